use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;

use super::client::SowReport;
use crate::{
    cli::OutputFormat,
    gateway::{AnswerResponse, SearchResult},
    session::{Session, Turn},
};

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize result: {}\"}}", e))
}

fn score_label(score: Option<f64>) -> String {
    score.map(|s| format!("{:.3}", s)).unwrap_or_else(|| "-".to_string())
}

/// Format search results
pub fn format_results(results: &[SearchResult], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(results),
        OutputFormat::Text => {
            let mut output = String::new();
            if results.is_empty() {
                output.push_str("No results found.\n");
            }
            for (i, result) in results.iter().enumerate() {
                let _ = writeln!(output, "{}. {}", i + 1, result.title.bold());
                if let Some(link) = &result.link {
                    let _ = writeln!(output, "   {}", link.cyan());
                }
                if let Some(score) = result.score {
                    let _ = writeln!(output, "   score: {:.3}", score);
                }
                if !result.content.is_empty() {
                    let _ = writeln!(output, "   {}", crate::analysis::preview(&result.content));
                }
            }
            output
        }
        OutputFormat::Markdown => {
            let mut output = String::from("## Results\n\n");
            if results.is_empty() {
                output.push_str("_No results found._\n");
            }
            for (i, result) in results.iter().enumerate() {
                match &result.link {
                    Some(link) => {
                        let _ = writeln!(output, "{}. [{}]({})", i + 1, result.title, link);
                    }
                    None => {
                        let _ = writeln!(output, "{}. **{}**", i + 1, result.title);
                    }
                }
                if !result.content.is_empty() {
                    let _ = writeln!(output, "   > {}", crate::analysis::preview(&result.content));
                }
            }
            output
        }
    }
}

/// Format a generated answer, with its sources when present
pub fn format_answer(answer: &AnswerResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(answer),
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str(&answer.answer_text);
            output.push('\n');

            if !answer.related_questions.is_empty() {
                output.push_str("\n--- Related questions ---\n");
                for question in &answer.related_questions {
                    let _ = writeln!(output, "• {}", question);
                }
            }

            if !answer.search_results.is_empty() {
                output.push_str("\n--- Sources ---\n");
                for result in &answer.search_results {
                    let _ = writeln!(output, "• {}", result.title);
                }
            }

            if let Some(session) = &answer.session_id {
                let _ = writeln!(output, "\n{} {}", "session:".dimmed(), session);
            }
            output
        }
        OutputFormat::Markdown => {
            let mut output = String::from("## Answer\n\n");
            output.push_str(&answer.answer_text);
            output.push_str("\n\n");

            if !answer.related_questions.is_empty() {
                output.push_str("## Related Questions\n\n");
                for question in &answer.related_questions {
                    let _ = writeln!(output, "- {}", question);
                }
                output.push('\n');
            }

            if !answer.search_results.is_empty() {
                output.push_str("## Sources\n\n");
                for result in &answer.search_results {
                    match &result.link {
                        Some(link) => {
                            let _ = writeln!(output, "- [{}]({})", result.title, link);
                        }
                        None => {
                            let _ = writeln!(output, "- {}", result.title);
                        }
                    }
                }
                output.push('\n');
            }

            if let Some(session) = &answer.session_id {
                output.push_str("---\n");
                let _ = writeln!(output, "*Session: {}*", session);
            }
            output
        }
    }
}

/// Format a SOW analysis
pub fn format_sow_report(report: &SowReport, format: OutputFormat) -> String {
    let analysis = &report.analysis;
    match format {
        // raw results are already summarised in the analysis
        OutputFormat::Json => to_json(analysis),
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(
                output,
                "Found {} unique SOW(s) for \"{}\":\n",
                analysis.group_count().to_string().green(),
                report.query
            );
            for (key, group) in &analysis.groups {
                let _ = writeln!(output, "  {}: {} document(s)", key.bold(), group.documents.len());
                let _ = writeln!(output, "      Primary: {}", group.primary_title);
                if let Some(link) = group.documents.first().and_then(|d| d.link.as_ref()) {
                    let _ = writeln!(output, "      Link: {}", link.cyan());
                }
            }
            if !analysis.unclassified.is_empty() {
                let _ = writeln!(
                    output,
                    "\n  Other related documents: {}",
                    analysis.unclassified.len()
                );
                for doc in analysis.unclassified.iter().take(3) {
                    let _ = writeln!(output, "      • {}", doc.title);
                }
            }
            let _ = writeln!(output, "\n  Total documents found: {}", analysis.total);
            output
        }
        OutputFormat::Markdown => {
            let mut output = format!("## SOW Analysis: `{}`\n\n", report.query);
            output.push_str("| SOW | Documents | Primary title |\n");
            output.push_str("|-----|-----------|---------------|\n");
            for (key, group) in &analysis.groups {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} |",
                    key,
                    group.documents.len(),
                    group.primary_title.replace('|', "\\|")
                );
            }
            if !analysis.unclassified.is_empty() {
                output.push_str("\n### Other documents\n\n");
                for doc in &analysis.unclassified {
                    let _ = writeln!(output, "- {} (score {})", doc.title, score_label(doc.score));
                }
            }
            let _ = writeln!(output, "\n*Total documents: {}*", analysis.total);
            output
        }
    }
}

/// Format a list of sessions
pub fn format_sessions(sessions: &[Session], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(sessions),
        OutputFormat::Text => {
            if sessions.is_empty() {
                return "No active sessions.\n".to_string();
            }
            sessions
                .iter()
                .map(|s| format!("{}\n", s.summary()))
                .collect()
        }
        OutputFormat::Markdown => {
            let mut output = String::from("| Session | State | Turns | Started |\n");
            output.push_str("|---------|-------|-------|---------|\n");
            for s in sessions {
                let _ = writeln!(
                    output,
                    "| `{}` | {} | {} | {} |",
                    s.session_id,
                    s.state,
                    s.turns.len(),
                    s.start_time.format("%Y-%m-%d %H:%M")
                );
            }
            output
        }
    }
}

/// Format a session's turn log
pub fn format_history(turns: &[Turn], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(turns),
        OutputFormat::Text | OutputFormat::Markdown => {
            if turns.is_empty() {
                return "No turns recorded.\n".to_string();
            }
            turns
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    format!(
                        "{}. [{}] {} (query {})\n",
                        i + 1,
                        t.timestamp.format("%H:%M:%S"),
                        t.query_text,
                        t.query_id
                    )
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classify;

    fn report() -> SowReport {
        let raw_results = vec![
            SearchResult::new("CHR_SOW#1 Intro", "a").with_link("gs://a"),
            SearchResult::new("Random Doc", "b").with_score(0.5),
        ];
        SowReport {
            query: "SOW".to_string(),
            analysis: classify(&raw_results),
            raw_results,
        }
    }

    #[test]
    fn test_sow_report_json_is_the_analysis() {
        let json = format_sow_report(&report(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["groups"]["SOW#1"]["primary_title"], "CHR_SOW#1 Intro");
        assert_eq!(value["unclassified"][0]["title"], "Random Doc");
    }

    #[test]
    fn test_sow_report_markdown() {
        let md = format_sow_report(&report(), OutputFormat::Markdown);
        assert!(md.contains("| SOW#1 | 1 | CHR_SOW#1 Intro |"));
        assert!(md.contains("- Random Doc (score 0.500)"));
        assert!(md.contains("*Total documents: 2*"));
    }

    #[test]
    fn test_answer_markdown_lists_sources() {
        let answer = AnswerResponse {
            answer_text: "Yes.".to_string(),
            search_results: vec![SearchResult::new("SOW#2", "").with_link("gs://b")],
            session_id: Some("abc-".to_string()),
            ..AnswerResponse::default()
        };
        let md = format_answer(&answer, OutputFormat::Markdown);
        assert!(md.starts_with("## Answer\n\nYes."));
        assert!(md.contains("- [SOW#2](gs://b)"));
        assert!(md.contains("*Session: abc-*"));
    }

    #[test]
    fn test_empty_results_text() {
        colored::control::set_override(false);
        assert_eq!(format_results(&[], OutputFormat::Text), "No results found.\n");
        assert_eq!(format_sessions(&[], OutputFormat::Text), "No active sessions.\n");
        assert_eq!(format_history(&[], OutputFormat::Text), "No turns recorded.\n");
    }
}
