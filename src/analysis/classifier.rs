use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::matcher::TitleMatcher;
use crate::constants::{PREVIEW_ELLIPSIS, PREVIEW_MAX_CHARS};
use crate::gateway::SearchResult;

/// Condensed view of a search result for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub title: String,
    pub link: Option<String>,
    /// Content cut to [`PREVIEW_MAX_CHARS`] characters
    pub preview: String,
    pub score: Option<f64>,
}

impl DocumentSummary {
    pub fn from_result(result: &SearchResult) -> Self {
        Self {
            title: result.title.clone(),
            link: result.link.clone(),
            preview: preview(&result.content),
            score: result.score,
        }
    }
}

/// All documents that share one SOW identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SowGroup {
    /// Canonical key, e.g. `SOW#3`
    pub key: String,
    /// Upper-cased identifier, e.g. `3`
    pub identifier: String,
    /// Title of the first document assigned to the group
    pub primary_title: String,
    pub documents: Vec<DocumentSummary>,
}

/// Partition of a result batch into SOW groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SowAnalysis {
    /// Ordered by key
    pub groups: BTreeMap<String, SowGroup>,
    /// Documents whose title names no SOW
    pub unclassified: Vec<DocumentSummary>,
    /// Number of input results
    pub total: usize,
}

impl SowAnalysis {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Documents placed in some group
    pub fn classified_count(&self) -> usize {
        self.groups.values().map(|g| g.documents.len()).sum()
    }
}

/// Group results by the SOW identifier in their titles.
///
/// Every result ends up in exactly one group or in `unclassified`, in input
/// order. Stateless; the same input always yields the same analysis.
///
/// Identifiers are upper-cased for the group key, so `sow#1x` and `SOW#1X`
/// land in the same `SOW#1X` group rather than two.
pub fn classify(results: &[SearchResult]) -> SowAnalysis {
    classify_with(&TitleMatcher::sow(), results)
}

/// [`classify`] with a custom matcher
pub fn classify_with(matcher: &TitleMatcher, results: &[SearchResult]) -> SowAnalysis {
    let mut analysis = SowAnalysis {
        total: results.len(),
        ..SowAnalysis::default()
    };

    for result in results {
        let summary = DocumentSummary::from_result(result);
        match matcher.find(&result.title) {
            Some(found) => {
                let key = found.key(matcher.label());
                analysis
                    .groups
                    .entry(key.clone())
                    .or_insert_with(|| SowGroup {
                        key,
                        identifier: found.identifier.to_ascii_uppercase(),
                        primary_title: result.title.clone(),
                        documents: Vec::new(),
                    })
                    .documents
                    .push(summary);
            }
            None => analysis.unclassified.push(summary),
        }
    }

    analysis
}

/// First [`PREVIEW_MAX_CHARS`] characters of `content`, with an ellipsis
/// appended when anything was cut
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &content[..cut], PREVIEW_ELLIPSIS),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn results(titles: &[&str]) -> Vec<SearchResult> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                SearchResult::new(*title, format!("content {}", i))
                    .with_link(format!("gs://docs/{}.pdf", i))
                    .with_score(i as f64)
            })
            .collect()
    }

    #[test]
    fn test_classify_empty() {
        let analysis = classify(&[]);
        assert!(analysis.groups.is_empty());
        assert!(analysis.unclassified.is_empty());
        assert_eq!(analysis.total, 0);
    }

    #[test]
    fn test_classify_groups_by_identifier() {
        let input = results(&["CHR_SOW#1 Intro", "SOW#1 Appendix", "Random Doc", "SOW#2"]);
        let analysis = classify(&input);

        assert_eq!(analysis.total, 4);
        assert_eq!(analysis.group_count(), 2);
        let keys: Vec<&String> = analysis.groups.keys().collect();
        assert_eq!(keys, vec!["SOW#1", "SOW#2"]);

        let first = &analysis.groups["SOW#1"];
        assert_eq!(first.primary_title, "CHR_SOW#1 Intro");
        assert_eq!(first.identifier, "1");
        assert_eq!(first.documents.len(), 2);
        assert_eq!(first.documents[1].title, "SOW#1 Appendix");
        assert_eq!(first.documents[1].link.as_deref(), Some("gs://docs/1.pdf"));
        assert_eq!(first.documents[1].score, Some(1.0));

        assert_eq!(analysis.groups["SOW#2"].documents.len(), 1);

        assert_eq!(analysis.unclassified.len(), 1);
        assert_eq!(analysis.unclassified[0].title, "Random Doc");
    }

    #[test]
    fn test_every_result_is_accounted_for() {
        let input = results(&[
            "sow 3",
            "",
            "SOW#XX template",
            "chr_sow_3 signed",
            "Budget",
            "SOW#10",
            "sow#xx",
        ]);
        let analysis = classify(&input);

        assert_eq!(
            analysis.classified_count() + analysis.unclassified.len(),
            analysis.total
        );
        assert_eq!(analysis.total, input.len());
        assert_eq!(analysis.groups["SOW#3"].documents.len(), 2);
        assert_eq!(analysis.groups["SOW#3"].primary_title, "sow 3");
        assert_eq!(analysis.groups["SOW#XX"].documents.len(), 2);
        assert_eq!(analysis.unclassified.len(), 2);
    }

    #[test]
    fn test_groups_are_sorted_by_key() {
        let input = results(&["SOW#2", "SOW#10", "SOW#1"]);
        let keys: Vec<String> = classify(&input).groups.into_keys().collect();
        assert_eq!(keys, vec!["SOW#1", "SOW#10", "SOW#2"]);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let input = results(&["SOW#2 b", "Random", "CHR_SOW#1", "SOW#2 a", "SOW 1"]);
        assert_eq!(classify(&input), classify(&input));
    }

    #[test]
    fn test_preview_short_content_untouched() {
        assert_eq!(preview("short"), "short");
        let exact = "a".repeat(PREVIEW_MAX_CHARS);
        assert_eq!(preview(&exact), exact);
    }

    #[test]
    fn test_preview_truncates_long_content() {
        let content = "b".repeat(PREVIEW_MAX_CHARS + 50);
        let cut = preview(&content);
        assert!(cut.chars().count() <= PREVIEW_MAX_CHARS + PREVIEW_ELLIPSIS.len());
        assert!(cut.ends_with(PREVIEW_ELLIPSIS));
        let body = cut.trim_end_matches(PREVIEW_ELLIPSIS);
        assert!(content.starts_with(body));
        assert_eq!(body.chars().count(), PREVIEW_MAX_CHARS);
    }

    #[test]
    fn test_preview_counts_characters_not_bytes() {
        let content = "é".repeat(PREVIEW_MAX_CHARS + 1);
        let cut = preview(&content);
        assert_eq!(cut.chars().count(), PREVIEW_MAX_CHARS + 3);
        assert!(content.starts_with(&cut[..cut.len() - 3]));
    }
}
