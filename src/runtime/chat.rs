use anyhow::Result;
use colored::Colorize;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use super::client::SearchClient;
use super::report::{format_answer, format_history, format_sessions};
use crate::cli::OutputFormat;

/// A parsed line of chat input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Query(String),
    NewSession,
    History,
    Sessions,
    End,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if !line.starts_with('/') {
            return Self::Query(line.to_string());
        }
        match line {
            "/new" => Self::NewSession,
            "/history" => Self::History,
            "/sessions" => Self::Sessions,
            "/end" => Self::End,
            "/help" | "/?" => Self::Help,
            "/quit" | "/exit" | "/q" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

const HELP: &str = "Commands: /new  /history  /sessions  /end  /help  /quit";

/// Interactive conversational search over stdin/stdout
pub struct ChatSession<'a> {
    client: &'a SearchClient,
    user_pseudo_id: Option<String>,
    max_age_hours: i64,
    format: OutputFormat,
    current: Option<String>,
}

impl<'a> ChatSession<'a> {
    pub fn new(
        client: &'a SearchClient,
        user_pseudo_id: Option<String>,
        max_age_hours: i64,
        format: OutputFormat,
    ) -> Self {
        Self {
            client,
            user_pseudo_id,
            max_age_hours,
            format,
            current: None,
        }
    }

    /// Id of the session follow-up questions go to
    pub fn current_session(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Run until EOF or /quit
    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(io::stdin()).lines();
        let mut stdout = io::stdout();

        println!("{}", "Conversational search. Ask a question.".bold());
        println!("{}", HELP.dimmed());

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if !self.handle(ChatInput::parse(&line)).await {
                break;
            }
        }

        if let Some(id) = self.current.take() {
            self.client.end_session(&id);
        }
        Ok(())
    }

    /// Handle one input. Returns false when the loop should stop.
    async fn handle(&mut self, input: ChatInput) -> bool {
        match input {
            ChatInput::Empty => {}
            ChatInput::Help => println!("{}", HELP),
            ChatInput::Quit => return false,
            ChatInput::Unknown(cmd) => println!("Unknown command {}. {}", cmd, HELP),
            ChatInput::NewSession => {
                if let Some(id) = self.current.take() {
                    self.client.end_session(&id);
                }
                println!("Next question starts a new session.");
            }
            ChatInput::End => match self.current.take() {
                Some(id) => {
                    self.client.end_session(&id);
                    println!("Session {} ended.", id);
                }
                None => println!("No session in progress."),
            },
            ChatInput::History => {
                let turns = self
                    .current
                    .as_deref()
                    .map(|id| self.client.session_history(id))
                    .unwrap_or_default();
                print!("{}", format_history(&turns, self.format));
            }
            ChatInput::Sessions => {
                let sessions = self.client.list_sessions(self.user_pseudo_id.as_deref());
                print!("{}", format_sessions(&sessions, self.format));
            }
            ChatInput::Query(query) => self.ask(&query).await,
        }
        true
    }

    async fn ask(&mut self, query: &str) {
        // the REPL is the sweep scheduler: clean up between turns
        let swept = self.client.cleanup_sessions(self.max_age_hours);
        if swept > 0 {
            println!("{}", format!("Swept {} expired session(s).", swept).dimmed());
        }

        let result = self
            .client
            .conversational_search(
                query,
                self.current.as_deref(),
                self.user_pseudo_id.as_deref(),
                false,
            )
            .await;

        match result {
            Ok(answer) => {
                self.current = answer.session_id.clone();
                println!("{}", format_answer(&answer, self.format));
            }
            Err(e) => {
                warn!(error = %e, "conversational search failed");
                eprintln!("{} {}", "error:".red(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SearchConfig;
    use crate::gateway::{AnswerResponse, MockSearchGateway};
    use crate::session::{self, SessionState};
    use std::sync::Arc;

    fn client() -> SearchClient {
        let mut mock = MockSearchGateway::new();
        mock.expect_search().returning(|_, _| Ok(vec![]));
        mock.expect_answer().returning(|_| {
            Ok(AnswerResponse {
                answer_text: "ok".to_string(),
                query_id: Some("q".to_string()),
                ..AnswerResponse::default()
            })
        });
        SearchClient::new(Arc::new(mock), SearchConfig::default())
    }

    #[tokio::test]
    async fn test_chat_follows_session_lifecycle() {
        let client = client();
        let mut chat = ChatSession::new(&client, Some("me".to_string()), 24, OutputFormat::Json);

        assert!(chat.handle(ChatInput::parse("first")).await);
        let provisional = chat.current_session().unwrap().to_string();
        assert!(session::is_provisional(&provisional));

        assert!(chat.handle(ChatInput::parse("second")).await);
        let confirmed = chat.current_session().unwrap().to_string();
        assert_eq!(confirmed, session::confirm(&provisional));
        assert_eq!(client.session_history(&confirmed).len(), 2);

        assert!(chat.handle(ChatInput::End).await);
        assert!(chat.current_session().is_none());
        let ended = client.session_info(&confirmed).unwrap();
        assert_eq!(ended.state, SessionState::Completed);

        assert!(!chat.handle(ChatInput::Quit).await);
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(ChatInput::parse("  "), ChatInput::Empty);
        assert_eq!(
            ChatInput::parse(" how many SOWs? "),
            ChatInput::Query("how many SOWs?".to_string())
        );
        assert_eq!(ChatInput::parse("/new"), ChatInput::NewSession);
        assert_eq!(ChatInput::parse("/history"), ChatInput::History);
        assert_eq!(ChatInput::parse("/sessions"), ChatInput::Sessions);
        assert_eq!(ChatInput::parse("/end"), ChatInput::End);
        assert_eq!(ChatInput::parse("/exit"), ChatInput::Quit);
        assert_eq!(
            ChatInput::parse("/bogus"),
            ChatInput::Unknown("/bogus".to_string())
        );
    }
}
