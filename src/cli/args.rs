use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vertex-search")]
#[command(version)]
#[command(about = "Query Vertex AI Search: search, answers, conversations and SOW analysis", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a search query
    Search {
        query: String,
        /// Number of results to return
        #[arg(short = 'n', long)]
        page_size: Option<usize>,
        /// Pseudonymous user id sent with the request
        #[arg(short, long)]
        user: Option<String>,
        /// Disable query expansion
        #[arg(long)]
        no_expansion: bool,
        /// Disable spell correction
        #[arg(long)]
        no_spell_correction: bool,
    },
    /// Generate an answer for a query
    Answer {
        query: String,
        /// Query id from a previous search
        #[arg(long)]
        query_id: Option<String>,
        /// Session id for conversational context
        #[arg(short, long)]
        session: Option<String>,
        /// Skip related questions
        #[arg(long)]
        no_related: bool,
    },
    /// Search and generate an answer in one go
    Ask {
        query: String,
        #[arg(short = 'n', long)]
        page_size: Option<usize>,
        #[arg(short, long)]
        user: Option<String>,
        /// Skip related questions
        #[arg(long)]
        no_related: bool,
    },
    /// Group SOW documents by identifier
    Sows {
        /// Query used to collect documents (defaults to config)
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short = 'n', long)]
        page_size: Option<usize>,
    },
    /// Interactive conversational search
    Chat {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Initialize configuration
    Init,
    /// Show configuration and credentials status
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
    /// Markdown formatted output
    Markdown,
}
