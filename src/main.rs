use anyhow::Result;
use clap::Parser;

use vertex_search::{
    cli::{handle_command, Cli},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr; RUST_LOG overrides --verbose
    init_logger(cli.verbose);

    handle_command(&cli).await
}
