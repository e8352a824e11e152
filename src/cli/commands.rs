use anyhow::{Context, Result};
use colored::Colorize;
use tracing::warn;

use crate::{
    app::{init_config, load_config, load_config_from, Config},
    constants::ACCESS_TOKEN_ENV,
    gateway::{AnswerRequest, TokenSource},
    runtime::{format_answer, format_results, format_sow_report, ChatSession, SearchClient},
};

use super::{Cli, Commands};

/// Load configuration: explicit --config path, else the layered defaults
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    if let Some(path) = &cli.config {
        return load_config_from(path);
    }
    match load_config() {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!(error = %e, "failed to load config, using defaults");
            Ok(Config::default())
        }
    }
}

/// Handle CLI subcommands
pub async fn handle_command(cli: &Cli) -> Result<()> {
    let format = cli.format;

    match &cli.command {
        Commands::Init => {
            match init_config()? {
                Some(path) => println!("Created default configuration at: {}", path.display()),
                None => println!("Configuration already exists, nothing to do."),
            }
            Ok(())
        }
        Commands::Status => {
            let config = resolve_config(cli)?;
            show_status(&config);
            Ok(())
        }
        Commands::Search {
            query,
            page_size,
            user,
            no_expansion,
            no_spell_correction,
        } => {
            let config = resolve_config(cli)?;
            let client = SearchClient::from_config(&config)?;

            let mut options = client.options();
            if let Some(n) = page_size {
                options.page_size = *n;
            }
            options.user_pseudo_id = user.clone();
            options.query_expansion &= !no_expansion;
            options.spell_correction &= !no_spell_correction;

            let results = client
                .search(query, &options)
                .await
                .context("Search failed")?;
            print!("{}", format_results(&results, format));
            Ok(())
        }
        Commands::Answer {
            query,
            query_id,
            session,
            no_related,
        } => {
            let config = resolve_config(cli)?;
            let client = SearchClient::from_config(&config)?;

            let request = AnswerRequest {
                query: query.clone(),
                query_id: query_id.clone(),
                session: session.clone(),
                enable_related_questions: !no_related,
            };
            let answer = client
                .answer(&request)
                .await
                .context("Answer generation failed")?;
            println!("{}", format_answer(&answer, format));
            Ok(())
        }
        Commands::Ask {
            query,
            page_size,
            user,
            no_related,
        } => {
            let config = resolve_config(cli)?;
            let client = SearchClient::from_config(&config)?;

            let mut options = client.options();
            if let Some(n) = page_size {
                options.page_size = *n;
            }
            options.user_pseudo_id = user.clone();

            let answer = client
                .search_with_answer(query, &options, !no_related)
                .await
                .context("Search with answer failed")?;
            println!("{}", format_answer(&answer, format));
            Ok(())
        }
        Commands::Sows { query, page_size } => {
            let config = resolve_config(cli)?;
            let client = SearchClient::from_config(&config)?;

            let query = query.as_deref().unwrap_or(&config.analysis.query);
            let page_size = page_size.unwrap_or(config.analysis.page_size);
            let report = client
                .analyze_sows(query, page_size)
                .await
                .context("SOW analysis failed")?;
            print!("{}", format_sow_report(&report, format));
            Ok(())
        }
        Commands::Chat { user } => {
            let config = resolve_config(cli)?;
            let client = SearchClient::from_config(&config)?;

            ChatSession::new(&client, user.clone(), config.sessions.max_age_hours, format)
                .run()
                .await
        }
    }
}

/// Show configuration and credential status
fn show_status(config: &Config) {
    println!("vertex-search v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let gateway = &config.gateway;
    println!("  Project:  {}", gateway.project_id.green());
    println!("  Engine:   {}", gateway.engine_id.green());
    println!("  Location: {}", gateway.location);
    println!("  Endpoint: {}/{}", gateway.endpoint, gateway.api_version);
    println!();

    let source = TokenSource::detect(gateway.access_token.as_deref());
    match source {
        TokenSource::Gcloud if which::which("gcloud").is_err() => {
            println!("  [ERROR] Credentials: gcloud not found and {} not set", ACCESS_TOKEN_ENV);
        }
        _ => println!("  [OK] Credentials: {}", source.describe()),
    }

    println!();
    println!(
        "  Search defaults: page size {}, expansion {}, spell correction {}",
        config.search.page_size, config.search.query_expansion, config.search.spell_correction
    );
    println!("  Sessions expire after {}h", config.sessions.max_age_hours);
    println!(
        "  SOW analysis: \"{}\" ({} results)",
        config.analysis.query, config.analysis.page_size
    );
}
