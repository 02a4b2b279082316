//! Sonotag CLI - zero-shot tagging of sound-effect libraries.
//!
//! Ranks every audio file in a tree against a text taxonomy using a joint
//! audio-text encoder and writes the top matches per file to CSV.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the encoder once
//! sonotag models download
//!
//! # Tag a library with the built-in taxonomy
//! sonotag classify ./sfx
//!
//! # Custom taxonomy, five tags per file
//! sonotag classify ./sfx --taxonomy taxonomy.txt --top-k 5 --output tags.csv
//!
//! # View configuration
//! sonotag config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Sonotag - zero-shot audio tagging against a text taxonomy.
#[derive(Parser, Debug)]
#[command(name = "sonotag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank audio files against the taxonomy and write a CSV report
    Classify(cli::classify::ClassifyArgs),

    /// Inspect the resolved taxonomy
    Taxonomy(cli::taxonomy::TaxonomyArgs),

    /// Manage encoder models (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match sonotag_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `sonotag config path`."
            );
            sonotag_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("sonotag v{}", sonotag_core::VERSION);

    match cli.command {
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Taxonomy(args) => cli::taxonomy::execute(args, &config),
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn classify_parses_overrides() {
        let cli = Cli::try_parse_from([
            "sonotag", "classify", "./sfx", "--top-k", "5", "--flat", "-o", "out.csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Classify(args) => {
                assert_eq!(args.top_k, Some(5));
                assert!(args.flat);
                assert_eq!(args.output.unwrap().to_str(), Some("out.csv"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["sonotag", "config", "path", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
