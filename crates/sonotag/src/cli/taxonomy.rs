//! The `sonotag taxonomy` command for inspecting label sets.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use sonotag_core::{Config, TaxonomyStore};

/// Arguments for the `taxonomy` command.
#[derive(Args, Debug)]
pub struct TaxonomyArgs {
    #[command(subcommand)]
    pub command: TaxonomyCommand,
}

/// Subcommands for taxonomy inspection.
#[derive(Subcommand, Debug)]
pub enum TaxonomyCommand {
    /// Print the resolved labels as JSON
    Show {
        /// Taxonomy file (defaults to `tagging.taxonomy_path`, then the built-in set)
        #[arg(short, long)]
        taxonomy: Option<PathBuf>,
    },
}

/// Execute the taxonomy command.
pub fn execute(args: TaxonomyArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        TaxonomyCommand::Show { taxonomy } => {
            let source = taxonomy.or_else(|| config.taxonomy_path());
            let store = TaxonomyStore::resolve(source.as_deref(), TaxonomyStore::builtin())?;
            println!("{}", serde_json::to_string_pretty(store.entries())?);
        }
    }
    Ok(())
}
