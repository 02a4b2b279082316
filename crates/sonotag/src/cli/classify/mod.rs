//! The `sonotag classify` command for tagging an audio tree.

mod batch;
mod setup;

use std::path::PathBuf;

use clap::Args;
use sonotag_core::Config;

use batch::run_batch;
use setup::setup_tagger;

/// Arguments for the `classify` command.
#[derive(Args, Debug, Default)]
pub struct ClassifyArgs {
    /// Directory of audio files to tag
    #[arg(required = true)]
    pub root: PathBuf,

    /// Taxonomy file (`a__b__label: description` per line)
    #[arg(short, long)]
    pub taxonomy: Option<PathBuf>,

    /// CSV report destination (defaults to `output.path`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Tags per file
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Only tag files directly inside ROOT
    #[arg(long)]
    pub flat: bool,

    /// Encoder input sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Shorter clips are zero-padded to this many seconds
    #[arg(long)]
    pub min_duration: Option<f64>,

    /// Encoder model name under the model directory
    #[arg(long)]
    pub model: Option<String>,
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, config: Config) -> anyhow::Result<()> {
    let ctx = setup_tagger(&args, config)?;
    run_batch(ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_args_default_has_no_overrides() {
        let args = ClassifyArgs::default();
        assert!(args.taxonomy.is_none());
        assert!(args.output.is_none());
        assert!(args.top_k.is_none());
        assert!(!args.flat);
        assert!(args.sample_rate.is_none());
        assert!(args.min_duration.is_none());
        assert!(args.model.is_none());
    }
}
