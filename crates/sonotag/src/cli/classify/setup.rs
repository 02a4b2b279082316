//! Tagger setup: config overrides, model loading, label encoding.

use std::path::PathBuf;
use std::sync::Arc;

use sonotag_core::pipeline::ensure_root_dir;
use sonotag_core::{ClapEncoder, Config, Sonotag};

use super::ClassifyArgs;

/// Everything a batch run needs, assembled by [`setup_tagger`].
pub(crate) struct TaggerContext {
    pub sonotag: Sonotag,
    pub root: PathBuf,
    pub recursive: bool,
    pub output: PathBuf,
}

/// Validate the root, apply CLI overrides, load the encoder, and encode labels.
pub(crate) fn setup_tagger(args: &ClassifyArgs, mut config: Config) -> anyhow::Result<TaggerContext> {
    ensure_root_dir(&args.root)?;

    apply_overrides(&mut config, args);
    config.validate()?;

    let model_dir = config.model_dir();
    if !ClapEncoder::model_exists(&config.embedding, &model_dir) {
        anyhow::bail!(
            "Model {:?} not found in {}\n\n  Hint: Run `sonotag models download` first.",
            config.embedding.model,
            model_dir.display()
        );
    }
    let encoder = ClapEncoder::load(&config.embedding, &model_dir)?;

    let recursive = config.processing.recursive;
    let output = config.output.path.clone();
    let sonotag = Sonotag::new(config, Arc::new(encoder))?;

    Ok(TaggerContext {
        sonotag,
        root: args.root.clone(),
        recursive,
        output,
    })
}

/// Fold command-line flags into the loaded config.
pub(crate) fn apply_overrides(config: &mut Config, args: &ClassifyArgs) {
    if let Some(taxonomy) = &args.taxonomy {
        config.tagging.taxonomy_path = Some(taxonomy.to_string_lossy().into_owned());
    }
    if let Some(top_k) = args.top_k {
        config.tagging.top_k = top_k;
    }
    if args.flat {
        config.processing.recursive = false;
    }
    if let Some(rate) = args.sample_rate {
        config.audio.target_sample_rate = rate;
    }
    if let Some(seconds) = args.min_duration {
        config.audio.min_duration_seconds = seconds;
    }
    if let Some(model) = &args.model {
        config.embedding.model = model.clone();
    }
    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let mut config = Config::default();
        let args = ClassifyArgs {
            root: PathBuf::from("./sfx"),
            taxonomy: Some(PathBuf::from("labels.txt")),
            output: Some(PathBuf::from("tags.csv")),
            top_k: Some(5),
            flat: true,
            sample_rate: Some(44_100),
            min_duration: Some(2.0),
            model: Some("larger_clap_general".to_string()),
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.tagging.taxonomy_path.as_deref(), Some("labels.txt"));
        assert_eq!(config.output.path, PathBuf::from("tags.csv"));
        assert_eq!(config.tagging.top_k, 5);
        assert!(!config.processing.recursive);
        assert_eq!(config.audio.target_sample_rate, 44_100);
        assert_eq!(config.audio.min_duration_seconds, 2.0);
        assert_eq!(config.embedding.model, "larger_clap_general");
    }

    #[test]
    fn no_flags_keep_config() {
        let mut config = Config::default();
        apply_overrides(&mut config, &ClassifyArgs::default());
        assert_eq!(config.tagging.top_k, 3);
        assert!(config.processing.recursive);
        assert_eq!(config.output.path, PathBuf::from("audio_rankings.csv"));
    }

    #[test]
    fn missing_root_fails_before_model_loading() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.csv");
        let args = ClassifyArgs {
            root: dir.path().join("missing"),
            output: Some(output.clone()),
            ..ClassifyArgs::default()
        };
        let err = setup_tagger(&args, Config::default()).err().unwrap();
        assert!(err.to_string().contains("Audio directory not found"));
        assert!(!output.exists());
    }
}
