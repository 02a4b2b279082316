//! Batch orchestration over an audio tree.
//!
//! Files are processed one at a time in enumeration order. Each file's work
//! runs on the blocking pool under a deadline; any failure becomes a
//! [`Diagnostic`](crate::types::Diagnostic) and the batch moves on.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::{PipelineError, PipelineResult};
use crate::ranking::LabelBank;
use crate::types::{BatchOutcome, ReportRow};

use super::classifier::FileClassifier;
use super::discovery::{DiscoveredFile, FileDiscovery};

/// Per-file progress notification.
#[derive(Debug, Clone, Copy)]
pub struct FileProgress<'a> {
    /// Files finished so far, including this one
    pub completed: usize,
    /// Files in the batch
    pub total: usize,
    pub relative_path: &'a str,
    pub succeeded: bool,
}

/// Walks an audio tree and classifies every supported file.
pub struct BatchDriver {
    classifier: Arc<FileClassifier>,
    discovery: FileDiscovery,
    file_timeout_ms: u64,
}

impl BatchDriver {
    /// Create a driver. `tagging.top_k` is validated against the bank here,
    /// before any file is touched.
    pub fn new(
        config: &Config,
        provider: Arc<dyn EmbeddingProvider>,
        bank: Arc<LabelBank>,
    ) -> PipelineResult<Self> {
        Ok(Self {
            classifier: Arc::new(FileClassifier::new(config, provider, bank)?),
            discovery: FileDiscovery::new(&config.processing),
            file_timeout_ms: config.limits.file_timeout_ms,
        })
    }

    /// Tags per row.
    pub fn top_k(&self) -> usize {
        self.classifier.top_k()
    }

    /// Enumerate candidate files under `root`.
    pub fn discover(&self, root: &Path, recursive: bool) -> PipelineResult<Vec<DiscoveredFile>> {
        ensure_root_dir(root)?;
        Ok(self.discovery.discover(root, recursive))
    }

    /// Classify every supported file under `root`.
    pub async fn run(&self, root: &Path, recursive: bool) -> PipelineResult<BatchOutcome> {
        self.run_with_progress(root, recursive, |_| {}).await
    }

    /// Like [`run`](Self::run), reporting each finished file to `on_file`.
    pub async fn run_with_progress<F>(
        &self,
        root: &Path,
        recursive: bool,
        on_file: F,
    ) -> PipelineResult<BatchOutcome>
    where
        F: FnMut(FileProgress<'_>),
    {
        let files = self.discover(root, recursive)?;
        tracing::info!("Found {} audio files under {:?}", files.len(), root);
        Ok(self.process_files(files, on_file).await)
    }

    /// Classify already-discovered files in order.
    pub async fn process_files<F>(&self, files: Vec<DiscoveredFile>, mut on_file: F) -> BatchOutcome
    where
        F: FnMut(FileProgress<'_>),
    {
        let total = files.len();
        let mut outcome = BatchOutcome::default();

        for (index, file) in files.into_iter().enumerate() {
            let relative_path = file.relative_path.clone();
            let result = self.classify_with_timeout(file).await;

            if let Err(e) = &result {
                tracing::error!("Skipping {}: {}", relative_path, e);
            }
            on_file(FileProgress {
                completed: index + 1,
                total,
                relative_path: &relative_path,
                succeeded: result.is_ok(),
            });
            outcome.push(relative_path, result);
        }

        tracing::info!(
            "Classified {} of {} files ({} skipped)",
            outcome.rows.len(),
            total,
            outcome.diagnostics.len()
        );
        outcome
    }

    async fn classify_with_timeout(&self, file: DiscoveredFile) -> PipelineResult<ReportRow> {
        let path = file.path.clone();
        let classifier = Arc::clone(&self.classifier);
        let task = tokio::task::spawn_blocking(move || classifier.classify(&file));

        match timeout(Duration::from_millis(self.file_timeout_ms), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(PipelineError::Encoding {
                path,
                message: format!("Task join error: {}", e),
            }),
            Err(_) => {
                tracing::warn!(
                    "Timed out on {:?} after {}ms; the encoder call is still running in the background",
                    path,
                    self.file_timeout_ms
                );
                Err(PipelineError::Timeout {
                    path,
                    stage: "classify".to_string(),
                    timeout_ms: self.file_timeout_ms,
                })
            }
        }
    }
}

/// Fail with `DirectoryNotFound` unless `root` is an existing directory.
pub fn ensure_root_dir(root: &Path) -> PipelineResult<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(PipelineError::DirectoryNotFound(root.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AudioClip;

    /// Embeds every clip onto the first axis and sleeps if asked to.
    struct StubProvider {
        delay: Duration,
    }

    impl EmbeddingProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| if i == 0 { vec![1.0, 0.0] } else { vec![0.0, 1.0] })
                .collect())
        }

        fn embed_audio(&self, _clip: &AudioClip) -> PipelineResult<Vec<f32>> {
            std::thread::sleep(self.delay);
            Ok(vec![1.0, 0.2])
        }
    }

    fn bank() -> Arc<LabelBank> {
        Arc::new(
            LabelBank::from_raw(
                vec!["tone".into(), "noise".into()],
                vec![1.0, 0.0, 0.0, 1.0],
                2,
            )
            .unwrap(),
        )
    }

    fn write_tone(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..1_600 {
            let v = (i as f32 / 16_000.0 * 440.0 * std::f32::consts::TAU).sin();
            writer.write_sample((v * 8_000.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn driver(config: &Config, delay: Duration) -> BatchDriver {
        BatchDriver::new(config, Arc::new(StubProvider { delay }), bank()).unwrap()
    }

    #[test]
    fn test_new_rejects_top_k_above_labels() {
        let mut config = Config::default();
        config.tagging.top_k = 3;
        let result = BatchDriver::new(
            &config,
            Arc::new(StubProvider {
                delay: Duration::ZERO,
            }),
            bank(),
        );
        assert!(matches!(
            result,
            Err(PipelineError::InvalidTopK { k: 3, available: 2 })
        ));
    }

    #[tokio::test]
    async fn test_missing_root_is_directory_not_found() {
        let mut config = Config::default();
        config.tagging.top_k = 1;
        let driver = driver(&config, Duration::ZERO);

        let err = driver
            .run(Path::new("/definitely/not/here"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DirectoryNotFound(_)));
    }

    #[tokio::test]
    async fn test_root_that_is_a_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.wav");
        write_tone(&file);

        let mut config = Config::default();
        config.tagging.top_k = 1;
        let err = driver(&config, Duration::ZERO)
            .run(&file, true)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DirectoryNotFound(_)));
    }

    #[tokio::test]
    async fn test_run_isolates_failures_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        write_tone(&dir.path().join("a.wav"));
        std::fs::write(dir.path().join("b.wav"), b"garbage, not a wav").unwrap();
        std::fs::write(dir.path().join("c.wav"), b"").unwrap();
        write_tone(&dir.path().join("d.wav"));

        let mut config = Config::default();
        config.tagging.top_k = 2;
        let driver = driver(&config, Duration::ZERO);

        let mut seen = Vec::new();
        let outcome = driver
            .run_with_progress(dir.path(), true, |p| {
                seen.push((p.completed, p.total, p.relative_path.to_string(), p.succeeded))
            })
            .await
            .unwrap();

        let rows: Vec<_> = outcome.rows.iter().map(|r| r.relative_path.as_str()).collect();
        assert_eq!(rows, vec!["a.wav", "d.wav"]);
        assert_eq!(outcome.diagnostics.len(), 2);
        assert_eq!(outcome.diagnostics[0].relative_path, "b.wav");
        assert_eq!(outcome.diagnostics[1].relative_path, "c.wav");

        let best = outcome.rows[0].tags.best().unwrap();
        assert_eq!(best.label_key, "tone");
        assert_eq!(outcome.rows[0].tags.len(), 2);

        assert_eq!(seen.len(), 4);
        assert_eq!(seen[1], (2, 4, "b.wav".to_string(), false));
        assert_eq!(seen[3], (4, 4, "d.wav".to_string(), true));
    }

    #[tokio::test]
    async fn test_slow_file_times_out() {
        let dir = tempfile::tempdir().unwrap();
        write_tone(&dir.path().join("slow.wav"));

        let mut config = Config::default();
        config.tagging.top_k = 1;
        config.limits.file_timeout_ms = 20;
        let driver = driver(&config, Duration::from_millis(500));

        let outcome = driver.run(dir.path(), false).await.unwrap();
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].message.contains("Timeout"));
    }
}
