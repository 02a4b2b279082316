//! Core data types for the sonotag pipeline.
//!
//! These types carry audio through normalization and represent the ranked
//! output of classifying a clip against the taxonomy.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PipelineResult;

/// A decoded (or normalized) audio clip.
///
/// Samples are stored planar: one `Vec<f32>` per channel, all the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Source file the clip was decoded from
    pub path: PathBuf,

    /// Planar samples in [-1, 1], one vector per channel
    pub samples: Vec<Vec<f32>>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioClip {
    /// Create a clip from planar samples.
    pub fn new(path: impl Into<PathBuf>, samples: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            path: path.into(),
            samples,
            sample_rate,
        }
    }

    /// Create a single-channel clip.
    pub fn mono(path: impl Into<PathBuf>, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(path, vec![samples], sample_rate)
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// The first channel's samples (the whole waveform once downmixed).
    pub fn first_channel(&self) -> &[f32] {
        self.samples.first().map_or(&[], Vec::as_slice)
    }
}

/// One label with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTag {
    /// Taxonomy key (e.g., "melee_sword_slash_light")
    pub label_key: String,

    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

impl RankedTag {
    /// Create a new ranked tag.
    pub fn new(label_key: impl Into<String>, score: f32) -> Self {
        Self {
            label_key: label_key.into(),
            score,
        }
    }
}

/// Top-K tags for a clip, highest score first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankingResult(Vec<RankedTag>);

impl RankingResult {
    pub fn new(tags: Vec<RankedTag>) -> Self {
        Self(tags)
    }

    pub fn tags(&self) -> &[RankedTag] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedTag> {
        self.0.iter()
    }

    /// The best-scoring tag, if any.
    pub fn best(&self) -> Option<&RankedTag> {
        self.0.first()
    }
}

impl<'a> IntoIterator for &'a RankingResult {
    type Item = &'a RankedTag;
    type IntoIter = std::slice::Iter<'a, RankedTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One line of the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Path relative to the enumeration root
    pub relative_path: String,

    /// Ranked tags for this file
    pub tags: RankingResult,
}

/// A file that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Path relative to the enumeration root
    pub relative_path: String,

    /// Human-readable failure message
    pub message: String,
}

/// Result of a batch run: processed rows plus per-file diagnostics.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Successfully classified files, in enumeration order
    pub rows: Vec<ReportRow>,

    /// Files that failed and were skipped, in enumeration order
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchOutcome {
    /// Partition per-file results into rows and diagnostics.
    ///
    /// Each item pairs the file's relative path with its outcome.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (String, PipelineResult<ReportRow>)>,
    {
        let mut outcome = Self::default();
        for (relative_path, result) in results {
            outcome.push(relative_path, result);
        }
        outcome
    }

    /// Record a single file's outcome.
    pub fn push(&mut self, relative_path: String, result: PipelineResult<ReportRow>) {
        match result {
            Ok(row) => self.rows.push(row),
            Err(e) => self.diagnostics.push(Diagnostic {
                relative_path,
                message: e.to_string(),
            }),
        }
    }

    /// Total number of files attempted.
    pub fn attempted(&self) -> usize {
        self.rows.len() + self.diagnostics.len()
    }
}

/// Processing statistics for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessingStats {
    /// Files classified successfully
    pub succeeded: usize,

    /// Files that failed
    pub failed: usize,

    /// Processing rate in files per second
    pub files_per_second: f64,

    /// Total processing time in seconds
    pub total_seconds: f64,
}

impl ProcessingStats {
    /// Summarize a finished batch.
    pub fn from_outcome(outcome: &BatchOutcome, elapsed: std::time::Duration) -> Self {
        let total_seconds = elapsed.as_secs_f64();
        let files_per_second = if total_seconds > 0.0 {
            outcome.attempted() as f64 / total_seconds
        } else {
            0.0
        };
        Self {
            succeeded: outcome.rows.len(),
            failed: outcome.diagnostics.len(),
            files_per_second,
            total_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn row(path: &str) -> ReportRow {
        ReportRow {
            relative_path: path.to_string(),
            tags: RankingResult::new(vec![RankedTag::new("a", 0.5)]),
        }
    }

    #[test]
    fn test_clip_dimensions() {
        let clip = AudioClip::new("x.wav", vec![vec![0.0; 480], vec![0.0; 480]], 48_000);
        assert_eq!(clip.channels(), 2);
        assert_eq!(clip.frames(), 480);
        assert!((clip.duration_seconds() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_empty_clip_has_zero_frames() {
        let clip = AudioClip::new("x.wav", vec![], 48_000);
        assert_eq!(clip.frames(), 0);
        assert!(clip.first_channel().is_empty());
    }

    #[test]
    fn test_outcome_partitions_results() {
        let results = vec![
            ("a.wav".to_string(), Ok(row("a.wav"))),
            (
                "b.wav".to_string(),
                Err(PipelineError::EmptyFile(PathBuf::from("/lib/b.wav"))),
            ),
            ("c.wav".to_string(), Ok(row("c.wav"))),
        ];
        let outcome = BatchOutcome::from_results(results);

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].relative_path, "a.wav");
        assert_eq!(outcome.rows[1].relative_path, "c.wav");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].relative_path, "b.wav");
        assert!(outcome.diagnostics[0].message.contains("Empty file"));
        assert_eq!(outcome.attempted(), 3);
    }

    #[test]
    fn test_ranking_result_serializes_as_list() {
        let result = RankingResult::new(vec![RankedTag::new("crowd_boo", 0.25)]);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"[{"label_key":"crowd_boo","score":0.25}]"#);
    }

    #[test]
    fn test_stats_from_outcome() {
        let mut outcome = BatchOutcome::default();
        outcome.push("a.wav".into(), Ok(row("a.wav")));
        outcome.push(
            "b.wav".into(),
            Err(PipelineError::FileNotFound(PathBuf::from("b.wav"))),
        );
        let stats = ProcessingStats::from_outcome(&outcome, std::time::Duration::from_secs(2));
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
        assert!((stats.files_per_second - 1.0).abs() < 1e-9);
    }
}
