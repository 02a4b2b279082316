//! CLAP encoder running locally via ONNX Runtime.
//!
//! Loads the audio and text towers of a CLAP ONNX export plus its tokenizer.
//! Both towers project into the same space, so their outputs can be compared
//! by cosine similarity.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::config::EmbeddingConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::AudioClip;

use super::features::{MelFrontend, SAMPLE_RATE};
use super::EmbeddingProvider;

pub const AUDIO_MODEL_FILENAME: &str = "audio_model.onnx";
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Files a model directory must contain.
pub const REQUIRED_FILES: &[&str] = &[AUDIO_MODEL_FILENAME, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME];

const FALLBACK_PAD_ID: u32 = 1;

/// CLAP audio + text encoder.
///
/// Sessions sit behind a `Mutex` because `Session::run` requires `&mut self`.
pub struct ClapEncoder {
    name: String,
    audio_session: Mutex<Session>,
    audio_input_name: String,
    text_session: Mutex<Session>,
    text_uses_attention_mask: bool,
    tokenizer: tokenizers::Tokenizer,
    pad_id: u32,
    frontend: MelFrontend,
    text_max_length: usize,
    text_batch_size: usize,
}

impl ClapEncoder {
    /// Load the encoder from `{model_dir}/{config.model}/`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> PipelineResult<Self> {
        let dir = Self::model_path(config, model_dir);
        if let Some(missing) = Self::missing_files(config, model_dir).first() {
            return Err(PipelineError::Model {
                message: format!(
                    "Model file {:?} not found. Run `sonotag models download` first.",
                    missing
                ),
            });
        }

        tracing::info!("Loading CLAP model from {:?}", dir);

        let audio_session = load_session(&dir.join(AUDIO_MODEL_FILENAME))?;
        let audio_input_name = audio_session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input_features".to_string());

        let text_session = load_session(&dir.join(TEXT_MODEL_FILENAME))?;
        let text_uses_attention_mask = text_session
            .inputs()
            .iter()
            .any(|i| i.name() == "attention_mask");

        let tokenizer =
            tokenizers::Tokenizer::from_file(dir.join(TOKENIZER_FILENAME)).map_err(|e| {
                PipelineError::Model {
                    message: format!("Failed to load tokenizer: {e}"),
                }
            })?;
        let pad_id = tokenizer
            .token_to_id("<pad>")
            .unwrap_or(FALLBACK_PAD_ID);

        tracing::debug!(
            "CLAP sessions ready (audio input: {:?}, text attention mask: {}, pad id: {})",
            audio_input_name,
            text_uses_attention_mask,
            pad_id
        );

        Ok(Self {
            name: config.model.clone(),
            audio_session: Mutex::new(audio_session),
            audio_input_name,
            text_session: Mutex::new(text_session),
            text_uses_attention_mask,
            tokenizer,
            pad_id,
            frontend: MelFrontend::new(),
            text_max_length: config.text_max_length,
            text_batch_size: config.text_batch_size.max(1),
        })
    }

    /// Directory holding the model files.
    pub fn model_path(config: &EmbeddingConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model)
    }

    /// Required files absent from the model directory.
    pub fn missing_files(config: &EmbeddingConfig, model_dir: &Path) -> Vec<PathBuf> {
        let dir = Self::model_path(config, model_dir);
        REQUIRED_FILES
            .iter()
            .map(|f| dir.join(f))
            .filter(|p| !p.exists())
            .collect()
    }

    /// Check whether all model files exist on disk.
    pub fn model_exists(config: &EmbeddingConfig, model_dir: &Path) -> bool {
        Self::missing_files(config, model_dir).is_empty()
    }

    fn encode_text_batch(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        let batch = tokenize_batch(&self.tokenizer, texts, self.text_max_length, self.pad_id)?;
        let shape = vec![batch.rows as i64, batch.seq_len as i64];

        let model_err = |message: String| PipelineError::Model { message };

        let ids = Value::from_array((shape.clone(), batch.input_ids))
            .map_err(|e| model_err(format!("Failed to create input_ids tensor: {e}")))?;

        let mut session = self
            .text_session
            .lock()
            .map_err(|e| model_err(format!("Text encoder lock poisoned: {e}")))?;

        let outputs = if self.text_uses_attention_mask {
            let mask = Value::from_array((shape, batch.attention_mask))
                .map_err(|e| model_err(format!("Failed to create attention_mask tensor: {e}")))?;
            session.run(ort::inputs!["input_ids" => ids, "attention_mask" => mask])
        } else {
            session.run(ort::inputs!["input_ids" => ids])
        }
        .map_err(|e| model_err(format!("Text encoder inference failed: {e}")))?;

        let embeds = outputs
            .iter()
            .find(|(name, _)| *name == "text_embeds")
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| model_err("Text encoder produced no outputs".to_string()))?;

        let (out_shape, data) = embeds
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| model_err(format!("Failed to extract text_embeds: {e}")))?;

        let dim = match out_shape.len() {
            2 => out_shape[1] as usize,
            _ => {
                return Err(model_err(format!(
                    "Unexpected text_embeds shape: {:?}",
                    out_shape
                )))
            }
        };
        if dim == 0 || data.len() != dim * texts.len() {
            return Err(model_err(format!(
                "text_embeds holds {} values, expected {} x {}",
                data.len(),
                texts.len(),
                dim
            )));
        }

        Ok(data.chunks(dim).map(<[f32]>::to_vec).collect())
    }
}

impl EmbeddingProvider for ClapEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(SAMPLE_RATE)
    }

    fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.text_batch_size) {
            embeddings.extend(self.encode_text_batch(chunk)?);
        }
        Ok(embeddings)
    }

    fn embed_audio(&self, clip: &AudioClip) -> PipelineResult<Vec<f32>> {
        let encoding_err = |message: String| PipelineError::Encoding {
            path: clip.path.clone(),
            message,
        };

        if clip.sample_rate != SAMPLE_RATE || clip.channels() != 1 {
            return Err(encoding_err(format!(
                "Expected 48 kHz mono input, got {} ch @ {} Hz",
                clip.channels(),
                clip.sample_rate
            )));
        }

        let features = self.frontend.features(clip.first_channel());
        let shape: Vec<i64> = features.shape().iter().map(|&d| d as i64).collect();
        let flat: Vec<f32> = features.iter().copied().collect();

        let input = Value::from_array((shape, flat))
            .map_err(|e| encoding_err(format!("Failed to create input tensor: {e}")))?;

        let mut session = self
            .audio_session
            .lock()
            .map_err(|e| encoding_err(format!("Audio encoder lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![self.audio_input_name.as_str() => input])
            .map_err(|e| encoding_err(format!("ONNX inference failed: {e}")))?;

        let embeds = outputs
            .iter()
            .find(|(name, _)| *name == "audio_embeds")
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| encoding_err("Audio encoder produced no outputs".to_string()))?;

        let (shape, data) = embeds
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| encoding_err(format!("Failed to extract audio_embeds: {e}")))?;

        match shape.len() {
            1 => Ok(data.to_vec()),
            2 => Ok(data[..shape[1] as usize].to_vec()),
            _ => Err(encoding_err(format!(
                "Unexpected audio_embeds shape: {:?}",
                shape
            ))),
        }
    }
}

fn load_session(path: &Path) -> PipelineResult<Session> {
    let session = Session::builder()
        .map_err(|e| PipelineError::Model {
            message: format!("Failed to create ONNX session builder: {e}"),
        })?
        .commit_from_file(path)
        .map_err(|e| PipelineError::Model {
            message: format!("Failed to load ONNX model {:?}: {e}", path),
        })?;

    tracing::debug!(
        "Loaded {:?} (inputs: {:?}, outputs: {:?})",
        path,
        session.inputs().iter().map(|i| i.name()).collect::<Vec<_>>(),
        session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>()
    );
    Ok(session)
}

/// Token ids and attention mask for a padded batch, row-major.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TokenBatch {
    pub rows: usize,
    pub seq_len: usize,
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

/// Tokenize, truncate each row to `max_length`, and pad to the longest row.
pub(crate) fn tokenize_batch(
    tokenizer: &tokenizers::Tokenizer,
    texts: &[String],
    max_length: usize,
    pad_id: u32,
) -> PipelineResult<TokenBatch> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| PipelineError::Model {
            message: format!("Tokenization failed: {e}"),
        })?;
    let rows: Vec<Vec<u32>> = encodings
        .iter()
        .map(|enc| enc.get_ids().iter().take(max_length).copied().collect())
        .collect();
    Ok(pad_rows(&rows, pad_id))
}

pub(crate) fn pad_rows(rows: &[Vec<u32>], pad_id: u32) -> TokenBatch {
    let seq_len = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let mut input_ids = vec![pad_id as i64; rows.len() * seq_len];
    let mut attention_mask = vec![0i64; rows.len() * seq_len];
    for (r, row) in rows.iter().enumerate() {
        for (c, &id) in row.iter().enumerate() {
            input_ids[r * seq_len + c] = id as i64;
            attention_mask[r * seq_len + c] = 1;
        }
    }
    TokenBatch {
        rows: rows.len(),
        seq_len,
        input_ids,
        attention_mask,
    }
}
