//! The `sonotag models` command for managing encoder models.

use std::path::Path;

use clap::{Args, Subcommand};
use sonotag_core::embedding::clap::{
    AUDIO_MODEL_FILENAME, REQUIRED_FILES, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME,
};
use sonotag_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download a CLAP model (audio encoder + text encoder + tokenizer)
    Download {
        /// Model to fetch (defaults to `embedding.model`)
        #[arg(long)]
        model: Option<String>,
    },

    /// List known models and their install status
    List,

    /// Show model directory path
    Path,
}

/// A CLAP ONNX export hosted on Hugging Face.
struct ModelVariant {
    name: &'static str,
    label: &'static str,
    repo: &'static str,
}

const MODEL_VARIANTS: &[ModelVariant] = &[
    ModelVariant {
        name: "clap-htsat-unfused",
        label: "CLAP HTSAT (unfused)",
        repo: "Xenova/clap-htsat-unfused",
    },
    ModelVariant {
        name: "larger_clap_general",
        label: "Larger CLAP (general audio)",
        repo: "Xenova/larger_clap_general",
    },
];

/// `(remote path, local filename)` for every file a model needs.
const MODEL_FILES: &[(&str, &str)] = &[
    ("onnx/audio_model.onnx", AUDIO_MODEL_FILENAME),
    ("onnx/text_model.onnx", TEXT_MODEL_FILENAME),
    ("tokenizer.json", TOKENIZER_FILENAME),
];

fn find_variant(name: &str) -> Option<&'static ModelVariant> {
    MODEL_VARIANTS.iter().find(|v| v.name == name)
}

fn hf_url(repo: &str, remote_path: &str) -> String {
    format!("https://huggingface.co/{repo}/resolve/main/{remote_path}")
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download { model } => {
            let name = model.unwrap_or_else(|| config.embedding.model.clone());
            let Some(variant) = find_variant(&name) else {
                anyhow::bail!(
                    "Unknown model {name:?}. Known models: {}",
                    MODEL_VARIANTS
                        .iter()
                        .map(|v| v.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            };

            let client = reqwest::Client::new();
            download_variant(variant, &config.model_dir(), &client).await?;
            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();
            println!("Models:");
            println!("  Directory: {}\n", model_dir.display());

            for variant in MODEL_VARIANTS {
                let variant_dir = model_dir.join(variant.name);
                let installed = REQUIRED_FILES
                    .iter()
                    .filter(|f| variant_dir.join(f).exists())
                    .count();
                let status = match installed {
                    n if n == REQUIRED_FILES.len() => "ready".to_string(),
                    0 => "not installed".to_string(),
                    n => format!("partial ({n}/{})", REQUIRED_FILES.len()),
                };
                let default_marker = if variant.name == config.embedding.model {
                    "  (default)"
                } else {
                    ""
                };
                println!(
                    "  - {:24} {:16}{}  {}",
                    variant.name, status, default_marker, variant.label
                );
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }
    }

    Ok(())
}

/// Download every file of a model variant. Skips files already on disk.
async fn download_variant(
    variant: &ModelVariant,
    model_dir: &Path,
    client: &reqwest::Client,
) -> anyhow::Result<()> {
    let variant_dir = model_dir.join(variant.name);
    std::fs::create_dir_all(&variant_dir)?;

    for (remote_path, local_name) in MODEL_FILES {
        let dest = variant_dir.join(local_name);
        if dest.exists() {
            tracing::info!("{} already exists at {:?}", local_name, dest);
            continue;
        }

        let url = hf_url(variant.repo, remote_path);
        tracing::info!("Downloading {} ({})...", local_name, variant.label);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        download_file(client, &url, &dest).await?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            local_name,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(())
}

/// Stream a URL to disk.
///
/// Bytes land in a `.part` file that is renamed into place once complete, so
/// an interrupted download never looks installed.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    let partial = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;
    drop(file);

    if let Some(total) = total_size {
        if downloaded != total {
            let _ = tokio::fs::remove_file(&partial).await;
            anyhow::bail!(
                "Incomplete download from {url}: got {downloaded} of {total} bytes. Try again."
            );
        }
    }

    tokio::fs::rename(&partial, dest).await?;
    Ok(())
}
