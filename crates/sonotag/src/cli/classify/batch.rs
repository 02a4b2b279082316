//! Batch run: progress bar, per-file isolation, summary, CSV report.

use std::io::Write;
use std::time::Instant;

use sonotag_core::pipeline::FileDiscovery;
use sonotag_core::{ProcessingStats, ReportWriter};

use super::setup::TaggerContext;

/// Classify every file under the root and write the report.
pub(crate) async fn run_batch(ctx: TaggerContext) -> anyhow::Result<()> {
    let driver = ctx.sonotag.driver();
    let files = driver.discover(&ctx.root, ctx.recursive)?;
    if files.is_empty() {
        tracing::warn!("No supported audio files found under {:?}", ctx.root);
    } else {
        tracing::info!(
            "Found {} audio file(s) to classify ({:.1} MB)",
            files.len(),
            FileDiscovery::total_size(&files) as f64 / (1024.0 * 1024.0)
        );
    }

    let start = Instant::now();
    let progress = create_progress_bar(files.len() as u64);
    let outcome = driver
        .process_files(files, |p| {
            progress.inc(1);
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                progress.set_message(format!("{:.1} files/sec", p.completed as f64 / elapsed));
            }
        })
        .await;
    progress.finish_and_clear();

    let stats = ProcessingStats::from_outcome(&outcome, start.elapsed());
    print_summary(&stats);

    let writer = ReportWriter::new(driver.top_k());
    match writer.write(&outcome.rows, &ctx.output) {
        Ok(()) => {
            eprintln!("  Report: {}", ctx.output.display());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Could not write report: {e}. Dumping CSV to stdout.");
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writer.write_to(&outcome.rows, &mut handle)?;
            handle.flush()?;
            Err(e.into())
        }
    }
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after a batch run.
fn print_summary(stats: &ProcessingStats) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.succeeded + stats.failed);
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("    Rate:         {:>7.1} files/sec", stats.files_per_second);
    eprintln!("  ====================================");
}
