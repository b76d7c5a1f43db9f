//! Per-paper analysis orchestration.
//!
//! Backend calls run with bounded concurrency; every finished document is
//! assembled straight away. Results keep input order, and a failed call
//! becomes a fallback record instead of an error.

use crate::analysis::PaperAnalysisAssembler;
use crate::backend::AnalysisBackend;
use crate::models::{PaperAnalysis, PaperMeta};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

/// Options for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum backend calls in flight.
    pub concurrency: usize,
    /// Show a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            show_progress: false,
        }
    }
}

/// Analyze every paper and return one record per paper, in input order.
pub async fn analyze_papers<B: AnalysisBackend>(
    backend: &B,
    assembler: &PaperAnalysisAssembler,
    compound: &str,
    papers: Vec<PaperMeta>,
    options: &PipelineOptions,
) -> Vec<PaperAnalysis> {
    let total = papers.len();
    let concurrency = options.concurrency.max(1);
    info!(
        "Analyzing {} papers with {} (concurrency {})",
        total,
        backend.describe(),
        concurrency
    );

    let progress = options.show_progress.then(|| progress_bar(total as u64));

    let analyses: Vec<PaperAnalysis> = stream::iter(papers)
        .map(|paper| {
            let progress = progress.as_ref();
            async move {
                let analysis = match backend.analyze(compound, &paper).await {
                    Ok(text) => assembler.assemble(paper, Some(&text)),
                    Err(e) => {
                        warn!("Analysis of paper {} failed: {}", paper.identifier, e);
                        assembler.assemble_failed(paper, e.to_string())
                    }
                };
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                analysis
            }
        })
        .buffered(concurrency)
        .collect()
        .await;

    if let Some(pb) = progress {
        pb.finish_with_message("Analysis complete");
    }

    let failed = analyses.iter().filter(|a| a.analysis_failed).count();
    info!(
        "Analyzed {} papers ({} fell back after backend failures)",
        analyses.len(),
        failed
    );

    analyses
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} papers ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
