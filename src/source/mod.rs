//! Literature source: paper records loaded from a JSON file.
//!
//! The file holds either a JSON array of records or an object with a
//! `papers` array. Records are passed through the pipeline unmodified.

use crate::models::PaperMeta;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Deserialize)]
#[serde(untagged)]
enum PaperFile {
    List(Vec<PaperMeta>),
    Wrapped { papers: Vec<PaperMeta> },
}

/// Load paper records from a JSON file.
pub fn load_papers(path: &Path) -> Result<Vec<PaperMeta>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read papers file: {}", path.display()))?;

    let papers = parse_papers(&content)
        .with_context(|| format!("Failed to parse papers file: {}", path.display()))?;

    debug!("Loaded {} papers from {}", papers.len(), path.display());
    Ok(papers)
}

/// Parse paper records from JSON text.
pub fn parse_papers(content: &str) -> Result<Vec<PaperMeta>> {
    let file: PaperFile = serde_json::from_str(content)
        .context("Expected a JSON array of papers or an object with a \"papers\" array")?;

    let papers = match file {
        PaperFile::List(papers) | PaperFile::Wrapped { papers } => papers,
    };

    let mut seen = HashSet::new();
    for paper in &papers {
        if paper.identifier.trim().is_empty() {
            warn!("Paper \"{}\" has an empty identifier", paper.title);
        } else if !seen.insert(paper.identifier.as_str()) {
            warn!("Duplicate paper identifier {}", paper.identifier);
        }
    }

    Ok(papers)
}
