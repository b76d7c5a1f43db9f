//! Replay backend: recorded analyses read from disk.
//!
//! Lets a run be reproduced exactly from saved backend output. Each paper's
//! analysis lives in `<dir>/<identifier>.txt`.

use crate::backend::{AnalysisBackend, BackendError};
use crate::models::PaperMeta;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ReplayBackend {
    dir: PathBuf,
}

impl ReplayBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the recording for a paper identifier.
    pub fn recording_path(&self, identifier: &str) -> PathBuf {
        let file_name: String = identifier
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{}.txt", file_name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AnalysisBackend for ReplayBackend {
    fn describe(&self) -> String {
        format!("replay:{}", self.dir.display())
    }

    async fn analyze(&self, _compound: &str, paper: &PaperMeta) -> Result<String, BackendError> {
        let path = self.recording_path(&paper.identifier);
        debug!("Reading recorded analysis {}", path.display());

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BackendError::MissingRecording(path))
            }
            Err(source) => Err(BackendError::Io { path, source }),
        }
    }
}
