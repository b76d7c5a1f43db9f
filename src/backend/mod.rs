//! Analysis backend boundary.
//!
//! A backend turns one paper into free-text safety analysis following the
//! prompt contract in [`prompt`]. Failures are reported as [`BackendError`]
//! and never abort a run; the pipeline substitutes the fallback record.

pub mod ollama;
pub mod prompt;
pub mod replay;

pub use ollama::{OllamaBackend, OllamaConfig};
pub use replay::ReplayBackend;

use crate::models::PaperMeta;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from an analysis backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to Ollama at {0}. Is Ollama running?")]
    Connect(String),

    #[error("Failed to send request: {0}")]
    Request(String),

    #[error("Ollama API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse backend response: {0}")]
    Decode(String),

    #[error("No recorded analysis at {}", .0.display())]
    MissingRecording(PathBuf),

    #[error("Failed to read recorded analysis {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Timeout(_) | BackendError::Connect(_) => true,
            BackendError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Produces a safety analysis document for one paper.
pub trait AnalysisBackend {
    /// Short description used in report metadata.
    fn describe(&self) -> String;

    /// Analyze one paper about `compound`.
    async fn analyze(&self, compound: &str, paper: &PaperMeta) -> Result<String, BackendError>;
}

/// Backend selected at startup.
pub enum Backend {
    Ollama(OllamaBackend),
    Replay(ReplayBackend),
}

impl AnalysisBackend for Backend {
    fn describe(&self) -> String {
        match self {
            Backend::Ollama(b) => b.describe(),
            Backend::Replay(b) => b.describe(),
        }
    }

    async fn analyze(&self, compound: &str, paper: &PaperMeta) -> Result<String, BackendError> {
        match self {
            Backend::Ollama(b) => b.analyze(compound, paper).await,
            Backend::Replay(b) => b.analyze(compound, paper).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(BackendError::Timeout(30).is_transient());
        assert!(BackendError::Connect("http://localhost:11434".to_string()).is_transient());
        assert!(BackendError::Status {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!BackendError::Status {
            status: 404,
            body: "model not found".to_string()
        }
        .is_transient());
        assert!(!BackendError::Decode("bad json".to_string()).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = BackendError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Ollama API error 500: boom");

        let err = BackendError::MissingRecording(PathBuf::from("/tmp/rec/1.txt"));
        assert_eq!(err.to_string(), "No recorded analysis at /tmp/rec/1.txt");
    }
}
