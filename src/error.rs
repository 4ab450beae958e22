//! Error type shared by the match state and the route layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid session snapshot: {0}")]
    Snapshot(#[source] serde_json::Error),
    #[error("invalid reference document `{document}`: {source}")]
    Reference {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),
    #[error("reference data unavailable: {0}")]
    ReferenceUnavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("unknown side `{0}`")]
    UnknownSide(String),
    #[error("unknown battle result `{0}`")]
    UnknownResult(String),
    #[error("invalid slot `{0}`")]
    InvalidSlot(String),
    #[error("csv export failed: {0}")]
    Export(String),
}
