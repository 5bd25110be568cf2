//! Error type shared by summary loading, graph construction and report output

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The summary document does not have the expected shape
    #[error("malformed metrics summary: {message}")]
    MalformedSummary { message: String },

    /// A pair key that is not `<producer>-<consumer>` over known stages
    #[error("invalid component pair key '{key}': {reason}")]
    InvalidPairKey { key: String, reason: String },

    /// An element id that is already present in the graph
    #[error("duplicate graph element id '{id}'")]
    DuplicateElement { id: String },

    /// An edge endpoint that names no node
    #[error("edge '{edge}' references missing node '{node}'")]
    DanglingEdge { edge: String, node: String },
}

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedSummary { message: message.into() }
    }

    pub fn invalid_pair(key: &str, reason: impl Into<String>) -> Self {
        Error::InvalidPairKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
