use crate::source::BufferId;
use crate::tree::LayerId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    #[error("language '{language}' is not available")]
    LanguageUnavailable { language: String },

    #[error("no injection query available for '{language}'")]
    QueryUnavailable { language: String },

    #[error("invalid injection query for '{language}': {message}")]
    InvalidQuery { language: String, message: String },

    #[error("failed to set language '{language}' on parser")]
    LanguageSet { language: String },

    #[error("invalid included ranges: {message}")]
    InvalidRanges { message: String },

    #[error("failed to parse '{language}' source")]
    ParseFailed { language: String },

    #[error("layer {0} does not exist in this tree")]
    UnknownLayer(LayerId),

    #[error("edit from buffer {got} reported to the tree of buffer {expected}")]
    ForeignEdit { expected: BufferId, got: BufferId },
}

impl LayerError {
    /// Errors that only disable injection discovery for a layer.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            LayerError::QueryUnavailable { .. } | LayerError::InvalidQuery { .. }
        )
    }
}
