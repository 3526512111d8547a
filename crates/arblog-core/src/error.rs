use arblog_archive::ArchiveError;
use arblog_types::ArchiveAddress;
use thiserror::Error;

use crate::fork::ForkStep;
use crate::parser::ParseError;

/// Errors from the blog layer.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("cannot open archive {address}: {source}")]
    Open {
        address: ArchiveAddress,
        #[source]
        source: ArchiveError,
    },

    /// The archive opened but its info could not be read.
    #[error("cannot read archive info: {0}")]
    Info(#[source] ArchiveError),

    #[error("articles directory {dir} unavailable: {source}")]
    ArticlesUnavailable {
        dir: String,
        #[source]
        source: ArchiveError,
    },

    #[error("cannot read article {name}: {source}")]
    ArticleRead {
        name: String,
        #[source]
        source: ArchiveError,
    },

    #[error("cannot parse article {name}: {source}")]
    ArticleParse {
        name: String,
        #[source]
        source: ParseError,
    },

    #[error("{path} not found: {source}")]
    ConfigUnavailable {
        path: String,
        #[source]
        source: ArchiveError,
    },

    #[error("{path} is not a valid blog configuration: {source}")]
    ConfigInvalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} not found: {source}")]
    StyleUnavailable {
        path: String,
        #[source]
        source: ArchiveError,
    },

    /// Rejected before any archive was touched.
    #[error("invalid fork request: {0}")]
    InvalidRequest(String),

    /// A fork step failed; nothing after it ran.
    #[error("fork failed at {step}: {source}")]
    Fork {
        step: ForkStep,
        #[source]
        source: ArchiveError,
    },

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BlogError {
    /// Kinds for which the blog has a sensible default: no articles, no
    /// configuration, no style. Everything else must reach the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ArticlesUnavailable { .. }
                | Self::ConfigUnavailable { .. }
                | Self::ConfigInvalid { .. }
                | Self::StyleUnavailable { .. }
        )
    }
}

/// Result alias for blog operations.
pub type BlogResult<T> = Result<T, BlogError>;
