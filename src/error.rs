use thiserror::Error;

use crate::level::LevelId;

/// Problems a command can run into. Commands never propagate these to the
/// dispatcher; they are turned into [`crate::editor::Report`]s instead.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("level {0} has no following sibling level")]
    NoNextSibling(LevelId),
    #[error("level {0} has no parent")]
    NoParent(LevelId),
    #[error("invalid JSON input: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid URL {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("script was cancelled")]
    Cancelled,
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("level {0} is no longer part of the outline")]
    Detached(LevelId),
    #[error("no reorderable group {0}")]
    UnknownGroup(String),
    #[error("reorder index {index} out of bounds for {len} items")]
    ReorderOutOfBounds { index: usize, len: usize },
    #[error("outline is inconsistent: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed section {0:?}")]
    UnclosedSection(String),
    #[error("unexpected closing tag {found:?} (expected {expected:?})")]
    MismatchedSection { expected: String, found: String },
    #[error("unterminated tag starting at byte {0}")]
    UnterminatedTag(usize),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("reading response body from {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
