//! Error types shared across the live-rendering core and the vault layer.

use thiserror::Error;

/// Reasons a reflow cannot produce a trustworthy token tree.
///
/// A parse error rejects the edit that triggered it; the previously
/// rendered tree stays on screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("block nesting depth {depth} exceeds the limit of {limit} at byte {offset}")]
    NestingTooDeep {
        depth: usize,
        limit: usize,
        offset: usize,
    },
    #[error("{kind} span {start}..{end} falls outside its parent {parent_start}..{parent_end}")]
    SpanOutOfBounds {
        kind: &'static str,
        start: usize,
        end: usize,
        parent_start: usize,
        parent_end: usize,
    },
    #[error("{kind} span starting at byte {start} overlaps the previous sibling ending at {previous_end}")]
    OverlappingBlocks {
        kind: &'static str,
        start: usize,
        previous_end: usize,
    },
}

/// Failures while building the display form of a single token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The display payload of a node is not a substring of its raw span.
    #[error("payload {payload:?} not found in raw span {raw:?}")]
    PayloadNotFound { raw: String, payload: String },
}

/// An input or selection event arrived while a reflow was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a reflow is already in progress")]
pub struct Busy;

/// Problems reading key binding overrides.
#[derive(Debug, Error)]
pub enum KeymapError {
    #[error("invalid key chord {0:?}")]
    InvalidChord(String),
    #[error("keymap file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read keymap {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load and save failures from a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}: {detail}")]
    Status {
        url: String,
        status: u16,
        detail: String,
    },
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("path escapes the vault: {0}")]
    InvalidPath(String),
    #[error("unsupported document type: {0}")]
    UnsupportedFileType(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Short label for status lines.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Transport { .. } | Self::Status { .. } | Self::Decode { .. } => "network",
            Self::NotFound(_) => "not found",
            Self::InvalidPath(_) | Self::UnsupportedFileType(_) => "rejected",
            Self::Io { .. } => "disk",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_messages_name_offsets() {
        let err = ParseError::NestingTooDeep {
            depth: 49,
            limit: 48,
            offset: 12,
        };
        assert_eq!(
            err.to_string(),
            "block nesting depth 49 exceeds the limit of 48 at byte 12"
        );
    }

    #[test]
    fn test_store_error_labels() {
        assert_eq!(StoreError::NotFound("a.md".into()).label(), "not found");
        assert_eq!(StoreError::InvalidPath("../x".into()).label(), "rejected");
        let status = StoreError::Status {
            url: "http://localhost/api".into(),
            status: 500,
            detail: "boom".into(),
        };
        assert_eq!(status.label(), "network");
        assert!(status.to_string().contains("500"));
    }
}
