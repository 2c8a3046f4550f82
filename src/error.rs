//! Error taxonomy. See `spec.md` §7 for the decode/schema/runtime split.

use thiserror::Error;

/// Errors raised while turning raw bytes into a [`crate::document::Document`].
///
/// These never appear in a validator [`crate::validate::Diagnostic`] list —
/// a document that fails to decode never reaches the validator at all.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed colour: {0}")]
    BadColor(String),
}

/// Errors raised by the interpreter while rendering an already-resolved
/// op list. The interpreter fails fast: a `RenderError` means the frame
/// is discarded wholesale, never partially committed.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum RenderError {
    #[error("unknown op: '{0}'")]
    UnknownOp(String),
    #[error("'{op}' refers to missing layer '{layer}'")]
    MissingLayer { op: &'static str, layer: String },
    #[error("shade_band side unsupported: '{0}'")]
    UnsupportedShadeSide(String),
}
