//! Error types for the value codecs.

/// Errors raised while decoding or encoding a column value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An interval string matched none of the supported forms.
    #[error("unsupported interval format: {0:?}")]
    Format(String),

    /// An array element could not be parsed.
    ///
    /// Decoding stops at the first bad element; no partial array is returned.
    #[error("invalid {kind} element at index {index}: {raw:?} ({message})")]
    Element {
        /// Wire type of the array being decoded (e.g. `integer[]`).
        kind: &'static str,
        /// Zero-based position of the element.
        index: usize,
        /// The element text as it appeared in the input.
        raw: String,
        /// Why the element was rejected.
        message: String,
    },

    /// A value has no counterpart in the target representation, such as a
    /// PostgreSQL interval with a month component.
    #[error("interval not representable: {0}")]
    Unrepresentable(String),

    /// The raw database value was not valid UTF-8.
    #[error("value is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Structured (JSON) encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    pub(crate) fn element(
        kind: &'static str,
        index: usize,
        raw: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Element {
            kind,
            index,
            raw: raw.into(),
            message: message.into(),
        }
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
