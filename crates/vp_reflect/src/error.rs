use std::sync::Arc;

use thiserror::Error;

use crate::ty::Type;

// -----------------------------------------------------------------------------
// InvokeError

/// A failure raised by a host member while it runs.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum InvokeError {
    #[error("receiver mismatch: expected `{expected}`, found `{actual}`")]
    ReceiverMismatch { expected: &'static str, actual: String },

    #[error("argument {index} is not a `{expected}`")]
    BadArgument { index: usize, expected: &'static str },

    #[error("expected {expected} arguments, found {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("{0}")]
    Failed(String),
}

impl InvokeError {
    /// Shorthand for [`InvokeError::Failed`].
    #[inline]
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

// -----------------------------------------------------------------------------
// ConversionError

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConversionError {
    #[error("cannot convert `{from}` to `{to}`")]
    Unsupported { from: String, to: Type },

    #[error("cannot convert null to primitive `{to}`")]
    NullToPrimitive { to: Type },

    #[error("cannot parse {text:?} as `{to}`")]
    Parse { text: String, to: Type },
}

// -----------------------------------------------------------------------------
// ClassNotFound

/// No registered type matches a class name, even after the system fallback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("class not found: `{0}`")]
pub struct ClassNotFound(pub Arc<str>);
