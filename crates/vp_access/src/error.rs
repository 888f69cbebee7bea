use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use vp_reflect::{ClassNotFound, ConversionError, InvokeError};

// -----------------------------------------------------------------------------
// CompileError

/// A property path that could not be tokenized.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    /// A delimiter that is never closed, or closed by the wrong one.
    #[error("unbalanced `{delimiter}` at offset {offset}")]
    UnbalancedDelimiter { delimiter: char, offset: usize },

    #[error("unterminated literal starting at offset {offset}")]
    UnterminatedLiteral { offset: usize },

    #[error("unterminated comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },

    #[error("invalid name at offset {offset}")]
    InvalidName { offset: usize },

    #[error("unexpected character `{found}` at offset {offset}")]
    UnexpectedCharacter { found: char, offset: usize },
}

impl CompileError {
    /// Position in the path.
    pub fn offset(&self) -> usize {
        match *self {
            Self::UnbalancedDelimiter { offset, .. }
            | Self::UnterminatedLiteral { offset }
            | Self::UnterminatedComment { offset }
            | Self::InvalidName { offset }
            | Self::UnexpectedCharacter { offset, .. } => offset,
        }
    }

    /// Moves the offset of an error found in a sub-text starting at `base`.
    pub(crate) fn shifted(mut self, base: usize) -> Self {
        match &mut self {
            Self::UnbalancedDelimiter { offset, .. }
            | Self::UnterminatedLiteral { offset }
            | Self::UnterminatedComment { offset }
            | Self::InvalidName { offset }
            | Self::UnexpectedCharacter { offset, .. } => *offset += base,
        }
        self
    }
}

// -----------------------------------------------------------------------------
// ErrorKind

/// The kind of [`AccessError`], along with some kind-specific information.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// No property rule matched the segment.
    #[error("could not access property `{name}` on `{receiver}`")]
    PropertyAccess { name: Arc<str>, receiver: String },

    /// No overload scored above zero.
    #[error("unable to resolve method `{name}{args}` on `{receiver}`")]
    MemberResolution {
        receiver: String,
        name: Arc<str>,
        args: String,
    },

    /// The compiling backend declined to specialize the path.
    #[error("cannot compile: {0}")]
    OptimizationNotSupported(&'static str),

    #[error(transparent)]
    ClassNotFound(#[from] ClassNotFound),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A member was reached through `null` without null-safe navigation.
    #[error("null receiver for `{name}`")]
    NullReceiver { name: Arc<str> },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
}

impl ErrorKind {
    /// Attaches the path and the offending offset.
    #[inline]
    pub fn at(self, path: &Arc<str>, offset: usize) -> AccessError {
        AccessError {
            kind: self,
            path: path.clone(),
            offset,
        }
    }
}

// -----------------------------------------------------------------------------
// AccessError

/// An error raised while building or evaluating an accessor.
///
/// Carries the full path text and the offset of the segment that failed,
/// so callers never need to re-walk the expression for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessError {
    kind: ErrorKind,
    path: Arc<str>,
    offset: usize,
}

impl AccessError {
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    #[inline]
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// The full path text.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Position of the failing segment in [`path`](Self::path).
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rebases an error of a nested operand onto the enclosing path.
    ///
    /// `base` is the byte offset at which the operand text starts.
    pub(crate) fn within(self, path: &Arc<str>, base: usize) -> Self {
        if Arc::ptr_eq(&self.path, path) {
            return self;
        }
        Self {
            kind: self.kind,
            path: path.clone(),
            offset: base + self.offset,
        }
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Encountered an error at offset {} while accessing `{}`: {}",
            self.offset, self.path, self.kind,
        )
    }
}

impl std::error::Error for AccessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{CompileError, ErrorKind};

    #[test]
    fn display_names_path_and_offset() {
        let path: Arc<str> = Arc::from("a.b(c");
        let err = ErrorKind::from(CompileError::UnbalancedDelimiter { delimiter: '(', offset: 3 }).at(&path, 3);
        assert_eq!(
            err.to_string(),
            "Encountered an error at offset 3 while accessing `a.b(c`: unbalanced `(` at offset 3",
        );
    }

    #[test]
    fn nested_errors_are_rebased() {
        let outer: Arc<str> = Arc::from("a.b(c.d)");
        let inner: Arc<str> = Arc::from("c.d");
        let err = ErrorKind::NullReceiver { name: Arc::from("d") }.at(&inner, 2);
        let err = err.within(&outer, 4);
        assert_eq!(err.path(), "a.b(c.d)");
        assert_eq!(err.offset(), 6);
    }
}
