//! Error types for the tincture content stream interpreter.

use thiserror::Error;

/// Primary error type for content stream interpretation.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    /// An operand that must be numeric (or a pattern name) had another type.
    #[error("operator {operator}: operand {index} must be {expected}, got {got}")]
    TypeMismatch {
        operator: &'static str,
        index: usize,
        expected: &'static str,
        got: &'static str,
    },

    /// A color was set before any color space was selected for its family.
    #[error("operator {operator}: no color space selected")]
    ColorSpaceNotSet { operator: &'static str },

    #[error("operator {operator}: unsupported color space {space}")]
    UnsupportedColorSpace {
        operator: &'static str,
        space: String,
    },

    #[error("operator {operator}: expected {expected} operands, got {got}")]
    OperandCountMismatch {
        operator: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("interpretation cancelled")]
    Cancelled,

    #[error("syntax error: {0}")]
    SyntaxError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// Returns true for failures that only affect a single operator.
    ///
    /// Cancellation and I/O errors end the whole pass.
    pub const fn is_operator_local(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Io(_))
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
