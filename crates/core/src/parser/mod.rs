//! Content stream tokenizing.
//!
//! - `lexer`: byte-level tokenizer and the operand/operator assembler
//!   the interpreter consumes

pub mod lexer;

// Re-export main types for convenience
pub use lexer::{ContentLexer, ContentParser, ContentToken, LexToken};
