//! tincture - interpreting the color operators of PDF content streams.
//!
//! Operands are collected from decoded content, and the active stroking or
//! non-stroking color space decides how many of them a color operator
//! takes and how they are read: as numeric components or as a pattern
//! name.

pub mod api;
pub mod document;
pub mod error;
pub mod interp;
pub mod model;
pub mod parser;

pub use api::high_level;

pub use error::{PdfError, Result};
