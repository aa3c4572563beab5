//! High-level API module for content stream color interpretation.
//!
//! # Example
//!
//! ```ignore
//! use tincture_core::api::{trace_colors, InterpretOptions};
//! use tincture_core::document::Page;
//!
//! let page = Page::new(1, std::fs::read("page-1.content")?);
//! let trace = trace_colors(&page, Some(InterpretOptions::default()))?;
//! ```

pub mod high_level;

// Re-export for convenience
pub use crate::interp::interpreter::InterpretOptions;
pub use high_level::{
    ColorTrace, Interpretation, interpret_content, interpret_page, trace_colors, trace_pages,
};
