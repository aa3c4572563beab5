//! Document module - the page handle passed through operators.
//!
//! This module contains:
//! - `page` - decoded content streams and resources of one page (Page)

pub mod page;

// Re-export main types for convenience
pub use page::Page;
