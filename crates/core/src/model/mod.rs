//! Content stream model types - operands, color spaces, colors and state.
//!
//! This module contains the core data model types:
//! - `objects` - Decoded content stream operands (Operand)
//! - `color` - Color space definitions and the operand-count table (ColorSpace)
//! - `state` - Colors and the rendering context (Color, GraphicState, RenderContext)
//! - `resources` - Named color spaces of a page (ResourceDictionary)

pub mod color;
pub mod objects;
pub mod resources;
pub mod state;

// Re-export main types for convenience
pub use color::{ColorSpace, PREDEFINED_COLORSPACE};
pub use objects::Operand;
pub use resources::ResourceDictionary;
pub use state::{CancellationToken, Color, ColorTarget, GraphicState, RenderContext};
