//! PDF content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - State stack (q, Q)
//! - `color` - Color space and values (G, g, RG, rg, K, k, CS, cs, SC, SCN, sc, scn)

pub mod color;
pub mod graphics_state;

pub use color::{ColorFamily, SetColor, SetColorSpace, SetDeviceColor};
pub use graphics_state::{RestoreState, SaveState};
