//! Graphics state operators.
//!
//! Handles: q, Q
//!
//! Only the color part of the graphics state is tracked, so saving and
//! restoring covers both color spaces and both colors.

use crate::document::page::Page;
use crate::error::Result;
use crate::interp::operator::{Operator, Outcome};
use crate::model::objects::Operand;
use crate::model::state::RenderContext;
use tracing::debug;

/// Saves the current graphics state to the stack.
///
/// PDF operator: `q`
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveState;

impl Operator for SaveState {
    fn name(&self) -> &'static str {
        "q"
    }

    fn operand_count(&self, _ctx: &RenderContext) -> Result<usize> {
        Ok(0)
    }

    fn apply(
        &self,
        _operands: &[Operand],
        _page: &Page,
        ctx: &mut RenderContext,
    ) -> Result<Outcome> {
        ctx.save();
        Ok(Outcome::Saved)
    }
}

/// Restores the graphics state from the stack.
///
/// PDF operator: `Q`
///
/// An unbalanced `Q` is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreState;

impl Operator for RestoreState {
    fn name(&self) -> &'static str {
        "Q"
    }

    fn operand_count(&self, _ctx: &RenderContext) -> Result<usize> {
        Ok(0)
    }

    fn apply(
        &self,
        _operands: &[Operand],
        _page: &Page,
        ctx: &mut RenderContext,
    ) -> Result<Outcome> {
        let restored = ctx.restore();
        if !restored {
            debug!("Q without matching q ignored");
        }
        Ok(Outcome::Restored(restored))
    }
}
