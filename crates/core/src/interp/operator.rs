//! Operator capability and the name -> handler registry.
//!
//! An operator is stateless. Everything it reads or writes lives in the
//! [`RenderContext`] handed to it, so one registry can serve any number of
//! passes, including concurrent ones on different pages.

use super::ops::color::{ColorFamily, SetColor, SetColorSpace, SetDeviceColor};
use super::ops::graphics_state::{RestoreState, SaveState};
use crate::document::page::Page;
use crate::error::Result;
use crate::model::color::ColorSpace;
use crate::model::objects::Operand;
use crate::model::state::{ColorTarget, RenderContext};
use rustc_hash::FxHashMap;

/// What a successful [`Operator::apply`] changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The color of `target` was replaced.
    ColorSet(ColorTarget),
    /// The color space of `target` was replaced, together with its color.
    SpaceSet(ColorTarget),
    /// The graphics state was pushed (`q`).
    Saved,
    /// The graphics state was popped (`Q`). `false` when nothing was saved.
    Restored(bool),
    /// Nothing changed because the active space cannot be handled by this
    /// operator.
    Skipped { space: ColorSpace },
}

/// A content stream operator.
pub trait Operator: Send + Sync {
    /// Case-sensitive keyword, e.g. `scn`.
    fn name(&self) -> &'static str;

    /// Number of operands this operator consumes in the current state.
    ///
    /// Reads the context only; never mutates it.
    fn operand_count(&self, ctx: &RenderContext) -> Result<usize>;

    /// The active color space, when this operator cannot set colors in it.
    ///
    /// Such an operator changes nothing; whatever operands precede it are
    /// dropped.
    fn unsupported_space(&self, _ctx: &RenderContext) -> Option<ColorSpace> {
        None
    }

    /// Apply the operator to exactly `operand_count(ctx)` operands.
    ///
    /// On error the context is left untouched.
    fn apply(&self, operands: &[Operand], page: &Page, ctx: &mut RenderContext)
    -> Result<Outcome>;
}

/// Maps operator keywords to their handlers.
pub struct OperatorRegistry {
    handlers: FxHashMap<&'static str, Box<dyn Operator>>,
}

impl OperatorRegistry {
    /// Create a registry with no operators.
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
        }
    }

    /// Create a registry with every color operator this crate implements.
    ///
    /// `SC sc SCN scn CS cs G g RG rg K k q Q`
    pub fn standard() -> Self {
        use ColorFamily::{Basic, Extended};
        use ColorTarget::{NonStroke, Stroke};

        let mut registry = Self::new();
        registry.register(SetColor::new("SC", Stroke, Basic));
        registry.register(SetColor::new("sc", NonStroke, Basic));
        registry.register(SetColor::new("SCN", Stroke, Extended));
        registry.register(SetColor::new("scn", NonStroke, Extended));
        registry.register(SetColorSpace::new("CS", Stroke));
        registry.register(SetColorSpace::new("cs", NonStroke));
        registry.register(SetDeviceColor::new("G", Stroke, ColorSpace::DeviceGray));
        registry.register(SetDeviceColor::new("g", NonStroke, ColorSpace::DeviceGray));
        registry.register(SetDeviceColor::new("RG", Stroke, ColorSpace::DeviceRgb));
        registry.register(SetDeviceColor::new("rg", NonStroke, ColorSpace::DeviceRgb));
        registry.register(SetDeviceColor::new("K", Stroke, ColorSpace::DeviceCmyk));
        registry.register(SetDeviceColor::new("k", NonStroke, ColorSpace::DeviceCmyk));
        registry.register(SaveState);
        registry.register(RestoreState);
        registry
    }

    /// Add `operator`, replacing any handler already registered under its
    /// name.
    pub fn register(&mut self, operator: impl Operator + 'static) {
        self.handlers.insert(operator.name(), Box::new(operator));
    }

    /// Look up a handler by exact keyword.
    pub fn get(&self, name: &str) -> Option<&dyn Operator> {
        self.handlers.get(name).map(|op| op.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered keywords, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("operators", &self.names())
            .finish()
    }
}
