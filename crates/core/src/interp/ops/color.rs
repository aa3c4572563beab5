//! Color operators.
//!
//! Handles: SC, sc, SCN, scn, CS, cs, G, g, RG, rg, K, k
//!
//! - SC/sc: Set color in the current Device, CIE-based or Indexed space
//! - SCN/scn: Same, plus ICCBased, Separation, DeviceN and Pattern spaces
//! - CS/cs: Select a color space and install its initial color
//! - G/g, RG/rg, K/k: Select a Device space and set the color in one step
//!
//! Uppercase operators act on the stroking color, lowercase ones on the
//! non-stroking color.

use crate::document::page::Page;
use crate::error::{PdfError, Result};
use crate::interp::operator::{Operator, Outcome};
use crate::model::color::ColorSpace;
use crate::model::objects::Operand;
use crate::model::state::{Color, ColorTarget, RenderContext};
use smallvec::SmallVec;
use tracing::warn;

/// Which color spaces a set-color operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFamily {
    /// `SC`/`sc`: Device, CIE-based and Indexed spaces
    Basic,
    /// `SCN`/`scn`: every space, patterns included
    Extended,
}

impl ColorFamily {
    pub const fn accepts(self, space: &ColorSpace) -> bool {
        match self {
            Self::Basic => !space.requires_extended_operator(),
            Self::Extended => true,
        }
    }
}

/// Sets the current color of one target in its active color space.
///
/// PDF operators: `SC`, `sc`, `SCN`, `scn`
///
/// The operand count comes from the active space:
/// - numeric spaces take one number per component
/// - colored patterns take the pattern name
/// - uncolored patterns take the underlying components, then the name
///
/// A space outside the operator's family, or one that could not be
/// resolved, consumes no operands and leaves the state alone.
#[derive(Debug, Clone, Copy)]
pub struct SetColor {
    name: &'static str,
    target: ColorTarget,
    family: ColorFamily,
}

impl SetColor {
    pub const fn new(name: &'static str, target: ColorTarget, family: ColorFamily) -> Self {
        Self {
            name,
            target,
            family,
        }
    }

    fn active_space<'c>(&self, ctx: &'c RenderContext) -> Result<&'c ColorSpace> {
        ctx.color_space(self.target)
            .ok_or(PdfError::ColorSpaceNotSet {
                operator: self.name,
            })
    }

    fn handles(&self, space: &ColorSpace) -> bool {
        space.is_supported() && self.family.accepts(space)
    }

    /// Build the color `operands` describe in `space`.
    ///
    /// Nothing is stored until the whole color is valid.
    fn build_color(&self, space: &ColorSpace, operands: &[Operand]) -> Result<Color> {
        let expected = space.operand_count();
        if operands.len() != expected {
            return Err(PdfError::OperandCountMismatch {
                operator: self.name,
                expected,
                got: operands.len(),
            });
        }

        let ColorSpace::Pattern { underlying } = space else {
            return self.numeric_color(space, operands);
        };

        // Supported pattern spaces always take at least the name.
        let (components, last) = operands.split_at(expected - 1);
        let name = match &last[0] {
            Operand::Name(name) => name.clone(),
            other => {
                return Err(PdfError::TypeMismatch {
                    operator: self.name,
                    index: expected - 1,
                    expected: "name",
                    got: other.type_name(),
                });
            }
        };
        let base = match underlying {
            Some(base_space) => Some(Box::new(self.numeric_color(base_space, components)?)),
            None => None,
        };
        Ok(Color::Pattern { name, base })
    }

    fn numeric_color(&self, space: &ColorSpace, operands: &[Operand]) -> Result<Color> {
        let values = numeric_operands(self.name, operands)?;
        Color::from_components(space, &values).ok_or(PdfError::OperandCountMismatch {
            operator: self.name,
            expected: space.component_count(),
            got: values.len(),
        })
    }
}

impl Operator for SetColor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn operand_count(&self, ctx: &RenderContext) -> Result<usize> {
        let space = self.active_space(ctx)?;
        if self.handles(space) {
            Ok(space.operand_count())
        } else {
            Ok(0)
        }
    }

    fn unsupported_space(&self, ctx: &RenderContext) -> Option<ColorSpace> {
        ctx.color_space(self.target)
            .filter(|space| !self.handles(space))
            .cloned()
    }

    fn apply(
        &self,
        operands: &[Operand],
        _page: &Page,
        ctx: &mut RenderContext,
    ) -> Result<Outcome> {
        let space = self.active_space(ctx)?;
        if !self.handles(space) {
            return Ok(Outcome::Skipped {
                space: space.clone(),
            });
        }
        let color = self.build_color(space, operands)?;
        ctx.set_color(self.target, Some(color));
        Ok(Outcome::ColorSet(self.target))
    }
}

/// Selects the color space of one target.
///
/// PDF operators: `CS`, `cs`
///
/// The operand names either a space that needs no parameters
/// (`DeviceRGB`, `Pattern`, ...) or an entry of the page's `/ColorSpace`
/// resources. The space's initial color replaces the current one.
#[derive(Debug, Clone, Copy)]
pub struct SetColorSpace {
    name: &'static str,
    target: ColorTarget,
}

impl SetColorSpace {
    pub const fn new(name: &'static str, target: ColorTarget) -> Self {
        Self { name, target }
    }
}

impl Operator for SetColorSpace {
    fn name(&self) -> &'static str {
        self.name
    }

    fn operand_count(&self, _ctx: &RenderContext) -> Result<usize> {
        Ok(1)
    }

    fn apply(
        &self,
        operands: &[Operand],
        _page: &Page,
        ctx: &mut RenderContext,
    ) -> Result<Outcome> {
        let [operand] = operands else {
            return Err(PdfError::OperandCountMismatch {
                operator: self.name,
                expected: 1,
                got: operands.len(),
            });
        };
        let name = operand.as_name().map_err(|_| PdfError::TypeMismatch {
            operator: self.name,
            index: 0,
            expected: "name",
            got: operand.type_name(),
        })?;

        let space = ctx.resources().resolve_color_space(name);
        if !space.is_supported() {
            warn!(operator = self.name, space = name, "color space not resolved");
        }
        let initial = space.initial_color();
        ctx.set_color_space(self.target, space);
        ctx.set_color(self.target, initial);
        Ok(Outcome::SpaceSet(self.target))
    }
}

/// Selects a Device color space and sets the color in it.
///
/// PDF operators: `G`/`g` (DeviceGray), `RG`/`rg` (DeviceRGB),
/// `K`/`k` (DeviceCMYK)
#[derive(Debug, Clone)]
pub struct SetDeviceColor {
    name: &'static str,
    target: ColorTarget,
    space: ColorSpace,
}

impl SetDeviceColor {
    pub const fn new(name: &'static str, target: ColorTarget, space: ColorSpace) -> Self {
        Self {
            name,
            target,
            space,
        }
    }
}

impl Operator for SetDeviceColor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn operand_count(&self, _ctx: &RenderContext) -> Result<usize> {
        Ok(self.space.operand_count())
    }

    fn apply(
        &self,
        operands: &[Operand],
        _page: &Page,
        ctx: &mut RenderContext,
    ) -> Result<Outcome> {
        let values = numeric_operands(self.name, operands)?;
        let color = Color::from_components(&self.space, &values).ok_or(
            PdfError::OperandCountMismatch {
                operator: self.name,
                expected: self.space.operand_count(),
                got: values.len(),
            },
        )?;
        ctx.set_color_space(self.target, self.space.clone());
        ctx.set_color(self.target, Some(color));
        Ok(Outcome::SpaceSet(self.target))
    }
}

/// Coerce every operand to a number, naming the first one that is not.
fn numeric_operands(operator: &'static str, operands: &[Operand]) -> Result<SmallVec<[f64; 4]>> {
    operands
        .iter()
        .enumerate()
        .map(|(index, operand)| {
            operand.as_num().map_err(|_| PdfError::TypeMismatch {
                operator,
                index,
                expected: "number",
                got: operand.type_name(),
            })
        })
        .collect()
}
