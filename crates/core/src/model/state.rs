//! Color values and the rendering context operators mutate.
//!
//! One `RenderContext` belongs to exactly one pass over a page's content
//! streams. Operators receive it by `&mut` and never keep it.

use super::color::ColorSpace;
use super::resources::ResourceDictionary;
use crate::error::{PdfError, Result};
use smallvec::SmallVec;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Color value stored in the graphics state.
///
/// Numeric components use the 0.0..=1.0 convention of the PDF operands
/// they were built from. No operator rescales them.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Greyscale color (0.0 = black, 1.0 = white)
    Gray(f64),
    /// RGB color
    Rgb(f64, f64, f64),
    /// CMYK color
    Cmyk(f64, f64, f64, f64),
    /// CIE L*a*b* color
    Lab(f64, f64, f64),
    /// Index into an Indexed color space palette
    Indexed(u32),
    /// Raw tints or ICC components that have no device equivalent
    Components(SmallVec<[f64; 4]>),
    /// Pattern fill. `base` is the color of an uncolored tiling pattern.
    Pattern {
        name: SmolStr,
        base: Option<Box<Color>>,
    },
}

impl Default for Color {
    fn default() -> Self {
        Self::Gray(0.0)
    }
}

impl Color {
    /// Build a color from numeric components in `space`.
    ///
    /// Returns `None` when the component count does not match the space or
    /// the space has no plain numeric colors (patterns, unsupported spaces).
    /// ICCBased colors with 1, 3 or 4 components map onto Gray, RGB and
    /// CMYK. Indexed values are rounded and clamped to the palette.
    pub fn from_components(space: &ColorSpace, values: &[f64]) -> Option<Self> {
        if !space.is_supported() || values.len() != space.component_count() {
            return None;
        }
        let color = match space {
            ColorSpace::DeviceGray | ColorSpace::CalGray => Self::Gray(values[0]),
            ColorSpace::DeviceRgb | ColorSpace::CalRgb => {
                Self::Rgb(values[0], values[1], values[2])
            }
            ColorSpace::DeviceCmyk => Self::Cmyk(values[0], values[1], values[2], values[3]),
            ColorSpace::Lab => Self::Lab(values[0], values[1], values[2]),
            ColorSpace::IccBased { components } => match components {
                1 => Self::Gray(values[0]),
                3 => Self::Rgb(values[0], values[1], values[2]),
                4 => Self::Cmyk(values[0], values[1], values[2], values[3]),
                _ => Self::Components(SmallVec::from_slice(values)),
            },
            ColorSpace::Indexed { hival, .. } => {
                let index = values[0].round().clamp(0.0, f64::from(*hival));
                Self::Indexed(index as u32)
            }
            ColorSpace::Separation { .. } | ColorSpace::DeviceN { .. } => {
                Self::Components(SmallVec::from_slice(values))
            }
            ColorSpace::Pattern { .. } | ColorSpace::Unsupported(_) => return None,
        };
        Some(color)
    }

    /// Numeric components of this color.
    ///
    /// Colored patterns have none; uncolored patterns report their base.
    pub fn components(&self) -> SmallVec<[f64; 4]> {
        match self {
            Self::Gray(g) => SmallVec::from_slice(&[*g]),
            Self::Rgb(r, g, b) => SmallVec::from_slice(&[*r, *g, *b]),
            Self::Cmyk(c, m, y, k) => SmallVec::from_slice(&[*c, *m, *y, *k]),
            Self::Lab(l, a, b) => SmallVec::from_slice(&[*l, *a, *b]),
            Self::Indexed(i) => SmallVec::from_slice(&[f64::from(*i)]),
            Self::Components(values) => values.clone(),
            Self::Pattern { base, .. } => base
                .as_ref()
                .map_or_else(SmallVec::new, |color| color.components()),
        }
    }

    /// Get the pattern name if this is a pattern color.
    pub fn pattern_name(&self) -> Option<&str> {
        match self {
            Self::Pattern { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Check if this color is a pattern color.
    pub const fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern { .. })
    }

    /// Approximate device RGB for painting consumers.
    ///
    /// Only device-like values convert; CIE, indexed, tint and pattern
    /// colors need resources this crate does not resolve.
    pub fn to_rgb(&self) -> Option<(f64, f64, f64)> {
        match self {
            Self::Gray(g) => Some((*g, *g, *g)),
            Self::Rgb(r, g, b) => Some((*r, *g, *b)),
            Self::Cmyk(c, m, y, k) => Some((
                (1.0 - c) * (1.0 - k),
                (1.0 - m) * (1.0 - k),
                (1.0 - y) * (1.0 - k),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gray(g) => write!(f, "Gray({g})"),
            Self::Rgb(r, g, b) => write!(f, "RGB({r}, {g}, {b})"),
            Self::Cmyk(c, m, y, k) => write!(f, "CMYK({c}, {m}, {y}, {k})"),
            Self::Lab(l, a, b) => write!(f, "Lab({l}, {a}, {b})"),
            Self::Indexed(i) => write!(f, "Indexed({i})"),
            Self::Components(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "Components({})", parts.join(", "))
            }
            Self::Pattern { name, base: None } => write!(f, "Pattern(/{name})"),
            Self::Pattern {
                name,
                base: Some(base),
            } => write!(f, "Pattern(/{name}, {base})"),
        }
    }
}

/// Which half of the graphics state an operator works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTarget {
    /// Path outlines (`SC`, `SCN`, `CS`, `G`, `RG`, `K`)
    Stroke,
    /// Fills and text (`sc`, `scn`, `cs`, `g`, `rg`, `k`)
    NonStroke,
}

impl ColorTarget {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stroke => "stroke",
            Self::NonStroke => "non-stroke",
        }
    }
}

impl fmt::Display for ColorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color part of the PDF graphics state.
///
/// Every field starts unset; see [`GraphicState::device_defaults`] for the
/// initial state a PDF viewer assumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphicState {
    /// Stroking color space
    pub stroke_color_space: Option<ColorSpace>,
    /// Non-stroking color space
    pub non_stroke_color_space: Option<ColorSpace>,
    /// Stroking color
    pub stroke_color: Option<Color>,
    /// Non-stroking (fill) color
    pub non_stroke_color: Option<Color>,
}

impl GraphicState {
    /// Create a graphics state with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// DeviceGray and black for both families.
    pub fn device_defaults() -> Self {
        Self {
            stroke_color_space: Some(ColorSpace::DeviceGray),
            non_stroke_color_space: Some(ColorSpace::DeviceGray),
            stroke_color: Some(Color::Gray(0.0)),
            non_stroke_color: Some(Color::Gray(0.0)),
        }
    }

    pub const fn color_space(&self, target: ColorTarget) -> Option<&ColorSpace> {
        match target {
            ColorTarget::Stroke => self.stroke_color_space.as_ref(),
            ColorTarget::NonStroke => self.non_stroke_color_space.as_ref(),
        }
    }

    pub const fn color(&self, target: ColorTarget) -> Option<&Color> {
        match target {
            ColorTarget::Stroke => self.stroke_color.as_ref(),
            ColorTarget::NonStroke => self.non_stroke_color.as_ref(),
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a pass.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// State of one content stream pass: colors, the q/Q stack and the
/// resources names are resolved against.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    graphicstate: GraphicState,
    gstack: Vec<GraphicState>,
    resources: ResourceDictionary,
    cancel: Option<CancellationToken>,
}

impl RenderContext {
    /// Create a context with no color space selected for either family.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context in the PDF initial graphics state.
    pub fn with_device_defaults() -> Self {
        Self {
            graphicstate: GraphicState::device_defaults(),
            ..Self::default()
        }
    }

    /// Replace the graphics state and drop any saved states.
    pub fn reset(&mut self, state: GraphicState) {
        self.graphicstate = state;
        self.gstack.clear();
    }

    pub const fn graphicstate(&self) -> &GraphicState {
        &self.graphicstate
    }

    pub const fn stroke_color_space(&self) -> Option<&ColorSpace> {
        self.graphicstate.stroke_color_space.as_ref()
    }

    pub fn set_stroke_color_space(&mut self, space: ColorSpace) {
        self.graphicstate.stroke_color_space = Some(space);
    }

    pub const fn non_stroke_color_space(&self) -> Option<&ColorSpace> {
        self.graphicstate.non_stroke_color_space.as_ref()
    }

    pub fn set_non_stroke_color_space(&mut self, space: ColorSpace) {
        self.graphicstate.non_stroke_color_space = Some(space);
    }

    pub const fn stroke_color(&self) -> Option<&Color> {
        self.graphicstate.stroke_color.as_ref()
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.graphicstate.stroke_color = Some(color);
    }

    pub const fn non_stroke_color(&self) -> Option<&Color> {
        self.graphicstate.non_stroke_color.as_ref()
    }

    pub fn set_non_stroke_color(&mut self, color: Color) {
        self.graphicstate.non_stroke_color = Some(color);
    }

    pub const fn color_space(&self, target: ColorTarget) -> Option<&ColorSpace> {
        self.graphicstate.color_space(target)
    }

    pub fn set_color_space(&mut self, target: ColorTarget, space: ColorSpace) {
        match target {
            ColorTarget::Stroke => self.set_stroke_color_space(space),
            ColorTarget::NonStroke => self.set_non_stroke_color_space(space),
        }
    }

    pub const fn color(&self, target: ColorTarget) -> Option<&Color> {
        self.graphicstate.color(target)
    }

    /// Store `color` for `target`; `None` clears it (e.g. after selecting
    /// a pattern space, which has no initial color).
    pub fn set_color(&mut self, target: ColorTarget, color: Option<Color>) {
        match target {
            ColorTarget::Stroke => self.graphicstate.stroke_color = color,
            ColorTarget::NonStroke => self.graphicstate.non_stroke_color = color,
        }
    }

    /// Push a copy of the current graphics state (`q`).
    pub fn save(&mut self) {
        self.gstack.push(self.graphicstate.clone());
    }

    /// Pop the most recently saved graphics state (`Q`).
    ///
    /// Returns false when nothing was saved; the state is left as is.
    pub fn restore(&mut self) -> bool {
        match self.gstack.pop() {
            Some(state) => {
                self.graphicstate = state;
                true
            }
            None => false,
        }
    }

    pub fn stack_depth(&self) -> usize {
        self.gstack.len()
    }

    pub const fn resources(&self) -> &ResourceDictionary {
        &self.resources
    }

    pub fn set_resources(&mut self, resources: ResourceDictionary) {
        self.resources = resources;
    }

    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancel = Some(token);
    }

    /// Fail with [`PdfError::Cancelled`] once the token has been cancelled.
    pub fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(PdfError::Cancelled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_components_device() {
        assert_eq!(
            Color::from_components(&ColorSpace::DeviceRgb, &[0.2, 0.4, 0.6]),
            Some(Color::Rgb(0.2, 0.4, 0.6))
        );
        assert_eq!(
            Color::from_components(&ColorSpace::CalGray, &[0.5]),
            Some(Color::Gray(0.5))
        );
        assert_eq!(Color::from_components(&ColorSpace::DeviceRgb, &[0.2]), None);
    }

    #[test]
    fn test_from_components_icc_and_tints() {
        let icc = ColorSpace::IccBased { components: 4 };
        assert_eq!(
            Color::from_components(&icc, &[0.1, 0.2, 0.3, 0.4]),
            Some(Color::Cmyk(0.1, 0.2, 0.3, 0.4))
        );

        let icc2 = ColorSpace::IccBased { components: 2 };
        assert_eq!(
            Color::from_components(&icc2, &[0.1, 0.9]),
            Some(Color::Components(SmallVec::from_slice(&[0.1, 0.9])))
        );

        let sep = ColorSpace::Separation {
            colorant: SmolStr::new("Gold"),
        };
        assert_eq!(
            Color::from_components(&sep, &[0.7]),
            Some(Color::Components(SmallVec::from_slice(&[0.7])))
        );
    }

    #[test]
    fn test_indexed_rounds_and_clamps() {
        let space = ColorSpace::Indexed {
            base: Box::new(ColorSpace::DeviceRgb),
            hival: 15,
        };
        assert_eq!(
            Color::from_components(&space, &[3.4]),
            Some(Color::Indexed(3))
        );
        assert_eq!(
            Color::from_components(&space, &[40.0]),
            Some(Color::Indexed(15))
        );
        assert_eq!(
            Color::from_components(&space, &[-2.0]),
            Some(Color::Indexed(0))
        );
    }

    #[test]
    fn test_pattern_components() {
        let colored = Color::Pattern {
            name: SmolStr::new("P0"),
            base: None,
        };
        assert!(colored.components().is_empty());
        assert_eq!(colored.pattern_name(), Some("P0"));

        let uncolored = Color::Pattern {
            name: SmolStr::new("P1"),
            base: Some(Box::new(Color::Gray(0.3))),
        };
        assert_eq!(uncolored.components().as_slice(), &[0.3]);
        assert!(uncolored.is_pattern());
    }

    #[test]
    fn test_to_rgb() {
        assert_eq!(Color::Gray(0.5).to_rgb(), Some((0.5, 0.5, 0.5)));
        assert_eq!(
            Color::Cmyk(0.0, 0.0, 0.0, 1.0).to_rgb(),
            Some((0.0, 0.0, 0.0))
        );
        assert_eq!(Color::Indexed(2).to_rgb(), None);
    }

    #[test]
    fn test_context_starts_unset() {
        let ctx = RenderContext::new();
        assert!(ctx.stroke_color_space().is_none());
        assert!(ctx.non_stroke_color_space().is_none());
        assert!(ctx.stroke_color().is_none());
        assert!(ctx.non_stroke_color().is_none());

        let ctx = RenderContext::with_device_defaults();
        assert_eq!(ctx.stroke_color_space(), Some(&ColorSpace::DeviceGray));
        assert_eq!(ctx.non_stroke_color(), Some(&Color::Gray(0.0)));
    }

    #[test]
    fn test_save_restore() {
        let mut ctx = RenderContext::with_device_defaults();
        ctx.save();
        ctx.set_stroke_color(Color::Rgb(1.0, 0.0, 0.0));
        assert_eq!(ctx.stack_depth(), 1);
        assert!(ctx.restore());
        assert_eq!(ctx.stroke_color(), Some(&Color::Gray(0.0)));
        assert!(!ctx.restore());
    }

    #[test]
    fn test_cancellation() {
        let mut ctx = RenderContext::new();
        assert!(ctx.check_cancelled().is_ok());

        let token = CancellationToken::new();
        ctx.set_cancellation_token(token.clone());
        token.cancel();
        assert!(matches!(ctx.check_cancelled(), Err(PdfError::Cancelled)));
    }
}
