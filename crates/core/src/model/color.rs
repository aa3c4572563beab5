//! PDF color space definitions.
//!
//! The operand count of every color-setting operator is derived from the
//! selected color space, and that table lives here and nowhere else.

use super::state::Color;
use crate::error::PdfError;
use rustc_hash::FxHashMap;
use smallvec::smallvec;
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// A PDF color space, with the parameters that change how colors in it
/// are written in a content stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    CalGray,
    CalRgb,
    Lab,
    /// ICC profile based space with `N` components.
    IccBased { components: u8 },
    /// Palette lookup into `base`, indices `0..=hival`.
    Indexed { base: Box<ColorSpace>, hival: u8 },
    /// Single colorant tint.
    Separation { colorant: SmolStr },
    /// One tint per colorant.
    DeviceN { colorants: Vec<SmolStr> },
    /// Tiling or shading patterns. Uncolored tiling patterns carry the
    /// space their color is given in.
    Pattern { underlying: Option<Box<ColorSpace>> },
    /// A color space name that could not be resolved.
    Unsupported(SmolStr),
}

impl ColorSpace {
    /// Look up a color space that can be selected by name alone.
    pub fn from_name(name: &str) -> Option<Self> {
        PREDEFINED_COLORSPACE.get(name).cloned()
    }

    /// PDF family name (e.g. `DeviceRGB`).
    pub fn name(&self) -> &str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRgb => "DeviceRGB",
            Self::DeviceCmyk => "DeviceCMYK",
            Self::CalGray => "CalGray",
            Self::CalRgb => "CalRGB",
            Self::Lab => "Lab",
            Self::IccBased { .. } => "ICCBased",
            Self::Indexed { .. } => "Indexed",
            Self::Separation { .. } => "Separation",
            Self::DeviceN { .. } => "DeviceN",
            Self::Pattern { .. } => "Pattern",
            Self::Unsupported(name) => name.as_str(),
        }
    }

    /// Number of numeric components a color in this space has.
    ///
    /// For a pattern space this is the component count of the underlying
    /// space (zero for colored patterns).
    pub fn component_count(&self) -> usize {
        match self {
            Self::DeviceGray | Self::CalGray => 1,
            Self::DeviceRgb | Self::CalRgb | Self::Lab => 3,
            Self::DeviceCmyk => 4,
            Self::IccBased { components } => usize::from(*components),
            Self::Indexed { .. } | Self::Separation { .. } => 1,
            Self::DeviceN { colorants } => colorants.len(),
            Self::Pattern { underlying } => {
                underlying.as_ref().map_or(0, |space| space.component_count())
            }
            Self::Unsupported(_) => 0,
        }
    }

    /// Number of operands `SC`/`sc`/`SCN`/`scn` consume in this space.
    ///
    /// Pattern spaces take the pattern name as their last operand, preceded
    /// by the underlying components for uncolored patterns. Unsupported
    /// spaces consume nothing.
    pub fn operand_count(&self) -> usize {
        if !self.is_supported() {
            return 0;
        }
        match self {
            Self::Pattern { .. } => self.component_count() + 1,
            _ => self.component_count(),
        }
    }

    /// Whether colors in this space can be resolved at all.
    pub fn is_supported(&self) -> bool {
        match self {
            Self::Unsupported(_) => false,
            Self::IccBased { components } => *components > 0,
            Self::DeviceN { colorants } => !colorants.is_empty(),
            Self::Indexed { base, .. } => {
                base.is_supported()
                    && !matches!(**base, Self::Pattern { .. } | Self::Indexed { .. })
            }
            Self::Pattern {
                underlying: Some(space),
            } => space.is_supported() && !matches!(**space, Self::Pattern { .. }),
            _ => true,
        }
    }

    /// Spaces that only `SCN`/`scn` may set colors in.
    pub const fn requires_extended_operator(&self) -> bool {
        matches!(
            self,
            Self::IccBased { .. }
                | Self::Separation { .. }
                | Self::DeviceN { .. }
                | Self::Pattern { .. }
        )
    }

    /// The color installed when this space is selected with `CS`/`cs`.
    ///
    /// Pattern and unsupported spaces have no initial color.
    pub fn initial_color(&self) -> Option<Color> {
        if !self.is_supported() {
            return None;
        }
        match self {
            Self::DeviceCmyk => Some(Color::Cmyk(0.0, 0.0, 0.0, 1.0)),
            Self::Indexed { .. } => Some(Color::Indexed(0)),
            Self::Separation { .. } => Some(Color::Components(smallvec![1.0])),
            Self::DeviceN { colorants } => {
                Some(Color::Components(colorants.iter().map(|_| 1.0).collect()))
            }
            Self::Pattern { .. } | Self::Unsupported(_) => None,
            _ => {
                let zeros = vec![0.0; self.component_count()];
                Color::from_components(self, &zeros)
            }
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IccBased { components } => write!(f, "ICCBased({components})"),
            Self::Indexed { base, hival } => write!(f, "Indexed({base}, {hival})"),
            Self::Separation { colorant } => write!(f, "Separation({colorant})"),
            Self::DeviceN { colorants } => write!(f, "DeviceN({})", colorants.join(", ")),
            Self::Pattern {
                underlying: Some(space),
            } => write!(f, "Pattern({space})"),
            Self::Unsupported(name) => write!(f, "Unsupported({name})"),
            _ => f.write_str(self.name()),
        }
    }
}

/// Parses the compact notation used on the command line:
///
/// `DeviceGray`, `DeviceRGB`, `DeviceCMYK`, `CalGray`, `CalRGB`, `Lab`,
/// `Pattern`, `ICCBased:N`, `Separation:COLORANT`, `DeviceN:C1,C2,...`,
/// `Indexed:BASE:HIVAL` and `Pattern:BASE`.
impl FromStr for ColorSpace {
    type Err = PdfError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let syntax = |msg: &str| PdfError::SyntaxError(format!("color space {spec:?}: {msg}"));

        let Some((family, params)) = spec.split_once(':') else {
            return Self::from_name(spec).ok_or_else(|| syntax("unknown color space"));
        };

        let space = match family {
            "ICCBased" => {
                let components: u8 = params
                    .parse()
                    .map_err(|_| syntax("component count must be a small integer"))?;
                if components == 0 {
                    return Err(syntax("component count must be positive"));
                }
                Self::IccBased { components }
            }
            "Separation" if !params.is_empty() => Self::Separation {
                colorant: SmolStr::new(params),
            },
            "DeviceN" => {
                let colorants: Vec<SmolStr> = params.split(',').map(SmolStr::new).collect();
                if colorants.iter().any(|c| c.is_empty()) {
                    return Err(syntax("empty colorant name"));
                }
                Self::DeviceN { colorants }
            }
            "Indexed" => {
                let (base, hival) = params
                    .rsplit_once(':')
                    .ok_or_else(|| syntax("expected Indexed:BASE:HIVAL"))?;
                let hival: u8 = hival
                    .parse()
                    .map_err(|_| syntax("hival must be in 0..=255"))?;
                Self::Indexed {
                    base: Box::new(base.parse()?),
                    hival,
                }
            }
            "Pattern" => Self::Pattern {
                underlying: Some(Box::new(params.parse()?)),
            },
            _ => return Err(syntax("unexpected parameters")),
        };

        if space.is_supported() {
            Ok(space)
        } else {
            Err(syntax("not a usable color space"))
        }
    }
}

/// Color spaces that can be selected by name without a resource lookup.
pub static PREDEFINED_COLORSPACE: LazyLock<FxHashMap<&'static str, ColorSpace>> =
    LazyLock::new(|| {
        let entries = [
            ("DeviceGray", ColorSpace::DeviceGray),
            ("DeviceRGB", ColorSpace::DeviceRgb),
            ("DeviceCMYK", ColorSpace::DeviceCmyk),
            ("CalGray", ColorSpace::CalGray),
            ("CalRGB", ColorSpace::CalRgb),
            ("Lab", ColorSpace::Lab),
            ("Pattern", ColorSpace::Pattern { underlying: None }),
        ];

        let mut map = FxHashMap::default();
        map.reserve(entries.len());
        for (name, space) in entries {
            map.insert(name, space);
        }
        map
    });
