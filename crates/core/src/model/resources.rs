//! Page resources used to resolve color space names.

use super::color::ColorSpace;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// The `/ColorSpace` part of a page resource dictionary, already resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDictionary {
    color_spaces: FxHashMap<SmolStr, ColorSpace>,
}

impl ResourceDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`ResourceDictionary::insert_color_space`].
    pub fn with_color_space(mut self, name: &str, space: ColorSpace) -> Self {
        self.insert_color_space(name, space);
        self
    }

    pub fn insert_color_space(&mut self, name: &str, space: ColorSpace) {
        self.color_spaces.insert(SmolStr::new(name), space);
    }

    pub fn color_space(&self, name: &str) -> Option<&ColorSpace> {
        self.color_spaces.get(name)
    }

    pub fn len(&self) -> usize {
        self.color_spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.color_spaces.is_empty()
    }

    /// Resolve the operand of `CS`/`cs`.
    ///
    /// Family names that need no parameters win over resource entries.
    /// Anything else becomes [`ColorSpace::Unsupported`].
    pub fn resolve_color_space(&self, name: &str) -> ColorSpace {
        ColorSpace::from_name(name)
            .or_else(|| self.color_space(name).cloned())
            .unwrap_or_else(|| ColorSpace::Unsupported(SmolStr::new(name)))
    }
}
