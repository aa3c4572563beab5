//! A page handed to the interpreter: its decoded content streams and the
//! resources its operators resolve names against.

use crate::model::resources::ResourceDictionary;

/// A page whose content streams are interpreted in one pass.
#[derive(Debug, Clone)]
pub struct Page {
    /// Page object ID
    pub pageid: u32,
    /// Media box (physical page size)
    pub mediabox: Option<[f64; 4]>,
    /// Page resources
    pub resources: ResourceDictionary,
    /// Page content streams (decoded data), interpreted in order
    pub contents: Vec<Vec<u8>>,
}

impl Page {
    /// Create a page with a single content stream.
    pub fn new(pageid: u32, content: impl Into<Vec<u8>>) -> Self {
        Self::with_contents(pageid, vec![content.into()])
    }

    /// Create a page from several content streams.
    pub fn with_contents(pageid: u32, contents: Vec<Vec<u8>>) -> Self {
        Self {
            pageid,
            mediabox: None,
            resources: ResourceDictionary::new(),
            contents,
        }
    }

    /// Attach the page resources.
    pub fn with_resources(mut self, resources: ResourceDictionary) -> Self {
        self.resources = resources;
        self
    }

    /// Set the media box reported to the device at the start of the page.
    pub fn with_mediabox(mut self, mediabox: [f64; 4]) -> Self {
        self.mediabox = Some(mediabox);
        self
    }

    /// The media box, or US Letter when the page has none.
    pub fn mediabox_or_default(&self) -> [f64; 4] {
        self.mediabox.unwrap_or([0.0, 0.0, 612.0, 792.0])
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::with_contents(0, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_mediabox() {
        let page = Page::new(1, b"q Q".to_vec()).with_mediabox([0.0, 0.0, 100.0, 100.0]);
        assert_eq!(page.mediabox_or_default(), [0.0, 0.0, 100.0, 100.0]);
    }

    #[test]
    fn test_default_mediabox() {
        let page = Page::default();
        assert_eq!(page.mediabox_or_default(), [0.0, 0.0, 612.0, 792.0]);
        assert!(page.contents.is_empty());
    }
}
