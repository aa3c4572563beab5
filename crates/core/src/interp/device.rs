//! Color devices - consumers of the color changes a page interpreter makes.
//!
//! The interpreter reports every change of a color space or color to its
//! device. A painting backend would use it to pick up the current fill and
//! stroke colors; [`ColorTraceDevice`] just records them.

use crate::model::color::ColorSpace;
use crate::model::state::{Color, ColorTarget, GraphicState};
use smol_str::SmolStr;

/// Interface for receiving color state changes.
///
/// Every method has a no-op default.
pub trait ColorDevice {
    /// Begin processing a page.
    fn begin_page(&mut self, _pageid: u32, _mediabox: [f64; 4]) {}

    /// End processing a page.
    fn end_page(&mut self, _pageid: u32) {}

    /// The color space or color of `target` changed.
    ///
    /// `pos` is the byte offset of `operator` in the page content, `state`
    /// the graphics state after the change.
    fn update_color(
        &mut self,
        _pos: usize,
        _operator: &str,
        _target: ColorTarget,
        _state: &GraphicState,
    ) {
    }
}

/// Device that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevice;

impl ColorDevice for NullDevice {}

/// One recorded color change.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorEvent {
    pub pageid: u32,
    /// Byte offset of the operator in the page content
    pub pos: usize,
    pub operator: SmolStr,
    pub target: ColorTarget,
    /// Color space of `target` after the operator
    pub space: Option<ColorSpace>,
    /// Color of `target` after the operator
    pub color: Option<Color>,
}

/// Records a [`ColorEvent`] for every color change, in stream order.
#[derive(Debug, Clone, Default)]
pub struct ColorTraceDevice {
    pageid: u32,
    events: Vec<ColorEvent>,
}

impl ColorTraceDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ColorEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ColorEvent> {
        self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl ColorDevice for ColorTraceDevice {
    fn begin_page(&mut self, pageid: u32, _mediabox: [f64; 4]) {
        self.pageid = pageid;
    }

    fn update_color(
        &mut self,
        pos: usize,
        operator: &str,
        target: ColorTarget,
        state: &GraphicState,
    ) {
        self.events.push(ColorEvent {
            pageid: self.pageid,
            pos,
            operator: SmolStr::new(operator),
            target,
            space: state.color_space(target).cloned(),
            color: state.color(target).cloned(),
        });
    }
}
