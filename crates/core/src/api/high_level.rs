//! High-level color interpretation API.
//!
//! Provides the main public entry points:
//! - `interpret_content()` - Run one buffer of decoded content, return the final color state
//! - `interpret_page()` - Same for a [`Page`] with resources
//! - `trace_colors()` - Record every color change on a page
//! - `trace_pages()` - Trace several pages with one registry

use crate::document::page::Page;
use crate::error::Result;
use crate::interp::device::{ColorEvent, ColorTraceDevice, NullDevice};
use crate::interp::interpreter::{ExecutionReport, InterpretOptions, PageInterpreter};
use crate::interp::operator::OperatorRegistry;
use crate::model::state::GraphicState;

/// Result of interpreting one page.
#[derive(Debug)]
pub struct Interpretation {
    /// Color state after the last operator
    pub state: GraphicState,
    pub report: ExecutionReport,
}

/// Color changes on one page, in stream order.
#[derive(Debug)]
pub struct ColorTrace {
    pub pageid: u32,
    pub events: Vec<ColorEvent>,
    /// Color state after the last operator
    pub state: GraphicState,
    pub report: ExecutionReport,
}

/// Interpret decoded content and return the final color state.
///
/// # Arguments
/// * `content` - Decoded content stream bytes
/// * `options` - Interpretation options (None for defaults)
///
/// # Example
/// ```
/// use tincture_core::high_level::interpret_content;
/// use tincture_core::model::{Color, ColorSpace};
///
/// let result = interpret_content(b"/DeviceRGB cs 0.2 0.4 0.6 scn", None).unwrap();
/// assert_eq!(result.state.non_stroke_color_space, Some(ColorSpace::DeviceRgb));
/// assert_eq!(result.state.non_stroke_color, Some(Color::Rgb(0.2, 0.4, 0.6)));
/// ```
pub fn interpret_content(
    content: &[u8],
    options: Option<InterpretOptions>,
) -> Result<Interpretation> {
    interpret_page(&Page::new(0, content), options)
}

/// Interpret every content stream of `page`.
pub fn interpret_page(page: &Page, options: Option<InterpretOptions>) -> Result<Interpretation> {
    let registry = OperatorRegistry::standard();
    let mut device = NullDevice;
    let mut interp = PageInterpreter::new(&registry, &mut device, options.unwrap_or_default());
    let report = interp.process_page(page)?;
    Ok(Interpretation {
        state: interp.ctx().graphicstate().clone(),
        report,
    })
}

/// Interpret `page` and record each color change.
pub fn trace_colors(page: &Page, options: Option<InterpretOptions>) -> Result<ColorTrace> {
    let registry = OperatorRegistry::standard();
    trace_page_with(&registry, page, &options.unwrap_or_default())
}

/// Trace several pages, sharing one operator registry.
///
/// Stops at the first page whose pass fails.
pub fn trace_pages(pages: &[Page], options: Option<InterpretOptions>) -> Result<Vec<ColorTrace>> {
    let registry = OperatorRegistry::standard();
    let options = options.unwrap_or_default();
    pages
        .iter()
        .map(|page| trace_page_with(&registry, page, &options))
        .collect()
}

fn trace_page_with(
    registry: &OperatorRegistry,
    page: &Page,
    options: &InterpretOptions,
) -> Result<ColorTrace> {
    let mut device = ColorTraceDevice::new();
    let (state, report) = {
        let mut interp = PageInterpreter::new(registry, &mut device, options.clone());
        let report = interp.process_page(page)?;
        (interp.ctx().graphicstate().clone(), report)
    };
    Ok(ColorTrace {
        pageid: page.pageid,
        events: device.into_events(),
        state,
        report,
    })
}
