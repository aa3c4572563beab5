//! Page interpreter - drives content stream operators over a rendering
//! context.
//!
//! Operands are collected until an operator keyword appears. The operator's
//! handler decides from the current color state how many operands it
//! takes; the interpreter checks the count, applies the handler and reports
//! the result to a [`ColorDevice`].

use super::device::ColorDevice;
use super::operator::{Operator, OperatorRegistry, Outcome};
use crate::document::page::Page;
use crate::error::{PdfError, Result};
use crate::model::color::ColorSpace;
use crate::model::objects::Operand;
use crate::model::state::{CancellationToken, ColorTarget, GraphicState, RenderContext};
use crate::parser::lexer::{ContentParser, ContentToken};
use smol_str::SmolStr;
use tracing::{debug, trace, warn};

/// What to do when an operator meets a color space it cannot handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnsupportedPolicy {
    /// Log a warning, record the operator as skipped and carry on.
    #[default]
    Skip,
    /// Treat it as an operator failure.
    Error,
}

/// How strictly operand counts are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperandCheck {
    /// Any mismatch fails the operator.
    #[default]
    Strict,
    /// Surplus leading operands are dropped. Too few still fails.
    Lenient,
}

/// Color state at the start of every page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InitialState {
    /// No color space selected; `SC`/`sc`/`SCN`/`scn` fail until
    /// `CS`/`cs` (or a Device color operator) runs.
    #[default]
    Unset,
    /// DeviceGray and black for both targets.
    DeviceDefaults,
}

impl InitialState {
    pub fn graphic_state(self) -> GraphicState {
        match self {
            Self::Unset => GraphicState::new(),
            Self::DeviceDefaults => GraphicState::device_defaults(),
        }
    }
}

/// Options for interpreting content streams.
#[derive(Debug, Clone, Default)]
pub struct InterpretOptions {
    /// Handling of operators that meet an unsupported color space.
    pub unsupported: UnsupportedPolicy,

    /// Operand count checking.
    pub operand_check: OperandCheck,

    /// Return the first operator failure instead of recording it.
    pub stop_on_error: bool,

    /// Color state each page starts from.
    pub initial_state: InitialState,

    /// Checked between operators; cancelling ends the pass with
    /// [`PdfError::Cancelled`].
    pub cancel: Option<CancellationToken>,
}

/// An operator that did not change anything because of its color space.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOperator {
    pub pos: usize,
    pub operator: SmolStr,
    pub space: ColorSpace,
}

/// An operator (or stretch of content) that failed.
#[derive(Debug)]
pub struct OperatorFailure {
    pub pos: usize,
    /// `None` when the content itself could not be tokenized
    pub operator: Option<SmolStr>,
    pub error: PdfError,
}

/// Summary of one pass.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Operators that ran successfully
    pub applied: usize,
    /// Operators with no registered handler
    pub unhandled: usize,
    pub skipped: Vec<SkippedOperator>,
    pub failures: Vec<OperatorFailure>,
}

impl ExecutionReport {
    /// True when nothing was skipped and nothing failed.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failures.is_empty()
    }
}

/// Executes content stream operators against one [`RenderContext`].
///
/// Each page gets a fresh context: [`PageInterpreter::process_page`] resets
/// it before running the page's content streams.
pub struct PageInterpreter<'a, D: ColorDevice> {
    registry: &'a OperatorRegistry,
    device: &'a mut D,
    options: InterpretOptions,
    ctx: RenderContext,
    report: ExecutionReport,
}

impl<'a, D: ColorDevice> PageInterpreter<'a, D> {
    pub fn new(
        registry: &'a OperatorRegistry,
        device: &'a mut D,
        options: InterpretOptions,
    ) -> Self {
        let mut ctx = RenderContext::new();
        if let Some(token) = &options.cancel {
            ctx.set_cancellation_token(token.clone());
        }
        Self {
            registry,
            device,
            options,
            ctx,
            report: ExecutionReport::default(),
        }
    }

    pub const fn ctx(&self) -> &RenderContext {
        &self.ctx
    }

    pub const fn options(&self) -> &InterpretOptions {
        &self.options
    }

    pub const fn report(&self) -> &ExecutionReport {
        &self.report
    }

    /// Hand out the report collected so far and start a new one.
    pub fn take_report(&mut self) -> ExecutionReport {
        std::mem::take(&mut self.report)
    }

    /// Reset the context for `page`: initial colors, empty state stack and
    /// the page's color space resources.
    pub fn init_state(&mut self, page: &Page) {
        self.ctx.reset(self.options.initial_state.graphic_state());
        self.ctx.set_resources(page.resources.clone());
        self.report = ExecutionReport::default();
    }

    /// Process a page.
    ///
    /// Resets the context, runs all content streams and returns the report
    /// of the pass. The final color state stays readable through
    /// [`PageInterpreter::ctx`].
    pub fn process_page(&mut self, page: &Page) -> Result<ExecutionReport> {
        debug!(pageid = page.pageid, streams = page.contents.len(), "processing page");
        self.init_state(page);
        self.device.begin_page(page.pageid, page.mediabox_or_default());
        let result = self.execute(page);
        self.device.end_page(page.pageid);
        result?;
        Ok(self.take_report())
    }

    /// Execute the content streams of `page` against the current context.
    ///
    /// Streams are concatenated with a newline in between, as if they were
    /// one stream.
    pub fn execute(&mut self, page: &Page) -> Result<()> {
        match page.contents.as_slice() {
            [] => Ok(()),
            [stream] => self.execute_content(stream, page),
            streams => {
                let joined = streams.join(&b'\n');
                self.execute_content(&joined, page)
            }
        }
    }

    /// Execute one buffer of decoded content.
    pub fn execute_content(&mut self, content: &[u8], page: &Page) -> Result<()> {
        let mut operands: Vec<Operand> = Vec::new();

        for item in ContentParser::new(content) {
            let (pos, token) = match item {
                Ok(item) => item,
                Err(error) => {
                    let pos = match &error {
                        PdfError::TokenError { pos, .. } => *pos,
                        _ => content.len(),
                    };
                    // The parser does not resume after an error.
                    return self.fail(pos, None, error);
                }
            };

            match token {
                ContentToken::Operand(operand) => operands.push(operand),
                ContentToken::InlineImage => operands.clear(),
                ContentToken::Operator(name) => {
                    self.ctx.check_cancelled()?;
                    let args = std::mem::take(&mut operands);
                    self.dispatch_operator(pos, &name, args, page)?;
                }
            }
        }

        if !operands.is_empty() {
            trace!(count = operands.len(), "trailing operands without operator");
        }
        Ok(())
    }

    /// Run one operator with the operands collected before it.
    ///
    /// Errors are returned only when the pass must stop.
    pub fn dispatch_operator(
        &mut self,
        pos: usize,
        name: &str,
        mut args: Vec<Operand>,
        page: &Page,
    ) -> Result<()> {
        let registry = self.registry;
        let Some(op) = registry.get(name) else {
            trace!(operator = name, pos, "no handler");
            self.report.unhandled += 1;
            return Ok(());
        };

        match self.apply_operator(op, &mut args, page) {
            Ok(outcome) => self.finish_operator(pos, op, outcome),
            Err(error) => self.fail(pos, Some(op.name()), error),
        }
    }

    fn apply_operator(
        &mut self,
        op: &dyn Operator,
        args: &mut Vec<Operand>,
        page: &Page,
    ) -> Result<Outcome> {
        let expected = op.operand_count(&self.ctx)?;
        if let Some(space) = op.unsupported_space(&self.ctx) {
            if !args.is_empty() {
                debug!(operator = op.name(), count = args.len(), "discarding operands");
            }
            return Ok(Outcome::Skipped { space });
        }
        if args.len() != expected {
            if self.options.operand_check == OperandCheck::Lenient && args.len() > expected {
                let surplus = args.len() - expected;
                warn!(operator = op.name(), surplus, "dropping surplus operands");
                args.drain(..surplus);
            } else {
                return Err(PdfError::OperandCountMismatch {
                    operator: op.name(),
                    expected,
                    got: args.len(),
                });
            }
        }
        op.apply(args, page, &mut self.ctx)
    }

    fn finish_operator(&mut self, pos: usize, op: &dyn Operator, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Skipped { space } => match self.options.unsupported {
                UnsupportedPolicy::Skip => {
                    warn!(
                        operator = op.name(),
                        pos,
                        %space,
                        "unsupported color space, operator skipped"
                    );
                    self.report.skipped.push(SkippedOperator {
                        pos,
                        operator: SmolStr::new_static(op.name()),
                        space,
                    });
                    Ok(())
                }
                UnsupportedPolicy::Error => self.fail(
                    pos,
                    Some(op.name()),
                    PdfError::UnsupportedColorSpace {
                        operator: op.name(),
                        space: space.to_string(),
                    },
                ),
            },
            Outcome::ColorSet(target) | Outcome::SpaceSet(target) => {
                debug!(
                    operator = op.name(),
                    pos,
                    color = ?self.ctx.color(target),
                    "color updated"
                );
                self.report.applied += 1;
                self.device
                    .update_color(pos, op.name(), target, self.ctx.graphicstate());
                Ok(())
            }
            Outcome::Saved | Outcome::Restored(false) => {
                self.report.applied += 1;
                Ok(())
            }
            Outcome::Restored(true) => {
                self.report.applied += 1;
                for target in [ColorTarget::Stroke, ColorTarget::NonStroke] {
                    self.device
                        .update_color(pos, op.name(), target, self.ctx.graphicstate());
                }
                Ok(())
            }
        }
    }

    /// Record a failure, or return it when the pass has to stop.
    fn fail(&mut self, pos: usize, operator: Option<&str>, error: PdfError) -> Result<()> {
        if self.options.stop_on_error || !error.is_operator_local() {
            return Err(error);
        }
        warn!(pos, operator, %error, "operator failed");
        self.report.failures.push(OperatorFailure {
            pos,
            operator: operator.map(SmolStr::new),
            error,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::device::NullDevice;
    use crate::model::state::Color;

    fn run(content: &[u8], options: InterpretOptions) -> (Result<ExecutionReport>, GraphicState) {
        let registry = OperatorRegistry::standard();
        let mut device = NullDevice;
        let mut interp = PageInterpreter::new(&registry, &mut device, options);
        let result = interp.process_page(&Page::new(1, content));
        let state = interp.ctx().graphicstate().clone();
        (result, state)
    }

    #[test]
    fn test_unset_space_fails_operator_only() {
        let (result, state) = run(b"0.5 sc 0.25 g", InterpretOptions::default());
        let report = result.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].error,
            PdfError::ColorSpaceNotSet { operator: "sc" }
        ));
        assert_eq!(report.applied, 1);
        assert_eq!(state.non_stroke_color, Some(Color::Gray(0.25)));
    }

    #[test]
    fn test_stop_on_error() {
        let options = InterpretOptions {
            stop_on_error: true,
            ..Default::default()
        };
        let (result, state) = run(b"0.5 sc 0.25 g", options);
        assert!(matches!(result, Err(PdfError::ColorSpaceNotSet { .. })));
        assert_eq!(state.non_stroke_color, None);
    }

    #[test]
    fn test_lenient_drops_leading_operands() {
        let options = InterpretOptions {
            operand_check: OperandCheck::Lenient,
            initial_state: InitialState::DeviceDefaults,
            ..Default::default()
        };
        let (result, state) = run(b"9 9 0.3 sc", options);
        assert!(result.unwrap().is_clean());
        assert_eq!(state.non_stroke_color, Some(Color::Gray(0.3)));
    }

    #[test]
    fn test_strict_rejects_surplus() {
        let options = InterpretOptions {
            initial_state: InitialState::DeviceDefaults,
            ..Default::default()
        };
        let (result, state) = run(b"9 0.3 sc", options);
        let report = result.unwrap();
        assert!(matches!(
            report.failures[0].error,
            PdfError::OperandCountMismatch {
                operator: "sc",
                expected: 1,
                got: 2
            }
        ));
        assert_eq!(state.non_stroke_color, Some(Color::Gray(0.0)));
    }

    #[test]
    fn test_unhandled_operators_discard_operands() {
        let options = InterpretOptions {
            initial_state: InitialState::DeviceDefaults,
            ..Default::default()
        };
        let (result, _) = run(b"BT /F1 12 Tf 0.1 g ET", options);
        let report = result.unwrap();
        assert_eq!(report.unhandled, 3);
        assert_eq!(report.applied, 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_lexer_error_is_recorded() {
        let (result, state) = run(b"0.5 g -. 1 g", InterpretOptions::default());
        let report = result.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].operator.is_none());
        assert_eq!(state.non_stroke_color, Some(Color::Gray(0.5)));
    }
}
