//! colortrace - Trace the color state of PDF content streams
//!
//! Runs decoded content streams through the color operator interpreter and
//! prints every change of the stroking and non-stroking color, followed by
//! the operators that were skipped or failed.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tincture_core::document::Page;
use tincture_core::high_level::{ColorTrace, trace_colors};
use tincture_core::interp::{
    ColorEvent, InitialState, InterpretOptions, OperandCheck, UnsupportedPolicy,
};
use tincture_core::model::{Color, ColorSpace, ResourceDictionary};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output type for the trace.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputType {
    /// One line per color change (default)
    #[default]
    Text,
    /// JSON array with one object per input file
    Json,
}

/// What to do with color operators in a space that cannot be handled.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Unsupported {
    /// Warn and continue (default)
    #[default]
    Skip,
    /// Report the operator as failed
    Error,
}

/// Trace the color operators of decoded PDF content streams.
#[derive(Parser, Debug)]
#[command(name = "colortrace")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more files holding decoded content stream data, one page each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Page color space resource as NAME=SPEC (e.g. CS0=ICCBased:3), repeatable
    #[arg(long = "color-space", value_name = "NAME=SPEC", value_parser = parse_resource)]
    color_spaces: Vec<(String, ColorSpace)>,

    /// Handling of color operators in unsupported color spaces
    #[arg(long, value_enum, default_value = "skip")]
    unsupported: Unsupported,

    /// Drop surplus leading operands instead of failing the operator
    #[arg(long, action = ArgAction::SetTrue)]
    lenient: bool,

    /// Abort at the first failing operator
    #[arg(long = "stop-on-error", action = ArgAction::SetTrue)]
    stop_on_error: bool,

    /// Start from DeviceGray black instead of no color space
    #[arg(long = "device-defaults", action = ArgAction::SetTrue)]
    device_defaults: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Type of output to generate
    #[arg(short = 't', long = "output-type", value_enum, default_value = "text")]
    output_type: OutputType,
}

fn parse_resource(arg: &str) -> std::result::Result<(String, ColorSpace), String> {
    let (name, spec) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=SPEC, got {arg:?}"))?;
    if name.is_empty() {
        return Err(format!("empty resource name in {arg:?}"));
    }
    let space = spec.parse::<ColorSpace>().map_err(|e| e.to_string())?;
    Ok((name.to_string(), space))
}

impl Args {
    fn interpret_options(&self) -> InterpretOptions {
        InterpretOptions {
            unsupported: match self.unsupported {
                Unsupported::Skip => UnsupportedPolicy::Skip,
                Unsupported::Error => UnsupportedPolicy::Error,
            },
            operand_check: if self.lenient {
                OperandCheck::Lenient
            } else {
                OperandCheck::Strict
            },
            stop_on_error: self.stop_on_error,
            initial_state: if self.device_defaults {
                InitialState::DeviceDefaults
            } else {
                InitialState::Unset
            },
            cancel: None,
        }
    }

    fn resources(&self) -> ResourceDictionary {
        self.color_spaces
            .iter()
            .fold(ResourceDictionary::new(), |resources, (name, space)| {
                resources.with_color_space(name, space.clone())
            })
    }
}

#[derive(Serialize)]
struct ColorRecord {
    kind: &'static str,
    components: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
}

impl From<&Color> for ColorRecord {
    fn from(color: &Color) -> Self {
        let kind = match color {
            Color::Gray(_) => "gray",
            Color::Rgb(..) => "rgb",
            Color::Cmyk(..) => "cmyk",
            Color::Lab(..) => "lab",
            Color::Indexed(_) => "indexed",
            Color::Components(_) => "components",
            Color::Pattern { .. } => "pattern",
        };
        Self {
            kind,
            components: color.components().to_vec(),
            pattern: color.pattern_name().map(str::to_string),
        }
    }
}

#[derive(Serialize)]
struct EventRecord {
    pos: usize,
    operator: String,
    target: &'static str,
    space: Option<String>,
    color: Option<ColorRecord>,
}

impl From<&ColorEvent> for EventRecord {
    fn from(event: &ColorEvent) -> Self {
        Self {
            pos: event.pos,
            operator: event.operator.to_string(),
            target: event.target.as_str(),
            space: event.space.as_ref().map(ToString::to_string),
            color: event.color.as_ref().map(ColorRecord::from),
        }
    }
}

#[derive(Serialize)]
struct IssueRecord {
    pos: usize,
    operator: Option<String>,
    message: String,
}

#[derive(Serialize)]
struct PageRecord {
    file: String,
    page: u32,
    applied: usize,
    unhandled: usize,
    events: Vec<EventRecord>,
    skipped: Vec<IssueRecord>,
    failures: Vec<IssueRecord>,
}

impl PageRecord {
    fn new(path: &Path, trace: &ColorTrace) -> Self {
        let report = &trace.report;
        Self {
            file: path.display().to_string(),
            page: trace.pageid,
            applied: report.applied,
            unhandled: report.unhandled,
            events: trace.events.iter().map(EventRecord::from).collect(),
            skipped: report
                .skipped
                .iter()
                .map(|skip| IssueRecord {
                    pos: skip.pos,
                    operator: Some(skip.operator.to_string()),
                    message: format!("unsupported color space {}", skip.space),
                })
                .collect(),
            failures: report
                .failures
                .iter()
                .map(|failure| IssueRecord {
                    pos: failure.pos,
                    operator: failure.operator.as_ref().map(ToString::to_string),
                    message: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

fn write_text<W: Write>(writer: &mut W, record: &PageRecord) -> io::Result<()> {
    writeln!(writer, "page {} ({})", record.page, record.file)?;
    for event in &record.events {
        let space = event.space.as_deref().unwrap_or("-");
        let color = match &event.color {
            Some(color) => format_color(color),
            None => "-".to_string(),
        };
        writeln!(
            writer,
            "{:>8}  {:<3} {:<10} {:<16} {}",
            event.pos, event.operator, event.target, space, color
        )?;
    }
    for skip in &record.skipped {
        writeln!(
            writer,
            "{:>8}  skipped {}: {}",
            skip.pos,
            skip.operator.as_deref().unwrap_or("-"),
            skip.message
        )?;
    }
    for failure in &record.failures {
        writeln!(
            writer,
            "{:>8}  failed {}: {}",
            failure.pos,
            failure.operator.as_deref().unwrap_or("-"),
            failure.message
        )?;
    }
    writeln!(
        writer,
        "applied {}, unhandled {}, skipped {}, failed {}",
        record.applied,
        record.unhandled,
        record.skipped.len(),
        record.failures.len()
    )
}

fn format_color(color: &ColorRecord) -> String {
    let components: Vec<String> = color.components.iter().map(f64::to_string).collect();
    match &color.pattern {
        Some(name) if components.is_empty() => format!("pattern /{name}"),
        Some(name) => format!("pattern /{name} [{}]", components.join(" ")),
        None => format!("{} [{}]", color.kind, components.join(" ")),
    }
}

fn process_file(path: &Path, pageid: u32, args: &Args) -> Result<PageRecord> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), bytes = data.len(), "read content stream");

    let page = Page::new(pageid, data).with_resources(args.resources());
    let trace = trace_colors(&page, Some(args.interpret_options()))
        .with_context(|| format!("error processing {}", path.display()))?;
    Ok(PageRecord::new(path, &trace))
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(args: &Args) -> Result<()> {
    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("failed to create output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    let mut records = Vec::with_capacity(args.files.len());
    for (index, path) in args.files.iter().enumerate() {
        let pageid = u32::try_from(index + 1).context("too many input files")?;
        let record = process_file(path, pageid, args)?;
        if let OutputType::Text = args.output_type {
            write_text(&mut output, &record)?;
        }
        records.push(record);
    }

    if let OutputType::Json = args.output_type {
        serde_json::to_writer_pretty(&mut output, &records)?;
        writeln!(output)?;
    }

    output.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
