//! Content stream interpretation and device output.
//!
//! This module contains:
//! - `operator`: Operator trait, outcomes and the keyword registry
//! - `ops`: Operator implementations by category
//! - `interpreter`: Page interpreter driving operators over a context
//! - `device`: Consumers of color changes

pub mod device;
pub mod interpreter;
pub mod operator;
pub mod ops;

// Re-export main types for convenience
pub use device::{ColorDevice, ColorEvent, ColorTraceDevice, NullDevice};
pub use interpreter::{
    ExecutionReport, InitialState, InterpretOptions, OperandCheck, OperatorFailure,
    PageInterpreter, SkippedOperator, UnsupportedPolicy,
};
pub use operator::{Operator, OperatorRegistry, Outcome};
