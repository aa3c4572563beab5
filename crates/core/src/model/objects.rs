//! Content stream operand types.
//!
//! Operands arrive already decoded; operators only ever see these values,
//! never raw bytes.

use crate::error::{PdfError, Result};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// A decoded content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /DeviceRGB, /P0)
    Name(SmolStr),
    /// String (byte array)
    String(Vec<u8>),
    /// Array of operands
    Array(Vec<Self>),
    /// Dictionary (name -> operand mapping)
    Dict(FxHashMap<SmolStr, Self>),
}

impl Operand {
    /// Create a name operand.
    pub fn name(name: &str) -> Self {
        Self::Name(SmolStr::new(name))
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
        }
    }
}

impl From<i64> for Operand {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Self::Real(n)
    }
}
