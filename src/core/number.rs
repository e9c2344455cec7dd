//! Purpose: Classify dynamic values as finite numbers before any arithmetic happens.
//! Exports: `Operand`, `json_type_name`.
//! Role: The only place where a `serde_json::Value` becomes something addable.
//! Invariants: An `Operand` is always finite; no NaN or infinity is ever constructed.
//! Invariants: Integers are normalized (non-negative values that fit `i64` are `Int`).
//! Invariants: Integer sums are exact when they fit `i64`/`u64`; otherwise they become `Float`.
use std::fmt;

use serde_json::{Number, Value};

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Operand {
    /// Accepts `Value::Number` only. Strings are never parsed, booleans are never
    /// widened, and null is never treated as zero.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Number(number) => Self::from_number(number),
            other => Err(Error::new(ErrorKind::InvalidArgument)
                .with_message(format!(
                    "operand must be a number, got {}",
                    json_type_name(other)
                ))
                .with_hint("Pass a JSON number such as 2 or 2.5 (quoted numbers are strings).")),
        }
    }

    pub fn from_number(number: &Number) -> Result<Self, Error> {
        if let Some(value) = number.as_i64() {
            return Ok(Operand::Int(value));
        }
        if let Some(value) = number.as_u64() {
            return Ok(Operand::UInt(value));
        }
        match number.as_f64() {
            Some(value) => Self::float(value),
            None => Err(Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("number {number} is not representable"))),
        }
    }

    pub fn float(value: f64) -> Result<Self, Error> {
        if value.is_finite() {
            Ok(Operand::Float(value))
        } else {
            Err(Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("operand must be finite, got {value}")))
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Operand::Float(_))
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Operand::Int(value) => value as f64,
            Operand::UInt(value) => value as f64,
            Operand::Float(value) => value,
        }
    }

    /// Adds two operands. Pure; the only failure is a float sum leaving the finite range.
    pub fn checked_add(self, other: Operand) -> Result<Operand, Error> {
        match (self.as_i128(), other.as_i128()) {
            (Some(lhs), Some(rhs)) => {
                // |i64|, u64 < 2^64, so the i128 sum cannot overflow.
                let exact = lhs + rhs;
                Ok(Self::from_i128(exact).unwrap_or(Operand::Float(exact as f64)))
            }
            _ => {
                let sum = self.as_f64() + other.as_f64();
                if sum.is_finite() {
                    Ok(Operand::Float(sum))
                } else {
                    Err(Error::new(ErrorKind::InvalidArgument)
                        .with_message("sum is outside the finite range of a 64-bit float"))
                }
            }
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Operand::Int(value) => Value::from(value),
            Operand::UInt(value) => Value::from(value),
            Operand::Float(value) => Value::from(value),
        }
    }

    fn as_i128(self) -> Option<i128> {
        match self {
            Operand::Int(value) => Some(i128::from(value)),
            Operand::UInt(value) => Some(i128::from(value)),
            Operand::Float(_) => None,
        }
    }

    fn from_i128(value: i128) -> Option<Operand> {
        if let Ok(value) = i64::try_from(value) {
            return Some(Operand::Int(value));
        }
        u64::try_from(value).ok().map(Operand::UInt)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Int(value)
    }
}

impl From<u64> for Operand {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Operand::Int)
            .unwrap_or(Operand::UInt(value))
    }
}

impl TryFrom<f64> for Operand {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Operand::float(value)
    }
}

impl TryFrom<&Value> for Operand {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Operand::from_value(value)
    }
}

impl From<Operand> for Value {
    fn from(operand: Operand) -> Self {
        operand.into_value()
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_value())
    }
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
