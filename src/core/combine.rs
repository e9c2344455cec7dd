//! Purpose: The numeric combinator: validated addition over dynamic values.
//! Exports: `add`, `sum`.
//! Role: Entry point behind `api::add`, the CLI, and the C ABI.
//! Invariants: Pure and re-entrant; inputs are borrowed and never mutated, no I/O.
//! Invariants: Every failure is `ErrorKind::InvalidArgument` tagged with the operand index.
//! Invariants: A failing call never yields a numeric result.
use serde_json::Value;

use crate::core::error::Error;
use crate::core::number::Operand;

pub fn add(a: &Value, b: &Value) -> Result<Value, Error> {
    let lhs = operand_at(a, 0)?;
    let rhs = operand_at(b, 1)?;
    let sum = lhs.checked_add(rhs)?;
    tracing::debug!(%lhs, %rhs, %sum, "add");
    Ok(sum.into_value())
}

/// Left fold of `add` starting from 0; an empty slice sums to 0.
pub fn sum(values: &[Value]) -> Result<Value, Error> {
    let mut total = Operand::Int(0);
    for (index, value) in values.iter().enumerate() {
        let operand = operand_at(value, index)?;
        total = total
            .checked_add(operand)
            .map_err(|err| err.with_index(index))?;
    }
    tracing::debug!(count = values.len(), %total, "sum");
    Ok(total.into_value())
}

fn operand_at(value: &Value, index: usize) -> Result<Operand, Error> {
    Operand::from_value(value).map_err(|err| {
        tracing::debug!(index, error = %err, "rejected operand");
        err.with_index(index)
    })
}
