//! Purpose: Internal JSON decoding boundary shared by the CLI, manifests, and the C ABI.
//! Exports: `parse` module with decode helpers.
//! Role: Single seam for operand/manifest decoding so callsites avoid ad hoc parsing.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub mod parse;
