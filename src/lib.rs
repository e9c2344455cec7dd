//! Purpose: Library crate behind the `adder` CLI, the C ABI, and Rust callers.
//! Exports: `api` (stable surface), `abi` (C bridge), `notice` (CLI diagnostics schema).
//! Role: Validated numeric addition plus the packaging metadata around it.
//! Invariants: The combinator is pure; only `package::registry` touches the filesystem.
//! Invariants: The library never installs a tracing subscriber; binaries do.
pub mod abi;
pub mod api;
mod core;
mod json;
pub mod notice;
mod package;
mod registry_paths;
