//! Purpose: Define the stable public Rust API boundary for adder.
//! Exports: `add`, `sum`, operand and error types, packaging and registry types.
//! Role: Public, additive-only surface used by the CLI, the C ABI, and library callers.
//! Invariants: The combinator is synchronous; there is no callback or async variant.
//! Invariants: Internal modules remain reachable only through these re-exports.

pub use crate::core::combine::{add, sum};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::number::{Operand, json_type_name};
pub use crate::json::parse::operand_from_text;
pub use crate::package::descriptor::{
    Bump, PackageDescriptor, bump_version, classify_bump, set_manifest_version,
};
pub use crate::package::registry::{LocalRegistry, Receipt, Registry, Release};
pub use crate::registry_paths::default_registry_dir;
