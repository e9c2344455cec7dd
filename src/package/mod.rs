//! Purpose: Packaging metadata and the registry collaborator seam.
//! Exports: `descriptor` (manifest model, version bumps) and `registry` (publish/versions).
//! Role: Everything around the combinator that a published package needs.
pub mod descriptor;
pub mod registry;
