//! Purpose: Resolve the local registry directory from flags, environment, and defaults.
//! Exports: `default_registry_dir`, `REGISTRY_DIR_ENV`.
//! Role: Keep CLI and library callers aligned on one registry location policy.
//! Invariants: `ADDER_REGISTRY_DIR` wins over the default `~/.adder/registry`.
//! Invariants: An empty environment value is treated as unset.

use std::ffi::OsString;
use std::path::PathBuf;

pub const REGISTRY_DIR_ENV: &str = "ADDER_REGISTRY_DIR";

pub fn default_registry_dir() -> PathBuf {
    resolve_registry_dir(
        std::env::var_os(REGISTRY_DIR_ENV),
        std::env::var_os("HOME"),
    )
}

fn resolve_registry_dir(configured: Option<OsString>, home: Option<OsString>) -> PathBuf {
    if let Some(dir) = configured.filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }
    PathBuf::from(home.unwrap_or_default())
        .join(".adder")
        .join("registry")
}

#[cfg(test)]
mod tests {
    use super::resolve_registry_dir;
    use std::ffi::OsString;
    use std::path::PathBuf;

    #[test]
    fn env_override_wins() {
        let dir = resolve_registry_dir(
            Some(OsString::from("/srv/registry")),
            Some(OsString::from("/home/dev")),
        );
        assert_eq!(dir, PathBuf::from("/srv/registry"));
    }

    #[test]
    fn empty_override_falls_back_to_home() {
        let dir = resolve_registry_dir(Some(OsString::new()), Some(OsString::from("/home/dev")));
        assert_eq!(dir, PathBuf::from("/home/dev/.adder/registry"));
    }
}
