//! Purpose: Model the package manifest handed to a registry alongside the artifact.
//! Exports: `PackageDescriptor`, `Bump`, `bump_version`, `classify_bump`, `set_manifest_version`.
//! Role: Shared by the CLI (`package check|bump`, `publish`) and `LocalRegistry`.
//! Invariants: A descriptor that passed `validate` has a name safe to use as a path segment.
//! Invariants: Version bumps clear pre-release and build metadata.
//! Notes: Unknown manifest fields are ignored on load and preserved by `set_manifest_version`.
use std::fmt;
use std::path::{Component, Path};

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::json::parse;

pub const MAX_NAME_LEN: usize = 214;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: Version,
    pub entry: String,
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// Version stays a string here so a bad version reports as InvalidArgument, not a
// manifest shape error.
#[derive(Deserialize)]
struct RawDescriptor {
    name: String,
    version: String,
    #[serde(alias = "main")]
    entry: String,
    license: String,
    #[serde(default)]
    description: Option<String>,
}

impl PackageDescriptor {
    pub fn new(
        name: impl Into<String>,
        version: Version,
        entry: impl Into<String>,
        license: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            entry: entry.into(),
            license: license.into(),
            description: None,
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let raw: RawDescriptor = parse::from_str(input).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid manifest: {err}"))
                .with_hint("A manifest needs string fields: name, version, entry (or main), license.")
                .with_source(err)
        })?;
        let version = Version::parse(&raw.version).map_err(|err| {
            Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("invalid version {:?}", raw.version))
                .with_hint("Use semantic versioning: MAJOR.MINOR.PATCH (for example 1.0.0).")
                .with_source(err)
        })?;
        Ok(Self {
            name: raw.name,
            version,
            entry: raw.entry,
            license: raw.license,
            description: raw.description,
        })
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::io("failed to read manifest", path, err))?;
        Self::from_json_str(&text).map_err(|err| err.with_path(path))
    }

    pub fn validate(&self) -> Result<(), Error> {
        validate_name(&self.name)?;
        validate_entry(&self.entry)?;
        validate_license(&self.license)
    }

    pub fn to_json(&self) -> Result<Value, Error> {
        serde_json::to_value(self).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("json encode failed")
                .with_source(err)
        })
    }
}

fn invalid(message: String) -> Error {
    Error::new(ErrorKind::InvalidArgument).with_message(message)
}

pub(crate) fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(invalid("package name is empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(format!(
            "package name is {} characters (max {MAX_NAME_LEN})",
            name.len()
        )));
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err(invalid(format!(
            "package name {name:?} must not start with '.' or '_'"
        )));
    }
    if let Some(ch) = name
        .chars()
        .find(|ch| !matches!(ch, 'a'..='z' | '0'..='9' | '-' | '_' | '.'))
    {
        return Err(invalid(format!(
            "package name {name:?} contains {ch:?}; use lowercase letters, digits, '-', '_', '.'"
        )));
    }
    Ok(())
}

fn validate_entry(entry: &str) -> Result<(), Error> {
    if entry.trim().is_empty() {
        return Err(invalid("entry point is empty".to_string()));
    }
    for component in Path::new(entry).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(invalid(format!(
                    "entry point {entry:?} must not leave the package directory"
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid(format!(
                    "entry point {entry:?} must be a relative path"
                )));
            }
        }
    }
    Ok(())
}

fn validate_license(license: &str) -> Result<(), Error> {
    if license.is_empty() {
        return Err(invalid("license identifier is empty".to_string()));
    }
    if license.chars().any(char::is_whitespace) {
        return Err(invalid(format!(
            "license {license:?} must be an identifier such as MIT or Apache-2.0"
        )));
    }
    Ok(())
}

/// Compatibility impact of a release: fixes, additive features, breaking changes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bump {
    Patch,
    Minor,
    Major,
}

impl Bump {
    pub fn as_str(self) -> &'static str {
        match self {
            Bump::Patch => "patch",
            Bump::Minor => "minor",
            Bump::Major => "major",
        }
    }
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next version for `bump`; fails when the bumped component is already `u64::MAX`.
pub fn bump_version(version: &Version, bump: Bump) -> Result<Version, Error> {
    let next = match bump {
        Bump::Patch => version
            .patch
            .checked_add(1)
            .map(|patch| Version::new(version.major, version.minor, patch)),
        Bump::Minor => version
            .minor
            .checked_add(1)
            .map(|minor| Version::new(version.major, minor, 0)),
        Bump::Major => version
            .major
            .checked_add(1)
            .map(|major| Version::new(major, 0, 0)),
    };
    next.ok_or_else(|| {
        Error::new(ErrorKind::InvalidArgument)
            .with_message(format!("cannot {bump}-bump {version}: {bump} component overflows"))
            .with_hint("Use a larger bump (minor or major) to reset the exhausted component.")
    })
}

/// Smallest bump that explains `from -> to`; `None` when `to` is not newer.
pub fn classify_bump(from: &Version, to: &Version) -> Option<Bump> {
    if to <= from {
        return None;
    }
    if to.major != from.major {
        Some(Bump::Major)
    } else if to.minor != from.minor {
        Some(Bump::Minor)
    } else {
        Some(Bump::Patch)
    }
}

/// Rewrites only the `version` field of a manifest document, keeping every other field.
pub fn set_manifest_version(manifest: &str, version: &Version) -> Result<String, Error> {
    let mut doc: Value = parse::from_str(manifest).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid manifest json")
            .with_source(err)
    })?;
    let Some(object) = doc.as_object_mut() else {
        return Err(Error::new(ErrorKind::Usage).with_message("manifest must be a JSON object"));
    };
    object.insert("version".to_string(), Value::String(version.to_string()));
    let mut text = serde_json::to_string_pretty(&doc).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("json encode failed")
            .with_source(err)
    })?;
    text.push('\n');
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(name: &str, version: &str) -> String {
        format!(
            r#"{{"name":"{name}","version":"{version}","main":"index.js","license":"MIT","scripts":{{"test":"mocha"}}}}"#
        )
    }

    #[test]
    fn loads_manifest_with_main_alias() {
        let descriptor = PackageDescriptor::from_json_str(&manifest("adder", "1.0.0")).unwrap();
        assert_eq!(descriptor.name, "adder");
        assert_eq!(descriptor.version, Version::new(1, 0, 0));
        assert_eq!(descriptor.entry, "index.js");
        assert_eq!(descriptor.license, "MIT");
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn missing_field_is_usage_error() {
        let err = PackageDescriptor::from_json_str(r#"{"name":"adder","version":"1.0.0"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().is_some());
    }

    #[test]
    fn bad_version_is_invalid_argument() {
        let err = PackageDescriptor::from_json_str(&manifest("adder", "1.0")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn name_rules() {
        let ok = ["adder", "my-adder", "adder.js", "a_b", "x1"];
        for name in ok {
            assert!(validate_name(name).is_ok(), "{name}");
        }
        let long = "a".repeat(MAX_NAME_LEN + 1);
        let bad = ["", "Adder", ".adder", "_adder", "my adder", "scope/adder", long.as_str()];
        for name in bad {
            let err = validate_name(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{name}");
        }
    }

    #[test]
    fn entry_rules() {
        assert!(validate_entry("index.js").is_ok());
        assert!(validate_entry("./lib/index.js").is_ok());
        assert!(validate_entry("").is_err());
        assert!(validate_entry("../index.js").is_err());
        assert!(validate_entry("/usr/lib/index.js").is_err());
    }

    #[test]
    fn license_rules() {
        assert!(validate_license("MIT").is_ok());
        assert!(validate_license("Apache-2.0").is_ok());
        assert!(validate_license("").is_err());
        assert!(validate_license("MIT License").is_err());
    }

    #[test]
    fn bumps_reset_lower_components() {
        let version = Version::parse("1.4.7-beta.1+build.5").unwrap();
        assert_eq!(bump_version(&version, Bump::Patch).unwrap(), Version::new(1, 4, 8));
        assert_eq!(bump_version(&version, Bump::Minor).unwrap(), Version::new(1, 5, 0));
        assert_eq!(bump_version(&version, Bump::Major).unwrap(), Version::new(2, 0, 0));
    }

    #[test]
    fn exhausted_component_cannot_be_bumped() {
        let version = Version::new(1, 2, u64::MAX);
        let err = bump_version(&version, Bump::Patch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.hint().is_some());
        assert_eq!(bump_version(&version, Bump::Minor).unwrap(), Version::new(1, 3, 0));

        let top = Version::new(u64::MAX, u64::MAX, 0);
        assert!(bump_version(&top, Bump::Minor).is_err());
        assert!(bump_version(&top, Bump::Major).is_err());
        assert_eq!(bump_version(&top, Bump::Patch).unwrap(), Version::new(u64::MAX, u64::MAX, 1));
    }

    #[test]
    fn descriptor_encodes_to_json() {
        let descriptor = PackageDescriptor::from_json_str(&manifest("adder", "1.0.0")).unwrap();
        let value = descriptor.to_json().unwrap();
        assert_eq!(value["version"], "1.0.0");
        assert_eq!(value["entry"], "index.js");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn classify_agrees_with_bump() {
        let version = Version::new(0, 9, 3);
        for bump in [Bump::Patch, Bump::Minor, Bump::Major] {
            assert_eq!(
                classify_bump(&version, &bump_version(&version, bump).unwrap()),
                Some(bump)
            );
        }
        assert_eq!(classify_bump(&version, &version), None);
        assert_eq!(classify_bump(&version, &Version::new(0, 9, 2)), None);
    }

    #[test]
    fn set_manifest_version_keeps_other_fields() {
        let text = set_manifest_version(&manifest("adder", "1.0.0"), &Version::new(1, 0, 1)).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["version"], "1.0.1");
        assert_eq!(doc["scripts"]["test"], "mocha");
        assert_eq!(doc["main"], "index.js");
        assert!(text.ends_with('\n'));
    }
}
