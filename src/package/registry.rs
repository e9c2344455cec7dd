//! Purpose: The registry seam plus a directory-backed registry used by the CLI and tests.
//! Exports: `Registry`, `LocalRegistry`, `Receipt`, `Release`.
//! Role: Accepts a named, versioned artifact and either stores it or rejects it.
//! Invariants: A stored name+version is never overwritten; a second publish is `AlreadyExists`.
//! Invariants: Publishes to one directory serialize on an exclusive advisory lock.
//! Invariants: Layout is `<dir>/<name>/<key>.artifact` + `<dir>/<name>/<key>.json`, where the
//! key is the version without build metadata.
//! Invariants: Names are checked against the manifest name rules before any path is built.
//! Notes: No authentication; the local registry trusts its filesystem permissions.
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use semver::{BuildMetadata, Version};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::error::{Error, ErrorKind};
use crate::package::descriptor::{PackageDescriptor, validate_name};

const LOCK_FILE: &str = ".lock";
const ARTIFACT_EXT: &str = "artifact";
const RECORD_EXT: &str = "json";

pub trait Registry {
    fn publish(&self, descriptor: &PackageDescriptor, artifact: &[u8]) -> Result<Receipt, Error>;

    /// Stored versions for `name`, ascending. Unknown names have no versions.
    fn versions(&self, name: &str) -> Result<Vec<Version>, Error>;
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub name: String,
    pub version: Version,
    pub sha256: String,
    pub size: u64,
    pub published_at: String,
}

/// What a registry keeps per release: the descriptor it was given and its receipt.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub descriptor: PackageDescriptor,
    pub receipt: Receipt,
}

#[derive(Clone, Debug)]
pub struct LocalRegistry {
    dir: PathBuf,
}

impl LocalRegistry {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|err| Error::io("failed to create registry directory", &dir, err))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn release(&self, name: &str, version: &Version) -> Result<Release, Error> {
        let path = self.record_path(name, version)?;
        let text = fs::read_to_string(&path).map_err(|err| {
            Error::io(format!("release {name}@{version} not found"), &path, err)
        })?;
        serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("invalid release record")
                .with_path(&path)
                .with_source(err)
        })
    }

    pub fn artifact(&self, name: &str, version: &Version) -> Result<Vec<u8>, Error> {
        let path = self.artifact_path(name, version)?;
        fs::read(&path).map_err(|err| Error::io("failed to read artifact", &path, err))
    }

    fn package_dir(&self, name: &str) -> Result<PathBuf, Error> {
        validate_name(name)?;
        Ok(self.dir.join(name))
    }

    fn artifact_path(&self, name: &str, version: &Version) -> Result<PathBuf, Error> {
        let key = release_key(version);
        Ok(self.package_dir(name)?.join(format!("{key}.{ARTIFACT_EXT}")))
    }

    fn record_path(&self, name: &str, version: &Version) -> Result<PathBuf, Error> {
        let key = release_key(version);
        Ok(self.package_dir(name)?.join(format!("{key}.{RECORD_EXT}")))
    }

    fn lock(&self) -> Result<RegistryLock, Error> {
        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|err| Error::io("failed to open registry lock", &path, err))?;
        file.lock_exclusive()
            .map_err(|err| Error::io("failed to lock registry", &path, err))?;
        Ok(RegistryLock { file })
    }
}

struct RegistryLock {
    file: File,
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl Registry for LocalRegistry {
    fn publish(&self, descriptor: &PackageDescriptor, artifact: &[u8]) -> Result<Receipt, Error> {
        descriptor.validate()?;
        let name = descriptor.name.as_str();
        let version = &descriptor.version;
        let _lock = self.lock()?;

        let package_dir = self.package_dir(name)?;
        fs::create_dir_all(&package_dir)
            .map_err(|err| Error::io("failed to create package directory", &package_dir, err))?;

        // create_new claims the version; an existing artifact means it is taken.
        let artifact_path = self.artifact_path(name, version)?;
        let record_path = self.record_path(name, version)?;
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&artifact_path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::warn!(%name, %version, "publish rejected: version exists");
                return Err(Error::new(ErrorKind::AlreadyExists)
                    .with_message(format!(
                        "{name}@{} is already published",
                        release_key(version)
                    ))
                    .with_hint("Published versions are immutable. Bump the version and publish again.")
                    .with_path(&artifact_path));
            }
            Err(err) => {
                return Err(Error::io("failed to create artifact", &artifact_path, err));
            }
        };

        let stored = file
            .write_all(artifact)
            .and_then(|_| file.sync_all())
            .map_err(|err| Error::io("failed to write artifact", &artifact_path, err))
            .and_then(|_| {
                let receipt = Receipt {
                    name: name.to_string(),
                    version: version.clone(),
                    sha256: sha256_hex(artifact),
                    size: artifact.len() as u64,
                    published_at: now_rfc3339()?,
                };
                let release = Release {
                    descriptor: descriptor.clone(),
                    receipt: receipt.clone(),
                };
                write_record(&record_path, &release)?;
                Ok(receipt)
            });

        match stored {
            Ok(receipt) => {
                tracing::info!(%name, %version, sha256 = %receipt.sha256, "published");
                Ok(receipt)
            }
            Err(err) => {
                if record_path.is_file() {
                    let _ = fs::remove_file(&record_path);
                }
                let _ = fs::remove_file(&artifact_path);
                Err(err)
            }
        }
    }

    fn versions(&self, name: &str) -> Result<Vec<Version>, Error> {
        let package_dir = self.package_dir(name)?;
        let entries = match fs::read_dir(&package_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(Error::io("failed to list package", &package_dir, err));
            }
        };
        let mut versions = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|err| Error::io("failed to list package", &package_dir, err))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXT) || !path.is_file()
            {
                continue;
            }
            // A record without its artifact is a leftover of an interrupted publish.
            if !path.with_extension(ARTIFACT_EXT).is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Ok(version) = Version::parse(stem) {
                versions.push(version);
            }
        }
        versions.sort();
        versions.dedup();
        Ok(versions)
    }
}

/// Storage key for a version: build metadata never distinguishes releases.
fn release_key(version: &Version) -> Version {
    Version {
        build: BuildMetadata::EMPTY,
        ..version.clone()
    }
}

fn write_record(path: &Path, release: &Release) -> Result<(), Error> {
    let mut bytes = serde_json::to_vec_pretty(release).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("json encode failed")
            .with_source(err)
    })?;
    bytes.push(b'\n');
    fs::write(path, bytes).map_err(|err| Error::io("failed to write release record", path, err))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

fn now_rfc3339() -> Result<String, Error> {
    use time::format_description::well_known::Rfc3339;
    time::OffsetDateTime::now_utc().format(&Rfc3339).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("timestamp format failed")
            .with_source(err)
    })
}
