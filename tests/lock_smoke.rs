// Multi-process lock smoke test for publish serialization.
use std::process::{Command, Stdio};

use adder::api::{LocalRegistry, Registry};

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_adder");
    Command::new(exe)
}

fn write_manifest(dir: &std::path::Path, file: &str, version: &str) -> std::path::PathBuf {
    let path = dir.join(file);
    std::fs::write(
        &path,
        format!(r#"{{"name":"lockpkg","version":"{version}","main":"index.js","license":"MIT"}}"#),
    )
    .expect("manifest");
    path
}

#[test]
fn concurrent_publishes_of_distinct_versions_all_land() {
    let temp = tempfile::tempdir().expect("tempdir");
    let registry_dir = temp.path().join("registry");
    let artifact = temp.path().join("artifact.tgz");
    std::fs::write(&artifact, b"payload").expect("artifact");

    let workers = 8;
    let mut children = Vec::new();
    for i in 0..workers {
        let manifest = write_manifest(temp.path(), &format!("m{i}.json"), &format!("1.0.{i}"));
        let child = cmd()
            .args([
                "--registry-dir",
                registry_dir.to_str().unwrap(),
                "publish",
                manifest.to_str().unwrap(),
                artifact.to_str().unwrap(),
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn");
        children.push(child);
    }

    for mut child in children {
        let status = child.wait().expect("wait");
        assert!(status.success());
    }

    let registry = LocalRegistry::open(&registry_dir).expect("open");
    let versions = registry.versions("lockpkg").expect("versions");
    assert_eq!(versions.len(), workers);
}

#[test]
fn concurrent_publishes_of_one_version_have_one_winner() {
    let temp = tempfile::tempdir().expect("tempdir");
    let registry_dir = temp.path().join("registry");
    let artifact = temp.path().join("artifact.tgz");
    std::fs::write(&artifact, b"payload").expect("artifact");
    let manifest = write_manifest(temp.path(), "package.json", "2.0.0");

    let workers = 8;
    let mut children = Vec::new();
    for _ in 0..workers {
        let child = cmd()
            .args([
                "--registry-dir",
                registry_dir.to_str().unwrap(),
                "publish",
                manifest.to_str().unwrap(),
                artifact.to_str().unwrap(),
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn");
        children.push(child);
    }

    let codes: Vec<i32> = children
        .into_iter()
        .map(|mut child| child.wait().expect("wait").code().expect("code"))
        .collect();
    assert_eq!(codes.iter().filter(|code| **code == 0).count(), 1);
    assert_eq!(codes.iter().filter(|code| **code == 4).count(), workers - 1);
}
