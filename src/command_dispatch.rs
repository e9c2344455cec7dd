//! Purpose: Hold top-level CLI command dispatch for `adder`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Successful commands print exactly one JSON document on stdout.
//! Invariants: Operand text is decoded as JSON; non-JSON text reaches the combinator as a string.

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    registry_dir: PathBuf,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Add { a, b } => {
            let operands = [
                operand_from_text(&a).map_err(|err| err.with_index(0))?,
                operand_from_text(&b).map_err(|err| err.with_index(1))?,
            ];
            let sum = add(&operands[0], &operands[1])?;
            emit_precision_notice("add", &operands, &sum, color_mode);
            emit_json(sum, color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Sum { values } => {
            let operands = values
                .iter()
                .enumerate()
                .map(|(index, value)| operand_from_text(value).map_err(|err| err.with_index(index)))
                .collect::<Result<Vec<Value>, Error>>()?;
            let sum = sum(&operands)?;
            emit_precision_notice("sum", &operands, &sum, color_mode);
            emit_json(sum, color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Package { command } => dispatch_package(command, color_mode),
        Command::Publish { manifest, artifact } => {
            let descriptor = PackageDescriptor::load(&manifest)?;
            let bytes = std::fs::read(&artifact)
                .map_err(|err| Error::io("failed to read artifact", &artifact, err))?;
            let registry = LocalRegistry::open(&registry_dir)?;
            let receipt = registry.publish(&descriptor, &bytes)?;
            let value = serde_json::to_value(&receipt).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("json encode failed")
                    .with_source(err)
            })?;
            emit_json(json!({ "published": value }), color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output(color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "adder", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
    }
}

fn dispatch_package(command: PackageCommand, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        PackageCommand::Check { manifest } => {
            let descriptor = PackageDescriptor::load(&manifest)?;
            descriptor
                .validate()
                .map_err(|err| err.with_path(&manifest))?;
            emit_json(
                json!({ "valid": true, "descriptor": descriptor.to_json()? }),
                color_mode,
            );
            Ok(RunOutcome::ok())
        }
        PackageCommand::Bump {
            manifest,
            bump,
            write,
        } => {
            let bump = Bump::from(bump);
            let descriptor = PackageDescriptor::load(&manifest)?;
            let next = bump_version(&descriptor.version, bump)
                .map_err(|err| err.with_path(&manifest))?;
            if write {
                let text = std::fs::read_to_string(&manifest)
                    .map_err(|err| Error::io("failed to read manifest", &manifest, err))?;
                let updated = set_manifest_version(&text, &next)?;
                std::fs::write(&manifest, updated)
                    .map_err(|err| Error::io("failed to write manifest", &manifest, err))?;
                tracing::info!(from = %descriptor.version, to = %next, "manifest version updated");
            }
            emit_json(
                json!({
                    "name": descriptor.name,
                    "from": descriptor.version.to_string(),
                    "to": next.to_string(),
                    "bump": bump.as_str(),
                    "written": write,
                }),
                color_mode,
            );
            Ok(RunOutcome::ok())
        }
    }
}
