//! Purpose: `adder` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit JSON on stdout (human text only for `version` on a TTY).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Logs go to stderr via tracing; stdout stays a clean JSON channel.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use adder::api::{
    Bump, Error, ErrorKind, LocalRegistry, PackageDescriptor, Registry, add, bump_version,
    default_registry_dir, operand_from_text, set_manifest_version, sum, to_exit_code,
};
use adder::notice::{Notice, notice_json, precision_notice};
use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint(clap_error_hint(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let registry_dir = cli.registry_dir.unwrap_or_else(default_registry_dir);
    let color_mode = cli.color;

    command_dispatch::dispatch_command(cli.command, registry_dir, color_mode)
        .map_err(add_invalid_argument_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "adder",
    version,
    about = "Validated numeric addition, plus the package metadata around it",
    long_about = None,
    after_help = r#"EXAMPLES
  $ adder add 1 2                    # 3
  $ adder add 0.1 0.2                # 0.30000000000000004
  $ adder add x 2                    # error: operand must be a number (exit 9)
  $ adder sum 1 2 3 4                # 10
  $ adder package check package.json
  $ adder package bump package.json minor --write
  $ adder publish package.json adder-1.0.0.tgz

  Operands are JSON: quoted numbers ("2") are strings and are rejected.
  Set RUST_LOG=debug to trace operand classification on stderr."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Local registry directory (default: $ADDER_REGISTRY_DIR or ~/.adder/registry)",
        value_hint = ValueHint::DirPath
    )]
    registry_dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Add two numbers",
        long_about = r#"Add two JSON numbers and print the sum as JSON.

Integers add exactly; a float operand makes the sum a float.
Anything that is not a JSON number (strings, booleans, null, arrays, objects)
is rejected with InvalidArgument instead of being coerced."#,
        after_help = r#"EXAMPLES
  $ adder add 1 2
  $ adder add -- -1.5 2
  $ adder add 9223372036854775807 1"#
    )]
    Add {
        #[arg(help = "First operand (JSON number)", allow_negative_numbers = true)]
        a: String,
        #[arg(help = "Second operand (JSON number)", allow_negative_numbers = true)]
        b: String,
    },
    #[command(
        about = "Sum any number of values",
        long_about = r#"Fold `add` over all operands, left to right, starting from 0.

With no operands the sum is 0. The first invalid operand stops the fold and
is reported with its index."#,
        after_help = r#"EXAMPLES
  $ adder sum 1 2 3
  $ adder sum"#
    )]
    Sum {
        #[arg(help = "Operands (JSON numbers)", allow_negative_numbers = true)]
        values: Vec<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Inspect and version package manifests"
    )]
    Package {
        #[command(subcommand)]
        command: PackageCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Publish an artifact to the local registry",
        long_about = r#"Validate the manifest and store the artifact under its name and version.

Publishing an existing name+version fails with AlreadyExists (exit 4);
published versions are immutable."#,
        after_help = r#"EXAMPLES
  $ adder publish package.json adder-1.0.0.tgz
  $ adder --registry-dir ./registry publish package.json adder-1.0.0.tgz"#
    )]
    Publish {
        #[arg(help = "Manifest path (JSON)", value_hint = ValueHint::FilePath)]
        manifest: PathBuf,
        #[arg(help = "Artifact path", value_hint = ValueHint::FilePath)]
        artifact: PathBuf,
    },
    #[command(
        about = "Print version info as JSON",
        after_help = r#"EXAMPLES
  $ adder version"#
    )]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ adder completion bash > ~/.local/share/bash-completion/completions/adder
  $ adder completion zsh > ~/.zfunc/_adder"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum PackageCommand {
    #[command(
        arg_required_else_help = true,
        about = "Validate a manifest",
        after_help = r#"EXAMPLES
  $ adder package check package.json"#
    )]
    Check {
        #[arg(help = "Manifest path (JSON)", value_hint = ValueHint::FilePath)]
        manifest: PathBuf,
    },
    #[command(
        arg_required_else_help = true,
        about = "Compute the next version",
        long_about = r#"Compute the next semantic version.

patch: backward-compatible fixes; minor: additive features; major: breaking changes.
Pre-release and build metadata are dropped."#,
        after_help = r#"EXAMPLES
  $ adder package bump package.json patch
  $ adder package bump package.json major --write"#
    )]
    Bump {
        #[arg(help = "Manifest path (JSON)", value_hint = ValueHint::FilePath)]
        manifest: PathBuf,
        #[arg(value_enum, help = "Bump kind: patch|minor|major")]
        bump: BumpCli,
        #[arg(long, help = "Rewrite the manifest's version field in place")]
        write: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BumpCli {
    Patch,
    Minor,
    Major,
}

impl From<BumpCli> for Bump {
    fn from(value: BumpCli) -> Self {
        match value {
            BumpCli::Patch => Bump::Patch,
            BumpCli::Minor => Bump::Minor,
            BumpCli::Major => Bump::Major,
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn emit_version_output(color_mode: ColorMode) {
    if io::stdout().is_terminal() {
        println!("adder {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(
            json!({
                "name": "adder",
                "version": env!("CARGO_PKG_VERSION"),
            }),
            color_mode,
        );
    }
}

fn emit_json(value: Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let pretty = is_tty || color_mode.use_color(is_tty);
    let encoded = if pretty && (value.is_object() || value.is_array()) {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    let json =
        encoded.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {}", notice.message);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn emit_precision_notice(cmd: &str, operands: &[Value], sum: &Value, color_mode: ColorMode) {
    let time = notice_time_now().unwrap_or_default();
    if let Some(notice) = precision_notice(cmd, time, operands, sum) {
        emit_notice(&notice, color_mode);
    }
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::InvalidArgument => "invalid argument".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(index) = err.index() {
        inner.insert("index".to_string(), json!(index));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(index) = err.index() {
        lines.push(format!(
            "{} {index}",
            colorize_label("operand:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);
    let Some(usage) = usage else {
        return "Try `adder --help`.".to_string();
    };

    let parts: Vec<&str> = usage
        .split_whitespace()
        .skip_while(|token| *token != "adder")
        .skip(1)
        .take_while(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
        .collect();
    if parts.is_empty() {
        return "Try `adder --help`.".to_string();
    }
    format!("Try `adder {} --help`.", parts.join(" "))
}

fn add_invalid_argument_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::InvalidArgument || err.hint().is_some() {
        return err;
    }
    err.with_hint("Fix the rejected value and retry; nothing was coerced or stored.")
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::NotFound => err.with_hint("Check that the path exists."),
        ErrorKind::Permission => {
            err.with_hint("Permission denied. Check file permissions or use a different --registry-dir.")
        }
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Internal error. Re-run with RUST_LOG=debug and report the output.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn error_json_carries_kind_index_and_hint() {
        let err = add_invalid_argument_hint(
            Error::new(ErrorKind::InvalidArgument)
                .with_message("operand must be a number, got string")
                .with_index(0),
        );
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "InvalidArgument");
        assert_eq!(value["error"]["index"], 0);
        assert!(value["error"]["hint"].is_string());
    }

    #[test]
    fn error_text_without_color_has_no_escapes() {
        let err = Error::new(ErrorKind::AlreadyExists).with_message("adder@1.0.0 is already published");
        let text = error_text(&err, false);
        assert_eq!(text, "error: adder@1.0.0 is already published");
        assert!(error_text(&err, true).contains("\u{1b}[31m"));
    }

    #[test]
    fn existing_hints_are_preserved() {
        let err = Error::new(ErrorKind::Io).with_hint("custom");
        assert_eq!(add_io_hint(err).hint(), Some("custom"));
    }
}
