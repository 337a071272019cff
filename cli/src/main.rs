//! roslyn-probe - print the semantic tokens a C# language server reports for
//! one file.
//!
//! # Pipeline
//!
//! ```text
//! args -> ProbeConfig::load -> locate::resolve_server_command -> Connection::spawn
//!      -> session::probe_semantic_tokens -> Connection::terminate -> report::render
//! ```
//!
//! The server is always terminated before the report (or the error) is
//! printed. Logs go to stderr, filtered by `RUST_LOG` (default `warn`).

mod locate;
mod report;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::{env, fs};

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use probe_config::ProbeConfig;
use probe_lsp::{Connection, SessionError, TargetDocument, TransportError, protocol, session};

const USAGE: &str = "Usage: roslyn-probe /path/to/file.cs";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    // stdout carries the report; keep logs on stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Exactly one argument: the file to probe.
fn parse_args<I>(args: I) -> Result<PathBuf, &'static str>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(path), None) => Ok(PathBuf::from(path)),
        _ => Err(USAGE),
    }
}

fn resolve_target(arg: &Path) -> Result<PathBuf> {
    let path = std::path::absolute(arg)
        .with_context(|| format!("resolving {}", arg.display()))?;
    if !path.is_file() {
        bail!("File not found: {}", path.display());
    }
    Ok(path)
}

/// Top-level message for failures the user can act on.
fn failure_summary(err: &SessionError) -> Option<&'static str> {
    match err {
        SessionError::Transport(TransportError::NoResponse { method, .. }) => {
            match method.as_str() {
                protocol::INITIALIZE => Some("No initialize response."),
                protocol::SEMANTIC_TOKENS_FULL => Some("No semantic tokens response received."),
                _ => None,
            }
        }
        _ => None,
    }
}

async fn run(arg: &Path) -> Result<String> {
    let file_path = resolve_target(arg)?;
    let source = fs::read_to_string(&file_path)
        .with_context(|| format!("reading {}", file_path.display()))?;

    // A broken config file is logged and ignored, like a missing one.
    let config = ProbeConfig::load().ok().flatten().unwrap_or_default();

    let command = locate::resolve_server_command(&config)?;
    let document = TargetDocument::new(&file_path, config.language_id(), source)?;

    let mut connection = Connection::spawn(&command)?;
    tracing::info!(
        file = %file_path.display(),
        pid = connection.pid(),
        "Requesting semantic tokens"
    );

    let outcome = session::probe_semantic_tokens(connection.transport(), &document).await;
    connection.terminate().await;

    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            let summary = failure_summary(&err);
            let err = anyhow::Error::new(err);
            return Err(match summary {
                Some(summary) => err.context(summary),
                None => err.context("semantic token probe failed"),
            });
        }
    };

    Ok(report::render(report.tokens(), config.max_tokens()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let arg = match parse_args(env::args_os().skip(1)) {
        Ok(arg) => arg,
        Err(usage) => {
            eprintln!("{usage}");
            return ExitCode::FAILURE;
        }
    };

    match run(&arg).await {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn parse_args_accepts_exactly_one() {
        assert_eq!(
            parse_args(os_args(&["/src/Program.cs"])),
            Ok(PathBuf::from("/src/Program.cs"))
        );
    }

    #[test]
    fn parse_args_rejects_missing_and_extra() {
        assert_eq!(parse_args(os_args(&[])), Err(USAGE));
        assert_eq!(parse_args(os_args(&["a.cs", "b.cs"])), Err(USAGE));
    }

    #[test]
    fn resolve_target_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_target(&dir.path().join("Missing.cs")).unwrap_err();
        assert!(err.to_string().starts_with("File not found: "));
    }

    #[test]
    fn resolve_target_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_target(dir.path()).is_err());
    }

    #[test]
    fn resolve_target_existing_file_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Program.cs");
        fs::write(&file, "class C {}").unwrap();
        let resolved = resolve_target(&file).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, file);
    }

    #[test]
    fn failure_summary_names_missing_response() {
        let err = SessionError::Transport(TransportError::NoResponse {
            id: 2,
            method: protocol::SEMANTIC_TOKENS_FULL.to_string(),
        });
        assert_eq!(
            failure_summary(&err),
            Some("No semantic tokens response received.")
        );

        let err = SessionError::Transport(TransportError::NoResponse {
            id: 1,
            method: protocol::INITIALIZE.to_string(),
        });
        assert_eq!(failure_summary(&err), Some("No initialize response."));
    }

    #[test]
    fn failure_summary_ignores_other_errors() {
        let err = SessionError::Decode(probe_lsp::DecodeError::MalformedTokenData { len: 3 });
        assert_eq!(failure_summary(&err), None);
    }
}
