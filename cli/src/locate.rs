//! Finding the language server and the command line that launches it.
//!
//! Lookup order for the server path:
//! 1. `ROSLYN_LSP_PATH`, when it names an existing file.
//! 2. `[server].path` from the config file, when it exists.
//! 3. The first `Microsoft.CodeAnalysis.LanguageServer.dll` under the
//!    wrapper cache (`~/.cache/roslyn-wrapper/Microsoft.CodeAnalysis.LanguageServer`).
//!
//! A `.dll` is run through the launcher (`dotnet`); anything else runs directly.

use std::env;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;

use probe_config::{ProbeConfig, SERVER_PATH_ENV};
use probe_lsp::ServerCommand;

pub const SERVER_DLL_NAME: &str = "Microsoft.CodeAnalysis.LanguageServer.dll";
const LAUNCHER_NAME: &str = "dotnet";

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Could not locate Roslyn Language Server. Set ROSLYN_LSP_PATH or run wrapper first.")]
    ServerNotFound,
    #[error("dotnet CLI not found on PATH.")]
    LauncherNotFound(#[source] which::Error),
}

/// Candidate locations, in priority order.
#[derive(Debug, Default)]
pub struct SearchPaths {
    env_override: Option<PathBuf>,
    configured: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
}

impl SearchPaths {
    pub fn from_env(config: &ProbeConfig) -> Self {
        Self {
            env_override: env::var_os(SERVER_PATH_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            configured: config.server_path(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".cache")
            .join("roslyn-wrapper")
            .join("Microsoft.CodeAnalysis.LanguageServer")
    })
}

pub fn find_server(paths: &SearchPaths) -> Result<PathBuf, LocateError> {
    let explicit = [&paths.env_override, &paths.configured]
        .into_iter()
        .flatten()
        .find(|path| {
            let exists = path.is_file();
            if !exists {
                tracing::debug!(path = %path.display(), "Skipping missing server path");
            }
            exists
        })
        .cloned();

    explicit
        .or_else(|| paths.cache_dir.as_deref().and_then(find_server_dll))
        .ok_or(LocateError::ServerNotFound)
}

/// First server DLL under `root`, walking entries in file-name order.
fn find_server_dll(root: &Path) -> Option<PathBuf> {
    if !root.is_dir() {
        return None;
    }

    WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_some_and(|ft| ft.is_file())
                && entry.file_name() == SERVER_DLL_NAME
        })
        .map(ignore::DirEntry::into_path)
}

fn is_dll(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dll"))
}

/// Build the command line for `server`, appending configured arguments.
pub fn server_command(server: &Path, config: &ProbeConfig) -> Result<ServerCommand, LocateError> {
    let command = if is_dll(server) {
        let launcher = match config.launcher() {
            Some(launcher) => launcher,
            None => which::which(LAUNCHER_NAME).map_err(LocateError::LauncherNotFound)?,
        };
        ServerCommand::new(launcher).arg(server)
    } else {
        ServerCommand::new(server)
    };

    Ok(command.args(config.server_args()))
}

pub fn resolve_server_command(config: &ProbeConfig) -> Result<ServerCommand, LocateError> {
    let server = find_server(&SearchPaths::from_env(config))?;
    let command = server_command(&server, config)?;
    tracing::debug!(%command, "Resolved language server");
    Ok(command)
}
