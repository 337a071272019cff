//! Configuration for roslyn-probe.
//!
//! Loaded from `~/.roslyn-probe/config.toml` when present. Every field is
//! optional; accessors on [`ProbeConfig`] apply the defaults.
//!
//! ```toml
//! [server]
//! path = "${HOME}/roslyn/Microsoft.CodeAnalysis.LanguageServer.dll"
//! args = ["--logLevel", "Information"]
//! launcher = "/usr/local/share/dotnet/dotnet"
//! language_id = "csharp"
//!
//! [output]
//! max_tokens = 200
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the language server DLL or executable.
/// Takes precedence over `[server].path` when it names an existing file.
pub const SERVER_PATH_ENV: &str = "ROSLYN_LSP_PATH";

pub const DEFAULT_LANGUAGE_ID: &str = "csharp";
pub const DEFAULT_MAX_TOKENS: usize = 200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeConfig {
    pub server: Option<ServerConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Language server DLL (run through the launcher) or native executable.
    /// `${VAR}` references are expanded.
    pub path: Option<String>,
    /// Extra arguments appended after the server path.
    #[serde(default)]
    pub args: Vec<String>,
    /// Program used to run a `.dll` server. Defaults to `dotnet` on `PATH`.
    pub launcher: Option<String>,
    /// `languageId` sent with `textDocument/didOpen`.
    pub language_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Maximum number of tokens printed after the summary line.
    pub max_tokens: Option<usize>,
}

impl ProbeConfig {
    /// Load the config file. `Ok(None)` when there is no home directory or
    /// no config file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Configured server path with `${VAR}` references expanded.
    #[must_use]
    pub fn server_path(&self) -> Option<PathBuf> {
        self.server
            .as_ref()
            .and_then(|server| server.path.as_deref())
            .map(expand_env_vars)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
    }

    #[must_use]
    pub fn server_args(&self) -> &[String] {
        self.server
            .as_ref()
            .map(|server| server.args.as_slice())
            .unwrap_or_default()
    }

    /// Configured launcher with `${VAR}` references expanded.
    #[must_use]
    pub fn launcher(&self) -> Option<PathBuf> {
        self.server
            .as_ref()
            .and_then(|server| server.launcher.as_deref())
            .map(expand_env_vars)
            .filter(|launcher| !launcher.trim().is_empty())
            .map(PathBuf::from)
    }

    #[must_use]
    pub fn language_id(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|server| server.language_id.as_deref())
            .unwrap_or(DEFAULT_LANGUAGE_ID)
    }

    #[must_use]
    pub fn max_tokens(&self) -> usize {
        self.output
            .as_ref()
            .and_then(|output| output.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".roslyn-probe").join("config.toml"))
}

/// Replace `${VAR}` with the value of `VAR` (empty when unset).
///
/// Unclosed `${` and empty `${}` are kept verbatim.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(0) => {
                out.push_str("${}");
                rest = &after[1..];
            }
            Some(end) => {
                out.push_str(&env::var(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
