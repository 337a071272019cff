//! Public types shared with the CLI.
//!
//! The CLI resolves where the language server lives and hands the result to
//! [`Connection::spawn`](crate::Connection::spawn) as a [`ServerCommand`].

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// A fully resolved command line for a language server.
///
/// Fields are private; construction goes through [`ServerCommand::new`] so the
/// program is always a concrete path or name, never an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ServerCommand {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    #[must_use]
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
