//! The operator-supplied hook command line.

use std::ffi::{OsStr, OsString};
use std::fmt;

/// Program and arguments run for every lifecycle event.
///
/// Arguments are passed through verbatim; the event itself travels only in
/// the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl HookCommand {
    /// Creates a command from a program and its arguments.
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits an argument vector into program and arguments.
    ///
    /// Returns `None` when `argv` is empty.
    pub fn from_argv<I>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut tokens = argv.into_iter();
        let program = tokens.next()?;
        Some(Self {
            program,
            args: tokens.collect(),
        })
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for HookCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
