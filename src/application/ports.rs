//! Port trait definitions for the application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;

use anyhow::Result;

use crate::domain::ConnectError;

/// Captured output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// An open, authenticated remote shell session on one host.
#[allow(async_fn_in_trait)]
pub trait RemoteSession {
    /// Execute a command on the host and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent or the channel fails.
    /// A command that merely writes to stderr is NOT an error; the stderr
    /// text comes back in [`ExecOutput`].
    async fn exec(&mut self, command: &str) -> Result<ExecOutput>;

    /// Close the session. Called on every exit path, including after a
    /// failed command.
    ///
    /// # Errors
    ///
    /// Returns an error if the disconnect message cannot be sent.
    async fn close(&mut self) -> Result<()>;
}

/// Opens authenticated sessions, distinguishing authentication rejection
/// from transport failure so the service can drive the password fallback.
#[allow(async_fn_in_trait)]
pub trait SessionOpener {
    type Session: RemoteSession;

    /// Open a session using private-key authentication.
    ///
    /// # Errors
    ///
    /// `ConnectError::AuthRejected` when the server refused the key;
    /// `ConnectError::Other` for everything else (unreachable host,
    /// timeout, unreadable key).
    async fn open_with_key(
        &self,
        address: &str,
        username: &str,
        key_path: &Path,
    ) -> Result<Self::Session, ConnectError>;

    /// Open a session using password authentication.
    ///
    /// # Errors
    ///
    /// Same split as [`SessionOpener::open_with_key`].
    async fn open_with_password(
        &self,
        address: &str,
        username: &str,
        password: &str,
    ) -> Result<Self::Session, ConnectError>;
}

/// Abstracts operator prompts so input collection can be tested with
/// scripted answers. Sync trait — prompts block on the terminal anyway.
pub trait Prompter {
    /// Read a line of input. The returned string is trimmed and may be
    /// empty; emptiness is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be read (e.g. no TTY).
    fn input(&self, label: &str) -> Result<String>;

    /// Read a masked secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be read.
    fn secret(&self, label: &str) -> Result<String>;
}

/// Abstracts progress reporting so the service can emit events without
/// depending on the presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit a section header.
    fn header(&self, message: &str);
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit an informational message (e.g. remote command output).
    fn info(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit an error message. Reporting an error does not stop the run.
    fn error(&self, message: &str);
}
