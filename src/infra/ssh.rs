//! SSH session adapter built on russh.
//!
//! Implements the `SessionOpener` / `RemoteSession` ports with a real SSH
//! client: key or password authentication, command execution with captured
//! stdout/stderr, and an explicit disconnect.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use russh::client;
use russh::{ChannelMsg, Disconnect};
use russh_keys::key;

use crate::application::ports::{ExecOutput, RemoteSession, SessionOpener};
use crate::domain::ConnectError;

/// Every target is reached on the standard SSH port; addresses are opaque
/// strings with no port component.
pub const SSH_PORT: u16 = 22;

/// Upper bound on the TCP connect + SSH handshake. Command execution is
/// deliberately unbounded; see DESIGN.md.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Accepts whatever host key the server presents, like `ssh` with
/// `StrictHostKeyChecking=accept-new` on a first connection. The fleet is
/// freshly imaged when this tool runs, so there is nothing to pin against.
struct AcceptHostKey;

#[async_trait]
impl client::Handler for AcceptHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Production `SessionOpener` backed by russh.
pub struct RusshOpener {
    config: Arc<client::Config>,
}

impl RusshOpener {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Arc::new(client::Config::default()),
        }
    }

    /// Establishes the transport and key exchange, bounded by
    /// [`CONNECT_TIMEOUT`]. Authentication happens afterwards.
    async fn handshake(&self, address: &str) -> Result<client::Handle<AcceptHostKey>, ConnectError> {
        let connect = client::connect(Arc::clone(&self.config), (address, SSH_PORT), AcceptHostKey);
        match tokio::time::timeout(CONNECT_TIMEOUT, connect).await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(e)) => Err(ConnectError::Other(
                anyhow::Error::new(e).context(format!("connecting to {address}")),
            )),
            Err(_) => Err(ConnectError::Other(anyhow!(
                "connection to {address} timed out after {}s",
                CONNECT_TIMEOUT.as_secs()
            ))),
        }
    }
}

impl Default for RusshOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionOpener for RusshOpener {
    type Session = RusshSession;

    async fn open_with_key(
        &self,
        address: &str,
        username: &str,
        key_path: &Path,
    ) -> Result<RusshSession, ConnectError> {
        let key_pair = russh_keys::load_secret_key(key_path, None)
            .with_context(|| format!("loading private key {}", key_path.display()))
            .map_err(ConnectError::Other)?;

        let mut handle = self.handshake(address).await?;
        let authenticated = handle
            .authenticate_publickey(username, Arc::new(key_pair))
            .await
            .map_err(|e| ConnectError::Other(anyhow::Error::new(e).context("key authentication")))?;
        if !authenticated {
            return Err(ConnectError::AuthRejected);
        }
        Ok(RusshSession { handle })
    }

    async fn open_with_password(
        &self,
        address: &str,
        username: &str,
        password: &str,
    ) -> Result<RusshSession, ConnectError> {
        let mut handle = self.handshake(address).await?;
        let authenticated = handle
            .authenticate_password(username, password)
            .await
            .map_err(|e| {
                ConnectError::Other(anyhow::Error::new(e).context("password authentication"))
            })?;
        if !authenticated {
            return Err(ConnectError::AuthRejected);
        }
        Ok(RusshSession { handle })
    }
}

/// An authenticated session on one host.
pub struct RusshSession {
    handle: client::Handle<AcceptHostKey>,
}

impl RemoteSession for RusshSession {
    async fn exec(&mut self, command: &str) -> Result<ExecOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .context("opening exec channel")?;
        channel
            .exec(true, command)
            .await
            .context("starting remote command")?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(&data[..]),
                // ext 1 is the SSH stderr stream
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(&data[..]),
                _ => {}
            }
        }

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    async fn close(&mut self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .context("closing session")?;
        Ok(())
    }
}
