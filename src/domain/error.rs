//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator.

use thiserror::Error;

use crate::domain::role::Role;

/// Errors from session establishment.
///
/// Only `AuthRejected` triggers the password fallback; everything else
/// fails the target and the run moves on to the next one.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("authentication rejected")]
    AuthRejected,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Fatal operator-input errors. These abort the whole run before any
/// session is opened.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("IP address for {0} cannot be empty")]
    EmptyAddress(Role),

    #[error("Username cannot be empty")]
    EmptyUsername,
}
