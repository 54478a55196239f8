// SPDX-License-Identifier: MIT
//
// Session construction errors.

use std::io;

use thiserror::Error;

use crate::caps::UnsupportedTerminal;

/// Why a [`Session`](crate::Session) could not be started.
///
/// Whatever was acquired before the failing step has already been
/// released when this is returned.
#[derive(Error, Debug)]
pub enum InitError {
    /// The terminal device could not be opened.
    #[error("Failed to open terminal device: {0}")]
    DeviceOpen(#[source] io::Error),

    /// No capability table is known for the terminal name.
    #[error("Unsupported terminal: {0:?}")]
    UnsupportedTerminal(String),

    /// The resize notification channel could not be created.
    #[error("Failed to create resize notification channel: {0}")]
    NotificationChannel(#[source] io::Error),

    /// Raw mode, the initial screen setup or the size query failed.
    #[error("Failed to set up terminal device: {0}")]
    DeviceSetup(#[source] io::Error),
}

impl From<UnsupportedTerminal> for InitError {
    fn from(err: UnsupportedTerminal) -> Self {
        Self::UnsupportedTerminal(err.0)
    }
}
