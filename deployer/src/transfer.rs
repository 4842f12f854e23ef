//! File-transfer abstraction used by the publisher.
//!
//! The publisher speaks to the remote host through [`TransferConnector`] and
//! [`TransferSession`] so that tests can inject recording or failing sessions
//! without network access. [`SessionGuard`] ties the connection lifetime to a
//! scope: the session is closed exactly once when the guard is dropped,
//! whichever way the scope is left.

use crate::config::TransferCredentials;
use camino::Utf8Path;

/// Errors arising from file-transfer operations.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The control connection or login failed.
    #[error("cannot connect to {address}: {reason}")]
    Connect {
        /// `host:port` that was dialled.
        address: String,
        /// Description of the failure.
        reason: String,
    },

    /// The server rejected a command.
    #[error("{command} {path}: {reason}")]
    Command {
        /// The operation that failed (for example `MKD` or `STOR`).
        command: &'static str,
        /// The remote path involved.
        path: String,
        /// The server's reply or client-side error.
        reason: String,
    },

    /// A local file could not be read.
    #[error("cannot read local file: {0}")]
    Io(#[from] std::io::Error),
}

/// An open connection to the remote file host.
#[cfg_attr(test, mockall::automock)]
pub trait TransferSession {
    /// Make sure the absolute remote directory `path` exists, creating any
    /// missing segments.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment cannot be created or entered.
    fn ensure_dir(&mut self, path: &str) -> Result<(), TransferError>;

    /// Upload the local file to the absolute remote path, overwriting any
    /// existing file, and return the number of bytes sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the local file cannot be read or the server
    /// rejects the transfer.
    fn upload(&mut self, local: &Utf8Path, remote: &str) -> Result<u64, TransferError>;

    /// Close the connection. Failures are ignored.
    fn close(&mut self);
}

/// Opens sessions to the remote file host.
#[cfg_attr(test, mockall::automock)]
pub trait TransferConnector {
    /// Connect and authenticate.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Connect`] if the host is unreachable or the
    /// login is rejected.
    fn connect(
        &self,
        credentials: &TransferCredentials,
    ) -> Result<Box<dyn TransferSession>, TransferError>;
}

/// Owns a session and closes it when dropped.
pub struct SessionGuard {
    session: Box<dyn TransferSession>,
}

impl SessionGuard {
    /// Take ownership of an open session.
    #[must_use]
    pub fn new(session: Box<dyn TransferSession>) -> Self {
        Self { session }
    }

    /// Borrow the underlying session.
    pub fn session(&mut self) -> &mut dyn TransferSession {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        log::debug!("closing transfer session");
        self.session.close();
    }
}
