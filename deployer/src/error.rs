//! Error types for the streameee deployment CLI.
//!
//! Every variant here is fatal: the binary prints the message and exits with
//! status 1. Cache purge failures are reported as warnings and have no
//! variant here.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort a release run.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Required configuration keys are absent or empty.
    #[error("missing configuration: {keys}; create .env.ftp (see .env.ftp.example)")]
    ConfigMissing {
        /// Comma-separated list of the missing keys.
        keys: String,
    },

    /// A configuration value is present but cannot be used.
    #[error("invalid configuration value for {key}: {reason}")]
    ConfigInvalid {
        /// The offending key.
        key: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// The project descriptor does not carry a usable version line.
    #[error("could not read version: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },

    /// The external build toolchain failed.
    #[error("APK build failed: {reason}")]
    BuildFailed {
        /// Description of the failure, including the exit status if any.
        reason: String,
    },

    /// The release artifact is not where the build puts it.
    #[error("APK not found at {path}; build it first with --build")]
    ArtifactMissing {
        /// Path that was checked.
        path: Utf8PathBuf,
    },

    /// The transient manifest could not be written or removed.
    #[error("manifest file {path} could not be written or removed")]
    ManifestWrite {
        /// Path of the manifest file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A file-transfer step failed.
    #[error("FTP {step} failed: {reason}")]
    Transfer {
        /// Human-readable name of the failed step.
        step: String,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`DeployError`].
pub type Result<T> = std::result::Result<T, DeployError>;
