//! Upload of the artifact and manifest to the remote file host.
//!
//! Publishing is a fixed, strictly sequential list of steps over a single
//! connection. The first failing step aborts the sequence; the connection is
//! closed exactly once on every exit path by [`SessionGuard`].

use crate::config::TransferCredentials;
use crate::error::{DeployError, Result};
use crate::layout::RemoteTarget;
use crate::transfer::{SessionGuard, TransferConnector, TransferError, TransferSession};
use camino::Utf8Path;
use std::fmt;

/// One step of the publish sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    /// Opening and authenticating the connection.
    Connect,
    /// Ensuring the update directory exists.
    EnsureUpdateDir,
    /// Ensuring the download directory exists.
    EnsureDownloadDir,
    /// Uploading the artifact to the stable download path.
    UploadStable,
    /// Uploading the artifact to the version-pinned path.
    UploadVersioned,
    /// Uploading the manifest.
    UploadManifest,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connect => "connect",
            Self::EnsureUpdateDir => "create update directory",
            Self::EnsureDownloadDir => "create download directory",
            Self::UploadStable => "upload of stable APK",
            Self::UploadVersioned => "upload of versioned APK",
            Self::UploadManifest => "upload of manifest",
        };
        f.write_str(label)
    }
}

/// A file that reached the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    /// Remote path written.
    pub remote_path: String,
    /// Bytes sent.
    pub bytes: u64,
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishResult {
    /// Uploads in the order they happened.
    pub uploaded: Vec<UploadRecord>,
}

/// Publish `artifact` and `manifest` to the paths in `target`.
///
/// # Errors
///
/// Returns [`DeployError::Transfer`] naming the first step that failed. No
/// later step is attempted.
pub fn publish(
    connector: &dyn TransferConnector,
    credentials: &TransferCredentials,
    artifact: &Utf8Path,
    manifest: &Utf8Path,
    target: &RemoteTarget,
) -> Result<PublishResult> {
    log::info!("connecting to {}", credentials.address());
    let session = connector
        .connect(credentials)
        .map_err(|e| step_error(PublishStep::Connect, &e))?;
    let mut guard = SessionGuard::new(session);

    run_steps(guard.session(), artifact, manifest, target)
}

fn run_steps(
    session: &mut dyn TransferSession,
    artifact: &Utf8Path,
    manifest: &Utf8Path,
    target: &RemoteTarget,
) -> Result<PublishResult> {
    let mut result = PublishResult::default();

    ensure(session, PublishStep::EnsureUpdateDir, &target.update_dir)?;
    ensure(session, PublishStep::EnsureDownloadDir, &target.download_dir)?;

    let uploads = [
        (PublishStep::UploadStable, artifact, &target.stable_artifact_path),
        (PublishStep::UploadVersioned, artifact, &target.versioned_artifact_path),
        (PublishStep::UploadManifest, manifest, &target.manifest_path),
    ];
    for (step, local, remote) in uploads {
        log::info!("uploading {local} to {remote}");
        let bytes = session
            .upload(local, remote)
            .map_err(|e| step_error(step, &e))?;
        result.uploaded.push(UploadRecord {
            remote_path: remote.clone(),
            bytes,
        });
    }

    Ok(result)
}

fn ensure(session: &mut dyn TransferSession, step: PublishStep, dir: &str) -> Result<()> {
    log::info!("ensuring remote directory {dir}");
    session.ensure_dir(dir).map_err(|e| step_error(step, &e))
}

fn step_error(step: PublishStep, err: &TransferError) -> DeployError {
    DeployError::Transfer {
        step: step.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
