//! Release pipeline orchestration.
//!
//! Runs the stages in a fixed forward order: optional build, artifact check,
//! version read, manifest composition, publish, cache purge and cleanup.
//! Collaborators that touch the outside world arrive through [`ReleaseDeps`]
//! so that the whole run can be exercised against stubs.

use crate::builder::{ApkBuilder, BUILD_ARGS, BUILD_COMMAND, CommandExecutor};
use crate::cdn::{CacheInvalidator, PurgeOutcome};
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::layout::{PublicUrls, ReleaseLayout, RemoteTarget};
use crate::manifest::{ManifestFile, UpdateManifest, compose};
use crate::output::{banner, format_size_mb, summary_lines, write_stderr_line};
use crate::publisher::publish;
use crate::transfer::TransferConnector;
use crate::version::{ReleaseDescriptor, read_descriptor};
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::io::Write;

/// User choices for a release run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOptions {
    /// Build the APK before publishing.
    pub build: bool,
    /// Mark the update as mandatory.
    pub force_update: bool,
    /// Release notes; `None` uses the default notes for the version.
    pub notes: Option<String>,
    /// Stop after composing the manifest.
    pub dry_run: bool,
}

/// Collaborators injected into a release run.
pub struct ReleaseDeps<'a> {
    /// Runs the build command.
    pub executor: &'a dyn CommandExecutor,
    /// Opens file-host sessions.
    pub connector: &'a dyn TransferConnector,
    /// Purges published URLs from the CDN.
    pub invalidator: CacheInvalidator<'a>,
}

/// What a completed release produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Version and build code that were released.
    pub descriptor: ReleaseDescriptor,
    /// Public URLs of the published files.
    pub urls: PublicUrls,
    /// Result of the cache purge. `Skipped` for dry runs.
    pub purge: PurgeOutcome,
    /// Size of the artifact in bytes.
    pub artifact_bytes: u64,
    /// Lowercase hex SHA-256 of the artifact.
    pub artifact_sha256: String,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Run a release for the project in `project_dir`.
///
/// Progress lines are written to `stderr`. The local manifest is deleted
/// only once every upload has succeeded; a failed run leaves it in place.
///
/// # Errors
///
/// Returns the first fatal error: [`DeployError::BuildFailed`],
/// [`DeployError::ArtifactMissing`], [`DeployError::Parse`],
/// [`DeployError::ManifestWrite`] or [`DeployError::Transfer`]. A failed
/// cache purge is not an error.
pub fn run_release(
    project_dir: &Utf8Path,
    layout: &ReleaseLayout,
    config: &DeployConfig,
    options: &ReleaseOptions,
    deps: &ReleaseDeps<'_>,
    stderr: &mut dyn Write,
) -> Result<ReleaseReport> {
    write_stderr_line(stderr, banner());
    write_stderr_line(stderr, "");

    let build_now = options.build && !options.dry_run;
    if build_now {
        write_stderr_line(stderr, "Building release APK...");
        ApkBuilder::new(deps.executor, project_dir).build()?;
    } else if options.build {
        write_stderr_line(
            stderr,
            format!("Would run: {BUILD_COMMAND} {}", BUILD_ARGS.join(" ")),
        );
    }

    let artifact = layout.artifact_in(project_dir);
    let planned_build = options.build && options.dry_run;
    if !planned_build && !artifact.is_file() {
        return Err(DeployError::ArtifactMissing { path: artifact });
    }

    let descriptor = read_descriptor(&layout.descriptor_in(project_dir))?;
    let manifest = compose(
        layout,
        &descriptor,
        options.notes.as_deref(),
        options.force_update,
    );
    announce(&manifest, stderr);

    let target = layout.remote_target(descriptor.version());
    let urls = layout.public_urls(descriptor.version());

    if options.dry_run {
        return dry_run_report(&manifest, &target, descriptor, urls, stderr);
    }

    let manifest_file = ManifestFile::write(&layout.local_manifest_in(project_dir), &manifest)?;
    let (artifact_bytes, artifact_sha256) = digest_file(&artifact)?;
    write_stderr_line(stderr, format!("APK size: {}", format_size_mb(artifact_bytes)));
    write_stderr_line(stderr, "");

    write_stderr_line(stderr, format!("Uploading to {}...", config.transfer.host));
    let published = publish(
        deps.connector,
        &config.transfer,
        &artifact,
        manifest_file.path(),
        &target,
    )?;
    for record in &published.uploaded {
        write_stderr_line(stderr, format!("  uploaded {}", record.remote_path));
    }

    let purge = deps.invalidator.purge_outcome(&urls.purge_set());
    match &purge {
        PurgeOutcome::Purged => write_stderr_line(stderr, "CDN cache purged"),
        PurgeOutcome::Failed { reason } => {
            write_stderr_line(stderr, format!("Warning: CDN cache purge failed: {reason}"));
        }
        PurgeOutcome::Skipped => {}
    }

    for line in summary_lines(&urls) {
        write_stderr_line(stderr, line);
    }
    write_stderr_line(stderr, format!("SHA-256:   {artifact_sha256}"));

    manifest_file.remove()?;

    Ok(ReleaseReport {
        descriptor,
        urls,
        purge,
        artifact_bytes,
        artifact_sha256,
        dry_run: false,
    })
}

fn announce(manifest: &UpdateManifest, stderr: &mut dyn Write) {
    write_stderr_line(
        stderr,
        format!("Version: {} (code {})", manifest.version, manifest.version_code),
    );
    write_stderr_line(stderr, format!("Notes: {}", manifest.release_notes));
    if manifest.force_update {
        write_stderr_line(stderr, "Force update: enabled");
    }
}

fn dry_run_report(
    manifest: &UpdateManifest,
    target: &RemoteTarget,
    descriptor: ReleaseDescriptor,
    urls: PublicUrls,
    stderr: &mut dyn Write,
) -> Result<ReleaseReport> {
    let json = manifest
        .to_pretty_json()
        .map_err(|e| DeployError::Parse {
            reason: format!("cannot encode manifest: {e}"),
        })?;

    write_stderr_line(stderr, "");
    write_stderr_line(stderr, "Dry run: no files will be written or uploaded.");
    write_stderr_line(stderr, "Manifest:");
    write_stderr_line(stderr, json);
    write_stderr_line(stderr, "Remote paths:");
    for path in [
        &target.stable_artifact_path,
        &target.versioned_artifact_path,
        &target.manifest_path,
    ] {
        write_stderr_line(stderr, format!("  {path}"));
    }

    Ok(ReleaseReport {
        descriptor,
        urls,
        purge: PurgeOutcome::Skipped,
        artifact_bytes: 0,
        artifact_sha256: String::new(),
        dry_run: true,
    })
}

/// Size and SHA-256 of the file at `path`.
fn digest_file(path: &Utf8Path) -> Result<(u64, String)> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let total = std::io::copy(&mut file, &mut hasher)?;
    Ok((total, format!("{:x}", hasher.finalize())))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
