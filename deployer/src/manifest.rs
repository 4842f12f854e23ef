//! Update manifest composition and the transient manifest file.
//!
//! The manifest is the small JSON document the app polls to learn about new
//! releases:
//!
//! ```json
//! {
//!   "version": "2.3.1",
//!   "versionCode": 14,
//!   "apkUrl": "https://streameee.com/update/streameee-v2.3.1.apk",
//!   "releaseNotes": "- Version 2.3.1",
//!   "forceUpdate": false
//! }
//! ```
//!
//! Field order is fixed by the struct declaration, so identical inputs always
//! serialize to identical bytes.

use crate::error::{DeployError, Result};
use crate::layout::ReleaseLayout;
use crate::version::ReleaseDescriptor;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// The update manifest published next to each release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManifest {
    /// The `MAJOR.MINOR.PATCH` version.
    pub version: String,
    /// The Android build code.
    pub version_code: u32,
    /// Absolute URL of the version-pinned artifact.
    pub apk_url: String,
    /// Release notes shown to the user.
    pub release_notes: String,
    /// Whether clients must install this update.
    pub force_update: bool,
}

impl UpdateManifest {
    /// Serialize as two-space indented JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails, which cannot
    /// happen for this plain data type in practice.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Default release notes used when none are supplied.
#[must_use]
pub fn default_release_notes(version: &str) -> String {
    format!("- Version {version}")
}

/// Compose the manifest for a release.
///
/// # Examples
///
/// ```
/// use streameee_deployer::layout::ReleaseLayout;
/// use streameee_deployer::manifest::compose;
/// use streameee_deployer::version::parse_descriptor;
///
/// let descriptor = parse_descriptor("version: 2.3.1+14")?;
/// let manifest = compose(&ReleaseLayout::default(), &descriptor, None, false);
/// assert_eq!(manifest.apk_url, "https://streameee.com/update/streameee-v2.3.1.apk");
/// assert_eq!(manifest.release_notes, "- Version 2.3.1");
/// # Ok::<(), streameee_deployer::error::DeployError>(())
/// ```
#[must_use]
pub fn compose(
    layout: &ReleaseLayout,
    descriptor: &ReleaseDescriptor,
    notes: Option<&str>,
    force_update: bool,
) -> UpdateManifest {
    let version = descriptor.version();
    UpdateManifest {
        version: version.to_owned(),
        version_code: descriptor.build_code(),
        apk_url: layout.versioned_artifact_url(version),
        release_notes: notes
            .filter(|n| !n.is_empty())
            .map_or_else(|| default_release_notes(version), str::to_owned),
        force_update,
    }
}

/// A manifest written to disk for upload.
///
/// The file is removed only through [`ManifestFile::remove`]. Dropping the
/// handle leaves the file in place so that failed runs can be inspected.
#[derive(Debug)]
pub struct ManifestFile {
    path: Utf8PathBuf,
}

impl ManifestFile {
    /// Write `manifest` to `path`, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::ManifestWrite`] if serialization or the write
    /// fails.
    pub fn write(path: &Utf8Path, manifest: &UpdateManifest) -> Result<Self> {
        let json = manifest
            .to_pretty_json()
            .map_err(|e| DeployError::ManifestWrite {
                path: path.to_owned(),
                source: std::io::Error::other(e),
            })?;
        std::fs::write(path, json).map_err(|source| DeployError::ManifestWrite {
            path: path.to_owned(),
            source,
        })?;
        log::debug!("wrote manifest to {path}");
        Ok(Self {
            path: path.to_owned(),
        })
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Delete the manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::ManifestWrite`] if the file cannot be removed.
    pub fn remove(self) -> Result<()> {
        std::fs::remove_file(&self.path).map_err(|source| DeployError::ManifestWrite {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("removed manifest {}", self.path);
        Ok(())
    }
}
