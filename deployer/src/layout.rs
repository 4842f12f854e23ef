//! Fixed naming scheme for a streameee release.
//!
//! The remote directory structure, public host, and local build paths are
//! constants of the deployment. They are gathered into [`ReleaseLayout`] so
//! that each stage receives them explicitly instead of reaching for globals.

use camino::{Utf8Path, Utf8PathBuf};

/// Local and remote paths that make up the deployment layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLayout {
    /// Public host serving the uploaded files.
    pub public_host: String,
    /// Application name used in artifact file names.
    pub app_name: String,
    /// Remote directory holding the manifest and version-pinned artifacts.
    pub remote_update_dir: String,
    /// Remote directory holding the stable download artifact.
    pub remote_download_dir: String,
    /// Remote manifest file name inside the update directory.
    pub remote_manifest_name: String,
    /// Artifact path relative to the project root, as produced by the build.
    pub artifact_path: Utf8PathBuf,
    /// Project descriptor path relative to the project root.
    pub descriptor_path: Utf8PathBuf,
    /// Transient manifest path relative to the project root.
    pub local_manifest_path: Utf8PathBuf,
    /// Credentials file relative to the project root.
    pub env_file: Utf8PathBuf,
}

impl Default for ReleaseLayout {
    fn default() -> Self {
        Self {
            public_host: "streameee.com".to_owned(),
            app_name: "streameee".to_owned(),
            remote_update_dir: "/streameee/update".to_owned(),
            remote_download_dir: "/streameee/dl".to_owned(),
            remote_manifest_name: "manifest.json".to_owned(),
            artifact_path: Utf8PathBuf::from("build/app/outputs/flutter-apk/app-release.apk"),
            descriptor_path: Utf8PathBuf::from("pubspec.yaml"),
            local_manifest_path: Utf8PathBuf::from("update-manifest.json"),
            env_file: Utf8PathBuf::from(".env.ftp"),
        }
    }
}

impl ReleaseLayout {
    /// File name of the version-pinned artifact, e.g. `streameee-v2.3.1.apk`.
    ///
    /// # Examples
    ///
    /// ```
    /// use streameee_deployer::layout::ReleaseLayout;
    ///
    /// let layout = ReleaseLayout::default();
    /// assert_eq!(layout.versioned_artifact_name("2.3.1"), "streameee-v2.3.1.apk");
    /// ```
    #[must_use]
    pub fn versioned_artifact_name(&self, version: &str) -> String {
        format!("{}-v{version}.apk", self.app_name)
    }

    /// File name of the stable artifact, e.g. `streameee.apk`.
    #[must_use]
    pub fn stable_artifact_name(&self) -> String {
        format!("{}.apk", self.app_name)
    }

    /// Public URL of the version-pinned artifact.
    #[must_use]
    pub fn versioned_artifact_url(&self, version: &str) -> String {
        format!(
            "https://{}/update/{}",
            self.public_host,
            self.versioned_artifact_name(version)
        )
    }

    /// Derive the remote destination paths for the given version.
    #[must_use]
    pub fn remote_target(&self, version: &str) -> RemoteTarget {
        RemoteTarget {
            update_dir: self.remote_update_dir.clone(),
            download_dir: self.remote_download_dir.clone(),
            stable_artifact_path: join_remote(
                &self.remote_download_dir,
                &self.stable_artifact_name(),
            ),
            versioned_artifact_path: join_remote(
                &self.remote_update_dir,
                &self.versioned_artifact_name(version),
            ),
            manifest_path: join_remote(&self.remote_update_dir, &self.remote_manifest_name),
        }
    }

    /// Derive the public URLs for the given version.
    #[must_use]
    pub fn public_urls(&self, version: &str) -> PublicUrls {
        let host = &self.public_host;
        PublicUrls {
            stable: format!("https://{host}/dl/{}", self.stable_artifact_name()),
            versioned: self.versioned_artifact_url(version),
            manifest: format!("https://{host}/update/{}", self.remote_manifest_name),
            short_link: format!("https://{host}/app"),
        }
    }

    /// Resolve the artifact path against a project root.
    #[must_use]
    pub fn artifact_in(&self, project_dir: &Utf8Path) -> Utf8PathBuf {
        project_dir.join(&self.artifact_path)
    }

    /// Resolve the descriptor path against a project root.
    #[must_use]
    pub fn descriptor_in(&self, project_dir: &Utf8Path) -> Utf8PathBuf {
        project_dir.join(&self.descriptor_path)
    }

    /// Resolve the transient manifest path against a project root.
    #[must_use]
    pub fn local_manifest_in(&self, project_dir: &Utf8Path) -> Utf8PathBuf {
        project_dir.join(&self.local_manifest_path)
    }

    /// Resolve the credentials file against a project root.
    #[must_use]
    pub fn env_file_in(&self, project_dir: &Utf8Path) -> Utf8PathBuf {
        project_dir.join(&self.env_file)
    }
}

/// Remote destination paths for one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Directory holding the manifest and version-pinned artifacts.
    pub update_dir: String,
    /// Directory holding the stable artifact.
    pub download_dir: String,
    /// Stable artifact path, overwritten by every release.
    pub stable_artifact_path: String,
    /// Version-pinned artifact path, unique per version.
    pub versioned_artifact_path: String,
    /// Manifest path, overwritten by every release.
    pub manifest_path: String,
}

/// Public HTTPS URLs for the files of one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrls {
    /// URL of the stable artifact.
    pub stable: String,
    /// URL of the version-pinned artifact.
    pub versioned: String,
    /// URL of the manifest.
    pub manifest: String,
    /// Short download link served by the web host.
    pub short_link: String,
}

impl PublicUrls {
    /// URLs whose cached copies go stale after a release.
    #[must_use]
    pub fn purge_set(&self) -> Vec<String> {
        vec![
            self.stable.clone(),
            self.manifest.clone(),
            self.versioned.clone(),
        ]
    }
}

/// Join a remote directory and file name with a single `/`.
fn join_remote(dir: &str, name: &str) -> String {
    format!("{}/{name}", dir.trim_end_matches('/'))
}
