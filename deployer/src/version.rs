//! Release version extraction from the Flutter project descriptor.
//!
//! The descriptor (`pubspec.yaml`) carries a line such as
//! `version: 2.3.1+14`, where the part before `+` is the user-visible version
//! and the part after it is the monotonically increasing Android build code.

use crate::error::{DeployError, Result};
use camino::Utf8Path;
use std::fmt;

/// Version information read from the project descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    version: String,
    build_code: u32,
}

impl ReleaseDescriptor {
    /// The `MAJOR.MINOR.PATCH` version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The positive build code.
    #[must_use]
    pub fn build_code(&self) -> u32 {
        self.build_code
    }
}

impl fmt::Display for ReleaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.version, self.build_code)
    }
}

/// Read and parse the descriptor at `path`.
///
/// # Errors
///
/// Returns [`DeployError::Parse`] if the file cannot be read or carries no
/// valid version line.
pub fn read_descriptor(path: &Utf8Path) -> Result<ReleaseDescriptor> {
    let contents = std::fs::read_to_string(path).map_err(|e| DeployError::Parse {
        reason: format!("cannot read {path}: {e}"),
    })?;
    parse_descriptor(&contents)
}

/// Parse the first `version: X.Y.Z+N` line of a descriptor.
///
/// Text after the build digits is ignored.
///
/// # Errors
///
/// Returns [`DeployError::Parse`] when no line matches, or when the build code
/// is zero or does not fit in a `u32`.
///
/// # Examples
///
/// ```
/// use streameee_deployer::version::parse_descriptor;
///
/// let descriptor = parse_descriptor("name: app\nversion: 2.3.1+14\n")?;
/// assert_eq!(descriptor.version(), "2.3.1");
/// assert_eq!(descriptor.build_code(), 14);
/// # Ok::<(), streameee_deployer::error::DeployError>(())
/// ```
pub fn parse_descriptor(contents: &str) -> Result<ReleaseDescriptor> {
    let (version, build_digits) = contents
        .lines()
        .find_map(match_version_line)
        .ok_or_else(|| DeployError::Parse {
            reason: "no `version: X.Y.Z+N` line in descriptor".to_owned(),
        })?;

    let build_code: u32 = build_digits.parse().map_err(|_| DeployError::Parse {
        reason: format!("build code {build_digits} is out of range"),
    })?;
    if build_code == 0 {
        return Err(DeployError::Parse {
            reason: "build code must be positive".to_owned(),
        });
    }

    Ok(ReleaseDescriptor {
        version: version.to_owned(),
        build_code,
    })
}

/// Match one line against `^version:\s*(\d+\.\d+\.\d+)\+(\d+)`.
fn match_version_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("version:")?.trim_start();
    let (version, after_plus) = rest.split_once('+')?;
    if !is_numeric_triplet(version) {
        return None;
    }
    let digits_len = after_plus
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after_plus.len());
    let build = after_plus.get(..digits_len)?;
    if build.is_empty() {
        return None;
    }
    Some((version, build))
}

fn is_numeric_triplet(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}
