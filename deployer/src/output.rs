//! Output formatting for the deployment CLI.
//!
//! Progress lines go to stderr through [`write_stderr_line`]; diagnostic
//! detail goes through the `log` facade instead.

use crate::layout::PublicUrls;
use std::io::Write;

const RULE: &str = "------------------------------------------------------";

/// Writes a single line to stderr, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// The banner printed at the start of a run.
#[must_use]
pub fn banner() -> String {
    concat!(
        "+-------------------------------------------+\n",
        "|   streameee APK Update Deployment         |\n",
        "+-------------------------------------------+"
    )
    .to_owned()
}

/// Format a byte count in mebibytes with two decimals.
///
/// # Examples
///
/// ```
/// use streameee_deployer::output::format_size_mb;
///
/// assert_eq!(format_size_mb(0), "0.00 MB");
/// assert_eq!(format_size_mb(1_048_576), "1.00 MB");
/// assert_eq!(format_size_mb(25_690_112), "24.50 MB");
/// ```
#[must_use]
pub fn format_size_mb(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    // Round to hundredths using integer arithmetic.
    let hundredths = (u128::from(bytes) * 100 + u128::from(MIB) / 2) / u128::from(MIB);
    format!("{}.{:02} MB", hundredths / 100, hundredths % 100)
}

/// Summary block printed after a successful release.
#[must_use]
pub fn summary_lines(urls: &PublicUrls) -> Vec<String> {
    vec![
        String::new(),
        "Deployment complete!".to_owned(),
        RULE.to_owned(),
        format!("Download:  {} (short link)", urls.short_link),
        format!("APK:       {}", urls.versioned),
        format!("Manifest:  {}", urls.manifest),
        RULE.to_owned(),
    ]
}
