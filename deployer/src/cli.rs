//! CLI argument definitions for the deployment tool.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::Parser;

/// Publish a streameee APK release.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "streameee-deploy")]
#[command(version, about)]
#[command(long_about = concat!(
    "Publish a streameee APK release.\n\n",
    "Reads the version from pubspec.yaml, writes update-manifest.json, uploads ",
    "the release APK and manifest to the FTP host, and purges the published ",
    "URLs from the Cloudflare cache when credentials are configured.\n\n",
    "Credentials are read from .env.ftp in the project directory; environment ",
    "variables with the same names take precedence.",
))]
#[command(after_help = concat!(
    "CONFIGURATION (.env.ftp):\n",
    "  FTP_HOST, FTP_USER, FTP_PASSWORD   required\n",
    "  FTP_PORT                           default 21\n",
    "  FTP_SECURE                         \"true\" enables explicit FTPS\n",
    "  CLOUDFLARE_ZONE_ID                 optional, enables cache purge\n",
    "  CLOUDFLARE_API_TOKEN               optional, enables cache purge\n\n",
    "EXAMPLES:\n",
    "  Upload an already built APK:\n",
    "    $ streameee-deploy\n\n",
    "  Build, then upload:\n",
    "    $ streameee-deploy --build\n\n",
    "  Mandatory update with custom notes:\n",
    "    $ streameee-deploy --force --notes \"- Fixes playback on 4K sticks\"\n\n",
    "  Preview the manifest and remote paths:\n",
    "    $ streameee-deploy --dry-run",
))]
pub struct Cli {
    /// Build the release APK with `flutter build apk --release` first.
    #[arg(long)]
    pub build: bool,

    /// Mark the update as mandatory for clients.
    #[arg(long)]
    pub force: bool,

    /// Release notes [default: "- Version <version>"].
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    pub notes: Option<String>,

    /// Compose the manifest and show the plan without uploading.
    #[arg(long)]
    pub dry_run: bool,

    /// Flutter project directory [default: current directory].
    #[arg(short = 'C', long, value_name = "DIR")]
    pub project_dir: Option<Utf8PathBuf>,

    /// Credentials file [default: <project-dir>/.env.ftp].
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
