//! Release APK build through the Flutter toolchain.
//!
//! The build is a pass-through: `flutter build apk --release` runs in the
//! project directory with inherited stdio, and any failure is fatal.

use crate::error::{DeployError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::process::{Command, ExitStatus};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `cmd` with `args` in `cwd`, streaming output to the terminal, and
    /// returns its exit status.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use streameee_deployer::builder::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let status = executor.run("flutter", &["--version"], Utf8Path::new("."))?;
    /// assert!(status.success());
    /// # Ok::<(), streameee_deployer::error::DeployError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str], cwd: &Utf8Path) -> Result<ExitStatus>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: &Utf8Path) -> Result<ExitStatus> {
        Command::new(cmd)
            .args(args)
            .current_dir(cwd)
            .status()
            .map_err(DeployError::from)
    }
}

/// The build toolchain invocation.
pub const BUILD_COMMAND: &str = "flutter";

/// Arguments passed to [`BUILD_COMMAND`].
pub const BUILD_ARGS: &[&str] = &["build", "apk", "--release"];

/// Builds the release APK for a Flutter project.
pub struct ApkBuilder<'a> {
    executor: &'a dyn CommandExecutor,
    project_dir: Utf8PathBuf,
}

impl<'a> ApkBuilder<'a> {
    /// Create a builder for the project rooted at `project_dir`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, project_dir: &Utf8Path) -> Self {
        Self {
            executor,
            project_dir: project_dir.to_owned(),
        }
    }

    /// Run the release build.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::BuildFailed`] if the toolchain cannot be started
    /// or exits unsuccessfully.
    pub fn build(&self) -> Result<()> {
        log::info!(
            "running {BUILD_COMMAND} {} in {}",
            BUILD_ARGS.join(" "),
            self.project_dir
        );
        let status = self
            .executor
            .run(BUILD_COMMAND, BUILD_ARGS, &self.project_dir)
            .map_err(|e| DeployError::BuildFailed {
                reason: format!("could not run {BUILD_COMMAND}: {e}"),
            })?;

        if !status.success() {
            return Err(DeployError::BuildFailed {
                reason: format!("{BUILD_COMMAND} exited with {status}"),
            });
        }
        Ok(())
    }
}
