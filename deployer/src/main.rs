//! streameee release CLI entrypoint.
//!
//! This binary publishes a built APK together with its update manifest,
//! optionally building it first and purging the CDN cache afterwards.

use camino::Utf8PathBuf;
use clap::Parser;
use clap::error::ErrorKind;
use std::io::Write;
use streameee_deployer::builder::SystemCommandExecutor;
use streameee_deployer::cdn::{CacheInvalidator, UreqTransport};
use streameee_deployer::cli::Cli;
use streameee_deployer::config::DeployConfig;
use streameee_deployer::error::{DeployError, Result};
use streameee_deployer::ftp::FtpConnector;
use streameee_deployer::layout::ReleaseLayout;
use streameee_deployer::logging;
use streameee_deployer::output::write_stderr_line;
use streameee_deployer::pipeline::{ReleaseDeps, ReleaseOptions, ReleaseReport, run_release};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if err.print().is_err() {
                // Best-effort output; the exit code still reports the outcome.
            }
            std::process::exit(exit_code_for_parse_error(&err));
        }
    };
    logging::init(cli.verbosity, cli.quiet);

    let mut stderr = std::io::stderr();
    let run_result = if cli.quiet {
        run(&cli, &mut std::io::sink())
    } else {
        run(&cli, &mut stderr)
    };
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, progress: &mut dyn Write) -> Result<ReleaseReport> {
    let layout = ReleaseLayout::default();
    let project_dir = resolve_project_dir(cli.project_dir.clone())?;
    let env_file = cli
        .env_file
        .clone()
        .unwrap_or_else(|| layout.env_file_in(&project_dir));
    log::debug!("project directory: {project_dir}, env file: {env_file}");

    let config = DeployConfig::load(&env_file)?;

    let executor = SystemCommandExecutor;
    let connector = FtpConnector;
    let transport = UreqTransport;
    let deps = ReleaseDeps {
        executor: &executor,
        connector: &connector,
        invalidator: CacheInvalidator::new(config.cdn.clone(), &transport),
    };

    run_release(
        &project_dir,
        &layout,
        &config,
        &release_options(cli),
        &deps,
        progress,
    )
}

fn release_options(cli: &Cli) -> ReleaseOptions {
    ReleaseOptions {
        build: cli.build,
        force_update: cli.force,
        notes: cli.notes.clone(),
        dry_run: cli.dry_run,
    }
}

fn resolve_project_dir(explicit: Option<Utf8PathBuf>) -> Result<Utf8PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|path| DeployError::ConfigInvalid {
        key: "project directory",
        reason: format!("{} is not valid UTF-8", path.display()),
    })
}

/// Help and version requests succeed; every other usage error is fatal.
fn exit_code_for_parse_error(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn exit_code_for_run_result<T>(result: Result<T>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("Error: {err}"));
            1
        }
    }
}
