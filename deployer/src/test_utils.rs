//! Shared test utilities for the deployer crate.

use crate::builder::CommandExecutor;
use crate::cdn::{PurgeError, PurgeTransport};
use crate::config::TransferCredentials;
use crate::error::{DeployError, Result};
use crate::transfer::{TransferConnector, TransferError, TransferSession};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::process::ExitStatus;
use std::rc::Rc;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "flutter").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// The expected working directory; `None` accepts any.
    pub cwd: Option<Utf8PathBuf>,
    /// The result to return when this command is invoked.
    pub result: Result<ExitStatus>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Creates a `StubExecutor` that accepts no invocations.
    pub fn unused() -> Self {
        Self::new(Vec::new())
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: &Utf8Path) -> Result<ExitStatus> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(DeployError::StubMismatch {
                message: format!("unexpected command invocation: {cmd} {}", args.join(" ")),
            });
        };

        assert_eq!(call.cmd, cmd);
        assert_eq!(call.args.as_slice(), args);
        if let Some(expected_cwd) = &call.cwd {
            assert_eq!(expected_cwd.as_path(), cwd);
        }

        call.result
    }
}

/// One interaction with the file host, as seen by [`RecordingConnector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferCall {
    /// A connection was opened.
    Connect,
    /// A directory was ensured.
    EnsureDir(String),
    /// A file was uploaded.
    Upload {
        /// Local source file.
        local: Utf8PathBuf,
        /// Remote destination path.
        remote: String,
    },
    /// The connection was closed.
    Close,
}

type Journal = Rc<RefCell<Vec<TransferCall>>>;

/// A `TransferConnector` that records every call made through it.
///
/// Sessions share the connector's journal. A connector can be told to refuse
/// connections, or to fail the first operation that targets a given remote
/// path.
#[derive(Debug, Default)]
pub struct RecordingConnector {
    journal: Journal,
    fail_on_remote: Option<String>,
    refuse_connection: bool,
}

impl RecordingConnector {
    /// Creates a connector whose sessions always succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector whose sessions fail on `remote`.
    pub fn failing_on(remote: impl Into<String>) -> Self {
        Self {
            fail_on_remote: Some(remote.into()),
            ..Self::default()
        }
    }

    /// Creates a connector that refuses to connect.
    pub fn refusing_connection() -> Self {
        Self {
            refuse_connection: true,
            ..Self::default()
        }
    }

    /// Returns a copy of the recorded calls.
    pub fn calls(&self) -> Vec<TransferCall> {
        self.journal.borrow().clone()
    }

    /// Returns how many times `call` was recorded.
    pub fn count(&self, call: &TransferCall) -> usize {
        self.journal.borrow().iter().filter(|c| *c == call).count()
    }

    /// Returns the remote paths uploaded to, in order.
    pub fn uploaded_paths(&self) -> Vec<String> {
        self.journal
            .borrow()
            .iter()
            .filter_map(|call| match call {
                TransferCall::Upload { remote, .. } => Some(remote.clone()),
                _ => None,
            })
            .collect()
    }
}

impl TransferConnector for RecordingConnector {
    fn connect(
        &self,
        credentials: &TransferCredentials,
    ) -> std::result::Result<Box<dyn TransferSession>, TransferError> {
        if self.refuse_connection {
            return Err(TransferError::Connect {
                address: credentials.address(),
                reason: "connection refused".to_owned(),
            });
        }
        self.journal.borrow_mut().push(TransferCall::Connect);
        Ok(Box::new(RecordingSession {
            journal: Rc::clone(&self.journal),
            fail_on_remote: self.fail_on_remote.clone(),
        }))
    }
}

struct RecordingSession {
    journal: Journal,
    fail_on_remote: Option<String>,
}

impl RecordingSession {
    fn check(&self, command: &'static str, path: &str) -> std::result::Result<(), TransferError> {
        if self.fail_on_remote.as_deref() == Some(path) {
            return Err(TransferError::Command {
                command,
                path: path.to_owned(),
                reason: "550 simulated failure".to_owned(),
            });
        }
        Ok(())
    }
}

impl TransferSession for RecordingSession {
    fn ensure_dir(&mut self, path: &str) -> std::result::Result<(), TransferError> {
        self.journal
            .borrow_mut()
            .push(TransferCall::EnsureDir(path.to_owned()));
        self.check("MKD", path)
    }

    fn upload(&mut self, local: &Utf8Path, remote: &str) -> std::result::Result<u64, TransferError> {
        self.journal.borrow_mut().push(TransferCall::Upload {
            local: local.to_owned(),
            remote: remote.to_owned(),
        });
        self.check("STOR", remote)?;
        Ok(std::fs::metadata(local)?.len())
    }

    fn close(&mut self) {
        self.journal.borrow_mut().push(TransferCall::Close);
    }
}

/// A `PurgeTransport` returning a canned response and counting requests.
#[derive(Debug)]
pub struct StubTransport {
    response: std::result::Result<String, String>,
    calls: Cell<usize>,
    last_body: RefCell<Option<String>>,
}

impl StubTransport {
    /// Answers every request with `body`.
    pub fn responding(body: impl Into<String>) -> Self {
        Self {
            response: Ok(body.into()),
            calls: Cell::new(0),
            last_body: RefCell::new(None),
        }
    }

    /// Fails every request with a network error.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            response: Err(reason.into()),
            calls: Cell::new(0),
            last_body: RefCell::new(None),
        }
    }

    /// Number of requests made.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Body of the most recent request.
    pub fn last_body(&self) -> Option<String> {
        self.last_body.borrow().clone()
    }
}

impl PurgeTransport for StubTransport {
    fn post_json(
        &self,
        url: &str,
        _bearer: &str,
        body: &str,
    ) -> std::result::Result<String, PurgeError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_body.borrow_mut() = Some(body.to_owned());
        self.response.clone().map_err(|reason| PurgeError::Request {
            url: url.to_owned(),
            reason,
        })
    }
}

/// Successful CDN API response body.
pub const PURGE_SUCCESS_BODY: &str = r#"{"success":true,"errors":[],"messages":[],"result":{"id":"zone"}}"#;

/// Failed CDN API response body.
pub const PURGE_FAILURE_BODY: &str =
    r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}],"messages":[],"result":null}"#;
