//! FTP implementation of the transfer traits, backed by `suppaftp`.
//!
//! Plain FTP is the default; `FTP_SECURE=true` upgrades the control channel
//! to explicit FTPS (`AUTH TLS`) using the platform TLS stack.

use crate::config::TransferCredentials;
use crate::transfer::{TransferConnector, TransferError, TransferSession};
use camino::Utf8Path;
use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, NativeTlsConnector, NativeTlsFtpStream};

enum Stream {
    Plain(FtpStream),
    Secure(NativeTlsFtpStream),
}

/// Runs the same block against either stream flavour.
macro_rules! with_stream {
    ($stream:expr, $s:ident => $body:block) => {
        match $stream {
            Stream::Plain($s) => $body,
            Stream::Secure($s) => $body,
        }
    };
}

/// Connects to FTP hosts with `suppaftp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpConnector;

impl TransferConnector for FtpConnector {
    fn connect(
        &self,
        credentials: &TransferCredentials,
    ) -> Result<Box<dyn TransferSession>, TransferError> {
        let address = credentials.address();
        let connect_error = |reason: String| TransferError::Connect {
            address: address.clone(),
            reason,
        };

        let mut stream = if credentials.secure {
            let tls = TlsConnector::new().map_err(|e| connect_error(e.to_string()))?;
            let secure = NativeTlsFtpStream::connect(address.as_str())
                .and_then(|s| s.into_secure(NativeTlsConnector::from(tls), &credentials.host))
                .map_err(|e| connect_error(e.to_string()))?;
            Stream::Secure(secure)
        } else {
            let plain =
                FtpStream::connect(address.as_str()).map_err(|e| connect_error(e.to_string()))?;
            Stream::Plain(plain)
        };

        with_stream!(&mut stream, s => {
            s.login(credentials.user.as_str(), credentials.password())
                .map_err(|e| connect_error(e.to_string()))?;
            s.transfer_type(FileType::Binary)
                .map_err(|e| connect_error(e.to_string()))?;
        });
        log::debug!(
            "logged in to {address} as {} (secure: {})",
            credentials.user,
            credentials.secure
        );

        Ok(Box::new(FtpSession { stream }))
    }
}

/// An authenticated FTP connection.
struct FtpSession {
    stream: Stream,
}

impl FtpSession {
    fn cwd(&mut self, path: &str) -> Result<(), FtpError> {
        with_stream!(&mut self.stream, s => { s.cwd(path) })
    }

    fn mkdir(&mut self, path: &str) -> Result<(), FtpError> {
        with_stream!(&mut self.stream, s => { s.mkdir(path) })
    }
}

impl TransferSession for FtpSession {
    fn ensure_dir(&mut self, path: &str) -> Result<(), TransferError> {
        let command_error = |command: &'static str, e: &FtpError| TransferError::Command {
            command,
            path: path.to_owned(),
            reason: e.to_string(),
        };

        if path.starts_with('/') {
            self.cwd("/").map_err(|e| command_error("CWD", &e))?;
        }
        for segment in remote_segments(path) {
            if self.cwd(segment).is_ok() {
                continue;
            }
            log::debug!("creating remote directory segment {segment}");
            self.mkdir(segment).map_err(|e| command_error("MKD", &e))?;
            self.cwd(segment).map_err(|e| command_error("CWD", &e))?;
        }
        Ok(())
    }

    fn upload(&mut self, local: &Utf8Path, remote: &str) -> Result<u64, TransferError> {
        let mut file = std::fs::File::open(local)?;
        let bytes = with_stream!(&mut self.stream, s => { s.put_file(remote, &mut file) })
            .map_err(|e| TransferError::Command {
                command: "STOR",
                path: remote.to_owned(),
                reason: e.to_string(),
            })?;
        log::debug!("stored {bytes} bytes at {remote}");
        Ok(bytes)
    }

    fn close(&mut self) {
        let quit = with_stream!(&mut self.stream, s => { s.quit() });
        if let Err(e) = quit {
            log::debug!("ignoring error on QUIT: {e}");
        }
    }
}

/// Non-empty segments of a remote path.
fn remote_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
