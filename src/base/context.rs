//! Ergonomic error context helpers.
//!
//! Converts `std::io::Error` into context-rich `NetError` variants carrying
//! the host or file the failure relates to.

use crate::base::neterror::NetError;
use std::io;
use std::path::Path;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// ```ignore
    /// let stream = socket.connect(addr).await.connection_context("example.com", 443)?;
    /// // Error: "Connection to example.com:443 failed: connection refused"
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Add file context to an IO error.
    fn file_context(self, path: &Path) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut => NetError::ConnectionTimedOut,
            _ => NetError::ConnectionFailed {
                host: host.to_string(),
                port,
                message: e.to_string(),
            },
        })
    }

    fn file_context(self, path: &Path) -> Result<T, NetError> {
        self.map_err(|e| NetError::FileError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_connection_context() {
        let result: Result<(), io::Error> =
            Err(Error::new(ErrorKind::ConnectionRefused, "refused"));
        let err = result.connection_context("example.com", 443).unwrap_err();

        match err {
            NetError::ConnectionFailed { host, port, .. } => {
                assert_eq!(host, "example.com");
                assert_eq!(port, 443);
            }
            _ => panic!("Expected ConnectionFailed"),
        }
    }

    #[test]
    fn test_connection_timeout_maps_to_timed_out() {
        let result: Result<(), io::Error> = Err(Error::new(ErrorKind::TimedOut, "slow"));
        let err = result.connection_context("example.com", 80).unwrap_err();
        assert_eq!(err, NetError::ConnectionTimedOut);
    }

    #[test]
    fn test_file_context() {
        let result: Result<(), io::Error> = Err(Error::new(ErrorKind::NotFound, "missing"));
        let err = result.file_context(Path::new("/tmp/x.bin")).unwrap_err();
        assert!(matches!(err, NetError::FileError { ref path, .. } if path == "/tmp/x.bin"));
        assert!(err.is_transport());
    }
}
