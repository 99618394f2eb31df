use thiserror::Error;

/// Errors produced while executing a request, a transfer or a cookie call.
///
/// Variants carry owned strings instead of source errors so a `NetError` can
/// be cloned into a bridge rejection and compared in tests.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // URL / input errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Invalid header: {name}")]
    InvalidHeader { name: String },
    #[error("Method not supported: {method}")]
    MethodNotSupported { method: String },
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    // Storage errors
    #[error("Invalid file path: {path}")]
    InvalidPath { path: String },
    #[error("Permission denied: {permission}")]
    PermissionDenied { permission: String },
    #[error("File error at {path}: {message}")]
    FileError { path: String, message: String },

    // Connection errors
    #[error("Name not resolved: {host}")]
    NameNotResolved { host: String },
    #[error("Connection to {host}:{port} failed: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Read timed out")]
    ReadTimedOut,
    #[error("Connection closed: {message}")]
    ConnectionClosed { message: String },
    #[error("SSL protocol error: {message}")]
    SslProtocolError { message: String },
    #[error("Network binding failed: {message}")]
    NetworkBindFailed { message: String },

    // HTTP errors
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
    #[error("Too many redirects")]
    TooManyRedirects,
    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },
}

impl NetError {
    /// Any I/O failure during connect, write or read.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NetError::NameNotResolved { .. }
                | NetError::ConnectionFailed { .. }
                | NetError::ConnectionTimedOut
                | NetError::ReadTimedOut
                | NetError::ConnectionClosed { .. }
                | NetError::SslProtocolError { .. }
                | NetError::InvalidResponse { .. }
                | NetError::TooManyRedirects
                | NetError::HttpStatus { .. }
                | NetError::FileError { .. }
        )
    }

    /// Short human-readable reason handed back to the bridge caller.
    pub fn reason(&self) -> &'static str {
        match self {
            NetError::InvalidUrl => "Invalid URL",
            NetError::PermissionDenied { permission } if permission.starts_with("write") => {
                "User denied write permission needed to save files"
            }
            NetError::PermissionDenied { .. } => {
                "User denied read permission needed to upload files"
            }
            _ => "Error",
        }
    }

    pub fn connection_closed(message: impl Into<String>) -> Self {
        NetError::ConnectionClosed {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        NetError::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        NetError::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<url::ParseError> for NetError {
    fn from(_: url::ParseError) -> Self {
        NetError::InvalidUrl
    }
}

impl From<hyper::Error> for NetError {
    fn from(err: hyper::Error) -> Self {
        if err.is_timeout() {
            NetError::ReadTimedOut
        } else if err.is_parse() {
            NetError::invalid_response(err.to_string())
        } else {
            NetError::connection_closed(err.to_string())
        }
    }
}
