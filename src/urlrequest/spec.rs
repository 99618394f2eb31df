//! Declarative descriptions of requests and transfers.

use crate::base::neterror::NetError;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The six methods the dispatcher accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    /// GET and HEAD: params go into the URL, no body is sent.
    pub fn is_read(self) -> bool {
        matches!(self, RequestMethod::Get | RequestMethod::Head)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Head => "HEAD",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }

    pub fn to_http(self) -> http::Method {
        match self {
            RequestMethod::Get => http::Method::GET,
            RequestMethod::Head => http::Method::HEAD,
            RequestMethod::Post => http::Method::POST,
            RequestMethod::Put => http::Method::PUT,
            RequestMethod::Patch => http::Method::PATCH,
            RequestMethod::Delete => http::Method::DELETE,
        }
    }
}

impl FromStr for RequestMethod {
    type Err = NetError;

    /// Method names are matched exactly, upper case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(RequestMethod::Get),
            "HEAD" => Ok(RequestMethod::Head),
            "POST" => Ok(RequestMethod::Post),
            "PUT" => Ok(RequestMethod::Put),
            "PATCH" => Ok(RequestMethod::Patch),
            "DELETE" => Ok(RequestMethod::Delete),
            other => Err(NetError::MethodNotSupported {
                method: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub url: String,
    pub method: RequestMethod,
    /// Applied in order; the last write per case-insensitive name wins.
    pub headers: Vec<(String, String)>,
    /// Merged into the URL for GET/HEAD only.
    pub query_params: Vec<(String, String)>,
    /// Encoded by `Content-Type`; ignored for GET/HEAD.
    pub body: Value,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub bind_to_interface: bool,
}

impl RequestSpec {
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            query_params: Vec::new(),
            body: Value::Null,
            connect_timeout: None,
            read_timeout: None,
            bind_to_interface: false,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn bind_to_interface(mut self, bind: bool) -> Self {
        self.bind_to_interface = bind;
        self
    }
}

/// A download or upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSpec {
    pub url: String,
    pub file_path: String,
    /// Symbolic directory `file_path` is relative to. `None` means
    /// `file_path` is absolute or a `file://` URL.
    pub file_directory: Option<String>,
    pub headers: Vec<(String, String)>,
    pub query_params: Vec<(String, String)>,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    /// Upload field name; the context default applies when unset.
    pub field_name: Option<String>,
    /// Extra plain fields sent before the file part of an upload.
    pub form_fields: Vec<(String, String)>,
}

impl TransferSpec {
    pub fn new(url: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_path: file_path.into(),
            file_directory: None,
            headers: Vec::new(),
            query_params: Vec::new(),
            connect_timeout: None,
            read_timeout: None,
            field_name: None,
            form_fields: Vec::new(),
        }
    }

    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.file_directory = Some(directory.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_fields.push((name.into(), value.into()));
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
}
