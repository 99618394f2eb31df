//! Inbound call options and outbound rejections.

use crate::base::neterror::NetError;
use crate::http::bodycodec::value_to_text;
use crate::urlrequest::spec::{RequestMethod, RequestSpec, TransferSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// Options of one bridge call. Every field is optional at this level; each
/// operation checks for the ones it needs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallOptions {
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Map<String, Value>,
    pub params: Map<String, Value>,
    pub data: Value,
    pub connect_timeout: Option<u64>,
    pub read_timeout: Option<u64>,
    pub bind_to_wifi: bool,
    pub file_path: Option<String>,
    pub file_directory: Option<String>,
    pub name: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
}

impl CallOptions {
    pub fn from_value(value: Value) -> Result<Self, NetError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| NetError::invalid_argument(e.to_string()))
    }

    /// The target URL, checked before any other option. A missing or
    /// unparsable URL is `InvalidUrl`.
    pub fn url(&self) -> Result<&str, NetError> {
        let url = self.url.as_deref().ok_or(NetError::InvalidUrl)?;
        Url::parse(url)?;
        Ok(url)
    }

    pub fn method(&self) -> Result<RequestMethod, NetError> {
        required(self.method.as_deref(), "method")?.parse()
    }

    pub fn key(&self) -> Result<&str, NetError> {
        required(self.key.as_deref(), "key")
    }

    pub fn request_spec(&self) -> Result<RequestSpec, NetError> {
        let url = self.url()?;
        let mut spec = RequestSpec::new(self.method()?, url);
        spec.headers = pairs(&self.headers);
        spec.query_params = pairs(&self.params);
        spec.body = self.data.clone();
        spec.connect_timeout = millis(self.connect_timeout);
        spec.read_timeout = millis(self.read_timeout);
        spec.bind_to_interface = self.bind_to_wifi;
        Ok(spec)
    }

    /// Transfer options. A missing `fileDirectory` falls back to
    /// `default_directory`; an object `data` becomes extra upload fields.
    pub fn transfer_spec(&self, default_directory: &str) -> Result<TransferSpec, NetError> {
        let url = self.url()?;
        let file_path = required(self.file_path.as_deref(), "filePath")?;
        let mut spec = TransferSpec::new(url, file_path);
        spec.file_directory = Some(
            self.file_directory
                .clone()
                .unwrap_or_else(|| default_directory.to_string()),
        );
        spec.headers = pairs(&self.headers);
        spec.query_params = pairs(&self.params);
        spec.connect_timeout = millis(self.connect_timeout);
        spec.read_timeout = millis(self.read_timeout);
        spec.field_name = self.name.clone();
        if let Value::Object(data) = &self.data {
            spec.form_fields = data
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), value_to_text(v)))
                .collect();
        }
        Ok(spec)
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, NetError> {
    value.ok_or_else(|| NetError::invalid_argument(format!("missing required option `{}`", field)))
}

fn pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(k, v)| (k.clone(), value_to_text(v)))
        .collect()
}

fn millis(ms: Option<u64>) -> Option<Duration> {
    ms.map(Duration::from_millis)
}

/// A failed call as the host sees it: a short reason plus the cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub message: String,
    pub cause: String,
}

impl From<NetError> for Rejection {
    fn from(err: NetError) -> Self {
        Self {
            message: err.reason().to_string(),
            cause: err.to_string(),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.message, self.cause)
    }
}
