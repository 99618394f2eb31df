use crate::bridge::call::{CallOptions, Rejection};
use crate::client::Client;
use crate::storage::permission::PermissionOutcome;
use serde_json::{json, Value};

/// JSON call surface for a host runtime.
///
/// Each method takes the call's options object and resolves with a JSON
/// value or rejects with a [`Rejection`].
#[derive(Debug, Clone, Default)]
pub struct HttpPlugin {
    client: Client,
}

impl HttpPlugin {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Route a call by method name.
    pub async fn call(&self, method: &str, options: Value) -> Result<Value, Rejection> {
        match method {
            "request" => self.request(options).await,
            "downloadFile" => self.download_file(options).await,
            "uploadFile" => self.upload_file(options).await,
            "setCookie" => self.set_cookie(options),
            "getCookies" => self.get_cookies(options),
            "deleteCookie" => self.delete_cookie(options),
            "clearCookies" => self.clear_cookies(),
            other => {
                tracing::debug!(method = other, "unknown plugin method");
                Err(Rejection {
                    message: "Error".to_string(),
                    cause: format!("unknown plugin method `{}`", other),
                })
            }
        }
    }

    /// `{status, headers, data}`.
    pub async fn request(&self, options: Value) -> Result<Value, Rejection> {
        let spec = CallOptions::from_value(options)?.request_spec()?;
        let result = self.client.execute(&spec).await?;
        Ok(to_json(&result))
    }

    /// `{path}`.
    pub async fn download_file(&self, options: Value) -> Result<Value, Rejection> {
        let spec = CallOptions::from_value(options)?.transfer_spec(&self.default_directory())?;
        let path = self.client.download(&spec).await?;
        Ok(json!({ "path": path.display().to_string() }))
    }

    pub async fn upload_file(&self, options: Value) -> Result<Value, Rejection> {
        let spec = CallOptions::from_value(options)?.transfer_spec(&self.default_directory())?;
        let result = self.client.upload(&spec).await?;
        Ok(to_json(&result))
    }

    pub fn set_cookie(&self, options: Value) -> Result<Value, Rejection> {
        let options = CallOptions::from_value(options)?;
        let value = options.value.as_deref().unwrap_or_default();
        self.client
            .cookies()
            .set_cookie(options.url()?, options.key()?, value)?;
        Ok(Value::Null)
    }

    /// `{value: [{key, value}]}`.
    pub fn get_cookies(&self, options: Value) -> Result<Value, Rejection> {
        let options = CallOptions::from_value(options)?;
        let cookies = self.client.cookies().get_cookies(options.url()?)?;
        Ok(json!({ "value": cookies }))
    }

    pub fn delete_cookie(&self, options: Value) -> Result<Value, Rejection> {
        let options = CallOptions::from_value(options)?;
        self.client
            .cookies()
            .delete_cookie(options.url()?, options.key()?)?;
        Ok(Value::Null)
    }

    pub fn clear_cookies(&self) -> Result<Value, Rejection> {
        self.client.cookies().clear_cookies();
        Ok(Value::Null)
    }

    /// Host callback for a permission prompt started by a transfer.
    pub fn handle_permission_result(&self, tag: u32, granted: bool) -> bool {
        let outcome = if granted {
            PermissionOutcome::Granted
        } else {
            PermissionOutcome::Denied
        };
        self.client.handle_permission_result(tag, outcome)
    }

    fn default_directory(&self) -> String {
        self.client.context().config().default_directory.clone()
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
