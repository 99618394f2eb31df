//! HTTP client with builder pattern.
//!
//! One [`Client`] owns a [`RequestContext`] and hands out per-request
//! builders, file transfers and the cookie store, all sharing that context.
//!
//! # Example
//!
//! ```rust,ignore
//! use nativehttp::Client;
//! use serde_json::json;
//!
//! let client = Client::builder()
//!     .read_timeout(std::time::Duration::from_secs(10))
//!     .build();
//!
//! let result = client
//!     .post("https://example.com/api")
//!     .header("Content-Type", "application/json")
//!     .json(json!({"name": "value"}))
//!     .send()
//!     .await?;
//! ```

use crate::base::neterror::NetError;
use crate::cookies::handler::CookieHandler;
use crate::cookies::store::CookieStore;
use crate::http::response::ResponseResult;
use crate::network::platform::{NetworkPlatform, SystemNetworkPlatform};
use crate::socket::route::ProcessRoute;
use crate::storage::permission::{PermissionOutcome, StorageAuthorizer};
use crate::storage::resolver::PathResolver;
use crate::urlrequest::context::{RequestContext, RequestContextConfig};
use crate::urlrequest::dispatcher::Dispatcher;
use crate::urlrequest::spec::{RequestMethod, RequestSpec, TransferSpec};
use crate::urlrequest::transfer::Transfer;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client for making requests.
///
/// Use [`Client::builder()`] to configure and create a client. Cloning is
/// cheap and clones share the cookie jar and process route.
#[derive(Debug, Clone)]
pub struct Client {
    ctx: Arc<RequestContext>,
    dispatcher: Dispatcher,
    transfer: Transfer,
    cookies: CookieStore,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        Self::from_context(Arc::new(RequestContext::new()))
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn from_context(ctx: Arc<RequestContext>) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&ctx)),
            transfer: Transfer::new(Arc::clone(&ctx)),
            cookies: CookieStore::new(Arc::clone(ctx.cookie_handler())),
            ctx,
        }
    }

    pub fn context(&self) -> &Arc<RequestContext> {
        &self.ctx
    }

    pub fn get<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(RequestMethod::Get, url)
    }

    pub fn head<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(RequestMethod::Head, url)
    }

    pub fn post<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(RequestMethod::Post, url)
    }

    pub fn put<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(RequestMethod::Put, url)
    }

    pub fn patch<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(RequestMethod::Patch, url)
    }

    pub fn delete<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(RequestMethod::Delete, url)
    }

    pub fn request<U: Into<String>>(&self, method: RequestMethod, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            spec: RequestSpec::new(method, url),
        }
    }

    /// Execute a fully described request.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<ResponseResult, NetError> {
        self.dispatcher.dispatch(spec).await
    }

    /// Download to the file `spec` names and return its absolute path.
    pub async fn download(&self, spec: &TransferSpec) -> Result<PathBuf, NetError> {
        self.transfer.download(spec).await
    }

    /// Upload the file `spec` names as `multipart/form-data`.
    pub async fn upload(&self, spec: &TransferSpec) -> Result<ResponseResult, NetError> {
        self.transfer.upload(spec).await
    }

    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    /// Deliver a storage-permission answer for a suspended transfer.
    pub fn handle_permission_result(&self, tag: u32, outcome: PermissionOutcome) -> bool {
        self.ctx.permissions().handle_permission_result(tag, outcome)
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: RequestContextConfig,
    route: Option<ProcessRoute>,
    cookie_handler: Option<Arc<dyn CookieHandler>>,
    network_platform: Option<Arc<dyn NetworkPlatform>>,
    path_resolver: Option<Arc<dyn PathResolver>>,
    authorizer: Option<Arc<dyn StorageAuthorizer>>,
}

impl ClientBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: RequestContextConfig) -> Self {
        self.config = config;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_connect_timeout = Some(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_read_timeout = Some(timeout);
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Persist the default cookie jar to `path`. Ignored when a cookie
    /// handler is injected.
    pub fn cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cookie_file = Some(path.into());
        self
    }

    /// Share a process route with another owner, e.g. a custom platform.
    pub fn process_route(mut self, route: ProcessRoute) -> Self {
        self.route = Some(route);
        self
    }

    pub fn cookie_handler(mut self, handler: Arc<dyn CookieHandler>) -> Self {
        self.cookie_handler = Some(handler);
        self
    }

    pub fn network_platform(mut self, platform: Arc<dyn NetworkPlatform>) -> Self {
        self.network_platform = Some(platform);
        self
    }

    pub fn path_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.path_resolver = Some(resolver);
        self
    }

    pub fn authorizer(mut self, authorizer: Arc<dyn StorageAuthorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn build(self) -> Client {
        let route = self.route.unwrap_or_default();
        let mut ctx = RequestContext::with_route(self.config, route.clone());

        if let Some(handler) = self.cookie_handler {
            ctx.set_cookie_handler(handler);
        }
        match self.network_platform {
            Some(platform) => ctx.set_network_platform(platform),
            None => ctx.set_network_platform(Arc::new(SystemNetworkPlatform::new(route))),
        }
        if let Some(resolver) = self.path_resolver {
            ctx.set_path_resolver(resolver);
        }
        if let Some(authorizer) = self.authorizer {
            ctx.set_authorizer(authorizer);
        }

        Client::from_context(Arc::new(ctx))
    }
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: Client,
    spec: RequestSpec,
}

impl RequestBuilder {
    /// Add a header. Later values replace earlier ones with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec = self.spec.header(name, value);
        self
    }

    /// Add a query parameter (GET/HEAD only).
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec = self.spec.param(key, value);
        self
    }

    /// Set the body. How it is encoded depends on the `Content-Type` header.
    pub fn json(mut self, body: Value) -> Self {
        self.spec = self.spec.body(body);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.spec = self.spec.connect_timeout(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.spec = self.spec.read_timeout(timeout);
        self
    }

    /// Run the request with the process pinned to the configured transport.
    pub fn bind_to_interface(mut self, bind: bool) -> Self {
        self.spec = self.spec.bind_to_interface(bind);
        self
    }

    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    pub async fn send(self) -> Result<ResponseResult, NetError> {
        self.client.execute(&self.spec).await
    }
}
