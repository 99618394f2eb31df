//! Request context: configuration plus the collaborators shared by every
//! request (cookie jar, stream factory, process route, storage access).

use crate::cookies::handler::CookieHandler;
use crate::cookies::monster::CookieMonster;
use crate::http::streamfactory::HttpStreamFactory;
use crate::network::platform::{NetworkPlatform, SystemNetworkPlatform, Transport};
use crate::socket::route::ProcessRoute;
use crate::socket::tls::TlsConfig;
use crate::storage::permission::{AllowAll, PermissionGate, StorageAuthorizer};
use crate::storage::resolver::{DirectoryResolver, PathResolver, DOCUMENTS};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration options for [`RequestContext`].
#[derive(Debug, Clone)]
pub struct RequestContextConfig {
    /// Sent when the caller does not supply a `User-Agent`.
    pub user_agent: String,

    /// Used when a call gives no connect timeout. `None` leaves it to the OS.
    pub default_connect_timeout: Option<Duration>,

    /// Used when a call gives no read timeout. `None` waits indefinitely.
    pub default_read_timeout: Option<Duration>,

    /// Follow redirects on GET/HEAD and downloads.
    pub follow_redirects: bool,

    pub max_redirects: usize,

    /// JSON file backing the cookie jar; `None` keeps cookies in memory.
    pub cookie_file: Option<PathBuf>,

    /// Symbolic directory for transfers that name none.
    pub default_directory: String,

    /// Multipart field name for uploads that name none.
    pub upload_field_name: String,

    /// Transport requested when a call asks to bind.
    pub bind_transport: Transport,

    pub tls: TlsConfig,
}

impl Default for RequestContextConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("nativehttp/", env!("CARGO_PKG_VERSION")).to_string(),
            default_connect_timeout: None,
            default_read_timeout: None,
            follow_redirects: true,
            max_redirects: 20,
            cookie_file: None,
            default_directory: DOCUMENTS.to_string(),
            upload_field_name: "file".to_string(),
            bind_transport: Transport::Wifi,
            tls: TlsConfig::default(),
        }
    }
}

/// Everything a request needs besides its own description.
pub struct RequestContext {
    config: RequestContextConfig,
    route: ProcessRoute,
    stream_factory: Arc<HttpStreamFactory>,
    cookies: Arc<dyn CookieHandler>,
    platform: Arc<dyn NetworkPlatform>,
    resolver: Arc<dyn PathResolver>,
    permissions: Arc<PermissionGate>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_config(RequestContextConfig::default())
    }

    /// Context with default collaborators: a (possibly file-backed) cookie
    /// jar, sysfs network discovery, env-derived directories and no
    /// permission prompts.
    pub fn with_config(config: RequestContextConfig) -> Self {
        Self::with_route(config, ProcessRoute::new())
    }

    pub fn with_route(config: RequestContextConfig, route: ProcessRoute) -> Self {
        let cookies: Arc<dyn CookieHandler> = match &config.cookie_file {
            Some(path) => Arc::new(CookieMonster::with_persistence(path)),
            None => Arc::new(CookieMonster::new()),
        };
        let stream_factory = Arc::new(HttpStreamFactory::new(route.clone(), config.tls.clone()));
        let platform: Arc<dyn NetworkPlatform> =
            Arc::new(SystemNetworkPlatform::new(route.clone()));

        Self {
            config,
            route,
            stream_factory,
            cookies,
            platform,
            resolver: Arc::new(DirectoryResolver::from_env()),
            permissions: Arc::new(PermissionGate::new(Arc::new(AllowAll))),
        }
    }

    pub fn set_cookie_handler(&mut self, cookies: Arc<dyn CookieHandler>) {
        self.cookies = cookies;
    }

    pub fn set_network_platform(&mut self, platform: Arc<dyn NetworkPlatform>) {
        self.platform = platform;
    }

    pub fn set_path_resolver(&mut self, resolver: Arc<dyn PathResolver>) {
        self.resolver = resolver;
    }

    pub fn set_authorizer(&mut self, authorizer: Arc<dyn StorageAuthorizer>) {
        self.permissions = Arc::new(PermissionGate::new(authorizer));
    }

    pub fn config(&self) -> &RequestContextConfig {
        &self.config
    }

    pub fn route(&self) -> &ProcessRoute {
        &self.route
    }

    pub fn stream_factory(&self) -> &Arc<HttpStreamFactory> {
        &self.stream_factory
    }

    pub fn cookie_handler(&self) -> &Arc<dyn CookieHandler> {
        &self.cookies
    }

    pub fn network_platform(&self) -> &Arc<dyn NetworkPlatform> {
        &self.platform
    }

    pub fn path_resolver(&self) -> &Arc<dyn PathResolver> {
        &self.resolver
    }

    pub fn permissions(&self) -> &Arc<PermissionGate> {
        &self.permissions
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("config", &self.config)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}
