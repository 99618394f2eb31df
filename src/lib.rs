//! # nativehttp
//!
//! A native HTTP request executor for embedding behind a host bridge.
//!
//! `nativehttp` takes declarative request descriptions and returns
//! normalized responses with content-type-driven body handling. It also
//! streams files to and from disk, keeps a cookie jar shared by every
//! request, and can pin a single request to a chosen network interface.
//!
//! ## Features
//!
//! - **Six methods**: GET/HEAD merge params into the URL, mutating methods
//!   encode the body as JSON, URL-encoded or multipart form
//! - **Transfers**: streamed download-to-file and multipart upload-from-file,
//!   gated by storage permissions for public directories
//! - **Cookies**: RFC 6265 jar with PSL validation and optional JSON
//!   persistence
//! - **Network binding**: a bind/run/unbind state machine around one request
//! - **TLS**: BoringSSL, HTTP/1.1 only
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nativehttp::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::new();
//!     let result = client
//!         .get("https://example.com/search")
//!         .param("q", "rust")
//!         .send()
//!         .await
//!         .unwrap();
//!     println!("Status: {}", result.status);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type, error context and logging setup
//! - [`bridge`] - JSON call surface for host runtimes
//! - [`cookies`] - Cookie jar, persistence and cookie calls
//! - [`http`] - Headers, bodies, codecs, multipart and transactions
//! - [`network`] - Network discovery and per-request binding
//! - [`socket`] - Connect jobs, TLS and the process route
//! - [`storage`] - Path resolution and storage permissions
//! - [`urlrequest`] - Request context, connections, dispatch and transfers

pub mod base;
pub mod bridge;
pub mod client;
pub mod cookies;
pub mod http;
pub mod network;
pub mod socket;
pub mod storage;
pub mod urlrequest;

pub use base::neterror::NetError;
pub use bridge::{HttpPlugin, Rejection};
pub use client::{Client, ClientBuilder, RequestBuilder};
pub use http::{ResponseData, ResponseResult};
pub use urlrequest::{RequestContextConfig, RequestMethod, RequestSpec, TransferSpec};
