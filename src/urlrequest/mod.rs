//! Request construction and execution.
//!
//! - [`context`]: configuration and shared collaborators
//! - [`spec`]: request and transfer descriptions
//! - [`connection`]: one configured connection, query merge, redirects
//! - [`dispatcher`]: method-specific request handling
//! - [`transfer`]: file download and upload

pub mod connection;
pub mod context;
pub mod dispatcher;
pub mod spec;
pub mod transfer;

pub use context::{RequestContext, RequestContextConfig};
pub use dispatcher::Dispatcher;
pub use spec::{RequestMethod, RequestSpec, TransferSpec};
pub use transfer::Transfer;
