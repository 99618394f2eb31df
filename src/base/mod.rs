//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): the single error type of the crate
//! - [`IoResultExt`](context::IoResultExt): context for `std::io` failures
//! - [`logging`]: optional tracing subscriber for hosts

pub mod context;
pub mod logging;
pub mod neterror;
