//! JSON call surface for embedding in a host runtime.

pub mod call;
pub mod plugin;

pub use call::{CallOptions, Rejection};
pub use plugin::HttpPlugin;
