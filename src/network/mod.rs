//! Per-request network binding.
//!
//! - [`binder`]: the bind → run → unbind state machine
//! - [`platform`]: how networks are found and the process is pinned

pub mod binder;
pub mod platform;

pub use binder::{NetworkBindState, NetworkBinder};
pub use platform::{Network, NetworkPlatform, SystemNetworkPlatform, Transport};
