//! File locations and storage permissions for transfers.

pub mod permission;
pub mod resolver;

pub use permission::{
    AllowAll, PermissionGate, PermissionOutcome, StorageAccess, StorageAuthorizer,
};
pub use resolver::{DirectoryResolver, PathResolver};
