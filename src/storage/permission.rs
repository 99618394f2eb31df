//! Storage permission gate.
//!
//! A transfer that needs storage access it does not have parks a
//! continuation under its operation tag, asks the host's
//! [`StorageAuthorizer`], and resumes when the host reports the outcome via
//! [`PermissionGate::handle_permission_result`].

use crate::base::neterror::NetError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Operation tag of a download waiting for write access.
pub const DOWNLOAD_WRITE_PERMISSION_TAG: u32 = 9022;
/// Operation tag of an upload waiting for read access.
pub const UPLOAD_READ_PERMISSION_TAG: u32 = 9023;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageAccess {
    Read,
    Write,
}

impl StorageAccess {
    pub fn permission_name(self) -> &'static str {
        match self {
            StorageAccess::Read => "read external storage",
            StorageAccess::Write => "write external storage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
}

/// Host-side permission UI.
pub trait StorageAuthorizer: Send + Sync {
    fn is_authorized(&self, access: StorageAccess) -> bool;

    /// Start asking the user. The answer comes back through
    /// [`PermissionGate::handle_permission_result`] with the same `tag`.
    fn request_authorization(&self, tag: u32, access: StorageAccess);
}

/// Authorizer for hosts without a permission model.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl StorageAuthorizer for AllowAll {
    fn is_authorized(&self, _access: StorageAccess) -> bool {
        true
    }

    fn request_authorization(&self, _tag: u32, _access: StorageAccess) {}
}

type Waiter = (u64, oneshot::Sender<PermissionOutcome>);

pub struct PermissionGate {
    authorizer: Arc<dyn StorageAuthorizer>,
    pending: Mutex<HashMap<u32, Waiter>>,
    next_id: AtomicU64,
}

impl PermissionGate {
    pub fn new(authorizer: Arc<dyn StorageAuthorizer>) -> Self {
        Self {
            authorizer,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Return once `access` is authorized, suspending on a user prompt if
    /// needed.
    pub async fn ensure(&self, tag: u32, access: StorageAccess) -> Result<(), NetError> {
        if self.authorizer.is_authorized(access) {
            return Ok(());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let replaced = self.lock_pending().insert(tag, (id, tx));
        let _guard = PendingGuard { gate: self, tag, id };
        if let Some(previous) = replaced {
            // Wakes the earlier waiter with a denial.
            drop(previous);
            tracing::debug!(tag, "replacing pending permission request");
        }

        tracing::debug!(tag, permission = access.permission_name(), "asking for storage permission");
        self.authorizer.request_authorization(tag, access);

        // A dropped sender (replaced by a newer request) counts as a denial.
        match rx.await.unwrap_or(PermissionOutcome::Denied) {
            PermissionOutcome::Granted => Ok(()),
            PermissionOutcome::Denied => {
                tracing::debug!(tag, "storage permission denied");
                Err(NetError::PermissionDenied {
                    permission: access.permission_name().to_string(),
                })
            }
        }
    }

    /// Deliver the host's answer for `tag`. Returns `false` when nothing was
    /// waiting.
    pub fn handle_permission_result(&self, tag: u32, outcome: PermissionOutcome) -> bool {
        let Some((_, waiter)) = self.lock_pending().remove(&tag) else {
            tracing::debug!(tag, "no pending call for permission result");
            return false;
        };
        waiter.send(outcome).is_ok()
    }

    pub fn has_pending(&self, tag: u32) -> bool {
        self.lock_pending().contains_key(&tag)
    }

    fn lock_pending(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<u32, Waiter>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears a waiter's entry when its call is dropped before an answer
/// arrives. Entries owned by a newer call are left alone.
struct PendingGuard<'a> {
    gate: &'a PermissionGate,
    tag: u32,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self.gate.lock_pending();
        if pending.get(&self.tag).is_some_and(|(id, _)| *id == self.id) {
            pending.remove(&self.tag);
            tracing::debug!(tag = self.tag, "permission waiter cancelled");
        }
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("pending", &self.lock_pending().len())
            .finish()
    }
}
