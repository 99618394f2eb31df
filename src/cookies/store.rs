//! Cookie calls exposed to the bridge.
//!
//! Every operation validates the URL first and then delegates to the shared
//! [`CookieHandler`].

use crate::base::neterror::NetError;
use crate::cookies::handler::CookieHandler;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Expiry used to delete a cookie by overwriting it.
const EXPIRED: &str = "Wed, 31 Dec 2000 23:59:59 GMT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieEntry {
    pub key: String,
    pub value: String,
}

#[derive(Clone)]
pub struct CookieStore {
    handler: Arc<dyn CookieHandler>,
}

impl CookieStore {
    pub fn new(handler: Arc<dyn CookieHandler>) -> Self {
        Self { handler }
    }

    pub fn set_cookie(&self, url: &str, key: &str, value: &str) -> Result<(), NetError> {
        let url = Url::parse(url)?;
        self.handler.set_cookie(&url, &format!("{}={}", key, value));
        Ok(())
    }

    /// Cookies visible to `url`. Segments that do not parse are skipped.
    pub fn get_cookies(&self, url: &str) -> Result<Vec<CookieEntry>, NetError> {
        let url = Url::parse(url)?;
        let Some(header) = self.handler.get_cookie(&url) else {
            return Ok(Vec::new());
        };

        let entries = header
            .split(';')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .filter_map(|segment| match cookie::Cookie::parse(segment) {
                Ok(c) => Some(CookieEntry {
                    key: c.name().to_string(),
                    value: c.value().to_string(),
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unparsable cookie segment");
                    None
                }
            })
            .collect();
        Ok(entries)
    }

    /// Overwrite `key` with an already-expired cookie.
    pub fn delete_cookie(&self, url: &str, key: &str) -> Result<(), NetError> {
        let url = Url::parse(url)?;
        self.handler
            .set_cookie(&url, &format!("{}=; Expires={}", key, EXPIRED));
        Ok(())
    }

    pub fn clear_cookies(&self) {
        self.handler.remove_all_cookies();
    }
}

impl std::fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieStore").finish_non_exhaustive()
    }
}
