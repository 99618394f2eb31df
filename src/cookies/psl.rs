//! Public Suffix List checks for `Domain` cookie attributes.
//!
//! A cookie scoped to a public suffix such as `com` or `co.uk` would be
//! shared by every site under it, so such domains are refused.

use psl::{List, Psl};

/// Whether `domain` is itself a known public suffix.
pub fn is_public_suffix(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    List.suffix(domain.as_bytes())
        .is_some_and(|suffix| suffix.is_known() && suffix.as_bytes() == domain.as_bytes())
}

/// A `Domain` attribute is acceptable when it is not a public suffix and
/// covers `host` (equal, or a parent domain of it).
pub fn is_valid_cookie_domain(cookie_domain: &str, host: &str) -> bool {
    let domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    if domain.is_empty() || is_public_suffix(&domain) {
        return false;
    }
    host == domain || host.ends_with(&format!(".{}", domain))
}
