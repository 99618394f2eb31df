use crate::cookies::psl;
use time::OffsetDateTime;
use url::Url;

/// One cookie as held by the jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    /// Lowercased, without a leading dot.
    pub domain: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
    pub secure: bool,
    pub http_only: bool,
    /// Set without a `Domain` attribute: only the exact host matches.
    pub host_only: bool,
}

impl CanonicalCookie {
    /// Host-only session cookie for `domain` at path `/`.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            creation_time: OffsetDateTime::now_utc(),
            expiration_time: None,
            secure: false,
            http_only: false,
            host_only: true,
        }
    }

    /// Parse a `Set-Cookie` style line received for `url`.
    ///
    /// Returns `None` for unparsable lines and for `Domain` attributes that
    /// are public suffixes or do not cover the URL's host.
    pub fn from_cookie_line(url: &Url, line: &str) -> Option<Self> {
        let parsed = cookie::Cookie::parse(line).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();

        let (domain, host_only) = match parsed.domain() {
            Some(d) => {
                let d = d.trim_start_matches('.').to_ascii_lowercase();
                if !psl::is_valid_cookie_domain(&d, &host) {
                    tracing::warn!(domain = %d, %host, "rejected cookie domain");
                    return None;
                }
                (d, false)
            }
            None => (host, true),
        };

        // Max-Age wins over Expires.
        let expiration_time = match parsed.max_age() {
            Some(age) => Some(OffsetDateTime::now_utc() + age),
            None => parsed.expires().and_then(|e| e.datetime()),
        };

        Some(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path: parsed
                .path()
                .filter(|p| p.starts_with('/'))
                .unwrap_or("/")
                .to_string(),
            creation_time: OffsetDateTime::now_utc(),
            expiration_time,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            host_only,
        })
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiration_time.is_some_and(|expiry| expiry <= now)
    }

    /// RFC 6265 domain, path and secure matching against `url`.
    pub fn matches_url(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or_default();
        domain_matches(&self.domain, host, self.host_only)
            && path_matches(&self.path, url.path())
            && (!self.secure || url.scheme() == "https")
    }
}

fn domain_matches(cookie_domain: &str, host: &str, host_only: bool) -> bool {
    if host.eq_ignore_ascii_case(cookie_domain) {
        return true;
    }
    if host_only || host.len() <= cookie_domain.len() {
        return false;
    }
    let split = host.len() - cookie_domain.len();
    host.is_char_boundary(split)
        && host[split..].eq_ignore_ascii_case(cookie_domain)
        && host.as_bytes()[split - 1] == b'.'
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    match request_path.strip_prefix(cookie_path) {
        Some("") => true,
        Some(rest) => cookie_path.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}
