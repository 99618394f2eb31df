use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::persistence;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies per domain; the oldest is evicted beyond this.
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// The cookie jar shared by every request of a context.
///
/// Cookies are bucketed by domain in a concurrent map. With a backing file
/// the jar is loaded at construction and rewritten after every mutation.
#[derive(Debug, Default)]
pub struct CookieMonster {
    store: DashMap<String, Vec<CanonicalCookie>>,
    backing_file: Option<PathBuf>,
}

impl CookieMonster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jar persisted to `path`. A missing or unreadable file starts empty.
    pub fn with_persistence(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let monster = Self {
            store: DashMap::new(),
            backing_file: Some(path.clone()),
        };
        match persistence::load_into(&monster, &path) {
            Ok(count) => tracing::debug!(count, path = %path.display(), "cookies loaded"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, path = %path.display(), "failed to load cookies"),
        }
        monster
    }

    pub fn backing_file(&self) -> Option<&Path> {
        self.backing_file.as_deref()
    }

    /// Store `cookie`, replacing one with the same name and path. An expired
    /// cookie only removes its predecessor.
    pub fn set_canonical_cookie(&self, cookie: CanonicalCookie) {
        self.insert(cookie);
        self.persist();
    }

    fn insert(&self, cookie: CanonicalCookie) {
        let mut bucket = self.store.entry(cookie.domain.clone()).or_default();
        bucket.retain(|c| c.name != cookie.name || c.path != cookie.path);

        if cookie.is_expired(OffsetDateTime::now_utc()) {
            return;
        }

        if bucket.len() >= MAX_COOKIES_PER_DOMAIN {
            if let Some(oldest) = bucket
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.creation_time)
                .map(|(i, _)| i)
            {
                bucket.remove(oldest);
            }
        }
        bucket.push(cookie);
    }

    /// Parse and store a `Set-Cookie` line. Returns `false` when rejected.
    pub fn parse_and_save_cookie(&self, url: &Url, line: &str) -> bool {
        match CanonicalCookie::from_cookie_line(url, line) {
            Some(cookie) => {
                self.set_canonical_cookie(cookie);
                true
            }
            None => {
                tracing::warn!(%url, "dropping unparsable cookie");
                false
            }
        }
    }

    /// Live cookies for `url`, longest path first, then oldest first.
    pub fn get_cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let now = OffsetDateTime::now_utc();

        let mut result: Vec<CanonicalCookie> = candidate_domains(&host)
            .iter()
            .filter_map(|domain| self.store.get(domain.as_str()))
            .flat_map(|bucket| {
                bucket
                    .iter()
                    .filter(|c| !c.is_expired(now) && c.matches_url(url))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();

        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });
        result
    }

    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|bucket| bucket.value().len()).sum()
    }

    pub fn clear(&self) {
        self.store.clear();
        self.persist();
    }

    pub fn iter_all_cookies(&self) -> impl Iterator<Item = CanonicalCookie> + '_ {
        self.store.iter().flat_map(|bucket| bucket.value().clone())
    }

    /// Insert without rewriting the backing file.
    pub(crate) fn restore(&self, cookie: CanonicalCookie) {
        self.insert(cookie);
    }

    fn persist(&self) {
        if let Some(path) = &self.backing_file {
            if let Err(e) = persistence::save_cookies(self, path) {
                tracing::warn!(error = %e, path = %path.display(), "failed to persist cookies");
            }
        }
    }
}

/// The host and each parent domain above it.
fn candidate_domains(host: &str) -> Vec<String> {
    let mut domains = vec![host.to_string()];
    let mut rest = host;
    while let Some((_, parent)) = rest.split_once('.') {
        if parent.is_empty() {
            break;
        }
        domains.push(parent.to_string());
        rest = parent;
    }
    domains
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_name_and_path_replaces() {
        let jar = CookieMonster::new();
        let u = url("http://example.com/");
        jar.parse_and_save_cookie(&u, "k=1");
        jar.parse_and_save_cookie(&u, "k=2");

        let cookies = jar.get_cookies_for_url(&u);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value, "2");
    }

    #[test]
    fn test_expired_cookie_deletes() {
        let jar = CookieMonster::new();
        let u = url("http://example.com/");
        jar.parse_and_save_cookie(&u, "k=1");
        jar.parse_and_save_cookie(&u, "k=; Expires=Wed, 31 Dec 2000 23:59:59 GMT");
        assert!(jar.get_cookies_for_url(&u).is_empty());
        assert_eq!(jar.total_cookie_count(), 0);
    }

    #[test]
    fn test_parent_domain_cookie_is_found() {
        let jar = CookieMonster::new();
        jar.parse_and_save_cookie(&url("http://www.example.com/"), "d=1; Domain=example.com");
        jar.parse_and_save_cookie(&url("http://api.example.com/"), "h=2");

        let names: Vec<_> = jar
            .get_cookies_for_url(&url("http://api.example.com/"))
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"d".to_string()));
        assert!(names.contains(&"h".to_string()));
    }

    #[test]
    fn test_longest_path_first() {
        let jar = CookieMonster::new();
        let u = url("http://example.com/a/b");
        jar.parse_and_save_cookie(&u, "root=1; Path=/");
        jar.parse_and_save_cookie(&u, "deep=2; Path=/a");

        let names: Vec<_> = jar.get_cookies_for_url(&u).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["deep", "root"]);
    }

    #[test]
    fn test_per_domain_limit_evicts_oldest() {
        let jar = CookieMonster::new();
        let u = url("http://example.com/");
        for i in 0..=MAX_COOKIES_PER_DOMAIN {
            jar.parse_and_save_cookie(&u, &format!("c{}=v", i));
        }
        assert_eq!(jar.total_cookie_count(), MAX_COOKIES_PER_DOMAIN);
    }

    #[test]
    fn test_candidate_domains() {
        assert_eq!(
            candidate_domains("a.b.example.com"),
            vec!["a.b.example.com", "b.example.com", "example.com", "com"]
        );
        assert_eq!(candidate_domains("localhost"), vec!["localhost"]);
    }

    #[test]
    fn test_persistent_jar_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let u = url("http://example.com/");

        let jar = CookieMonster::with_persistence(&path);
        jar.parse_and_save_cookie(&u, "session=abc");
        drop(jar);

        let reloaded = CookieMonster::with_persistence(&path);
        let cookies = reloaded.get_cookies_for_url(&u);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value, "abc");

        reloaded.clear();
        assert_eq!(CookieMonster::with_persistence(&path).total_cookie_count(), 0);
    }
}
