use crate::cookies::monster::CookieMonster;
use url::Url;

/// Process-wide cookie handler consulted by every request and by the
/// cookie store operations.
///
/// Built once per context and passed by `Arc`; nothing looks it up
/// globally.
pub trait CookieHandler: Send + Sync {
    /// Store one `Set-Cookie` style line for `url`. Invalid lines are dropped.
    fn set_cookie(&self, url: &Url, line: &str);

    /// `name=value` pairs joined by `"; "` for `url`, or `None` if empty.
    fn get_cookie(&self, url: &Url) -> Option<String>;

    fn remove_all_cookies(&self);
}

impl CookieHandler for CookieMonster {
    fn set_cookie(&self, url: &Url, line: &str) {
        self.parse_and_save_cookie(url, line);
    }

    fn get_cookie(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies_for_url(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn remove_all_cookies(&self) {
        self.clear();
    }
}
