//! JSON persistence for [`CookieMonster`].

use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::monster::CookieMonster;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use time::OffsetDateTime;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct StoredCookie {
    name: String,
    value: String,
    domain: String,
    path: String,
    secure: bool,
    http_only: bool,
    host_only: bool,
    created_unix_secs: i64,
    expires_unix_secs: Option<i64>,
}

impl From<CanonicalCookie> for StoredCookie {
    fn from(c: CanonicalCookie) -> Self {
        Self {
            name: c.name,
            value: c.value,
            domain: c.domain,
            path: c.path,
            secure: c.secure,
            http_only: c.http_only,
            host_only: c.host_only,
            created_unix_secs: c.creation_time.unix_timestamp(),
            expires_unix_secs: c.expiration_time.map(|t| t.unix_timestamp()),
        }
    }
}

impl StoredCookie {
    fn into_cookie(self) -> CanonicalCookie {
        let now = OffsetDateTime::now_utc();
        CanonicalCookie {
            name: self.name,
            value: self.value,
            domain: self.domain,
            path: self.path,
            creation_time: OffsetDateTime::from_unix_timestamp(self.created_unix_secs)
                .unwrap_or(now),
            expiration_time: self
                .expires_unix_secs
                .and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok()),
            secure: self.secure,
            http_only: self.http_only,
            host_only: self.host_only,
        }
    }
}

/// Write every cookie in `monster` to `path`, creating parent directories.
pub fn save_cookies(monster: &CookieMonster, path: &Path) -> io::Result<()> {
    let stored: Vec<StoredCookie> = monster.iter_all_cookies().map(StoredCookie::from).collect();
    let json = serde_json::to_string_pretty(&stored)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)
}

/// Load cookies from `path` into `monster`, skipping expired ones. Returns
/// how many were restored.
pub fn load_into(monster: &CookieMonster, path: &Path) -> io::Result<usize> {
    let json = fs::read_to_string(path)?;
    let stored: Vec<StoredCookie> =
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let now = OffsetDateTime::now_utc();
    let mut restored = 0;
    for cookie in stored.into_iter().map(StoredCookie::into_cookie) {
        if cookie.is_expired(now) {
            continue;
        }
        monster.restore(cookie);
        restored += 1;
    }
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_expired_entries_skipped_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cookies.json");

        let json = r#"[
            {"name":"live","value":"1","domain":"example.com","path":"/","secure":false,
             "http_only":false,"host_only":true,"created_unix_secs":0,"expires_unix_secs":null},
            {"name":"old","value":"2","domain":"example.com","path":"/","secure":false,
             "http_only":false,"host_only":true,"created_unix_secs":0,"expires_unix_secs":978307199}
        ]"#;
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, json).unwrap();

        let monster = CookieMonster::new();
        assert_eq!(load_into(&monster, &path).unwrap(), 1);
        assert_eq!(monster.iter_all_cookies().next().unwrap().name, "live");
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("cookies.json");

        let monster = CookieMonster::new();
        monster.set_canonical_cookie(CanonicalCookie::new("k", "v", "example.com"));
        save_cookies(&monster, &path).unwrap();

        let restored = CookieMonster::new();
        assert_eq!(load_into(&restored, &path).unwrap(), 1);
    }

    #[test]
    fn test_corrupt_file_is_invalid_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, "not json").unwrap();

        let err = load_into(&CookieMonster::new(), &path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
