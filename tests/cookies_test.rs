use nativehttp::base::neterror::NetError;
use nativehttp::cookies::{CookieHandler, CookieMonster, CookieStore};
use std::sync::Arc;
use url::Url;

fn store() -> (Arc<CookieMonster>, CookieStore) {
    let jar = Arc::new(CookieMonster::new());
    (jar.clone(), CookieStore::new(jar))
}

#[test]
fn test_set_get_delete_round_trip() {
    let (_, store) = store();
    let url = "http://example.com";

    store.set_cookie(url, "theme", "dark").unwrap();
    let cookies = store.get_cookies(url).unwrap();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].key, "theme");
    assert_eq!(cookies[0].value, "dark");

    store.delete_cookie(url, "theme").unwrap();
    assert!(store.get_cookies(url).unwrap().is_empty());
}

#[test]
fn test_set_overwrites_same_key() {
    let (jar, store) = store();
    store.set_cookie("http://example.com/", "k", "1").unwrap();
    store.set_cookie("http://example.com/", "k", "2").unwrap();

    let cookies = store.get_cookies("http://example.com/").unwrap();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].value, "2");
    assert_eq!(jar.total_cookie_count(), 1);
}

#[test]
fn test_cookies_are_per_host() {
    let (_, store) = store();
    store.set_cookie("http://a.example.com", "a", "1").unwrap();
    store.set_cookie("http://b.example.com", "b", "2").unwrap();

    let a = store.get_cookies("http://a.example.com").unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].key, "a");
}

#[test]
fn test_clear_removes_everything() {
    let (jar, store) = store();
    store.set_cookie("http://example.com", "a", "1").unwrap();
    store.set_cookie("http://example.org", "b", "2").unwrap();

    store.clear_cookies();
    assert_eq!(jar.total_cookie_count(), 0);
    assert!(store.get_cookies("http://example.com").unwrap().is_empty());
}

#[test]
fn test_invalid_url_rejected() {
    let (jar, store) = store();
    assert_eq!(store.set_cookie("ht!tp://", "a", "1"), Err(NetError::InvalidUrl));
    assert_eq!(store.get_cookies("ht!tp://"), Err(NetError::InvalidUrl));
    assert_eq!(store.delete_cookie("ht!tp://", "a"), Err(NetError::InvalidUrl));
    assert_eq!(jar.total_cookie_count(), 0);
}

#[test]
fn test_parent_domain_cookie_visible_to_subdomain() {
    let jar = CookieMonster::new();
    let url = Url::parse("https://a.example.com/").unwrap();
    assert!(jar.parse_and_save_cookie(&url, "shared=1; Domain=example.com"));

    let sub = Url::parse("https://b.example.com/").unwrap();
    assert_eq!(jar.get_cookie(&sub).as_deref(), Some("shared=1"));
}

#[test]
fn test_public_suffix_domain_rejected() {
    let jar = CookieMonster::new();
    let url = Url::parse("https://foo.co.uk/").unwrap();
    assert!(!jar.parse_and_save_cookie(&url, "evil=1; Domain=co.uk"));
    assert_eq!(jar.total_cookie_count(), 0);
}

#[test]
fn test_path_ordering() {
    let jar = CookieMonster::new();
    let url = Url::parse("https://example.com/app/page").unwrap();
    jar.parse_and_save_cookie(&url, "root=1; Path=/");
    jar.parse_and_save_cookie(&url, "app=2; Path=/app");
    jar.parse_and_save_cookie(&url, "other=3; Path=/other");

    assert_eq!(jar.get_cookie(&url).as_deref(), Some("app=2; root=1"));
}

#[test]
fn test_persistent_jar_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("state/cookies.json");
    let url = Url::parse("https://example.com/").unwrap();

    {
        let jar = CookieMonster::with_persistence(&file);
        jar.set_cookie(&url, "kept=yes; Max-Age=3600");
        jar.set_cookie(&url, "gone=soon; Max-Age=0");
    }
    assert!(file.exists());

    let reloaded = CookieMonster::with_persistence(&file);
    assert_eq!(reloaded.get_cookie(&url).as_deref(), Some("kept=yes"));

    reloaded.remove_all_cookies();
    let emptied = CookieMonster::with_persistence(&file);
    assert_eq!(emptied.total_cookie_count(), 0);
}

#[test]
fn test_corrupt_cookie_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("cookies.json");
    std::fs::write(&file, "not json").unwrap();

    let jar = CookieMonster::with_persistence(&file);
    assert_eq!(jar.total_cookie_count(), 0);
}
