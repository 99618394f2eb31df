//! Cookie jar and cookie calls.
//!
//! | Type | Responsibility |
//! |------|----------------|
//! | [`CookieMonster`](monster::CookieMonster) | Concurrent jar, optionally file-backed |
//! | [`CanonicalCookie`](canonical_cookie::CanonicalCookie) | One cookie and its matching rules |
//! | [`CookieHandler`](handler::CookieHandler) | Jar interface used by requests |
//! | [`CookieStore`](store::CookieStore) | set/get/delete/clear calls |
//! | [`persistence`] | JSON save/load |
//! | [`psl`] | Public suffix checks for `Domain` |

pub mod canonical_cookie;
pub mod handler;
pub mod monster;
pub mod persistence;
pub mod psl;
pub mod store;

pub use handler::CookieHandler;
pub use monster::CookieMonster;
pub use store::{CookieEntry, CookieStore};
