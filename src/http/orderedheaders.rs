use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::str::FromStr;

/// Request headers in the order the caller supplied them.
///
/// Names are validated on insert and compared case-insensitively; writing an
/// existing name replaces its value in place, so the last write wins while the
/// first position is kept.
#[derive(Debug, Clone, Default)]
pub struct OrderedHeaderMap {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl OrderedHeaderMap {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Build from caller-supplied pairs, applying each in order.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, NetError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = Self::new();
        for (name, value) in pairs {
            map.insert(name, value)?;
        }
        Ok(map)
    }

    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let invalid = || NetError::InvalidHeader {
            name: name.to_string(),
        };
        let name_header = HeaderName::from_str(name).map_err(|_| invalid())?;
        let value_header = HeaderValue::from_str(value).map_err(|_| invalid())?;

        // HeaderName is lowercase, so equality is a case-insensitive match.
        if let Some((_, v)) = self.headers.iter_mut().find(|(n, _)| *n == name_header) {
            *v = value_header;
        } else {
            self.headers.push((name_header, value_header));
        }
        Ok(())
    }

    /// Insert only when the name is not present yet.
    pub fn insert_default(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        if self.contains(name) {
            return Ok(());
        }
        self.insert(name, value)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let target = HeaderName::from_str(name).ok()?;
        self.headers
            .iter()
            .find(|(n, _)| *n == target)
            .and_then(|(_, v)| v.to_str().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The request `Content-Type`, which drives body encoding.
    pub fn content_type(&self) -> Option<&str> {
        self.get(http::header::CONTENT_TYPE.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter().map(|(n, v)| (n, v))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Consumes the map and returns a standard `http::HeaderMap`.
    pub fn to_header_map(self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            map.append(name, value);
        }
        map
    }
}
