//! Endpoint keys.
//!
//! A key is the name a caller dispatches by (`getUser`, `list_pets`). It
//! begins with a letter and continues with letters, digits or `_`, so it can
//! be embedded in cache keys and log fields without escaping.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a string was refused as an endpoint key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EndpointKeyError {
    #[error("key is empty")]
    Empty,

    #[error("key starts with '{0}', expected a letter")]
    LeadingNonLetter(char),

    #[error("key has '{found}' at position {position}, expected a letter, digit or '_'")]
    IllegalChar { found: char, position: usize },
}

/// A checked endpoint key.
///
/// Deserializing goes through the same check, so a definitions row with a
/// malformed key fails while the file is parsed.
///
/// ```rust
/// use apimap_lib::EndpointKey;
///
/// let key = EndpointKey::new("getUser").unwrap();
/// assert_eq!(key.as_str(), "getUser");
/// assert!(EndpointKey::new("get-user").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointKey(String);

impl EndpointKey {
    pub fn new(key: impl Into<String>) -> Result<Self, EndpointKeyError> {
        let key = key.into();
        check(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check(key: &str) -> Result<(), EndpointKeyError> {
    let mut chars = key.char_indices();
    let (_, first) = chars.next().ok_or(EndpointKeyError::Empty)?;
    if !first.is_alphabetic() {
        return Err(EndpointKeyError::LeadingNonLetter(first));
    }
    match chars.find(|(_, c)| !(c.is_alphanumeric() || *c == '_')) {
        Some((position, found)) => Err(EndpointKeyError::IllegalChar { found, position }),
        None => Ok(()),
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Registry maps are looked up by `&str`.
impl Borrow<str> for EndpointKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EndpointKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<EndpointKey> for String {
    fn from(key: EndpointKey) -> Self {
        key.0
    }
}

impl TryFrom<String> for EndpointKey {
    type Error = EndpointKeyError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}

impl TryFrom<&str> for EndpointKey {
    type Error = EndpointKeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}
