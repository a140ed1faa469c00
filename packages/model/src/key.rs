use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable node identifier. Survives every mutation except the removal of
/// the node itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Sequential key generator owned by a value or an editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyGenerator {
    prefix: String,
    count: u64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            count: 0,
        }
    }

    /// Mint the next key
    pub fn new_key(&mut self) -> Key {
        let key = Key(format!("{}{}", self.prefix, self.count));
        self.count += 1;
        key
    }

    /// Advance the counter past a key that was supplied from outside, so
    /// that later keys never collide with it.
    pub fn observe(&mut self, key: &Key) {
        let Some(rest) = key.as_str().strip_prefix(self.prefix.as_str()) else {
            return;
        };
        if let Ok(n) = rest.parse::<u64>() {
            if n >= self.count {
                self.count = n + 1;
            }
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
