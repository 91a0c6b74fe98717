//! Content hashing for plug values and evaluation contexts.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::value::Value;

/// Digest identifying the content of a computation.
///
/// Two plugs with equal hashes under a context are guaranteed to produce
/// equal values under that context.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Returns the raw digest bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &hex::encode(self.0)[..12])
    }
}

/// Append-only accumulator producing a [`ContentHash`].
///
/// Every append is length- or tag-prefixed so that distinct sequences of
/// appends cannot collide by concatenation.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a string.
    pub fn append_str(&mut self, s: &str) -> &mut Self {
        self.inner.update(b"s");
        self.inner.update((s.len() as u64).to_le_bytes());
        self.inner.update(s.as_bytes());
        self
    }

    /// Appends an integer.
    pub fn append_int(&mut self, i: i64) -> &mut Self {
        self.inner.update(b"i");
        self.inner.update(i.to_le_bytes());
        self
    }

    /// Appends another hash.
    pub fn append_hash(&mut self, hash: &ContentHash) -> &mut Self {
        self.inner.update(b"h");
        self.inner.update(hash.0);
        self
    }

    /// Appends a value, including its type.
    pub fn append_value(&mut self, value: &Value) -> &mut Self {
        self.append_str(value.value_type().as_ref());
        match value {
            Value::Bool(b) => self.inner.update([u8::from(*b)]),
            Value::Int(i) => self.inner.update(i.to_le_bytes()),
            Value::Float(f) => self.inner.update(f.to_bits().to_le_bytes()),
            Value::String(s) => {
                self.append_str(s);
            }
        }
        self
    }

    /// Consumes the hasher and returns the digest.
    pub fn finish(self) -> ContentHash {
        ContentHash(self.inner.finalize().into())
    }
}

impl fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentHasher").finish_non_exhaustive()
    }
}
