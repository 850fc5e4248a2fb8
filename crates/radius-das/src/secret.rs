//! Shared secret storage
//!
//! The secret is copied once at server initialization and wiped from memory
//! when the server context is dropped.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// RADIUS shared secret that zeroizes on drop and never prints itself
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    inner: Vec<u8>,
}

impl SharedSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: bytes.into(),
        }
    }

    /// Secret bytes for digest computation
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret(<{} bytes redacted>)", self.inner.len())
    }
}
