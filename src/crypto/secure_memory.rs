//! Secure memory handling for sensitive data
//!
//! Provides types that securely zero memory on drop to prevent
//! sensitive data from lingering in memory.

use std::fmt;
use std::ops::Deref;

use zeroize::Zeroize;

/// A string type that zeros its contents on drop
///
/// Use this for passwords read from the terminal before they are sealed.
pub struct SecureString {
    inner: String,
}

impl SecureString {
    /// Create a new SecureString
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    /// Get the string contents
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Get the length
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Strip a trailing line terminator in place
    pub fn trim_line_end(&mut self) {
        while self.inner.ends_with('\n') || self.inner.ends_with('\r') {
            self.inner.pop();
        }
    }

    /// Copy the contents into a guarded byte buffer
    pub fn to_locked_buffer(&self) -> LockedBuffer {
        LockedBuffer::from_slice(self.inner.as_bytes())
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl Deref for SecureString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// Don't print the contents in Debug output
impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("len", &self.inner.len())
            .finish()
    }
}

// Don't print the contents in Display output
impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.inner.len())
    }
}

/// A guarded plaintext buffer handed out by [`Enclave::open`](super::Enclave::open)
///
/// The contents are overwritten with zeros on [`destroy`](Self::destroy) and on
/// drop, so every exit path (early `?` returns, unwinding panics) wipes them.
/// Destroying twice is a no-op.
pub struct LockedBuffer {
    inner: Vec<u8>,
    destroyed: bool,
}

impl LockedBuffer {
    /// Take ownership of bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: bytes,
            destroyed: false,
        }
    }

    /// Copy a slice into a new buffer
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    /// Create an empty buffer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Vec::with_capacity(capacity))
    }

    /// Get the bytes (empty once destroyed)
    pub fn bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Get mutable bytes
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.inner
    }

    /// Append bytes without leaving a stale copy behind on reallocation
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        let needed = self.inner.len() + bytes.len();
        if needed > self.inner.capacity() {
            let mut grown = Vec::with_capacity(needed);
            grown.extend_from_slice(&self.inner);
            self.inner.zeroize();
            self.inner = grown;
        }
        self.inner.extend_from_slice(bytes);
        self.destroyed = false;
    }

    /// Get the length
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether [`destroy`](Self::destroy) has run
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Overwrite the contents with zeros and release the allocation
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.inner.zeroize();
        self.inner = Vec::new();
        self.destroyed = true;
    }
}

impl Drop for LockedBuffer {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl Deref for LockedBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl AsRef<[u8]> for LockedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl PartialEq for LockedBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

// Don't print the contents in Debug output
impl fmt::Debug for LockedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedBuffer")
            .field("len", &self.inner.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
