//! Fingerprinting utilities for node identity and output namespacing.
//!
//! This module provides:
//! - `Fingerprint`: a truncated hex digest used in node identities and output paths
//! - `Hashable`: canonical byte encoding plus a default `fingerprint()`
//! - `hash_bytes()`: full SHA-256 of arbitrary bytes

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::DIGEST_LEN;

/// A canonical, order-independent fingerprint of a value.
///
/// The fingerprint is a `DIGEST_LEN`-character truncated SHA-256 of the
/// value's canonical encoding. It is reproducible across processes and
/// platforms, which keeps output paths stable between regenerations.
///
/// # Format
///
/// A lowercase hexadecimal string, e.g. `"3f9a0c1be27d4a55"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Types with a canonical byte encoding.
///
/// Implementations must write the same bytes for values that compare equal,
/// independent of how the value was constructed. Length prefixes keep the
/// encoding unambiguous.
pub trait Hashable {
  fn write_canonical(&self, out: &mut Vec<u8>);

  fn fingerprint(&self) -> Fingerprint {
    let mut buf = Vec::new();
    self.write_canonical(&mut buf);
    let full = hash_bytes(&buf);
    Fingerprint(full[..DIGEST_LEN].to_string())
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA-256 hex digest.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}

/// Append a length-prefixed string to a canonical encoding.
pub fn write_str(out: &mut Vec<u8>, s: &str) {
  out.extend_from_slice(s.len().to_string().as_bytes());
  out.push(b':');
  out.extend_from_slice(s.as_bytes());
}
