//! Content fingerprints using FxHash.
//!
//! Fast and deterministic, not cryptographic. Good enough to tell two
//! versions of a settings file apart in a diagnostic message.
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let h = hash::compute("some content"); // -> u64
//! let fp = hash::fingerprint("some content"); // -> "a1b2c3d4"
//! ```

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

/// Compute hash and return as 8-char hex fingerprint.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(value: &T) -> String {
    format!("{:016x}", compute(value))[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(compute("graphics"), compute(b"graphics"));
        assert_ne!(compute("a"), compute("b"));
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = fingerprint("<Root/>");
        assert_eq!(fp.len(), 8);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fingerprint("<Root/>"));
    }
}
