//! Content fingerprints for change detection.
//!
//! Fingerprints identify extracted text cheaply so repeated runs can tell
//! whether a title changed. They are NOT collision resistant and must not be
//! used for integrity or security checks.

use sha2::{Digest, Sha256};

/// Length of the hex fingerprint kept after truncation.
pub const FINGERPRINT_LEN: usize = 10;

/// Produces a short deterministic identity string for a piece of text.
pub trait ContentFingerprinter: Send + Sync {
    /// Fingerprint the exact text. Identical input must give identical output.
    fn fingerprint(&self, text: &str) -> String;
}

/// Polynomial rolling hash (`hash * 31 + unit`) over UTF-16 code units.
///
/// Arithmetic wraps at 32 bits, the absolute value is rendered as lowercase
/// hex and truncated to [`FINGERPRINT_LEN`] characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingHashFingerprinter;

impl ContentFingerprinter for RollingHashFingerprinter {
    fn fingerprint(&self, text: &str) -> String {
        let hash = text
            .encode_utf16()
            .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)));

        // Widen first: |i32::MIN| does not fit in an i32.
        let magnitude = i64::from(hash).unsigned_abs();
        let mut hex = format!("{magnitude:x}");
        hex.truncate(FINGERPRINT_LEN);
        hex
    }
}

/// SHA-256 based fingerprint, truncated to the same length.
///
/// Swappable with [`RollingHashFingerprinter`]; fingerprints from the two are
/// not comparable, so switching invalidates change detection for cached data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Fingerprinter;

impl ContentFingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let mut hex = hex::encode(hasher.finalize());
        hex.truncate(FINGERPRINT_LEN);
        hex
    }
}

/// Fingerprint text with the default rolling hash.
pub fn fingerprint(text: &str) -> String {
    RollingHashFingerprinter.fingerprint(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stability() {
        let a = fingerprint("Title 12 - Banks and Banking");
        let b = fingerprint("Title 12 - Banks and Banking");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_known_values() {
        assert_eq!(fingerprint(""), "0");
        assert_eq!(fingerprint("a"), "61");
        assert_eq!(fingerprint("abc"), "17862");
    }

    #[test]
    fn test_fingerprint_wraps_32_bits() {
        // 1794106052 == 0x6aefe2c4
        assert_eq!(fingerprint("hello world"), "6aefe2c4");
    }

    #[test]
    fn test_fingerprint_min_value_absolute() {
        // This string hashes to i32::MIN.
        assert_eq!(fingerprint("polygenelubricants"), "80000000");
    }

    #[test]
    fn test_fingerprint_order_sensitive() {
        assert_ne!(fingerprint("ab"), fingerprint("ba"));
    }

    #[test]
    fn test_sha256_fingerprint_format() {
        let fp = Sha256Fingerprinter.fingerprint("hello");
        assert_eq!(fp.len(), FINGERPRINT_LEN);
        assert_eq!(fp, "2cf24dba5f");
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprinters_are_swappable() {
        let impls: Vec<Box<dyn ContentFingerprinter>> =
            vec![Box::new(RollingHashFingerprinter), Box::new(Sha256Fingerprinter)];
        for fp in impls {
            assert_eq!(fp.fingerprint("x"), fp.fingerprint("x"));
        }
    }
}
