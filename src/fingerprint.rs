use std::fmt::{self, Write};

/// Number of leading `id` words that make up a [`Fingerprint`].
pub const FINGERPRINT_WORDS: usize = 5;

/// Printable identity token taken from the header's `id` words.
///
/// This is the first five words rendered as uppercase hex without padding or
/// separators. Nothing is hashed. Because words are not zero-padded,
/// different ids can render to the same string (`[0x1, 0x23, ..]` and
/// `[0x12, 0x3, ..]`), so equal fingerprints only suggest, and do not prove,
/// equal images.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_id(id: &[u32; 8]) -> Self {
        let mut s = String::with_capacity(FINGERPRINT_WORDS * 8);

        for word in &id[..FINGERPRINT_WORDS] {
            // Writing to a String cannot fail.
            let _ = write!(s, "{word:X}");
        }

        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format() {
        let fp = Fingerprint::from_id(&[0xdeadbeef, 0x1, 0x0, 0xabc, 0x12345678, 0xff, 0xff, 0xff]);
        assert_eq!(fp.as_str(), "DEADBEEF10ABC12345678");
        assert_eq!(fp.to_string(), "DEADBEEF10ABC12345678");

        let fp = Fingerprint::from_id(&[0; 8]);
        assert_eq!(fp.as_str(), "00000");

        let fp = Fingerprint::from_id(&[u32::MAX; 8]);
        assert_eq!(fp.as_str().len(), 40);
    }

    #[test]
    fn only_leading_words() {
        let a = Fingerprint::from_id(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let b = Fingerprint::from_id(&[1, 2, 3, 4, 5, 0, 0, 0]);
        assert_eq!(a, b);

        for i in 0..FINGERPRINT_WORDS {
            let mut id = [1, 2, 3, 4, 5, 6, 7, 8];
            id[i] += 0x10;
            assert_ne!(Fingerprint::from_id(&id), a, "word {i}");
        }
    }

    #[test]
    fn weak_equality() {
        let a = Fingerprint::from_id(&[0x1, 0x23, 0, 0, 0, 0, 0, 0]);
        let b = Fingerprint::from_id(&[0x12, 0x3, 0, 0, 0, 0, 0, 0]);
        assert_eq!(a, b);
    }
}
