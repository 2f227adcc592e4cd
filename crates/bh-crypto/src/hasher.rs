use bh_types::ContentAddress;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so equal bytes hashed under different domains never collide.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for stored patient records.
    pub const RECORD: Self = Self {
        domain: "bh-record-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentAddress {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentAddress::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected address.
    pub fn verify(&self, data: &[u8], expected: &ContentAddress) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn verify_detects_tampering() {
        let addr = ContentHasher::RECORD.hash(b"original");
        assert!(ContentHasher::RECORD.verify(b"original", &addr));
        assert!(!ContentHasher::RECORD.verify(b"tampered", &addr));
    }

    #[test]
    fn custom_domain_differs() {
        let custom = ContentHasher::new("bh-test-v1");
        assert_eq!(custom.domain(), "bh-test-v1");
        assert_ne!(custom.hash(b"data"), ContentHasher::RECORD.hash(b"data"));
    }

    #[test]
    fn domain_is_not_raw_blake3() {
        let addr = ContentHasher::RECORD.hash(b"data");
        assert_ne!(addr.as_bytes(), blake3::hash(b"data").as_bytes());
    }

    proptest! {
        #[test]
        fn identical_bytes_identical_address(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(ContentHasher::RECORD.hash(&data), ContentHasher::RECORD.hash(&data.clone()));
        }

        #[test]
        fn different_bytes_different_address(
            a in proptest::collection::vec(any::<u8>(), 0..64),
            b in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(ContentHasher::RECORD.hash(&a), ContentHasher::RECORD.hash(&b));
        }
    }
}
