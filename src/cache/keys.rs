//! Cache key derivation for article listings.

use sha2::{Digest, Sha256};

/// Key holding the full, unpaginated article listing.
pub const ARTICLES_ALL_KEY: &str = "articles";

/// Namespace under which every paginated or searched listing is stored.
pub const DEFAULT_PAGINATION_NAMESPACE: &str = "articles:pagination";

/// Derive the cache key for one listing request.
///
/// Fields are joined in a fixed order and hashed so that arbitrary keywords
/// produce a bounded key. The keyword is used exactly as given, so callers
/// normalise it first if they want `"Rust"` and `" rust"` to share an entry.
pub fn derive_key(
    namespace: &str,
    page: u32,
    page_size: u32,
    order: &str,
    keyword: &str,
) -> String {
    let canonical = format!("page:{page}_size:{page_size}_order:{order}_keyword:{keyword}");
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{namespace}:{}", hex::encode(digest))
}

/// Prefix matching every key produced by [`derive_key`] for `namespace`.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_yield_same_key() {
        let first = derive_key(
            DEFAULT_PAGINATION_NAMESPACE,
            2,
            20,
            "created_at desc",
            "rust",
        );
        let second = derive_key(
            DEFAULT_PAGINATION_NAMESPACE,
            2,
            20,
            "created_at desc",
            "rust",
        );
        assert_eq!(first, second);
    }

    #[test]
    fn every_field_participates() {
        let base = derive_key("ns", 1, 10, "id asc", "cat");
        assert_ne!(base, derive_key("ns", 2, 10, "id asc", "cat"));
        assert_ne!(base, derive_key("ns", 1, 11, "id asc", "cat"));
        assert_ne!(base, derive_key("ns", 1, 10, "id desc", "cat"));
        assert_ne!(base, derive_key("ns", 1, 10, "id asc", "Cat"));
        assert_ne!(base, derive_key("ns", 1, 10, "id asc", "cat "));
        assert_ne!(base, derive_key("other", 1, 10, "id asc", "cat"));
    }

    #[test]
    fn keys_are_namespaced_and_bounded() {
        let long_keyword = "x".repeat(4096);
        let key = derive_key(
            DEFAULT_PAGINATION_NAMESPACE,
            1,
            10,
            "id asc",
            &long_keyword,
        );
        let prefix = namespace_prefix(DEFAULT_PAGINATION_NAMESPACE);
        assert!(key.starts_with(&prefix));
        assert_eq!(key.len(), prefix.len() + 64);
        assert!(!ARTICLES_ALL_KEY.starts_with(&prefix));
    }
}
