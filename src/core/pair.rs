/// Order a user pair lexicographically
///
/// A match belongs to an unordered pair, so both partners must resolve the
/// same (user_a, user_b) ordering regardless of who swiped last.
///
/// # Returns
/// The two ids with the lexicographically smaller one first
pub fn ordered_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Build the normalized pair key used by the match store's uniqueness constraint
///
/// Both sides of a concurrent mutual like compute the same key, which is what
/// lets the store's create-if-absent collapse the race to a single record.
pub fn pair_key(a: &str, b: &str) -> String {
    let (first, second) = ordered_pair(a, b);
    format!("{}:{}", first, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_pair_is_symmetric() {
        assert_eq!(ordered_pair("alice", "bob"), ("alice", "bob"));
        assert_eq!(ordered_pair("bob", "alice"), ("alice", "bob"));
    }

    #[test]
    fn test_ordered_pair_identical_ids() {
        assert_eq!(ordered_pair("alice", "alice"), ("alice", "alice"));
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(pair_key("alice", "bob"), pair_key("bob", "alice"));
        assert_eq!(pair_key("alice", "bob"), "alice:bob");
    }
}
