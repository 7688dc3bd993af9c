//! Common types used across the resolver modules.

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Normalize a raw verb for index lookups.
///
/// Surrounding whitespace is ignored and comparison is case-insensitive.
/// Returns `None` for input that is empty once trimmed.
pub fn normalize_verb(verb: &str) -> Option<String> {
    let trimmed = verb.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Recover the guard from a poisoned lock.
///
/// Every lock in this crate guards a rebuildable cache, so a panic in another
/// holder never leaves data that must not be read.
pub(crate) fn recover<G>(result: std::sync::LockResult<G>) -> G {
    result.unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_verb() {
        assert_eq!(normalize_verb("LS"), Some("ls".to_string()));
        assert_eq!(normalize_verb("  Grep "), Some("grep".to_string()));
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_verb(""), None);
        assert_eq!(normalize_verb("   "), None);
    }
}
