//! Shared serde helper functions used across multiple modules.

/// Serde default helper that returns `true`.
pub fn default_true() -> bool {
    true
}

/// `skip_serializing_if` predicate: emit a boolean only when it is `true`.
pub fn is_false(value: &bool) -> bool {
    !*value
}
