use async_trait::async_trait;

use crate::error::RedisError;

/// The subset of key-value commands the reporter reads from.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Plain string value of `key`, `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, RedisError>;

    /// One SCAN step. Returns the matching keys of this step and the cursor to resume
    /// from; a returned cursor of 0 means the iteration is complete.
    async fn scan(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> Result<(Vec<String>, u64), RedisError>;

    /// Single hash field, `None` when the key or the field does not exist.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, RedisError>;

    /// Remaining time to live in seconds. Follows Redis: -1 when the key has no
    /// expiry, -2 when the key does not exist.
    async fn ttl(&self, key: &str) -> Result<i64, RedisError>;

    async fn ping(&self) -> Result<(), RedisError>;
}

/// Escape glob metacharacters so `value` only matches itself inside a SCAN pattern.
pub fn escape_glob(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Glob matching with the subset of Redis pattern syntax the reporter emits:
/// `*`, `?` and backslash escapes.
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();
    match_from(&pattern, &candidate)
}

fn match_from(pattern: &[char], candidate: &[char]) -> bool {
    match pattern.first() {
        None => candidate.is_empty(),
        Some('*') => {
            (0..=candidate.len()).any(|skip| match_from(&pattern[1..], &candidate[skip..]))
        }
        Some('?') => !candidate.is_empty() && match_from(&pattern[1..], &candidate[1..]),
        Some('\\') if pattern.len() > 1 => {
            candidate.first() == Some(&pattern[1]) && match_from(&pattern[2..], &candidate[1..])
        }
        Some(c) => candidate.first() == Some(c) && match_from(&pattern[1..], &candidate[1..]),
    }
}
