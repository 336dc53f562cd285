//! Environment variable parsing utilities.
//!
//! Typed helpers used by the configuration layers, replacing the repeated
//! `std::env::var(..).ok().and_then(|v| v.parse().ok()).unwrap_or(..)` chain.
//!
//! # Example
//!
//! ```
//! use prober_types::env_utils::{env_bool, env_var, env_var_or};
//!
//! let timeout: u64 = env_var_or("PROBER_TIMEOUT_SECS", 10);
//! let custom: Option<u64> = env_var("PROBER_TIMEOUT_MS");
//! let verbose = env_bool("PROBER_VERBOSE");
//! # let _ = (timeout, custom, verbose);
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable with a default value.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Check if an environment variable is set to a truthy value.
///
/// Recognizes "1", "true", "yes", "on" (case-insensitive).
pub fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Read a non-empty string environment variable.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_parsing() {
        std::env::set_var("PROBER_TEST_ENV_U64", " 42 ");
        assert_eq!(env_var::<u64>("PROBER_TEST_ENV_U64"), Some(42));
        std::env::remove_var("PROBER_TEST_ENV_U64");
    }

    #[test]
    fn test_env_var_invalid_uses_default() {
        std::env::set_var("PROBER_TEST_ENV_BAD", "not-a-number");
        assert_eq!(env_var_or::<u64>("PROBER_TEST_ENV_BAD", 7), 7);
        std::env::remove_var("PROBER_TEST_ENV_BAD");
    }

    #[test]
    fn test_env_bool_values() {
        std::env::set_var("PROBER_TEST_ENV_BOOL", "Yes");
        assert!(env_bool("PROBER_TEST_ENV_BOOL"));
        std::env::set_var("PROBER_TEST_ENV_BOOL", "0");
        assert!(!env_bool("PROBER_TEST_ENV_BOOL"));
        std::env::remove_var("PROBER_TEST_ENV_BOOL");
        assert!(!env_bool("PROBER_TEST_ENV_BOOL"));
    }

    #[test]
    fn test_env_string_empty_is_none() {
        std::env::set_var("PROBER_TEST_ENV_STR", "  ");
        assert_eq!(env_string("PROBER_TEST_ENV_STR"), None);
        std::env::remove_var("PROBER_TEST_ENV_STR");
    }
}
