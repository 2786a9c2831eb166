//! Configuration utility functions
//!
//! This module provides helper functions for reading configuration
//! overrides from environment variables.

use std::path::PathBuf;

/// Get a string value from an environment variable or use the default
pub fn get_env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Get an optional string value from an environment variable.
/// Empty values are treated as unset.
pub fn get_env_opt_string(key: &str, default: Option<String>) -> Option<String> {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => default,
    }
}

/// Get a path value from an environment variable or use the default
pub fn get_env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

/// Get a u32 value from an environment variable or use the default
pub fn get_env_u32(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Get a u64 value from an environment variable or use the default
pub fn get_env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_u32_falls_back_on_garbage() {
        let key = "TVSTREAM_TEST_UTILS_U32";
        unsafe {
            std::env::set_var(key, "not-a-number");
        }
        assert_eq!(get_env_u32(key, 7), 7);
        unsafe {
            std::env::set_var(key, " 12 ");
        }
        assert_eq!(get_env_u32(key, 7), 12);
        unsafe {
            std::env::remove_var(key);
        }
        assert_eq!(get_env_u32(key, 7), 7);
    }

    #[test]
    fn test_get_env_opt_string_ignores_empty() {
        let key = "TVSTREAM_TEST_UTILS_OPT";
        unsafe {
            std::env::set_var(key, "  ");
        }
        assert_eq!(get_env_opt_string(key, None), None);
        unsafe {
            std::env::set_var(key, "/dev/dri/renderD128");
        }
        assert_eq!(
            get_env_opt_string(key, None).as_deref(),
            Some("/dev/dri/renderD128")
        );
        unsafe {
            std::env::remove_var(key);
        }
    }
}
