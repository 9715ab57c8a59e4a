//! Shared test utilities for config module tests.

use std::sync::Mutex;

use super::env_parser::ALL_ENV_VARS;

/// Mutex to serialize environment variable tests and prevent race conditions.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Set an environment variable. Callers must hold `ENV_MUTEX`.
pub fn set_env_var(name: &str, value: &str) {
    // SAFETY: env tests are serialized through ENV_MUTEX.
    unsafe { std::env::set_var(name, value) };
}

/// Clean up environment variables used by amnesia config.
pub fn cleanup_env_vars() {
    for var in ALL_ENV_VARS {
        // SAFETY: env tests are serialized through ENV_MUTEX.
        unsafe { std::env::remove_var(var) };
    }
}
