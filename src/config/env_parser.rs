//! Environment variable parsing utilities for configuration.

use crate::errors::Error;
use std::path::PathBuf;

use super::paths;

pub const ENV_DATABASE_PATH: &str = "AMNESIA_DB";
pub const ENV_EMBEDDING_MODEL: &str = "AMNESIA_EMBEDDING_MODEL";
pub const ENV_EMBEDDING_DIMS: &str = "AMNESIA_EMBEDDING_DIMS";
pub const ENV_MODEL_CACHE: &str = "AMNESIA_MODEL_CACHE";
pub const ENV_SEARCH_LIMIT: &str = "AMNESIA_SEARCH_LIMIT";

/// Every variable read by the configuration loader.
#[cfg(test)]
pub const ALL_ENV_VARS: [&str; 5] = [
    ENV_DATABASE_PATH,
    ENV_EMBEDDING_MODEL,
    ENV_EMBEDDING_DIMS,
    ENV_MODEL_CACHE,
    ENV_SEARCH_LIMIT,
];

/// Parse environment variable value or return error if empty/whitespace.
fn parse_env_string(name: &str, value: &str) -> Result<String, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(value.to_string())
}

/// Parse environment variable as a path, expanding tilde.
fn parse_env_path(name: &str, value: &str) -> Result<PathBuf, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(paths::expand_tilde_path(&PathBuf::from(value)))
}

/// Parse environment variable as an unsigned integer. Range checks happen in validation.
fn parse_env_usize(name: &str, value: &str) -> Result<usize, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {name} value: {e}")))
}

/// Apply AMNESIA_DB environment variable override.
pub fn apply_database_path_override(database_path: &mut PathBuf) -> Result<(), Error> {
    if let Ok(val) = std::env::var(ENV_DATABASE_PATH) {
        *database_path = parse_env_path(ENV_DATABASE_PATH, &val)?;
    }
    Ok(())
}

/// Apply AMNESIA_EMBEDDING_MODEL environment variable override.
pub fn apply_embedding_model_override(embedding_model: &mut String) -> Result<(), Error> {
    if let Ok(val) = std::env::var(ENV_EMBEDDING_MODEL) {
        *embedding_model = parse_env_string(ENV_EMBEDDING_MODEL, &val)?;
    }
    Ok(())
}

/// Apply AMNESIA_EMBEDDING_DIMS environment variable override.
pub fn apply_embedding_dims_override(embedding_dims: &mut usize) -> Result<(), Error> {
    if let Ok(val) = std::env::var(ENV_EMBEDDING_DIMS) {
        *embedding_dims = parse_env_usize(ENV_EMBEDDING_DIMS, &val)?;
    }
    Ok(())
}

/// Apply AMNESIA_MODEL_CACHE environment variable override.
pub fn apply_model_cache_override(model_cache: &mut PathBuf) -> Result<(), Error> {
    if let Ok(val) = std::env::var(ENV_MODEL_CACHE) {
        *model_cache = parse_env_path(ENV_MODEL_CACHE, &val)?;
    }
    Ok(())
}

/// Apply AMNESIA_SEARCH_LIMIT environment variable override.
pub fn apply_search_limit_override(search_limit: &mut usize) -> Result<(), Error> {
    if let Ok(val) = std::env::var(ENV_SEARCH_LIMIT) {
        *search_limit = parse_env_usize(ENV_SEARCH_LIMIT, &val)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_string_empty() {
        let result = parse_env_string("TEST_VAR", "");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_env_string_whitespace() {
        let result = parse_env_string("TEST_VAR", "   ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_env_string_valid() {
        let result = parse_env_string("TEST_VAR", "valid");
        assert_eq!(result.unwrap(), "valid");
    }

    #[test]
    fn test_parse_env_path_expands_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let path = parse_env_path("TEST_PATH", "~/amnesia/memories.db").unwrap();
        assert_eq!(path, home.join("amnesia/memories.db"));
    }

    #[test]
    fn test_parse_env_usize_invalid() {
        assert!(matches!(
            parse_env_usize("TEST_NUM", "many"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_env_usize("TEST_NUM", "-3"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_env_usize_trims() {
        assert_eq!(parse_env_usize("TEST_NUM", " 384 ").unwrap(), 384);
    }
}
