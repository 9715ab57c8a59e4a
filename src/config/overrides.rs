//! Environment variable overrides for configuration.

use crate::errors::Error;

use super::env_parser;
use super::Config;

/// Apply environment variable overrides to configuration.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), Error> {
    env_parser::apply_database_path_override(&mut config.database_path)?;
    env_parser::apply_embedding_model_override(&mut config.embedding_model)?;
    env_parser::apply_embedding_dims_override(&mut config.embedding_dims)?;
    env_parser::apply_model_cache_override(&mut config.model_cache)?;
    env_parser::apply_search_limit_override(&mut config.search_limit)?;
    Ok(())
}
