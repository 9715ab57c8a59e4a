//! Configuration validation logic.

use crate::errors::Error;
use crate::sqlite::MAX_SEARCH_LIMIT;
use std::path::PathBuf;

/// Upper bound accepted for `embedding_dims`.
pub const MAX_EMBEDDING_DIMS: usize = 8192;

/// Validates configuration values.
pub struct ConfigValidator {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
    /// HuggingFace embedding model identifier.
    pub embedding_model: String,
    /// Vector length produced by the model.
    pub embedding_dims: usize,
    /// Default number of query results.
    pub search_limit: usize,
}

impl ConfigValidator {
    /// Validate all configuration values for correctness and constraints.
    ///
    /// Checks that:
    /// - Embedding dimensions are between 1 and `MAX_EMBEDDING_DIMS`
    /// - Search limit is between 1 and `MAX_SEARCH_LIMIT`
    /// - Embedding model is not empty
    /// - Database path is not empty
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any validation check fails.
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_embedding_dims()?;
        self.validate_search_limit()?;
        self.validate_embedding_model()?;
        self.validate_database_path()?;

        Ok(())
    }

    fn validate_embedding_dims(&self) -> Result<(), Error> {
        if self.embedding_dims == 0 || self.embedding_dims > MAX_EMBEDDING_DIMS {
            return Err(Error::Config(format!(
                "Invalid embedding dimensions: {} (must be between 1 and {MAX_EMBEDDING_DIMS})",
                self.embedding_dims
            )));
        }

        Ok(())
    }

    fn validate_search_limit(&self) -> Result<(), Error> {
        if self.search_limit == 0 || self.search_limit > MAX_SEARCH_LIMIT {
            return Err(Error::Config(format!(
                "Invalid search limit: {} (must be between 1 and {MAX_SEARCH_LIMIT})",
                self.search_limit
            )));
        }

        Ok(())
    }

    fn validate_embedding_model(&self) -> Result<(), Error> {
        if self.embedding_model.trim().is_empty() {
            return Err(Error::Config("Embedding model cannot be empty".to_string()));
        }

        Ok(())
    }

    fn validate_database_path(&self) -> Result<(), Error> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ConfigValidator {
        ConfigValidator {
            database_path: PathBuf::from("/test/memories.db"),
            embedding_model: "test/model".to_string(),
            embedding_dims: 768,
            search_limit: 5,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_zero_dims_rejected() {
        let validator = ConfigValidator {
            embedding_dims: 0,
            ..valid()
        };
        assert!(matches!(validator.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_dims_bounds() {
        let mut validator = valid();
        validator.embedding_dims = 1;
        assert!(validator.validate().is_ok());

        validator.embedding_dims = MAX_EMBEDDING_DIMS;
        assert!(validator.validate().is_ok());

        validator.embedding_dims = MAX_EMBEDDING_DIMS + 1;
        assert!(matches!(validator.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_search_limit_bounds() {
        let mut validator = valid();
        validator.search_limit = 0;
        assert!(matches!(validator.validate(), Err(Error::Config(_))));

        validator.search_limit = MAX_SEARCH_LIMIT;
        assert!(validator.validate().is_ok());

        validator.search_limit = MAX_SEARCH_LIMIT + 1;
        assert!(matches!(validator.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_model_rejected() {
        let validator = ConfigValidator {
            embedding_model: "  ".to_string(),
            ..valid()
        };
        assert!(matches!(validator.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let validator = ConfigValidator {
            database_path: PathBuf::new(),
            ..valid()
        };
        assert!(matches!(validator.validate(), Err(Error::Config(_))));
    }
}
