//! Configuration for the sales pipeline.
//!
//! Uses the builder pattern with validate-on-build so a hosting UI can send
//! configuration as JSON and get a structured validation error back.

use serde::{Deserialize, Serialize};

/// Smallest allowed value for the product top-N truncation.
pub const TOP_N_MIN: usize = 5;
/// Largest allowed value for the product top-N truncation.
pub const TOP_N_MAX: usize = 30;

/// Configuration for [`crate::SalesPipeline`].
///
/// Use [`PipelineConfig::builder()`] for a fluent setup:
///
/// ```rust,ignore
/// let config = PipelineConfig::builder()
///     .top_n(15)
///     .export_file_name("q3_sales.csv")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of product groups kept in the revenue-by-product ranking.
    /// Must lie in [`TOP_N_MIN`]..=[`TOP_N_MAX`]. Default: 10.
    pub top_n: usize,

    /// File name used for the exported filtered table.
    /// Default: "filtered_sales.csv".
    pub export_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            export_file_name: "filtered_sales.csv".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(TOP_N_MIN..=TOP_N_MAX).contains(&self.top_n) {
            return Err(ConfigValidationError::TopNOutOfRange(self.top_n));
        }

        if self.export_file_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyExportFileName);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid top-N value: {0} (must be between {TOP_N_MIN} and {TOP_N_MAX})")]
    TopNOutOfRange(usize),

    #[error("Export file name must not be empty")]
    EmptyExportFileName,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    top_n: Option<usize>,
    export_file_name: Option<String>,
}

impl PipelineConfigBuilder {
    /// Set how many product groups the revenue ranking keeps.
    ///
    /// # Arguments
    /// * `n` - Value between [`TOP_N_MIN`] and [`TOP_N_MAX`] inclusive.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set the file name used when exporting the filtered table.
    pub fn export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            top_n: self.top_n.unwrap_or(defaults.top_n),
            export_file_name: self.export_file_name.unwrap_or(defaults.export_file_name),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.top_n, 10);
        assert_eq!(config.export_file_name, "filtered_sales.csv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .top_n(30)
            .export_file_name("weekly.csv")
            .build()
            .unwrap();

        assert_eq!(config.top_n, 30);
        assert_eq!(config.export_file_name, "weekly.csv");
    }

    #[test]
    fn test_validation_top_n_bounds() {
        assert!(PipelineConfig::builder().top_n(4).build().is_err());
        assert!(PipelineConfig::builder().top_n(31).build().is_err());
        assert!(PipelineConfig::builder().top_n(5).build().is_ok());
        assert!(PipelineConfig::builder().top_n(30).build().is_ok());
    }

    #[test]
    fn test_validation_empty_export_name() {
        let result = PipelineConfig::builder().export_file_name("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyExportFileName
        ));
    }

    #[test]
    fn test_config_from_frontend_json() {
        let json = r#"{"top_n": 12, "export_file_name": "sales.csv"}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.top_n, 12);
        assert_eq!(config.export_file_name, "sales.csv");
    }
}
