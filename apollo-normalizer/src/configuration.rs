//! Logic for loading executor configuration in to an object model

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Selections nested deeper than this are most likely a malicious or broken response.
const DEFAULT_RECURSION_LIMIT: usize = 512;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

/// The configuration for the executor.
///
/// Can be created through `serde::Deserialize` from various formats,
/// or from YAML with [`Configuration::from_yaml`].
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Maximum nesting depth of objects in a response before the traversal is aborted.
    pub recursion_limit: usize,

    /// Options for the normalized record set.
    pub normalization: Normalization,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            normalization: Normalization::default(),
        }
    }
}

/// Normalization options.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Normalization {
    /// Separator placed between a parent cache key and a response key or list index when an
    /// object has no identity of its own.
    pub path_separator: String,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            path_separator: ".".to_string(),
        }
    }
}

impl Configuration {
    /// Parses a YAML document. An empty document yields the default configuration.
    pub fn from_yaml(raw_yaml: &str) -> Result<Self, ConfigurationError> {
        if raw_yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let configuration: Configuration = serde_yaml::from_str(raw_yaml).map_err(|e| {
            ConfigurationError::InvalidConfiguration {
                message: "failed to parse yaml",
                error: e.to_string(),
            }
        })?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// The JSON schema of the configuration, for editor support and validation by tooling.
    pub fn schema() -> RootSchema {
        let settings = SchemaSettings::draft07().with(|s| {
            s.option_nullable = true;
            s.option_add_null_type = false;
            s.inline_subschemas = true;
        });
        settings.into_generator().into_root_schema_for::<Configuration>()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.recursion_limit == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid recursion_limit",
                error: "the limit must be greater than zero".to_string(),
            });
        }
        if self.normalization.path_separator.is_empty() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid normalization.path_separator",
                error: "the separator must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
