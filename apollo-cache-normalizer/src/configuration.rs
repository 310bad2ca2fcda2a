//! Logic for loading configuration in to an object model

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::identity::DEFAULT_ID_FIELD;
use crate::identity::ROOT_QUERY;

const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_yaml::Error),
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

/// Which key a normalized record uses for each field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKeys {
    /// The key of the field in the result: its alias when it has one.
    #[default]
    ResponseKey,
    /// The schema name of the field, even when it is aliased.
    FieldName,
}

/// Normalizer configuration.
///
/// Normalizations whose stores are merged into one cache must agree on `root_id` and
/// `id_field`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Identity of a top-level result object that has no identity of its own.
    pub(crate) root_id: String,

    /// Key of a result object holding its identity.
    pub(crate) id_field: String,

    /// Keys of normalized records.
    pub(crate) record_keys: RecordKeys,

    /// Maximum nesting of objects and lists in a result.
    pub(crate) max_depth: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            root_id: ROOT_QUERY.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            record_keys: RecordKeys::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[buildstructor::buildstructor]
impl Configuration {
    /// Builds a validated configuration; unset options take their defaults.
    #[builder]
    pub fn new(
        root_id: Option<String>,
        id_field: Option<String>,
        record_keys: Option<RecordKeys>,
        max_depth: Option<usize>,
    ) -> Result<Self, ConfigurationError> {
        Self {
            root_id: root_id.unwrap_or_else(|| ROOT_QUERY.to_string()),
            id_field: id_field.unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()),
            record_keys: record_keys.unwrap_or_default(),
            max_depth: max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        }
        .validate()
    }
}

impl Configuration {
    /// Loads and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        let configuration: Configuration =
            serde_yaml::from_str(yaml).map_err(ConfigurationError::DeserializeConfigError)?;
        configuration.validate()
    }

    /// The JSON schema of the YAML document.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(Configuration)
    }

    pub(crate) fn validate(self) -> Result<Self, ConfigurationError> {
        if self.root_id.is_empty() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid root_id",
                error: "the root identity cannot be empty".to_string(),
            });
        }
        if self.id_field.is_empty() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid id_field",
                error: "the identity field cannot be empty".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid max_depth",
                error: "must be at least 1".to_string(),
            });
        }
        Ok(self)
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn record_keys(&self) -> RecordKeys {
        self.record_keys
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
