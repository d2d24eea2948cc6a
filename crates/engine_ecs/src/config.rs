//! World configuration.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The environment variable holding a JSON-encoded [`WorldConfig`].
pub const WORLD_CONFIG_ENV: &str = "ECS_WORLD_CONFIG";

/// Errors raised while loading a [`WorldConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON could not be parsed into a config.
    #[error("invalid world config: {0}")]
    Json(#[from] serde_json::Error),

    /// The environment variable is set but not valid unicode.
    #[error("ECS_WORLD_CONFIG is not valid unicode")]
    NotUnicode,
}

/// Sizing knobs for a [`World`](crate::World).
///
/// Every field is a starting capacity, not a limit, except
/// `deferred_capacity`, which bounds the buffers returned by
/// [`World::deferred_buffer`](crate::World::deferred_buffer).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Entity slots reserved up front.
    pub entity_capacity: usize,
    /// Component slots reserved by each new pool.
    pub pool_capacity: usize,
    /// Maximum handles a deferred-destruction buffer accepts before it
    /// starts dropping pushes. `None` means unbounded.
    pub deferred_capacity: Option<usize>,
}

impl WorldConfig {
    /// Default configuration: no reservation, unbounded deferred buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Bound deferred-destruction buffers to `capacity` handles.
    #[must_use]
    pub fn with_deferred_capacity(mut self, capacity: usize) -> Self {
        self.deferred_capacity = Some(capacity);
        self
    }

    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from the [`WORLD_CONFIG_ENV`] environment variable, falling back
    /// to the defaults when it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(WORLD_CONFIG_ENV) {
            Ok(json) => {
                let config = Self::from_json(&json)?;
                debug!(?config, var = WORLD_CONFIG_ENV, "loaded world config");
                Ok(config)
            }
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = WorldConfig::new()
            .with_entity_capacity(1024)
            .with_pool_capacity(64)
            .with_deferred_capacity(16);
        assert_eq!(config.entity_capacity, 1024);
        assert_eq!(config.pool_capacity, 64);
        assert_eq!(config.deferred_capacity, Some(16));
    }

    #[test]
    fn test_from_json_partial() {
        let config = WorldConfig::from_json(r#"{ "pool_capacity": 32 }"#).unwrap();
        assert_eq!(config, WorldConfig::new().with_pool_capacity(32));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            WorldConfig::from_json("{ pool_capacity: }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = WorldConfig::new().with_deferred_capacity(8);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(WorldConfig::from_json(&json).unwrap(), config);
    }
}
