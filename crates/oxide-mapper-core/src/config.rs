//! Mapper configuration.

use serde::{Deserialize, Serialize};

use crate::dialect::{AdapterKind, OracleAdapter, SqlAdapter};
use crate::error::Result;
use crate::version::{CounterVersion, TimestampVersion, VersionStrategy};

/// Built-in version strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionKind {
    /// See [`CounterVersion`].
    #[default]
    Counter,
    /// See [`TimestampVersion`].
    Timestamp,
}

impl VersionKind {
    #[must_use]
    pub fn build(self) -> Box<dyn VersionStrategy> {
        match self {
            Self::Counter => Box::new(CounterVersion),
            Self::Timestamp => Box::new(TimestampVersion),
        }
    }
}

/// Which adapter and version strategy a mapper uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    /// The engine family.
    pub adapter: AdapterKind,
    /// Oracle only: read `RETURNING ... INTO` values from a result row
    /// instead of output parameters.
    pub oracle_returning_rows: bool,
    /// How version columns advance on update.
    pub version_strategy: VersionKind,
}

impl MapperConfig {
    /// A default configuration for `adapter`.
    #[must_use]
    pub fn new(adapter: AdapterKind) -> Self {
        Self {
            adapter,
            ..Self::default()
        }
    }

    /// A default configuration for the engine named by a connection URL.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MapperError::Configuration`] for an unknown scheme.
    pub fn for_url(url: &str) -> Result<Self> {
        AdapterKind::from_url(url).map(Self::new)
    }

    /// Builds the configured adapter.
    #[must_use]
    pub fn build_adapter(&self) -> Box<dyn SqlAdapter> {
        match self.adapter {
            AdapterKind::Oracle if self.oracle_returning_rows => {
                Box::new(OracleAdapter::returning_rows())
            }
            kind => kind.build(),
        }
    }

    /// Builds the configured version strategy.
    #[must_use]
    pub fn build_version_strategy(&self) -> Box<dyn VersionStrategy> {
        self.version_strategy.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::RetrievalStrategy;

    #[test]
    fn test_defaults() {
        let config = MapperConfig::default();
        assert_eq!(config.adapter, AdapterKind::Generic);
        assert_eq!(config.version_strategy, VersionKind::Counter);
        assert!(!config.oracle_returning_rows);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: MapperConfig =
            serde_json::from_str(r#"{"adapter": "oracle", "oracle_returning_rows": true}"#).unwrap();
        assert_eq!(config.adapter, AdapterKind::Oracle);
        assert_eq!(
            config.build_adapter().retrieval_strategy(),
            RetrievalStrategy::ReturningRow
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_json::from_str::<MapperConfig>(r#"{"dialect": "oracle"}"#).is_err());
    }

    #[test]
    fn test_for_url() {
        let config = MapperConfig::for_url("sqlite://data.db").unwrap();
        assert_eq!(config.build_adapter().kind(), AdapterKind::Sqlite);
    }
}
