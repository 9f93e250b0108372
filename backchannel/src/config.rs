//! Runtime configuration for a backchannel client.
//!
//! Every field has a default, so an empty TOML document is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackchannelConfig {
    /// Default deadline for an outbound query.
    pub query_timeout_ms: u64,
    /// Period of the effect rebuild loop.
    pub effect_rebuild_interval_ms: u64,
    /// How many recent inbound `(sender, id)` query pairs are remembered
    /// to drop duplicated deliveries.
    pub duplicate_query_window: usize,
    /// Only accept an answer from the member the query was sent to.
    pub verify_answer_origin: bool,
}

impl Default for BackchannelConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 10_000,
            effect_rebuild_interval_ms: 1_000,
            duplicate_query_window: 256,
            verify_answer_origin: true,
        }
    }
}

impl BackchannelConfig {
    pub fn from_toml_str(input: &str) -> ProtocolResult<Self> {
        let config: BackchannelConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ProtocolResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ProtocolError::Config(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> ProtocolResult<()> {
        if self.query_timeout_ms == 0 {
            return Err(ProtocolError::Config(
                "query_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.effect_rebuild_interval_ms == 0 {
            return Err(ProtocolError::Config(
                "effect_rebuild_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn effect_rebuild_interval(&self) -> Duration {
        Duration::from_millis(self.effect_rebuild_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = BackchannelConfig::from_toml_str("").expect("parse");
        assert_eq!(config, BackchannelConfig::default());
        assert_eq!(config.query_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let config = BackchannelConfig::from_toml_str(
            "query_timeout_ms = 2500\nverify_answer_origin = false\n",
        )
        .expect("parse");
        assert_eq!(config.query_timeout_ms, 2500);
        assert!(!config.verify_answer_origin);
        assert_eq!(config.effect_rebuild_interval_ms, 1_000);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = BackchannelConfig::from_toml_str("query_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ProtocolError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "effect_rebuild_interval_ms = 250").expect("write");
        let config = BackchannelConfig::load(file.path()).expect("load");
        assert_eq!(config.effect_rebuild_interval(), Duration::from_millis(250));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = BackchannelConfig::load("/nonexistent/backchannel.toml").unwrap_err();
        assert!(matches!(err, ProtocolError::Config(_)));
    }
}
