//! Config - Handler settings loaded from a JSON file

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stabilize::StabilizationPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid stabilization policy for {type_name}: {reason}")]
    InvalidPolicy { type_name: String, reason: String },

    #[error("Invalid listPageSize {0}: must be positive")]
    InvalidPageSize(i32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerConfig {
    /// AWS region; the SDK default chain applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Policy overrides keyed by type name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub stabilization: HashMap<String, StabilizationPolicy>,
    /// Page size for listings that take one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_page_size: Option<i32>,
}

impl HandlerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (type_name, policy) in &self.stabilization {
            let reason = if policy.delay_seconds == 0 {
                "delaySeconds must be positive"
            } else if policy.timeout_seconds == 0 {
                "timeoutSeconds must be positive"
            } else {
                continue;
            };
            return Err(ConfigError::InvalidPolicy {
                type_name: type_name.clone(),
                reason: reason.to_string(),
            });
        }
        if let Some(size) = self.list_page_size
            && size <= 0
        {
            return Err(ConfigError::InvalidPageSize(size));
        }
        Ok(())
    }

    /// The configured policy for `type_name`, or `default`
    pub fn policy_or(&self, type_name: &str, default: StabilizationPolicy) -> StabilizationPolicy {
        self.stabilization
            .get(type_name)
            .copied()
            .unwrap_or(default)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = HandlerConfig::from_json("{}").unwrap();
        let default = StabilizationPolicy::new(60, 86_400);
        assert_eq!(config.policy_or("AWS::Panorama::Package", default), default);
        assert!(config.region.is_none());
    }

    #[test]
    fn per_type_override() {
        let config = HandlerConfig::from_json(
            r#"{
                "region": "us-west-2",
                "stabilization": {
                    "AWS::Panorama::ApplicationInstance": {"delaySeconds": 30, "timeoutSeconds": 600}
                },
                "listPageSize": 25
            }"#,
        )
        .unwrap();

        let default = StabilizationPolicy::new(300, 1);
        assert_eq!(
            config.policy_or("AWS::Panorama::ApplicationInstance", default),
            StabilizationPolicy::new(30, 600)
        );
        assert_eq!(config.policy_or("AWS::Panorama::Package", default), default);
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.list_page_size, Some(25));
    }

    #[test]
    fn zero_delay_is_rejected() {
        let err = HandlerConfig::from_json(
            r#"{"stabilization": {"AWS::Panorama::Package": {"delaySeconds": 0, "timeoutSeconds": 10}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPolicy { .. }));
    }

    #[test]
    fn non_positive_page_size_is_rejected() {
        for json in [r#"{"listPageSize": 0}"#, r#"{"listPageSize": -5}"#] {
            let err = HandlerConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidPageSize(_)), "{}", json);
        }
        assert_eq!(
            HandlerConfig::from_json(r#"{"listPageSize": 1}"#)
                .unwrap()
                .list_page_size,
            Some(1)
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = HandlerConfig::from_json("{region").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
