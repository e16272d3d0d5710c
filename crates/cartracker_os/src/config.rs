#![forbid(unsafe_code)]

use std::collections::HashMap;

pub const ENV_CREATE_POLICY: &str = "CARTRACKER_CREATE_POLICY";

/// What `createCar` does when a record already exists under the VIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreatePolicy {
    /// Replace the stored record, repair history included.
    #[default]
    Overwrite,
    RejectExisting,
}

impl CreatePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Some(CreatePolicy::Overwrite),
            "reject_existing" => Some(CreatePolicy::RejectExisting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarTrackerConfig {
    pub create_policy: CreatePolicy,
}

impl CarTrackerConfig {
    pub fn mvp_v1() -> Self {
        Self {
            create_policy: CreatePolicy::Overwrite,
        }
    }

    pub fn with_create_policy(mut self, create_policy: CreatePolicy) -> Self {
        self.create_policy = create_policy;
        self
    }

    pub fn load() -> Result<Self, ConfigError> {
        let kv: HashMap<String, String> = std::env::vars().collect();
        Self::from_kv(&kv)
    }

    pub fn from_kv(kv: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::mvp_v1();
        if let Some(raw) = kv.get(ENV_CREATE_POLICY) {
            if !raw.trim().is_empty() {
                config.create_policy =
                    CreatePolicy::parse(raw).ok_or_else(|| ConfigError {
                        key: ENV_CREATE_POLICY,
                        message: format!(
                            "unknown value '{raw}'. expected one of: overwrite, reject_existing"
                        ),
                    })?;
            }
        }
        Ok(config)
    }
}

impl Default for CarTrackerConfig {
    fn default() -> Self {
        Self::mvp_v1()
    }
}
