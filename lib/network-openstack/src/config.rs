//! OpenStack backend configuration file

use network_core::{CoreError, Result};
use serde::Deserialize;
use std::path::Path;

/// Connection settings for Keystone and Neutron, loaded from YAML
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpenStackConfig {
    /// Keystone v3 endpoint, e.g. "http://keystone:5000/v3"
    pub auth_url: String,
    /// Neutron endpoint, e.g. "http://neutron:9696"
    pub network_endpoint: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub password: String,
    /// Pre-issued token; skips password authentication when set
    #[serde(default)]
    pub token_id: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_name: String,
    #[serde(default)]
    pub domain_id: String,
    #[serde(default)]
    pub domain_name: String,
    /// Informational only: `network-endpoint` is used as given, with no
    /// catalog lookup by region
    #[serde(default)]
    pub region: String,
    /// External network used as the gateway of every router
    pub ext_net_id: String,
}

impl OpenStackConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::InvalidConfiguration(format!("reading {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)
            .map_err(|e| CoreError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.network_endpoint.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "network-endpoint is required".to_string(),
            ));
        }
        if self.ext_net_id.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "ext-net-id is required".to_string(),
            ));
        }
        if self.token_id.is_empty() && self.password.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "either token-id or password is required".to_string(),
            ));
        }
        if self.token_id.is_empty() && self.username.is_empty() && self.user_id.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "username or user-id is required for password authentication".to_string(),
            ));
        }
        Ok(())
    }
}
