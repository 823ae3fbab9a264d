use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network describes a tenant network that should exist in the
/// OpenStack networking backend: one network, one subnet and one router
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "stackube.kubernetes.io",
    version = "v1",
    kind = "Network",
    plural = "networks",
    namespaced,
    derive = "Default",
    status = "NetworkStatus",
    printcolumn = r#"{"name":"CIDR","type":"string","jsonPath":".spec.cidr"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
)]
pub struct NetworkSpec {
    /// Address range of the subnet (IPv4 prefix, e.g. "10.0.0.0/16")
    pub cidr: String,

    /// Gateway address of the subnet
    pub gateway: String,

    /// Optional: ID of an existing backend network to adopt instead of
    /// creating one
    #[serde(rename = "networkID", default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,

    /// Optional: owning tenant, defaults to the controller's tenant
    #[serde(rename = "tenantID", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Observed state of a Network, written only by the network controller
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NetworkStatus {
    /// Current state
    #[serde(default)]
    pub state: NetworkState,

    /// Human-readable detail about the last reconciliation
    #[serde(default)]
    pub message: String,
}

impl NetworkStatus {
    pub fn new(state: NetworkState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

/// Lifecycle state of a Network.
///
/// The serialized names are persisted in the cluster store and must not change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum NetworkState {
    #[default]
    Initializing,
    Active,
    Failed,
    Processed,
}

impl NetworkState {
    /// Wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkState::Initializing => "Initializing",
            NetworkState::Active => "Active",
            NetworkState::Failed => "Failed",
            NetworkState::Processed => "Processed",
        }
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Network {
    /// Current state, or None if no status was ever written
    pub fn state(&self) -> Option<NetworkState> {
        self.status.as_ref().map(|s| s.state)
    }
}
