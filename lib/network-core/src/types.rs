//! Provider-side view of a network, recomputed from the backend on demand

use network_api::NetworkState;
use serde::{Deserialize, Serialize};

/// A network as the networking backend sees it
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderNetwork {
    pub name: String,
    /// Backend-assigned ID (empty until created)
    pub uid: String,
    pub tenant_id: String,
    pub subnets: Vec<ProviderSubnet>,
    pub status: NetworkState,
}

/// A subnet of a provider network
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSubnet {
    pub name: String,
    pub uid: String,
    pub cidr: String,
    pub gateway: String,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// Static host route of a subnet
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub nexthop: String,
    pub destination_cidr: String,
}

/// Map a backend network status string onto the Network state space
pub fn to_provider_status(status: &str) -> NetworkState {
    match status {
        "ACTIVE" => NetworkState::Active,
        "BUILD" => NetworkState::Initializing,
        _ => NetworkState::Failed,
    }
}
