//! Neutron and Keystone resources and the primitive calls made on them

use async_trait::async_trait;
use network_core::Result;
use serde::{Deserialize, Serialize};

/// Device owner of ports that attach a subnet to a router
pub const ROUTER_INTERFACE_OWNER: &str = "network:router_interface";

/// Keystone project (tenant)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub admin_state_up: bool,
    /// IDs of the subnets on this network
    #[serde(default)]
    pub subnets: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub cidr: String,
    #[serde(default)]
    pub gateway_ip: Option<String>,
    #[serde(default)]
    pub dns_nameservers: Vec<String>,
    #[serde(default)]
    pub host_routes: Vec<HostRoute>,
    #[serde(default)]
    pub tenant_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HostRoute {
    pub destination: String,
    pub nexthop: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Router {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub external_gateway_info: Option<GatewayInfo>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GatewayInfo {
    pub network_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub network_id: String,
    #[serde(default)]
    pub device_owner: String,
}

/// Lookup filter for networks; unset fields match everything
#[derive(Clone, Debug, Default)]
pub struct NetworkFilter {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl NetworkFilter {
    pub fn by_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: None,
        }
    }

    pub fn by_name(name: &str) -> Self {
        Self {
            id: None,
            name: Some(name.to_string()),
        }
    }

    pub fn matches(&self, network: &Network) -> bool {
        self.id.as_ref().map_or(true, |id| *id == network.id)
            && self.name.as_ref().map_or(true, |name| *name == network.name)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NetworkCreateOpts {
    pub name: String,
    pub admin_state_up: bool,
    pub tenant_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RouterCreateOpts {
    pub name: String,
    pub tenant_id: String,
    pub external_gateway_info: GatewayInfo,
}

#[derive(Clone, Debug, Serialize)]
pub struct SubnetCreateOpts {
    pub network_id: String,
    pub name: String,
    pub cidr: String,
    pub ip_version: u8,
    pub tenant_id: String,
    pub gateway_ip: String,
    pub dns_nameservers: Vec<String>,
}

/// Primitive backend calls. A missing object is reported as
/// `CoreError::NotFound`; every other failure as `CoreError::Backend`.
#[async_trait]
pub trait NeutronApi: Send + Sync {
    async fn list_tenants(&self) -> Result<Vec<Tenant>>;

    async fn list_networks(&self, filter: &NetworkFilter) -> Result<Vec<Network>>;
    async fn create_network(&self, opts: &NetworkCreateOpts) -> Result<Network>;
    async fn delete_network(&self, network_id: &str) -> Result<()>;

    async fn get_subnet(&self, subnet_id: &str) -> Result<Subnet>;
    async fn create_subnet(&self, opts: &SubnetCreateOpts) -> Result<Subnet>;
    async fn delete_subnet(&self, subnet_id: &str) -> Result<()>;

    async fn list_routers(&self, name: &str) -> Result<Vec<Router>>;
    async fn create_router(&self, opts: &RouterCreateOpts) -> Result<Router>;
    async fn delete_router(&self, router_id: &str) -> Result<()>;
    async fn add_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()>;
    async fn remove_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()>;

    async fn list_ports(&self, network_id: &str) -> Result<Vec<Port>>;
    async fn delete_port(&self, port_id: &str) -> Result<()>;
}
