//! NetworkProvider on top of the Neutron primitives

use crate::neutron::{
    self, GatewayInfo, NetworkCreateOpts, NetworkFilter, NeutronApi, RouterCreateOpts,
    SubnetCreateOpts, ROUTER_INTERFACE_OWNER,
};
use async_trait::async_trait;
use network_core::types::to_provider_status;
use network_core::{CoreError, NetworkProvider, ProviderNetwork, ProviderSubnet, Result, Route};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const IPV4: u8 = 4;

/// OpenStack implementation of the networking backend.
///
/// Routers share the name of the network they serve, which is how teardown
/// finds them again.
pub struct OpenStackDriver {
    api: Arc<dyn NeutronApi>,
    /// External network routers use as their gateway
    ext_net_id: String,
}

impl OpenStackDriver {
    pub fn new(api: Arc<dyn NeutronApi>, ext_net_id: impl Into<String>) -> Self {
        Self {
            api,
            ext_net_id: ext_net_id.into(),
        }
    }

    /// Resolve a network that must match exactly once
    async fn find_network(&self, filter: &NetworkFilter) -> Result<neutron::Network> {
        let mut networks = self.api.list_networks(filter).await?;
        match networks.len() {
            0 => Err(CoreError::NotFound(format!("network {:?}", filter))),
            1 => Ok(networks.remove(0)),
            n => Err(CoreError::MultipleResults(format!(
                "{} networks match {:?}",
                n, filter
            ))),
        }
    }

    async fn get_router_by_name(&self, name: &str) -> Result<Option<neutron::Router>> {
        let mut routers = self.api.list_routers(name).await?;
        match routers.len() {
            0 => Ok(None),
            1 => Ok(Some(routers.remove(0))),
            n => Err(CoreError::MultipleResults(format!(
                "{} routers named {}",
                n, name
            ))),
        }
    }

    /// A missing subnet of an existing network is a backend inconsistency,
    /// never `NotFound`: that error is reserved for the network lookup itself.
    async fn get_provider_subnet(&self, subnet_id: &str) -> Result<ProviderSubnet> {
        let subnet = self.api.get_subnet(subnet_id).await.map_err(|e| {
            error!("Get openstack subnet {} failed: {}", subnet_id, e);
            match e {
                CoreError::NotFound(msg) => {
                    CoreError::Backend(format!("subnet {} listed but missing: {}", subnet_id, msg))
                }
                other => other,
            }
        })?;
        Ok(to_provider_subnet(subnet))
    }

    async fn to_provider_network(&self, network: neutron::Network) -> Result<ProviderNetwork> {
        let mut subnets = Vec::with_capacity(network.subnets.len());
        for subnet_id in &network.subnets {
            subnets.push(self.get_provider_subnet(subnet_id).await?);
        }

        Ok(ProviderNetwork {
            name: network.name,
            uid: network.id,
            tenant_id: network.tenant_id,
            subnets,
            status: to_provider_status(&network.status),
        })
    }

    /// Display name of a tenant ID, or the input if no tenant has that ID
    pub async fn to_tenant_name(&self, tenant: &str) -> String {
        match self.api.list_tenants().await {
            Ok(tenants) => tenants
                .into_iter()
                .find(|t| t.id == tenant)
                .map(|t| t.name)
                .unwrap_or_else(|| tenant.to_string()),
            Err(e) => {
                warn!("List tenants failed: {}", e);
                tenant.to_string()
            }
        }
    }

    /// ID of a tenant display name, or the input if no tenant has that name
    pub async fn to_tenant_id(&self, tenant: &str) -> String {
        match self.api.list_tenants().await {
            Ok(tenants) => tenants
                .into_iter()
                .find(|t| t.name == tenant)
                .map(|t| t.id)
                .unwrap_or_else(|| tenant.to_string()),
            Err(e) => {
                warn!("List tenants failed: {}", e);
                tenant.to_string()
            }
        }
    }

    /// Best-effort removal of a partially created network
    async fn rollback(&self, name: &str) {
        if let Err(e) = self.delete_network(name).await {
            error!("Delete openstack network {} failed: {}", name, e);
        }
    }
}

#[async_trait]
impl NetworkProvider for OpenStackDriver {
    async fn tenant_exists(&self, tenant: &str) -> Result<bool> {
        let tenants = self.api.list_tenants().await?;
        if tenants.is_empty() {
            debug!("No tenants visible in identity service");
            return Ok(false);
        }
        Ok(tenants.iter().any(|t| t.id == tenant || t.name == tenant))
    }

    async fn get_network_by_id(&self, network_id: &str) -> Result<ProviderNetwork> {
        let network = self
            .find_network(&NetworkFilter::by_id(network_id))
            .await
            .map_err(|e| {
                error!("Get openstack network {} failed: {}", network_id, e);
                e
            })?;
        self.to_provider_network(network).await
    }

    async fn get_network(&self, name: &str) -> Result<ProviderNetwork> {
        let network = self
            .find_network(&NetworkFilter::by_name(name))
            .await
            .map_err(|e| {
                debug!("Get openstack network {} failed: {}", name, e);
                e
            })?;
        self.to_provider_network(network).await
    }

    async fn create_network(&self, network: &ProviderNetwork) -> Result<ProviderNetwork> {
        if network.subnets.is_empty() {
            return Err(CoreError::InvalidConfiguration(format!(
                "network {} has no subnets",
                network.name
            )));
        }

        let os_network = self
            .api
            .create_network(&NetworkCreateOpts {
                name: network.name.clone(),
                admin_state_up: true,
                tenant_id: network.tenant_id.clone(),
            })
            .await
            .map_err(|e| {
                error!("Create openstack network {} failed: {}", network.name, e);
                e
            })?;

        let router = match self
            .api
            .create_router(&RouterCreateOpts {
                name: network.name.clone(),
                tenant_id: network.tenant_id.clone(),
                external_gateway_info: GatewayInfo {
                    network_id: self.ext_net_id.clone(),
                },
            })
            .await
        {
            Ok(router) => router,
            Err(e) => {
                error!("Create openstack router {} failed: {}", network.name, e);
                self.rollback(&network.name).await;
                return Err(e);
            }
        };

        let mut subnets = Vec::with_capacity(network.subnets.len());
        for sub in &network.subnets {
            let subnet = match self
                .api
                .create_subnet(&SubnetCreateOpts {
                    network_id: os_network.id.clone(),
                    name: sub.name.clone(),
                    cidr: sub.cidr.clone(),
                    ip_version: IPV4,
                    tenant_id: network.tenant_id.clone(),
                    gateway_ip: sub.gateway.clone(),
                    dns_nameservers: sub.dns_servers.clone(),
                })
                .await
            {
                Ok(subnet) => subnet,
                Err(e) => {
                    error!("Create openstack subnet {} failed: {}", sub.name, e);
                    self.rollback(&network.name).await;
                    return Err(e);
                }
            };

            if let Err(e) = self.api.add_router_interface(&router.id, &subnet.id).await {
                error!(
                    "Add subnet {} to openstack router {} failed: {}",
                    sub.name, router.id, e
                );
                self.rollback(&network.name).await;
                return Err(e);
            }

            subnets.push(to_provider_subnet(subnet));
        }

        info!("Created openstack network {} ({})", network.name, os_network.id);

        Ok(ProviderNetwork {
            name: os_network.name,
            uid: os_network.id,
            tenant_id: network.tenant_id.clone(),
            subnets,
            status: to_provider_status(&os_network.status),
        })
    }

    async fn update_network(&self, network: &ProviderNetwork) -> Result<()> {
        // TODO: propagate subnet changes once Network updates are reconciled
        debug!("Update of network {} is not implemented", network.name);
        Ok(())
    }

    async fn delete_network(&self, name: &str) -> Result<()> {
        let network = match self.find_network(&NetworkFilter::by_name(name)).await {
            Ok(network) => network,
            Err(e) if e.is_not_found() => {
                debug!("Openstack network {} already deleted", name);
                return Ok(());
            }
            Err(e) => {
                error!("Get openstack network {} failed: {}", name, e);
                return Err(e);
            }
        };

        // Router interface ports go away with remove_router_interface
        match self.api.list_ports(&network.id).await {
            Ok(ports) => {
                for port in ports
                    .iter()
                    .filter(|p| p.device_owner != ROUTER_INTERFACE_OWNER)
                {
                    if let Err(e) = self.api.delete_port(&port.id).await {
                        warn!("Delete port {} failed: {}", port.id, e);
                    }
                }
            }
            Err(e) => error!("Get openstack ports of network {} failed: {}", network.id, e),
        }

        let router = self.get_router_by_name(name).await.map_err(|e| {
            error!("Get openstack router {} failed: {}", name, e);
            e
        })?;

        for subnet_id in &network.subnets {
            if let Some(router) = &router {
                ignore_not_found(
                    self.api.remove_router_interface(&router.id, subnet_id).await,
                )
                .map_err(|e| {
                    error!(
                        "Remove subnet {} from openstack router {} failed: {}",
                        subnet_id, router.id, e
                    );
                    e
                })?;
            }

            ignore_not_found(self.api.delete_subnet(subnet_id).await).map_err(|e| {
                error!("Delete openstack subnet {} failed: {}", subnet_id, e);
                e
            })?;
        }

        if let Some(router) = &router {
            ignore_not_found(self.api.delete_router(&router.id).await).map_err(|e| {
                error!("Delete openstack router {} failed: {}", router.id, e);
                e
            })?;
        }

        ignore_not_found(self.api.delete_network(&network.id).await).map_err(|e| {
            error!("Delete openstack network {} failed: {}", network.id, e);
            e
        })?;

        info!("Deleted openstack network {} ({})", name, network.id);
        Ok(())
    }
}

fn ignore_not_found(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => {
            debug!("Already absent: {}", e);
            Ok(())
        }
        other => other,
    }
}

fn to_provider_subnet(subnet: neutron::Subnet) -> ProviderSubnet {
    ProviderSubnet {
        name: subnet.name,
        uid: subnet.id,
        cidr: subnet.cidr,
        gateway: subnet.gateway_ip.unwrap_or_default(),
        dns_servers: subnet.dns_nameservers,
        routes: subnet
            .host_routes
            .into_iter()
            .map(|r| Route {
                nexthop: r.nexthop,
                destination_cidr: r.destination,
            })
            .collect(),
    }
}
