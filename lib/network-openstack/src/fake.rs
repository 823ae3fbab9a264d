//! In-memory Neutron used by the driver and reconciler tests.
//!
//! Enforces the same dependency rules as Neutron (a subnet attached to a
//! router cannot be deleted, a network with subnets or ports cannot be
//! deleted, ...) so out-of-order teardown fails here the way it would
//! against a real backend.

use crate::neutron::{
    GatewayInfo, Network, NetworkCreateOpts, NetworkFilter, NeutronApi, Port, Router,
    RouterCreateOpts, Subnet, SubnetCreateOpts, Tenant, ROUTER_INTERFACE_OWNER,
};
use async_trait::async_trait;
use network_core::{CoreError, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    next_id: u32,
    tenants: Vec<Tenant>,
    networks: BTreeMap<String, Network>,
    subnets: BTreeMap<String, Subnet>,
    routers: BTreeMap<String, Router>,
    ports: BTreeMap<String, Port>,
    /// router ID -> attached subnet IDs
    interfaces: BTreeMap<String, Vec<String>>,
}

impl State {
    fn id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", kind, self.next_id)
    }
}

#[derive(Default)]
pub struct FakeNeutron {
    state: Mutex<State>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    tenants_unavailable: Mutex<bool>,
}

fn conflict(msg: String) -> CoreError {
    CoreError::Backend(format!("409 Conflict: {}", msg))
}

impl FakeNeutron {
    pub fn with_tenants(tenants: &[(&str, &str)]) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().tenants = tenants
            .iter()
            .map(|(id, name)| Tenant {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        fake
    }

    /// Make every future call of `op` fail with a backend error
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn tenants_unavailable(&self) {
        *self.tenants_unavailable.lock().unwrap() = true;
    }

    /// Every call made so far, as "<op> <argument>"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls of one kind
    pub fn calls_of(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(' ').next() == Some(op))
            .count()
    }

    /// Calls that change backend state
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list_") && !c.starts_with("get_"))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn network_count(&self) -> usize {
        self.state.lock().unwrap().networks.len()
    }

    pub fn router_count(&self) -> usize {
        self.state.lock().unwrap().routers.len()
    }

    pub fn subnet_count(&self) -> usize {
        self.state.lock().unwrap().subnets.len()
    }

    /// Insert a network directly, bypassing the call log. Returns its ID.
    pub fn seed_network(&self, name: &str, status: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.id("net");
        state.networks.insert(
            id.clone(),
            Network {
                id: id.clone(),
                name: name.to_string(),
                status: status.to_string(),
                tenant_id: "T1".to_string(),
                admin_state_up: true,
                subnets: Vec::new(),
            },
        );
        id
    }

    /// Attach a port to a network, bypassing the call log. Returns its ID.
    pub fn seed_port(&self, network_id: &str, device_owner: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.id("port");
        state.ports.insert(
            id.clone(),
            Port {
                id: id.clone(),
                network_id: network_id.to_string(),
                device_owner: device_owner.to_string(),
            },
        );
        id
    }

    /// List a subnet ID on a network without creating the subnet
    pub fn seed_dangling_subnet(&self, network_id: &str, subnet_id: &str) {
        if let Some(network) = self.state.lock().unwrap().networks.get_mut(network_id) {
            network.subnets.push(subnet_id.to_string());
        }
    }

    fn call(&self, op: &'static str, arg: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{} {}", op, arg));
        if self.failing.lock().unwrap().contains(op) {
            return Err(CoreError::Backend(format!("injected {} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl NeutronApi for FakeNeutron {
    async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        self.call("list_tenants", "")?;
        if *self.tenants_unavailable.lock().unwrap() {
            return Err(CoreError::Backend("503 Service Unavailable".to_string()));
        }
        Ok(self.state.lock().unwrap().tenants.clone())
    }

    async fn list_networks(&self, filter: &NetworkFilter) -> Result<Vec<Network>> {
        let arg = filter.name.clone().or_else(|| filter.id.clone()).unwrap_or_default();
        self.call("list_networks", &arg)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .networks
            .values()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect())
    }

    async fn create_network(&self, opts: &NetworkCreateOpts) -> Result<Network> {
        self.call("create_network", &opts.name)?;
        let mut state = self.state.lock().unwrap();
        let id = state.id("net");
        let network = Network {
            id: id.clone(),
            name: opts.name.clone(),
            status: "ACTIVE".to_string(),
            tenant_id: opts.tenant_id.clone(),
            admin_state_up: opts.admin_state_up,
            subnets: Vec::new(),
        };
        state.networks.insert(id, network.clone());
        Ok(network)
    }

    async fn delete_network(&self, network_id: &str) -> Result<()> {
        self.call("delete_network", network_id)?;
        let mut state = self.state.lock().unwrap();
        let network = state
            .networks
            .get(network_id)
            .ok_or_else(|| CoreError::NotFound(network_id.to_string()))?;
        if !network.subnets.is_empty() {
            return Err(conflict(format!("network {} has subnets", network_id)));
        }
        if state.ports.values().any(|p| p.network_id == network_id) {
            return Err(conflict(format!("network {} has ports", network_id)));
        }
        state.networks.remove(network_id);
        Ok(())
    }

    async fn get_subnet(&self, subnet_id: &str) -> Result<Subnet> {
        self.call("get_subnet", subnet_id)?;
        self.state
            .lock()
            .unwrap()
            .subnets
            .get(subnet_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(subnet_id.to_string()))
    }

    async fn create_subnet(&self, opts: &SubnetCreateOpts) -> Result<Subnet> {
        self.call("create_subnet", &opts.name)?;
        let mut state = self.state.lock().unwrap();
        if !state.networks.contains_key(&opts.network_id) {
            return Err(CoreError::NotFound(opts.network_id.clone()));
        }
        let id = state.id("subnet");
        let subnet = Subnet {
            id: id.clone(),
            name: opts.name.clone(),
            network_id: opts.network_id.clone(),
            cidr: opts.cidr.clone(),
            gateway_ip: Some(opts.gateway_ip.clone()),
            dns_nameservers: opts.dns_nameservers.clone(),
            host_routes: Vec::new(),
            tenant_id: opts.tenant_id.clone(),
        };
        state.subnets.insert(id.clone(), subnet.clone());
        if let Some(network) = state.networks.get_mut(&opts.network_id) {
            network.subnets.push(id);
        }
        Ok(subnet)
    }

    async fn delete_subnet(&self, subnet_id: &str) -> Result<()> {
        self.call("delete_subnet", subnet_id)?;
        let mut state = self.state.lock().unwrap();
        let network_id = state
            .subnets
            .get(subnet_id)
            .map(|s| s.network_id.clone())
            .ok_or_else(|| CoreError::NotFound(subnet_id.to_string()))?;
        if state.interfaces.values().any(|s| s.iter().any(|id| id == subnet_id)) {
            return Err(conflict(format!("subnet {} is attached to a router", subnet_id)));
        }
        if state
            .ports
            .values()
            .any(|p| p.network_id == network_id && p.device_owner != ROUTER_INTERFACE_OWNER)
        {
            return Err(conflict(format!("subnet {} has ports in use", subnet_id)));
        }
        state.subnets.remove(subnet_id);
        if let Some(network) = state.networks.get_mut(&network_id) {
            network.subnets.retain(|id| id != subnet_id);
        }
        Ok(())
    }

    async fn list_routers(&self, name: &str) -> Result<Vec<Router>> {
        self.call("list_routers", name)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .routers
            .values()
            .filter(|r| r.name == name)
            .cloned()
            .collect())
    }

    async fn create_router(&self, opts: &RouterCreateOpts) -> Result<Router> {
        self.call("create_router", &opts.name)?;
        let mut state = self.state.lock().unwrap();
        let id = state.id("router");
        let router = Router {
            id: id.clone(),
            name: opts.name.clone(),
            tenant_id: opts.tenant_id.clone(),
            external_gateway_info: Some(GatewayInfo {
                network_id: opts.external_gateway_info.network_id.clone(),
            }),
        };
        state.routers.insert(id, router.clone());
        Ok(router)
    }

    async fn delete_router(&self, router_id: &str) -> Result<()> {
        self.call("delete_router", router_id)?;
        let mut state = self.state.lock().unwrap();
        if !state.routers.contains_key(router_id) {
            return Err(CoreError::NotFound(router_id.to_string()));
        }
        if state.interfaces.get(router_id).map_or(false, |s| !s.is_empty()) {
            return Err(conflict(format!("router {} still has interfaces", router_id)));
        }
        state.routers.remove(router_id);
        Ok(())
    }

    async fn add_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()> {
        self.call("add_router_interface", subnet_id)?;
        let mut state = self.state.lock().unwrap();
        if !state.routers.contains_key(router_id) {
            return Err(CoreError::NotFound(router_id.to_string()));
        }
        let network_id = state
            .subnets
            .get(subnet_id)
            .map(|s| s.network_id.clone())
            .ok_or_else(|| CoreError::NotFound(subnet_id.to_string()))?;
        state
            .interfaces
            .entry(router_id.to_string())
            .or_default()
            .push(subnet_id.to_string());
        let port_id = format!("rif-{}", subnet_id);
        state.ports.insert(
            port_id.clone(),
            Port {
                id: port_id,
                network_id,
                device_owner: ROUTER_INTERFACE_OWNER.to_string(),
            },
        );
        Ok(())
    }

    async fn remove_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()> {
        self.call("remove_router_interface", subnet_id)?;
        let mut state = self.state.lock().unwrap();
        let attached = state
            .interfaces
            .get_mut(router_id)
            .ok_or_else(|| CoreError::NotFound(router_id.to_string()))?;
        let before = attached.len();
        attached.retain(|id| id != subnet_id);
        if attached.len() == before {
            return Err(CoreError::NotFound(format!(
                "subnet {} on router {}",
                subnet_id, router_id
            )));
        }
        state.ports.remove(&format!("rif-{}", subnet_id));
        Ok(())
    }

    async fn list_ports(&self, network_id: &str) -> Result<Vec<Port>> {
        self.call("list_ports", network_id)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .ports
            .values()
            .filter(|p| p.network_id == network_id)
            .cloned()
            .collect())
    }

    async fn delete_port(&self, port_id: &str) -> Result<()> {
        self.call("delete_port", port_id)?;
        let mut state = self.state.lock().unwrap();
        let owner = state.ports.get(port_id).map(|p| p.device_owner.clone());
        match owner.as_deref() {
            None => Err(CoreError::NotFound(port_id.to_string())),
            Some(ROUTER_INTERFACE_OWNER) => Err(conflict(format!(
                "port {} is a router interface",
                port_id
            ))),
            Some(_) => {
                state.ports.remove(port_id);
                Ok(())
            }
        }
    }
}
