//! Network reconciler: drives the networking backend toward the desired
//! state of Network resources and reports the outcome in their status.
//!
//! Events are handled one at a time, in the order the watch delivered them.
//! Only Added events are reconciled; Updated and Deleted are logged and
//! otherwise ignored.

use crate::naming;
use crate::store::{NetworkStore, WatchEvent};
use crate::types::{ProviderNetwork, ProviderSubnet};
use crate::{NetworkProvider, Result};
use futures::StreamExt;
use kube::ResourceExt;
use network_api::{Network, NetworkState, NetworkStatus};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct NetworkReconciler {
    provider: Arc<dyn NetworkProvider>,
    store: Arc<dyn NetworkStore>,
    /// Tenant used for Networks that do not name one
    default_tenant_id: String,
}

impl NetworkReconciler {
    pub fn new(
        provider: Arc<dyn NetworkProvider>,
        store: Arc<dyn NetworkStore>,
        default_tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            default_tenant_id: default_tenant_id.into(),
        }
    }

    /// Consume the store's watch stream until it ends
    pub async fn run(&self) -> Result<()> {
        info!("Begin watching Network objects");

        let mut events = self.store.watch();
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => self.handle(event).await,
                Err(e) => error!("Error in Network watch stream: {}", e),
            }
        }

        info!("Network watch stream ended");
        Ok(())
    }

    /// Dispatch a single change notification
    pub async fn handle(&self, event: WatchEvent) {
        match event {
            WatchEvent::Added(network) => {
                self.on_add(&network).await;
            }
            WatchEvent::Updated { old, new } => self.on_update(&old, &new),
            WatchEvent::Deleted(network) => self.on_delete(&network),
        }
    }

    /// Create or adopt the backend network for `network` and write the
    /// resulting terminal status. Returns the status that was written.
    pub async fn on_add(&self, network: &Network) -> NetworkStatus {
        let namespace = network.namespace().unwrap_or_else(|| "default".to_string());
        let name = network.name_any();
        info!("[NetworkReconciler] OnAdd {}/{}", namespace, name);

        let desired = self.translate(network);
        let status = self.provision(network, &desired).await;

        match self.store.update_status(&namespace, &name, &status).await {
            Ok(()) => info!(
                "Updated network {}/{} status: {} ({})",
                namespace, name, status.state, status.message
            ),
            Err(e) => error!("Error updating network {}/{} status: {}", namespace, name, e),
        }

        status
    }

    /// Updates are not reconciled yet
    pub fn on_update(&self, old: &Network, new: &Network) {
        info!(
            "[NetworkReconciler] OnUpdate {}/{} (resource version {:?} -> {:?})",
            new.namespace().unwrap_or_default(),
            new.name_any(),
            old.resource_version(),
            new.resource_version()
        );
    }

    /// Deletions are not reconciled yet; backend objects are left in place
    pub fn on_delete(&self, network: &Network) {
        info!(
            "[NetworkReconciler] OnDelete {}/{}",
            network.namespace().unwrap_or_default(),
            network.name_any()
        );
    }

    /// Translate a Network resource into the backend object it describes.
    ///
    /// Networks map 1:1 to subnets. A Network without a CIDR has nothing to
    /// allocate and yields no subnet.
    pub fn translate(&self, network: &Network) -> ProviderNetwork {
        let name = network.name_any();
        let tenant_id = network
            .spec
            .tenant_id
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.default_tenant_id.clone());

        let mut subnets = Vec::new();
        if !network.spec.cidr.trim().is_empty() {
            subnets.push(ProviderSubnet {
                name: naming::subnet_name(&name),
                uid: Uuid::new_v4().to_string(),
                cidr: network.spec.cidr.clone(),
                gateway: network.spec.gateway.clone(),
                ..Default::default()
            });
        }

        ProviderNetwork {
            name: naming::network_name(&name),
            uid: network.uid().unwrap_or_default(),
            tenant_id,
            subnets,
            status: NetworkState::Initializing,
        }
    }

    async fn provision(&self, network: &Network, desired: &ProviderNetwork) -> NetworkStatus {
        debug!("[NetworkReconciler] add network {}", desired.name);

        match self.provider.tenant_exists(&desired.tenant_id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Tenant {} doesn't exist in network provider", desired.tenant_id);
                return failed(format!(
                    "tenant {} doesn't exist in network provider",
                    desired.tenant_id
                ));
            }
            // An unreachable identity service does not block provisioning
            Err(e) => error!("Check tenant {} failed: {}", desired.tenant_id, e),
        }

        if let Some(network_id) = network.spec.network_id.as_deref().filter(|id| !id.is_empty()) {
            return match self.provider.get_network_by_id(network_id).await {
                Ok(existing) => {
                    info!("Adopting existing network {} ({})", existing.name, existing.uid);
                    terminal_status(&existing, "adopted")
                }
                Err(e) if e.is_not_found() => {
                    warn!("Network {} doesn't exist in network provider: {}", network_id, e);
                    failed(format!(
                        "network {} doesn't exist in network provider: {}",
                        network_id, e
                    ))
                }
                Err(e) => {
                    warn!("Get network {} failed: {}", network_id, e);
                    failed(format!("get network {} failed: {}", network_id, e))
                }
            };
        }

        if desired.subnets.len() != 1 {
            warn!(
                "Network {} must have exactly one subnet, got {}",
                desired.name,
                desired.subnets.len()
            );
            return failed(format!(
                "network {} must have exactly one subnet, got {}",
                desired.name,
                desired.subnets.len()
            ));
        }

        match self.provider.get_network(&desired.name).await {
            Ok(existing) => {
                info!("Network {} has already been created", desired.name);
                terminal_status(&existing, "adopted")
            }
            Err(e) if e.is_not_found() => match self.provider.create_network(desired).await {
                Ok(created) => {
                    info!("Created network {} ({})", created.name, created.uid);
                    terminal_status(&created, "created")
                }
                Err(e) => {
                    warn!("Create network {} failed: {}", desired.name, e);
                    failed(format!("create network {} failed: {}", desired.name, e))
                }
            },
            Err(e) => {
                warn!("Get network {} failed: {}", desired.name, e);
                failed(format!("get network {} failed: {}", desired.name, e))
            }
        }
    }
}

fn failed(message: String) -> NetworkStatus {
    NetworkStatus::new(NetworkState::Failed, message)
}

fn terminal_status(network: &ProviderNetwork, action: &str) -> NetworkStatus {
    NetworkStatus::new(
        network.status,
        format!(
            "network {} ({}) {}, provider state {}",
            network.name, network.uid, action, network.status
        ),
    )
}
