//! Networking backend capability consumed by the reconciler

use crate::{ProviderNetwork, Result};
use async_trait::async_trait;

/// Operations the reconciler needs from the networking backend.
///
/// Implementations are shared across all reconciliations, so the backend
/// session lives inside the implementing value.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Whether a tenant exists, matched by ID or by display name
    async fn tenant_exists(&self, tenant: &str) -> Result<bool>;

    /// Fetch a network by backend ID. Fails with `NotFound` if absent.
    async fn get_network_by_id(&self, network_id: &str) -> Result<ProviderNetwork>;

    /// Fetch a network by name. Fails with `NotFound` if absent and with
    /// `MultipleResults` if the name is ambiguous.
    async fn get_network(&self, name: &str) -> Result<ProviderNetwork>;

    /// Create the network, its router and its subnet. On failure, everything
    /// already created is removed on a best-effort basis before returning.
    async fn create_network(&self, network: &ProviderNetwork) -> Result<ProviderNetwork>;

    /// Not implemented by any backend yet; always succeeds.
    async fn update_network(&self, network: &ProviderNetwork) -> Result<()>;

    /// Remove the network and all of its dependents, children first.
    /// A network that is already absent is not an error.
    async fn delete_network(&self, name: &str) -> Result<()>;
}
