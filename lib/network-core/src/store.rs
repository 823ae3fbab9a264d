//! Access to Network resources in the cluster store

use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use network_api::{Network, NetworkStatus};

/// A change notification for a Network, delivered in observation order
#[derive(Clone, Debug)]
pub enum WatchEvent {
    Added(Network),
    Updated { old: Network, new: Network },
    Deleted(Network),
}

impl WatchEvent {
    /// The most recent snapshot carried by the event
    pub fn network(&self) -> &Network {
        match self {
            WatchEvent::Added(n) | WatchEvent::Deleted(n) => n,
            WatchEvent::Updated { new, .. } => new,
        }
    }
}

#[async_trait]
pub trait NetworkStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Network>;

    async fn create(&self, namespace: &str, network: &Network) -> Result<Network>;

    /// Replace the status subresource of a Network
    async fn update_status(&self, namespace: &str, name: &str, status: &NetworkStatus) -> Result<()>;

    async fn list(&self) -> Result<Vec<Network>>;

    /// Ordered stream of change notifications
    fn watch(&self) -> BoxStream<'static, Result<WatchEvent>>;
}
