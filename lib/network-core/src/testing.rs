//! In-memory NetworkStore

use crate::store::{NetworkStore, WatchEvent};
use crate::{CoreError, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use kube::ResourceExt;
use network_api::{Network, NetworkStatus};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Keeps Networks in a map keyed by `namespace/name`, records every status
/// write, and replays queued events from `watch`.
#[derive(Default)]
pub struct MemoryNetworkStore {
    networks: Mutex<BTreeMap<String, Network>>,
    status_writes: Mutex<Vec<(String, NetworkStatus)>>,
    events: Mutex<Vec<Result<WatchEvent>>>,
    fail_status_writes: AtomicBool,
}

fn key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

impl MemoryNetworkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next `watch` call
    pub fn push_event(&self, event: WatchEvent) {
        self.events.lock().unwrap().push(Ok(event));
    }

    /// Queue a stream error for the next `watch` call
    pub fn push_error(&self, error: CoreError) {
        self.events.lock().unwrap().push(Err(error));
    }

    /// Make every later `update_status` fail. Failed writes are still recorded.
    pub fn fail_status_writes(&self) {
        self.fail_status_writes.store(true, Ordering::SeqCst);
    }

    /// Every status write so far, as (`namespace/name`, status)
    pub fn status_writes(&self) -> Vec<(String, NetworkStatus)> {
        self.status_writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetworkStore for MemoryNetworkStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Network> {
        self.networks
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| CoreError::NotFound(key(namespace, name)))
    }

    async fn create(&self, namespace: &str, network: &Network) -> Result<Network> {
        let mut network = network.clone();
        network.metadata.namespace = Some(namespace.to_string());
        self.networks
            .lock()
            .unwrap()
            .insert(key(namespace, &network.name_any()), network.clone());
        Ok(network)
    }

    async fn update_status(&self, namespace: &str, name: &str, status: &NetworkStatus) -> Result<()> {
        self.status_writes
            .lock()
            .unwrap()
            .push((key(namespace, name), status.clone()));
        if self.fail_status_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Backend(format!(
                "status write to {} rejected",
                key(namespace, name)
            )));
        }
        if let Some(network) = self.networks.lock().unwrap().get_mut(&key(namespace, name)) {
            network.status = Some(status.clone());
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Network>> {
        Ok(self.networks.lock().unwrap().values().cloned().collect())
    }

    fn watch(&self) -> BoxStream<'static, Result<WatchEvent>> {
        let events: Vec<Result<WatchEvent>> = self.events.lock().unwrap().drain(..).collect();
        stream::iter(events).boxed()
    }
}
