//! Kubernetes-backed NetworkStore

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use kube::api::{ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use kube_runtime::{watcher, WatchStreamExt};
use network_api::{Network, NetworkStatus};
use network_core::{CoreError, NetworkStore, Result, WatchEvent};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub struct KubeNetworkStore {
    client: Client,
    /// Watch scope; None watches every namespace
    namespace: Option<String>,
}

impl KubeNetworkStore {
    pub fn new(client: Client, namespace: Option<String>) -> Self {
        Self { client, namespace }
    }

    fn namespaced(&self, namespace: &str) -> Api<Network> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn scoped(&self) -> Api<Network> {
        match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

#[async_trait]
impl NetworkStore for KubeNetworkStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Network> {
        Ok(self.namespaced(namespace).get(name).await?)
    }

    async fn create(&self, namespace: &str, network: &Network) -> Result<Network> {
        Ok(self
            .namespaced(namespace)
            .create(&PostParams::default(), network)
            .await?)
    }

    async fn update_status(&self, namespace: &str, name: &str, status: &NetworkStatus) -> Result<()> {
        let patch = json!({ "status": status });
        self.namespaced(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Network>> {
        Ok(self.scoped().list(&ListParams::default()).await?.items)
    }

    fn watch(&self) -> BoxStream<'static, Result<WatchEvent>> {
        notifications(watcher(self.scoped(), watcher::Config::default()))
    }
}

/// Convert raw watcher events into notifications. Errors are delayed with
/// the watcher's default backoff so an unreachable API server is not
/// relisted in a tight loop.
fn notifications<S>(events: S) -> BoxStream<'static, Result<WatchEvent>>
where
    S: Stream<Item = std::result::Result<watcher::Event<Network>, watcher::Error>> + Send + 'static,
{
    let mut informer = Informer::default();
    events
        .default_backoff()
        .map(move |event| -> Vec<Result<WatchEvent>> {
            match event {
                Ok(event) => informer.observe(event).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(CoreError::Backend(format!("watch failed: {}", e)))],
            }
        })
        .flat_map(stream::iter)
        .boxed()
}

/// Turns raw watcher events into Added / Updated / Deleted notifications by
/// remembering the last object seen under each key.
#[derive(Default)]
struct Informer {
    known: HashMap<String, Network>,
    /// Keys seen since the current relist started
    relisted: Option<HashSet<String>>,
}

fn key_of(network: &Network) -> String {
    format!(
        "{}/{}",
        network.namespace().unwrap_or_default(),
        network.name_any()
    )
}

impl Informer {
    fn observe(&mut self, event: watcher::Event<Network>) -> Vec<WatchEvent> {
        match event {
            watcher::Event::Init => {
                debug!("Network relist started");
                self.relisted = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(network) => {
                if let Some(seen) = self.relisted.as_mut() {
                    seen.insert(key_of(&network));
                }
                self.upsert(network, true).into_iter().collect()
            }
            watcher::Event::InitDone => {
                let seen = self.relisted.take().unwrap_or_default();
                let gone: Vec<String> = self
                    .known
                    .keys()
                    .filter(|k| !seen.contains(*k))
                    .cloned()
                    .collect();
                debug!("Network relist done, {} removed while away", gone.len());
                gone.into_iter()
                    .filter_map(|k| self.known.remove(&k))
                    .map(WatchEvent::Deleted)
                    .collect()
            }
            watcher::Event::Apply(network) => self.upsert(network, false).into_iter().collect(),
            watcher::Event::Delete(network) => {
                self.known.remove(&key_of(&network));
                vec![WatchEvent::Deleted(network)]
            }
        }
    }

    /// A relisted object with an unchanged resourceVersion is not an update
    fn upsert(&mut self, network: Network, relist: bool) -> Option<WatchEvent> {
        match self.known.insert(key_of(&network), network.clone()) {
            None => Some(WatchEvent::Added(network)),
            Some(old) if relist && old.resource_version() == network.resource_version() => None,
            Some(old) => Some(WatchEvent::Updated { old, new: network }),
        }
    }
}
