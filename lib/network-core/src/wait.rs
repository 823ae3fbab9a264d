//! Bounded fixed-interval polling

use crate::store::NetworkStore;
use crate::{CoreError, Result};
use network_api::NetworkState;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::debug;

/// Poll `condition` every `interval` until it returns true or `timeout`
/// elapses. An error from the condition stops polling and is returned.
pub async fn poll<F, Fut>(interval: Duration, timeout: Duration, mut condition: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        time::sleep(interval).await;

        if condition().await? {
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(CoreError::Timeout(format!(
                "condition not met within {:?}",
                timeout
            )));
        }
    }
}

/// Wait until a Network reaches `state`. A store error is treated as
/// "not yet" so a transient read failure does not end the wait.
pub async fn wait_for_network_state(
    store: &dyn NetworkStore,
    namespace: &str,
    name: &str,
    state: NetworkState,
) -> Result<()> {
    poll(Duration::from_millis(100), Duration::from_secs(10), move || async move {
        match store.get(namespace, name).await {
            Ok(network) => Ok(network.state() == Some(state)),
            Err(e) => {
                debug!("Waiting for network {}/{}: {}", namespace, name, e);
                Ok(false)
            }
        }
    })
    .await
}
