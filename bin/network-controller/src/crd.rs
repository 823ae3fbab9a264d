//! Network CRD registration

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client, CustomResourceExt, ResourceExt};
use network_api::Network;
use network_core::wait::poll;
use network_core::{CoreError, Result};
use std::time::Duration;
use tracing::{error, info, warn};

const ESTABLISH_INTERVAL: Duration = Duration::from_millis(500);
const ESTABLISH_TIMEOUT: Duration = Duration::from_secs(60);

/// Register the Network CRD and wait until the API server serves it.
///
/// An existing CRD is left alone. A CRD created here that never becomes
/// established is deleted again.
pub async fn ensure_network_crd(client: Client) -> Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client);
    let crd = Network::crd();
    let name = crd.name_any();

    match crds.create(&PostParams::default(), &crd).await {
        Ok(_) => info!("Created CRD {}", name),
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            info!("CRD {} already exists", name);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let api = &crds;
    let crd_name = name.as_str();
    let established = poll(ESTABLISH_INTERVAL, ESTABLISH_TIMEOUT, move || async move {
        let crd = api.get(crd_name).await?;
        Ok::<_, CoreError>(is_established(&crd))
    })
    .await;

    if let Err(e) = established {
        error!("CRD {} not established: {}", name, e);
        if let Err(delete_err) = crds.delete(&name, &DeleteParams::default()).await {
            error!("Delete CRD {} failed: {}", name, delete_err);
        }
        return Err(e);
    }

    info!("CRD {} established", name);
    Ok(())
}

fn is_established(crd: &CustomResourceDefinition) -> bool {
    let conditions = crd
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|c| c.as_slice())
        .unwrap_or_default();

    let mut established = false;
    for cond in conditions {
        match (cond.type_.as_str(), cond.status.as_str()) {
            ("Established", "True") => established = true,
            ("NamesAccepted", "False") => warn!(
                "CRD name conflict: {}",
                cond.reason.as_deref().unwrap_or("unknown")
            ),
            _ => {}
        }
    }
    established
}
