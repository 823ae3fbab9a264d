use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use network_core::NetworkReconciler;
use network_openstack::{NeutronClient, OpenStackConfig, OpenStackDriver};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod crd;
mod store;

use config::Args;
use store::KubeNetworkStore;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!("Starting network-controller...");

    let os_config = OpenStackConfig::from_file(&args.openstack_config).with_context(|| {
        format!(
            "loading OpenStack configuration from {}",
            args.openstack_config.display()
        )
    })?;
    let neutron = NeutronClient::connect(&os_config)
        .await
        .context("connecting to OpenStack")?;
    let driver = OpenStackDriver::new(Arc::new(neutron), os_config.ext_net_id.clone());

    let client = Client::try_default().await?;
    if args.skip_crd_bootstrap {
        info!("Skipping Network CRD bootstrap");
    } else {
        crd::ensure_network_crd(client.clone())
            .await
            .context("registering the Network CRD")?;
    }

    let store = KubeNetworkStore::new(client, args.namespace.clone());
    let reconciler = NetworkReconciler::new(Arc::new(driver), Arc::new(store), args.tenant_id);

    tokio::select! {
        result = reconciler.run() => {
            if let Err(e) = result {
                error!("Network controller error: {}", e);
                return Err(e.into());
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received, exiting...");
        }
    }

    Ok(())
}
