//! Command line flags

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "network-controller", about = "Reconciles Network resources against OpenStack Neutron")]
pub struct Args {
    /// Path to the OpenStack YAML configuration
    #[arg(long, env = "OPENSTACK_CONFIG", default_value = "/etc/stackube/openstack.yaml")]
    pub openstack_config: PathBuf,

    /// Tenant owning Networks that do not set tenantID
    #[arg(long, env = "TENANTID")]
    pub tenant_id: String,

    /// Only watch Networks in this namespace
    #[arg(long)]
    pub namespace: Option<String>,

    /// Assume the Network CRD is already installed
    #[arg(long)]
    pub skip_crd_bootstrap: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}
