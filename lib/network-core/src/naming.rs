//! Derived backend object names
//!
//! Adoption finds existing backend objects by these names, so the formats
//! must stay stable across releases.

const NAME_PREFIX: &str = "kube";
const NETWORK_SUFFIX: &str = "network";
const SUBNET_SUFFIX: &str = "subnet";

/// Backend network (and router) name for a Network resource
pub fn network_name(resource_name: &str) -> String {
    format!("{}_{}", resource_name, NETWORK_SUFFIX)
}

/// Backend subnet name for a Network resource
pub fn subnet_name(resource_name: &str) -> String {
    format!("{}_{}", resource_name, SUBNET_SUFFIX)
}

/// Tenant-qualified name: `kube_<name>_<tenant>`
pub fn build_network_name(name: &str, tenant_id: &str) -> String {
    format!("{}_{}_{}", NAME_PREFIX, name, tenant_id)
}

/// Namespace-qualified name: `kube_<name>_<namespace>`
pub fn build_load_balancer_name(name: &str, namespace: &str) -> String {
    format!("{}_{}_{}", NAME_PREFIX, name, namespace)
}

/// Port name for a pod attached to a backend network
pub fn build_port_name(pod_name: &str, namespace: &str, network_id: &str) -> String {
    format!("{}_{}_{}_{}", NAME_PREFIX, pod_name, namespace, network_id)
}
