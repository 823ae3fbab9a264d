//! API version v1 for Stackube CRDs

pub mod network;

pub use network::{Network, NetworkSpec, NetworkState, NetworkStatus};

