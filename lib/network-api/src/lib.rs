//! Stackube Network API types and CRDs for Kubernetes integration
//!
//! This library defines the custom resource the network controller watches:
//! - Network: a CIDR + gateway that should exist as a network, subnet and
//!   router in the OpenStack networking backend

pub mod v1;

pub use v1::{Network, NetworkSpec, NetworkState, NetworkStatus};
