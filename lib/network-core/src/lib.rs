//! Core reconciliation functionality for Stackube networks
//!
//! This library provides:
//! - The capability traits the reconciler consumes: the networking backend
//!   (`NetworkProvider`) and the cluster store (`NetworkStore`)
//! - Provider-side network types and status mapping
//! - The Network reconciler and its create-or-adopt protocol
//! - Derived naming and a bounded polling helper

pub mod error;
pub mod naming;
pub mod provider;
pub mod reconciler;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod wait;

pub use error::{CoreError, Result};
pub use provider::NetworkProvider;
pub use reconciler::NetworkReconciler;
pub use store::{NetworkStore, WatchEvent};
pub use types::{ProviderNetwork, ProviderSubnet, Route};
