//! OpenStack networking backend
//!
//! - `neutron`: primitive Neutron/Keystone operations (`NeutronApi`)
//! - `client`: HTTP implementation of `NeutronApi`
//! - `driver`: `NetworkProvider` built on the primitives, including the
//!   create sequence with compensating deletion and ordered teardown
//! - `config`: backend configuration file

pub mod client;
pub mod config;
pub mod driver;
pub mod neutron;

#[cfg(test)]
mod fake;

pub use client::NeutronClient;
pub use config::OpenStackConfig;
pub use driver::OpenStackDriver;
pub use neutron::NeutronApi;
