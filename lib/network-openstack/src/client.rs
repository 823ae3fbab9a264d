//! HTTP client for the Keystone v3 and Neutron v2.0 REST APIs

use crate::config::OpenStackConfig;
use crate::neutron::{
    Network, NetworkCreateOpts, NetworkFilter, NeutronApi, Port, Router, RouterCreateOpts, Subnet,
    SubnetCreateOpts, Tenant,
};
use async_trait::async_trait;
use network_core::{CoreError, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

const TOKEN_HEADER: &str = "X-Auth-Token";
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Authenticated Keystone/Neutron client.
///
/// The token is obtained once at construction and never renewed.
pub struct NeutronClient {
    http: reqwest::Client,
    identity_endpoint: String,
    network_endpoint: String,
    token: String,
}

#[derive(Deserialize)]
struct ProjectsBody {
    projects: Vec<Tenant>,
}

#[derive(Deserialize)]
struct NetworksBody {
    networks: Vec<Network>,
}

#[derive(Deserialize)]
struct NetworkBody {
    network: Network,
}

#[derive(Deserialize)]
struct SubnetBody {
    subnet: Subnet,
}

#[derive(Deserialize)]
struct RoutersBody {
    routers: Vec<Router>,
}

#[derive(Deserialize)]
struct RouterBody {
    router: Router,
}

#[derive(Deserialize)]
struct PortsBody {
    ports: Vec<Port>,
}

fn transport_error(e: reqwest::Error) -> CoreError {
    CoreError::Backend(e.to_string())
}

impl NeutronClient {
    /// Build a client, authenticating with a password unless the
    /// configuration carries a token
    pub async fn connect(config: &OpenStackConfig) -> Result<Self> {
        let http = reqwest::Client::new();

        let token = if config.token_id.is_empty() {
            Self::authenticate(&http, config).await?
        } else {
            config.token_id.clone()
        };

        info!(
            "Connected to OpenStack (identity {}, network {}, region {})",
            config.auth_url,
            config.network_endpoint,
            if config.region.is_empty() { "unset" } else { config.region.as_str() }
        );

        Ok(Self {
            http,
            identity_endpoint: config.auth_url.trim_end_matches('/').to_string(),
            network_endpoint: config.network_endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn authenticate(http: &reqwest::Client, config: &OpenStackConfig) -> Result<String> {
        let url = format!("{}/auth/tokens", config.auth_url.trim_end_matches('/'));
        let response = http
            .post(&url)
            .json(&password_auth_body(config))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check(response, "POST", &url).await?;

        response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|t| t.to_string())
            .ok_or_else(|| CoreError::Backend(format!("no {} in response", SUBJECT_TOKEN_HEADER)))
    }

    fn network_url(&self, path: &str) -> String {
        format!("{}/v2.0/{}", self.network_endpoint, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(TOKEN_HEADER, &self.token)
    }

    async fn send(&self, request: RequestBuilder, method: &str, url: &str) -> Result<Response> {
        debug!("{} {}", method, url);
        let response = request.send().await.map_err(transport_error)?;
        check(response, method, url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .send(self.request(Method::GET, url).query(query), "GET", url)
            .await?;
        response.json().await.map_err(transport_error)
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T> {
        let response = self
            .send(self.request(Method::POST, url).json(body), "POST", url)
            .await?;
        response.json().await.map_err(transport_error)
    }

    async fn put(&self, url: &str, body: &Value) -> Result<()> {
        self.send(self.request(Method::PUT, url).json(body), "PUT", url)
            .await?;
        Ok(())
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, url), "DELETE", url)
            .await?;
        Ok(())
    }
}

/// Map a non-success response to NotFound or Backend
async fn check(response: Response, method: &str, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(CoreError::NotFound(format!("{} {}", method, url)));
    }
    Err(CoreError::Backend(format!(
        "{} {} returned {}: {}",
        method, url, status, body
    )))
}

fn password_auth_body(config: &OpenStackConfig) -> Value {
    let domain = if !config.domain_id.is_empty() {
        json!({ "id": config.domain_id })
    } else if !config.domain_name.is_empty() {
        json!({ "name": config.domain_name })
    } else {
        json!({ "id": "default" })
    };

    let user = if !config.user_id.is_empty() {
        json!({ "id": config.user_id, "password": config.password })
    } else {
        json!({ "name": config.username, "password": config.password, "domain": domain })
    };

    let mut auth = json!({
        "identity": {
            "methods": ["password"],
            "password": { "user": user },
        }
    });

    if !config.tenant_id.is_empty() {
        auth["scope"] = json!({ "project": { "id": config.tenant_id } });
    } else if !config.tenant_name.is_empty() {
        auth["scope"] = json!({ "project": { "name": config.tenant_name, "domain": domain } });
    }

    json!({ "auth": auth })
}

#[async_trait]
impl NeutronApi for NeutronClient {
    async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let url = format!("{}/projects", self.identity_endpoint);
        let body: ProjectsBody = self.get_json(&url, &[]).await?;
        Ok(body.projects)
    }

    async fn list_networks(&self, filter: &NetworkFilter) -> Result<Vec<Network>> {
        let mut query = Vec::new();
        if let Some(id) = &filter.id {
            query.push(("id", id.as_str()));
        }
        if let Some(name) = &filter.name {
            query.push(("name", name.as_str()));
        }
        let body: NetworksBody = self.get_json(&self.network_url("networks"), &query).await?;
        Ok(body.networks)
    }

    async fn create_network(&self, opts: &NetworkCreateOpts) -> Result<Network> {
        let body: NetworkBody = self
            .post_json(&self.network_url("networks"), &json!({ "network": opts }))
            .await?;
        Ok(body.network)
    }

    async fn delete_network(&self, network_id: &str) -> Result<()> {
        self.delete(&self.network_url(&format!("networks/{}", network_id)))
            .await
    }

    async fn get_subnet(&self, subnet_id: &str) -> Result<Subnet> {
        let body: SubnetBody = self
            .get_json(&self.network_url(&format!("subnets/{}", subnet_id)), &[])
            .await?;
        Ok(body.subnet)
    }

    async fn create_subnet(&self, opts: &SubnetCreateOpts) -> Result<Subnet> {
        let body: SubnetBody = self
            .post_json(&self.network_url("subnets"), &json!({ "subnet": opts }))
            .await?;
        Ok(body.subnet)
    }

    async fn delete_subnet(&self, subnet_id: &str) -> Result<()> {
        self.delete(&self.network_url(&format!("subnets/{}", subnet_id)))
            .await
    }

    async fn list_routers(&self, name: &str) -> Result<Vec<Router>> {
        let body: RoutersBody = self
            .get_json(&self.network_url("routers"), &[("name", name)])
            .await?;
        Ok(body.routers)
    }

    async fn create_router(&self, opts: &RouterCreateOpts) -> Result<Router> {
        let body: RouterBody = self
            .post_json(&self.network_url("routers"), &json!({ "router": opts }))
            .await?;
        Ok(body.router)
    }

    async fn delete_router(&self, router_id: &str) -> Result<()> {
        self.delete(&self.network_url(&format!("routers/{}", router_id)))
            .await
    }

    async fn add_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()> {
        let url = self.network_url(&format!("routers/{}/add_router_interface", router_id));
        self.put(&url, &json!({ "subnet_id": subnet_id })).await
    }

    async fn remove_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()> {
        let url = self.network_url(&format!("routers/{}/remove_router_interface", router_id));
        self.put(&url, &json!({ "subnet_id": subnet_id })).await
    }

    async fn list_ports(&self, network_id: &str) -> Result<Vec<Port>> {
        let body: PortsBody = self
            .get_json(&self.network_url("ports"), &[("network_id", network_id)])
            .await?;
        Ok(body.ports)
    }

    async fn delete_port(&self, port_id: &str) -> Result<()> {
        self.delete(&self.network_url(&format!("ports/{}", port_id)))
            .await
    }
}
