//! Cluster Manager Client
//!
//! HTTPS/JSON client for the cluster manager's REST interface.
//! Certificate verification is on by default; a custom CA bundle can be
//! added, and verification can only be disabled by explicit configuration.

use std::path::PathBuf;
use std::time::Duration;

use autobalance_core::{search_factor_is_met, NumberLike, UsageStats};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::envelope::decode_content;
use crate::error::{RebalanceError, Result};
use crate::manager::{ClusterManager, UniformRebalance};

// ===== Endpoints =====

const MAINTENANCE_MODE_PATH: &str =
    "/services/cluster/manager/info?f=maintenance_mode&output_mode=json";
const SEARCH_FACTOR_PATH: &str =
    "/services/cluster/manager/generation/master?output_mode=json&f=search_factor_met";
const CLUSTERING_CONF_PATH: &str =
    "/servicesNS/-/-/configs/conf-server/clustering?output_mode=json";
const CLUSTERING_CONF_SETTINGS_PATH: &str =
    "/servicesNS/nobody/system/configs/conf-server/clustering";
const REBALANCE_PATH: &str =
    "/services/cluster/master/control/control/rebalance_buckets?output_mode=json";
const USAGE_REBALANCE_PATH: &str =
    "/services/cluster/master/control/control/rebalance_buckets_usage?output_mode=json";
const PRUNE_EXCESS_PATH: &str = "/services/cluster/master/control/default/prune_index";

/// Default management endpoint of the local cluster manager
pub const DEFAULT_BASE_URL: &str = "https://localhost:8089";

/// Default authorization scheme prefixed to the session token
pub const DEFAULT_AUTH_SCHEME: &str = "Splunk";

/// Client construction errors
#[derive(Error, Debug)]
pub enum ClientBuildError {
    #[error("Failed to read CA certificate {path}: {source}")]
    CaCertRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid CA certificate {path}: {source}")]
    CaCertInvalid {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// TLS settings for the manager connection
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Extra CA certificate (PEM) trusted in addition to the system roots
    pub ca_cert: Option<PathBuf>,
    /// Skip server certificate verification (DANGEROUS - operator decision only)
    pub danger_accept_invalid_certs: bool,
}

/// Connection settings for [`HttpClusterManager`]
#[derive(Debug, Clone)]
pub struct ManagerClientConfig {
    pub base_url: String,
    pub auth_scheme: String,
    pub token: String,
    pub tls: TlsConfig,
    pub timeout: Duration,
}

impl ManagerClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            token: token.into(),
            tls: TlsConfig::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

// ===== Response payloads =====

#[derive(Debug, Deserialize)]
struct MaintenanceContent {
    maintenance_mode: bool,
}

#[derive(Debug, Deserialize)]
struct SearchFactorContent {
    #[serde(default)]
    search_factor_met: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ClusteringContent {
    #[serde(default)]
    rebalance_threshold: Option<NumberLike>,
}

#[derive(Debug, Deserialize)]
struct DescriptionContent {
    description: String,
}

/// Cluster manager reached over HTTPS
pub struct HttpClusterManager {
    client: Client,
    base_url: String,
    authorization: String,
}

impl HttpClusterManager {
    pub fn new(config: &ManagerClientConfig) -> std::result::Result<Self, ClientBuildError> {
        let mut builder = Client::builder().timeout(config.timeout);

        if let Some(ref ca_path) = config.tls.ca_cert {
            let pem = std::fs::read(ca_path).map_err(|source| ClientBuildError::CaCertRead {
                path: ca_path.clone(),
                source,
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|source| {
                ClientBuildError::CaCertInvalid {
                    path: ca_path.clone(),
                    source,
                }
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if config.tls.danger_accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("{} {}", config.auth_scheme, config.token),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        debug!(url = %url, "Attempting to call");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, &self.authorization)
            .send()
            .await
            .map_err(|e| RebalanceError::transport(&url, e))?;

        read_ok("GET", &url, response).await
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<String> {
        let url = self.url(path);
        debug!(url = %url, form = ?form, "Attempting to call");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, &self.authorization)
            .form(form)
            .send()
            .await
            .map_err(|e| RebalanceError::transport(&url, e))?;

        read_ok("POST", &url, response).await
    }
}

/// Accept only HTTP 200 and return the body text
async fn read_ok(method: &'static str, url: &str, response: Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RebalanceError::transport(url, e))?;

    if status != StatusCode::OK {
        return Err(RebalanceError::Http {
            method,
            endpoint: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    debug!(response = %body, "Response");
    Ok(body)
}

#[async_trait::async_trait]
impl ClusterManager for HttpClusterManager {
    #[instrument(skip(self))]
    async fn maintenance_mode(&self) -> Result<bool> {
        let body = self.get(MAINTENANCE_MODE_PATH).await?;
        let content: MaintenanceContent = decode_content(MAINTENANCE_MODE_PATH, &body)?;
        Ok(content.maintenance_mode)
    }

    #[instrument(skip(self))]
    async fn search_factor_met(&self) -> Result<bool> {
        let body = self.get(SEARCH_FACTOR_PATH).await?;
        let content: SearchFactorContent = decode_content(SEARCH_FACTOR_PATH, &body)?;
        debug!(search_factor = ?content.search_factor_met, "Search factor");
        Ok(search_factor_is_met(content.search_factor_met.as_ref()))
    }

    #[instrument(skip(self))]
    async fn rebalance_threshold(&self) -> Result<Option<NumberLike>> {
        let body = self.get(CLUSTERING_CONF_PATH).await?;
        let content: ClusteringContent = decode_content(CLUSTERING_CONF_PATH, &body)?;
        Ok(content.rebalance_threshold)
    }

    #[instrument(skip(self))]
    async fn set_rebalance_threshold(&self, threshold: f64) -> Result<()> {
        self.post_form(
            CLUSTERING_CONF_SETTINGS_PATH,
            &[("rebalance_threshold", threshold.to_string())],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn prune_excess_buckets(&self, index: Option<&str>) -> Result<()> {
        // The prune endpoint answers with very little, so only the status matters
        let mut form = Vec::new();
        if let Some(index) = index {
            form.push(("index", index.to_string()));
        }
        self.post_form(PRUNE_EXCESS_PATH, &form).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn usage_rebalance_status(&self) -> Result<UsageStats> {
        let body = self
            .post_form(USAGE_REBALANCE_PATH, &[("action", "status".to_string())])
            .await?;
        decode_content(USAGE_REBALANCE_PATH, &body)
    }

    #[instrument(skip(self))]
    async fn start_usage_rebalance(&self) -> Result<String> {
        let body = self
            .post_form(USAGE_REBALANCE_PATH, &[("action", "start".to_string())])
            .await?;
        let content: DescriptionContent = decode_content(USAGE_REBALANCE_PATH, &body)?;
        Ok(content.description)
    }

    #[instrument(skip(self))]
    async fn start_rebalance(&self, params: &UniformRebalance) -> Result<String> {
        let mut form = vec![
            ("action", "start".to_string()),
            ("searchable", params.searchable.to_string()),
        ];
        if let Some(ref index) = params.index {
            form.push(("index", index.clone()));
        }
        if let Some(minutes) = params.max_time_in_min {
            form.push(("max_time_in_min", minutes.to_string()));
        }

        let body = self.post_form(REBALANCE_PATH, &form).await?;
        let content: DescriptionContent = decode_content(REBALANCE_PATH, &body)?;
        Ok(content.description)
    }
}
