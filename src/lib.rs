//! Cluster-wide storage inventory for Proxmox VE.
//!
//! Queries the read-only management API for cluster members, guests, guest
//! disk configuration and storage status, then filters, aggregates and
//! renders the result as a table, CSV or JSON.
//!
//! # Examples
//!
//! ```no_run
//! use pve_storage_info::{InventoryResult, ProxmoxClient, RunConfig, View, run};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> InventoryResult<()> {
//!     let client = ProxmoxClient::builder()
//!         .host("pve1.example.com")
//!         .token("root@pam!inventory", "6f1c9a3e-2b7d-4c5e-9f0a-1b2c3d4e5f60")
//!         .accept_invalid_certs(true)
//!         .build()?;
//!
//!     let config = RunConfig {
//!         view: View::TotalPerVm,
//!         ..Default::default()
//!     };
//!     print!("{}", run(Arc::new(client), &config).await?);
//!     Ok(())
//! }
//! ```

mod auth;
mod core;

#[cfg(test)]
mod tests;

pub use crate::core::{
    application::{
        aggregator::{build as build_rows, grand_total},
        collector::{CollectPlan, Collector},
        config::{OutputFormat, RenderOptions, RunConfig, View, effective_workers},
        filter::Filter,
        pipeline::run,
        render::{Cell, RowSet, render},
    },
    domain::{
        error::{ApiError, ApiResult, InventoryError, InventoryResult, ValidationError},
        model::{
            cluster::{ClusterInfo, ClusterNode, ExternalAddress, NodeRole},
            disk_record::DiskRecord,
            guest::{Guest, GuestConfig, GuestType},
            inventory::{CollectWarning, Inventory, WarningScope},
            network::NetworkInterface,
            storage::StorageStatus,
        },
        value_object::{
            DiskSize, ProxmoxApiToken, ProxmoxHost, ProxmoxPassword, ProxmoxPort, ProxmoxRealm,
            ProxmoxUrl, ProxmoxUsername,
        },
    },
    infrastructure::{
        api_client::ApiClient,
        config::{ClientConfig, RateLimitConfig},
        corosync::{CorosyncConfig, DEFAULT_COROSYNC_CONF},
        pve_api::PveApi,
    },
};

use crate::core::domain::model::proxmox_connection::{ProxmoxConnection, ProxmoxCredentials};
use std::time::Duration;

/// The HTTP implementation of [`PveApi`].
pub type ProxmoxClient = ApiClient;

/// Builder for a [`ProxmoxClient`].
///
/// Either [`token`](Self::token) or [`credentials`](Self::credentials) must
/// be set; a token wins when both are.
#[derive(Debug)]
pub struct ProxmoxClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    realm: Option<String>,
    token_id: Option<String>,
    token_secret: Option<String>,
    secure: bool,
    config: ClientConfig,
}

impl Default for ProxmoxClientBuilder {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            username: None,
            password: None,
            realm: None,
            token_id: None,
            token_secret: None,
            secure: true,
            config: ClientConfig::default(),
        }
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::Field {
        field: field.to_string(),
        message: format!("{} is required", field),
    }
}

impl ProxmoxClientBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Ticket login with username, password and realm.
    pub fn credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        realm: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self.realm = Some(realm.into());
        self
    }

    /// API token authentication (`USER@REALM!TOKENID` and its secret).
    pub fn token(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.token_id = Some(id.into());
        self.token_secret = Some(secret.into());
        self
    }

    /// Use HTTPS (the default) or plain HTTP.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn rate_limit(mut self, rate_limit: Option<RateLimitConfig>) -> Self {
        self.config.rate_limit = rate_limit;
        self
    }

    pub fn ticket_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.ticket_lifetime = lifetime;
        self
    }

    /// Validates the settings and creates the client. No request is sent.
    pub fn build(self) -> InventoryResult<ProxmoxClient> {
        let host = ProxmoxHost::new(self.host.ok_or_else(|| missing("host"))?)?;
        let port = ProxmoxPort::new(self.port.unwrap_or(ProxmoxPort::DEFAULT))?;

        let credentials = match (self.token_id, self.token_secret) {
            (Some(id), Some(secret)) => ProxmoxCredentials::Token(ProxmoxApiToken::new(id, secret)?),
            (Some(_), None) => return Err(missing("token secret").into()),
            (None, _) => ProxmoxCredentials::Password {
                username: ProxmoxUsername::new(self.username.ok_or_else(|| missing("username"))?)?,
                password: ProxmoxPassword::new(self.password.ok_or_else(|| missing("password"))?)?,
                realm: ProxmoxRealm::new(self.realm.unwrap_or_else(|| "pam".to_string()))?,
            },
        };

        let url = ProxmoxUrl::new(&host, &port, self.secure)?;
        let connection = ProxmoxConnection::new(host, port, credentials, self.secure, url);
        Ok(ApiClient::new(connection, self.config)?)
    }
}

impl ApiClient {
    /// Creates a new builder for client configuration.
    pub fn builder() -> ProxmoxClientBuilder {
        ProxmoxClientBuilder::default()
    }
}
