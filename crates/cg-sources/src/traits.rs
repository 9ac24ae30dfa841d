//! Source adapter trait definitions.
//!
//! The five inventory sources implement one capability: resolve a hostname
//! to an `AssetRecord` or report it absent. The cascade owns ordering and
//! applicability; adapters own their transport and error containment.

use crate::secure_string::SecureString;
use async_trait::async_trait;
use cg_core::AssetRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur inside a source adapter.
///
/// These never cross the cascade boundary: the cascade downgrades every
/// variant to "absent" and moves on to the next source.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Health status of a source adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceHealth {
    /// Source is reachable and answering.
    Healthy,
    /// Source is reachable but impaired.
    Degraded(String),
    /// Source is not reachable.
    Unhealthy(String),
    /// Source has no usable configuration and always resolves to absent.
    Unconfigured,
}

/// The five source variants, in cascade preference order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Cmdb,
    Relational,
    CloudInventory,
    ClusterMetadata,
    FlatFile,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Cmdb => write!(f, "cmdb"),
            SourceKind::Relational => write!(f, "relational"),
            SourceKind::CloudInventory => write!(f, "cloud_inventory"),
            SourceKind::ClusterMetadata => write!(f, "cluster_metadata"),
            SourceKind::FlatFile => write!(f, "flat_file"),
        }
    }
}

/// Transport configuration shared by the HTTP-backed adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name/identifier.
    pub name: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Request timeout in seconds; each adapter call must complete or
    /// fail within this budget.
    pub timeout_secs: u64,
    /// Maximum retries.
    pub max_retries: u32,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
    /// Additional headers to include.
    pub headers: HashMap<String, String>,
}

/// Authentication configuration.
///
/// All credential fields use `SecureString` so sensitive data is zeroized
/// from memory when no longer needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication.
    None,
    /// API key in a header.
    ApiKey {
        key: SecureString,
        header_name: String,
    },
    /// Bearer token.
    BearerToken { token: SecureString },
    /// Basic authentication.
    Basic {
        username: String,
        password: SecureString,
    },
    /// OAuth2 client credentials.
    OAuth2 {
        client_id: String,
        client_secret: SecureString,
        token_url: String,
        scopes: Vec<String>,
    },
}

/// The single capability every inventory source provides.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Returns the source name.
    fn name(&self) -> &str;

    /// Returns the source variant.
    fn kind(&self) -> SourceKind;

    /// Applicability gate evaluated by the cascade before `resolve` is
    /// called. Sources applicable to every hostname keep the default.
    fn applies_to(&self, _hostname: &str) -> bool {
        true
    }

    /// Resolves a hostname to an asset record, or `None` when this source
    /// has no active knowledge of it.
    ///
    /// Implementations map "not found", "inactive", and "unconfigured" to
    /// `Ok(None)`; transport and parse failures are returned as errors for
    /// the cascade to log and downgrade.
    async fn resolve(&self, hostname: &str) -> SourceResult<Option<AssetRecord>>;

    /// Checks the health of the source.
    async fn health_check(&self) -> SourceResult<SourceHealth>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Cmdb.to_string(), "cmdb");
        assert_eq!(SourceKind::FlatFile.to_string(), "flat_file");
    }

    #[test]
    fn test_source_kind_cascade_order() {
        // The enum order is the cascade preference order.
        let mut kinds = vec![
            SourceKind::FlatFile,
            SourceKind::Cmdb,
            SourceKind::ClusterMetadata,
            SourceKind::Relational,
            SourceKind::CloudInventory,
        ];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                SourceKind::Cmdb,
                SourceKind::Relational,
                SourceKind::CloudInventory,
                SourceKind::ClusterMetadata,
                SourceKind::FlatFile,
            ]
        );
    }

    #[test]
    fn test_auth_config_serde_tagging() {
        let auth = AuthConfig::Basic {
            username: "svc-user".to_string(),
            password: SecureString::from("hunter2"),
        };
        let json = serde_json::to_value(&auth).unwrap();
        assert_eq!(json["type"], "basic");
        assert_eq!(json["username"], "svc-user");
    }

    #[test]
    fn test_source_health_serde() {
        let health = SourceHealth::Unconfigured;
        let json = serde_json::to_string(&health).unwrap();
        assert_eq!(json, "\"unconfigured\"");
    }
}
