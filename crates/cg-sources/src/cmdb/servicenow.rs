//! ServiceNow CMDB source adapter.
//!
//! Queries the `cmdb_ci_server` table for an operational record matching the
//! hostname, then dereferences the owner through `sys_user` for an email
//! address. A failed owner dereference degrades to the unknown-owner
//! sentinel rather than failing the whole lookup.

use crate::http::HttpClient;
use crate::traits::{
    InventorySource, SourceConfig, SourceError, SourceHealth, SourceKind, SourceResult,
};
use async_trait::async_trait;
use cg_core::{unknown_owner_email, AssetRecord, UNKNOWN};
use serde::Deserialize;
use tracing::{debug, warn};

/// ServiceNow CMDB adapter.
pub struct ServiceNowCmdbSource {
    name: String,
    client: HttpClient,
    /// Domain used for the unknown-owner email sentinel.
    owner_domain: String,
}

/// Generic envelope for ServiceNow table API responses.
#[derive(Debug, Deserialize)]
struct TableResponse<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

/// Envelope for single-record responses (`/table/{name}/{sys_id}`).
#[derive(Debug, Deserialize)]
struct RecordResponse<T> {
    result: T,
}

/// A `cmdb_ci_server` row, limited to the fields the resolver projects.
///
/// The query requests `sysparm_display_value=all`, so every field arrives
/// as a `{display_value, value}` object: `value` carries sys_ids for
/// references and raw values otherwise.
#[derive(Debug, Deserialize)]
struct CmdbServerRecord {
    #[allow(dead_code)]
    #[serde(default)]
    name: Option<FieldValue>,
    #[serde(default)]
    owned_by: Option<FieldValue>,
    #[serde(default)]
    support_group: Option<FieldValue>,
    #[serde(default)]
    environment: Option<FieldValue>,
    #[serde(default)]
    cost_center: Option<FieldValue>,
}

#[derive(Debug, Deserialize)]
struct FieldValue {
    #[serde(default)]
    value: String,
    #[serde(default)]
    display_value: Option<String>,
}

impl FieldValue {
    /// Display value when present, raw value otherwise.
    fn display_or_value(&self) -> &str {
        match self.display_value.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => &self.value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SysUserRecord {
    #[serde(default)]
    email: Option<String>,
}

impl ServiceNowCmdbSource {
    /// Creates a ServiceNow adapter. `owner_domain` is the mail domain used
    /// when a record has no resolvable owner.
    pub fn new(config: SourceConfig, owner_domain: impl Into<String>) -> SourceResult<Self> {
        Ok(Self {
            name: config.name.clone(),
            client: HttpClient::new(config)?,
            owner_domain: owner_domain.into(),
        })
    }

    /// Dereferences an owner sys_id to an email address. Any failure along
    /// the way yields the unknown-owner sentinel; the primary record still
    /// authorizes.
    async fn owner_email(&self, sys_id: &str) -> String {
        let path = format!(
            "api/now/table/sys_user/{}?sysparm_fields=email",
            urlencoding::encode(sys_id)
        );

        match self.client.get_json::<RecordResponse<SysUserRecord>>(&path).await {
            Ok(response) => match response.result.email {
                Some(email) if !email.is_empty() => email,
                _ => unknown_owner_email(&self.owner_domain),
            },
            Err(e) => {
                warn!(sys_id = %sys_id, error = %e, "owner dereference failed");
                unknown_owner_email(&self.owner_domain)
            }
        }
    }
}

#[async_trait]
impl InventorySource for ServiceNowCmdbSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Cmdb
    }

    async fn resolve(&self, hostname: &str) -> SourceResult<Option<AssetRecord>> {
        // operational_status=1 filters to operational servers, so a hit here
        // is active by construction.
        let query = format!("name={}^operational_status=1", hostname);
        let path = format!(
            "api/now/table/cmdb_ci_server?sysparm_query={}&sysparm_fields=name,owned_by,support_group,environment,cost_center&sysparm_display_value=all&sysparm_limit=1",
            urlencoding::encode(&query)
        );

        let response: TableResponse<CmdbServerRecord> = self.client.get_json(&path).await?;

        let record = match response.result.into_iter().next() {
            Some(record) => record,
            None => {
                debug!(hostname = %hostname, "no operational CMDB record");
                return Ok(None);
            }
        };

        let owner_email = match record.owned_by.as_ref().filter(|f| !f.value.is_empty()) {
            Some(owner) => self.owner_email(&owner.value).await,
            None => unknown_owner_email(&self.owner_domain),
        };

        let owner_team = record
            .support_group
            .as_ref()
            .map(|f| f.display_or_value())
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        let environment = record
            .environment
            .as_ref()
            .map(|f| f.display_or_value())
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        let cost_center = record
            .cost_center
            .as_ref()
            .map(|f| f.display_or_value())
            .unwrap_or_default()
            .to_string();

        Ok(Some(AssetRecord::active(
            hostname,
            owner_email,
            owner_team,
            environment,
            cost_center,
        )))
    }

    async fn health_check(&self) -> SourceResult<SourceHealth> {
        let path = "api/now/table/cmdb_ci_server?sysparm_limit=1&sysparm_fields=name";
        match self.client.get(path).await {
            Ok(_) => Ok(SourceHealth::Healthy),
            Err(SourceError::AuthenticationFailed(e)) => {
                Ok(SourceHealth::Unhealthy(format!("authentication failed: {}", e)))
            }
            Err(e) => Ok(SourceHealth::Unhealthy(e.to_string())),
        }
    }
}
