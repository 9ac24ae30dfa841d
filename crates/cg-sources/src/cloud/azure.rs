//! Azure Resource Graph source adapter.
//!
//! Looks up virtual machines by name or OS computer name and projects their
//! ownership tags. Only this adapter is gated by the cascade's cloud scope:
//! hostnames outside the configured domain (and without an "internal"
//! marker) skip Azure entirely.

use crate::http::HttpClient;
use crate::traits::{
    InventorySource, SourceConfig, SourceHealth, SourceKind, SourceResult,
};
use async_trait::async_trait;
use cg_core::{cloud_scope_matches, unknown_owner_email, AssetRecord, AssetStatus, UNKNOWN};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const RESOURCE_GRAPH_PATH: &str =
    "providers/Microsoft.ResourceGraph/resources?api-version=2021-03-01";

/// Azure Resource Graph adapter for VM inventory.
pub struct AzureResourceGraphSource {
    name: String,
    client: HttpClient,
    subscription_id: String,
    /// Domain suffix gating applicability (e.g. "contoso.com").
    domain_suffix: String,
    owner_domain: String,
}

#[derive(Debug, Deserialize)]
struct ResourceGraphResponse {
    #[serde(default = "Vec::new")]
    data: Vec<VmRow>,
}

#[derive(Debug, Deserialize)]
struct VmRow {
    #[allow(dead_code)]
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    owner_email: Option<String>,
    #[serde(default)]
    owner_team: Option<String>,
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    cost_center: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl AzureResourceGraphSource {
    pub fn new(
        config: SourceConfig,
        subscription_id: impl Into<String>,
        domain_suffix: impl Into<String>,
        owner_domain: impl Into<String>,
    ) -> SourceResult<Self> {
        Ok(Self {
            name: config.name.clone(),
            client: HttpClient::new(config)?,
            subscription_id: subscription_id.into(),
            domain_suffix: domain_suffix.into(),
            owner_domain: owner_domain.into(),
        })
    }

    fn vm_query(hostname: &str) -> String {
        format!(
            "Resources \
             | where type == 'microsoft.compute/virtualmachines' \
             | where name == '{h}' or properties.osProfile.computerName == '{h}' \
             | project \
                 hostname = name, \
                 owner_email = tags.Owner, \
                 owner_team = tags.Team, \
                 environment = tags.Environment, \
                 cost_center = tags.CostCenter, \
                 status = case( \
                     properties.extended.instanceView.powerState.displayStatus == 'VM running', 'active', \
                     'inactive' \
                 ) \
             | limit 1",
            h = hostname
        )
    }
}

#[async_trait]
impl InventorySource for AzureResourceGraphSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::CloudInventory
    }

    fn applies_to(&self, hostname: &str) -> bool {
        cloud_scope_matches(hostname, &self.domain_suffix)
    }

    async fn resolve(&self, hostname: &str) -> SourceResult<Option<AssetRecord>> {
        // A quote cannot occur in a valid hostname and would corrupt the
        // KQL string literal.
        if hostname.contains('\'') {
            return Ok(None);
        }

        let body = json!({
            "subscriptions": [self.subscription_id],
            "query": Self::vm_query(hostname),
            "options": { "resultFormat": "objectArray" }
        });

        let response: ResourceGraphResponse =
            self.client.post_json(RESOURCE_GRAPH_PATH, &body).await?;

        let row = match response.data.into_iter().next() {
            Some(row) => row,
            None => {
                debug!(hostname = %hostname, "no matching virtual machine");
                return Ok(None);
            }
        };

        let active = row
            .status
            .as_deref()
            .map(|s| AssetStatus::parse(s).is_active())
            .unwrap_or(false);
        if !active {
            debug!(hostname = %hostname, "virtual machine not running");
            return Ok(None);
        }

        Ok(Some(AssetRecord::active(
            hostname,
            row.owner_email
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| unknown_owner_email(&self.owner_domain)),
            row.owner_team
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            row.environment
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            row.cost_center.unwrap_or_default(),
        )))
    }

    async fn health_check(&self) -> SourceResult<SourceHealth> {
        let body = json!({
            "subscriptions": [self.subscription_id],
            "query": "Resources | limit 1",
            "options": { "resultFormat": "objectArray" }
        });

        match self
            .client
            .post_json::<_, ResourceGraphResponse>(RESOURCE_GRAPH_PATH, &body)
            .await
        {
            Ok(_) => Ok(SourceHealth::Healthy),
            Err(e) => Ok(SourceHealth::Unhealthy(e.to_string())),
        }
    }
}
