//! Kubernetes namespace source adapter.
//!
//! In-cluster service hostnames (`service.namespace.svc.cluster.local`)
//! resolve through the owning namespace's metadata: `team`, `environment`,
//! and `cost-center` labels plus an `owner-email` annotation. A namespace
//! that is not in the Active phase does not authorize.

use crate::traits::{
    InventorySource, SourceError, SourceHealth, SourceKind, SourceResult,
};
use async_trait::async_trait;
use cg_core::{cluster_namespace, unknown_owner_email, AssetRecord, UNKNOWN};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::Api;
use kube::Client;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Upper bound for one API server round trip. The client's own read
/// timeout is far longer; a hung API server must not stall resolution.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

const LABEL_TEAM: &str = "team";
const LABEL_ENVIRONMENT: &str = "environment";
const LABEL_COST_CENTER: &str = "cost-center";
const LABEL_OWNER: &str = "owner";
const ANNOTATION_OWNER_EMAIL: &str = "owner-email";

/// Kubernetes namespace adapter.
pub struct KubernetesNamespaceSource {
    name: String,
    namespaces: Api<Namespace>,
    owner_domain: String,
    call_timeout: Duration,
}

impl KubernetesNamespaceSource {
    /// Connects using the ambient kubeconfig or in-cluster service account.
    pub async fn connect(
        name: impl Into<String>,
        owner_domain: impl Into<String>,
    ) -> SourceResult<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| SourceError::ConfigError(e.to_string()))?;

        Ok(Self::with_client(name, client, owner_domain))
    }

    /// Builds an adapter over an existing client.
    pub fn with_client(
        name: impl Into<String>,
        client: Client,
        owner_domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespaces: Api::all(client),
            owner_domain: owner_domain.into(),
            call_timeout: CALL_TIMEOUT,
        }
    }

    /// Overrides the per-call timeout.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

/// Maps namespace metadata to an asset record. Returns `None` for any
/// namespace not in the Active phase.
fn record_from_namespace(hostname: &str, ns: &Namespace, owner_domain: &str) -> Option<AssetRecord> {
    let phase = ns
        .status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or_default();
    if phase != "Active" {
        debug!(hostname = %hostname, phase = %phase, "namespace not active");
        return None;
    }

    let labels = ns.metadata.labels.as_ref();
    let annotations = ns.metadata.annotations.as_ref();

    let label = |key: &str| -> Option<String> {
        labels
            .and_then(|l| l.get(key))
            .filter(|v| !v.is_empty())
            .cloned()
    };

    let owner_email = annotations
        .and_then(|a| a.get(ANNOTATION_OWNER_EMAIL))
        .filter(|v| !v.is_empty())
        .cloned()
        .or_else(|| label(LABEL_OWNER))
        .unwrap_or_else(|| unknown_owner_email(owner_domain));

    Some(AssetRecord::active(
        hostname,
        owner_email,
        label(LABEL_TEAM).unwrap_or_else(|| UNKNOWN.to_string()),
        label(LABEL_ENVIRONMENT).unwrap_or_else(|| UNKNOWN.to_string()),
        label(LABEL_COST_CENTER).unwrap_or_default(),
    ))
}

#[async_trait]
impl InventorySource for KubernetesNamespaceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::ClusterMetadata
    }

    fn applies_to(&self, hostname: &str) -> bool {
        cluster_namespace(hostname).is_some()
    }

    async fn resolve(&self, hostname: &str) -> SourceResult<Option<AssetRecord>> {
        let namespace = match cluster_namespace(hostname) {
            Some(ns) => ns,
            None => return Ok(None),
        };

        let response = timeout(self.call_timeout, self.namespaces.get(namespace))
            .await
            .map_err(|_| {
                SourceError::Timeout(format!(
                    "namespace lookup exceeded {}s",
                    self.call_timeout.as_secs()
                ))
            })?;

        let ns = match response {
            Ok(ns) => ns,
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                debug!(hostname = %hostname, namespace = %namespace, "namespace not found");
                return Ok(None);
            }
            Err(kube::Error::Api(ae)) if ae.code == 401 || ae.code == 403 => {
                return Err(SourceError::AuthenticationFailed(ae.to_string()));
            }
            Err(e) => return Err(SourceError::ConnectionFailed(e.to_string())),
        };

        Ok(record_from_namespace(hostname, &ns, &self.owner_domain))
    }

    async fn health_check(&self) -> SourceResult<SourceHealth> {
        let params = kube::api::ListParams::default().limit(1);
        match timeout(self.call_timeout, self.namespaces.list_metadata(&params)).await {
            Ok(Ok(_)) => Ok(SourceHealth::Healthy),
            Ok(Err(e)) => Ok(SourceHealth::Unhealthy(e.to_string())),
            Err(_) => Ok(SourceHealth::Unhealthy(format!(
                "namespace list exceeded {}s",
                self.call_timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::NamespaceStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn namespace(
        phase: &str,
        labels: &[(&str, &str)],
        annotations: &[(&str, &str)],
    ) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                annotations: Some(
                    annotations
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                ..Default::default()
            },
            status: Some(NamespaceStatus {
                phase: Some(phase.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_active_namespace_with_annotation_owner() {
        let ns = namespace(
            "Active",
            &[
                ("team", "payments"),
                ("environment", "production"),
                ("cost-center", "CC-42"),
            ],
            &[("owner-email", "payments-oncall@contoso.com")],
        );

        let record =
            record_from_namespace("api.prod-payments.svc.cluster.local", &ns, "contoso.com")
                .unwrap();
        assert_eq!(record.owner_email, "payments-oncall@contoso.com");
        assert_eq!(record.owner_team, "payments");
        assert_eq!(record.environment, "production");
        assert_eq!(record.cost_center, "CC-42");
        assert!(record.is_active());
    }

    #[test]
    fn test_owner_label_fallback() {
        let ns = namespace("Active", &[("owner", "ops@contoso.com")], &[]);
        let record =
            record_from_namespace("svc.ops.svc.cluster.local", &ns, "contoso.com").unwrap();
        assert_eq!(record.owner_email, "ops@contoso.com");
        assert_eq!(record.owner_team, "unknown");
        assert_eq!(record.cost_center, "");
    }

    #[test]
    fn test_missing_owner_uses_sentinel() {
        let ns = namespace("Active", &[("team", "batch")], &[]);
        let record =
            record_from_namespace("job.batch.svc.cluster.local", &ns, "contoso.com").unwrap();
        assert_eq!(record.owner_email, "unknown@contoso.com");
    }

    #[test]
    fn test_terminating_namespace_is_absent() {
        let ns = namespace("Terminating", &[("team", "gone")], &[]);
        assert!(record_from_namespace("svc.gone.svc.cluster.local", &ns, "contoso.com").is_none());
    }

    #[test]
    fn test_empty_label_values_fall_through() {
        let ns = namespace("Active", &[("team", ""), ("environment", "qa")], &[]);
        let record =
            record_from_namespace("svc.qa.svc.cluster.local", &ns, "contoso.com").unwrap();
        assert_eq!(record.owner_team, "unknown");
        assert_eq!(record.environment, "qa");
    }

    /// A client pointed at an endpoint that accepts connections but never
    /// answers. The connection sits in the listener's backlog, so requests
    /// hang until the per-call timeout fires.
    async fn hung_server_source(call_timeout: Duration) -> (KubernetesNamespaceSource, tokio::net::TcpListener) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri: http::Uri = format!("http://{}", listener.local_addr().unwrap())
            .parse()
            .unwrap();
        let client = Client::try_from(kube::Config::new(uri)).unwrap();
        let source = KubernetesNamespaceSource::with_client("kubernetes", client, "contoso.com")
            .with_call_timeout(call_timeout);
        (source, listener)
    }

    #[tokio::test]
    async fn test_resolve_bounded_by_call_timeout() {
        let (source, _listener) = hung_server_source(Duration::from_millis(200)).await;

        let start = std::time::Instant::now();
        let result = source.resolve("api.payments.svc.cluster.local").await;

        assert!(matches!(result, Err(SourceError::Timeout(_))));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_health_check_bounded_by_call_timeout() {
        let (source, _listener) = hung_server_source(Duration::from_millis(200)).await;

        let health = source.health_check().await.unwrap();
        assert!(matches!(health, SourceHealth::Unhealthy(_)));
    }
}
