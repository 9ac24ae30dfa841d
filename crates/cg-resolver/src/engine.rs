//! The resolution cascade.

use cg_core::ResolutionOutcome;
use cg_observability::{AuditEventType, AuditLog, AuditResult, ANONYMOUS_ACTOR};
use cg_sources::{InventorySource, SourceError, SourceHealth, SourceKind};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Ordered cascade over the configured inventory sources.
///
/// The cascade holds sources in strict preference order and short-circuits
/// on the first active record. Source failures are contained here: an
/// adapter error is logged, audited, and treated exactly like "absent".
pub struct ResolutionCascade {
    sources: Vec<Arc<dyn InventorySource>>,
    audit_log: Arc<AuditLog>,
}

/// Health of one source as reported by `check_sources`.
#[derive(Debug, Clone)]
pub struct SourceStatus {
    pub name: String,
    pub kind: SourceKind,
    pub health: SourceHealth,
}

/// Builder for [`ResolutionCascade`].
///
/// Sources may be registered in any order; `build` sorts them into the
/// fixed cascade order. Unconfigured sources are simply never registered,
/// which makes them behave as absent without any runtime branching.
#[derive(Default)]
pub struct CascadeBuilder {
    sources: Vec<Arc<dyn InventorySource>>,
    audit_log: Option<Arc<AuditLog>>,
}

impl CascadeBuilder {
    pub fn with_source(mut self, source: Arc<dyn InventorySource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_audit_log(mut self, audit_log: Arc<AuditLog>) -> Self {
        self.audit_log = Some(audit_log);
        self
    }

    pub fn build(mut self) -> ResolutionCascade {
        // Stable sort: registration order breaks ties within a kind.
        self.sources.sort_by_key(|s| s.kind());
        ResolutionCascade {
            sources: self.sources,
            audit_log: self.audit_log.unwrap_or_else(|| Arc::new(AuditLog::default())),
        }
    }
}

impl ResolutionCascade {
    pub fn builder() -> CascadeBuilder {
        CascadeBuilder::default()
    }

    /// The registered sources in cascade order.
    pub fn sources(&self) -> &[Arc<dyn InventorySource>] {
        &self.sources
    }

    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit_log
    }

    /// Resolves a hostname to its terminal outcome.
    ///
    /// `requester` is recorded in the audit trail as the acting identity
    /// but has no effect on the decision.
    #[instrument(skip(self, requester), fields(requester = requester.unwrap_or(ANONYMOUS_ACTOR)))]
    pub async fn resolve(&self, hostname: &str, requester: Option<&str>) -> ResolutionOutcome {
        let actor = requester.unwrap_or(ANONYMOUS_ACTOR);

        for source in &self.sources {
            if !source.applies_to(hostname) {
                debug!(source = %source.name(), "source not applicable, skipping");
                continue;
            }

            match source.resolve(hostname).await {
                Ok(Some(record)) if record.is_active() => {
                    info!(
                        source = %source.name(),
                        owner_team = %record.owner_team,
                        environment = %record.environment,
                        "hostname authorized"
                    );
                    self.audit_log
                        .log_resolution_event(
                            AuditEventType::ResolutionAuthorized,
                            actor,
                            hostname,
                            &format!("resolved by {}", source.name()),
                            json!({
                                "source": source.kind().to_string(),
                                "owner_team": record.owner_team,
                                "environment": record.environment,
                            }),
                            AuditResult::Success,
                        )
                        .await;
                    return ResolutionOutcome::authorized(record, source.kind().to_string());
                }
                Ok(Some(_)) => {
                    // Adapters filter inactive records themselves; treat a
                    // stray one as absent anyway.
                    debug!(source = %source.name(), "record present but not active");
                }
                Ok(None) => {
                    debug!(source = %source.name(), "no record");
                }
                Err(e @ SourceError::InvalidResponse(_)) => {
                    error!(source = %source.name(), error = %e, "source returned malformed data, continuing cascade");
                    self.audit_log
                        .log_resolution_event(
                            AuditEventType::MalformedRecord,
                            actor,
                            hostname,
                            &format!("{} returned malformed data", source.name()),
                            json!({ "source": source.kind().to_string(), "error": e.to_string() }),
                            AuditResult::Failure(e.to_string()),
                        )
                        .await;
                }
                Err(e) => {
                    warn!(source = %source.name(), error = %e, "source failed, continuing cascade");
                    self.audit_log
                        .log_resolution_event(
                            AuditEventType::SourceUnavailable,
                            actor,
                            hostname,
                            &format!("{} unavailable", source.name()),
                            json!({ "source": source.kind().to_string(), "error": e.to_string() }),
                            AuditResult::Failure(e.to_string()),
                        )
                        .await;
                }
            }
        }

        let outcome = ResolutionOutcome::not_found(hostname);
        info!("hostname denied: no active record in any source");
        self.audit_log
            .log_resolution_event(
                AuditEventType::ResolutionDenied,
                actor,
                hostname,
                "exhausted all sources",
                json!({ "sources_checked": self.sources.len() }),
                AuditResult::Denied("not found in any inventory source".to_string()),
            )
            .await;
        outcome
    }

    /// Health-checks every registered source, in cascade order.
    pub async fn check_sources(&self) -> Vec<SourceStatus> {
        let mut statuses = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let health = match source.health_check().await {
                Ok(health) => health,
                Err(e) => SourceHealth::Unhealthy(e.to_string()),
            };
            statuses.push(SourceStatus {
                name: source.name().to_string(),
                kind: source.kind(),
                health,
            });
        }
        statuses
    }
}
