//! Audit trail for resolution requests.
//!
//! Every resolution records one terminal event (authorized or denied) with
//! the requester as actor. The requester identifier is audit-only metadata
//! and never influences the authorization decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Actor recorded when no requester identifier was supplied.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// An entry in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
    /// Event type.
    pub event_type: AuditEventType,
    /// Actor (requester identifier or system component).
    pub actor: String,
    /// Hostname the event concerns, if any.
    pub hostname: Option<String>,
    /// Description of the event.
    pub description: String,
    /// Additional details.
    pub details: serde_json::Value,
    /// Result/outcome.
    pub result: AuditResult,
}

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Resolver startup/shutdown.
    SystemLifecycle,
    /// A resolution ended in an authorized outcome.
    ResolutionAuthorized,
    /// A resolution ended in a denied outcome.
    ResolutionDenied,
    /// A source could not be reached and was downgraded to absent.
    SourceUnavailable,
    /// A source returned data the resolver could not parse.
    MalformedRecord,
    /// Custom event.
    Custom(String),
}

/// Result of an audited operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Failure(String),
    Denied(String),
}

/// Bounded in-memory audit log.
///
/// Writers fully own entries; readers get clones. Oldest entries are
/// evicted once the capacity is reached.
pub struct AuditLog {
    entries: Arc<RwLock<VecDeque<AuditLogEntry>>>,
    max_entries: usize,
    log_to_tracing: bool,
}

impl AuditLog {
    /// Creates a new audit log.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_entries))),
            max_entries,
            log_to_tracing: true,
        }
    }

    /// Creates an audit log without tracing output (tests).
    pub fn without_tracing(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_entries))),
            max_entries,
            log_to_tracing: false,
        }
    }

    /// Logs an audit entry.
    pub async fn log(&self, entry: AuditLogEntry) {
        if self.log_to_tracing {
            info!(
                event_type = ?entry.event_type,
                actor = %entry.actor,
                hostname = ?entry.hostname,
                result = ?entry.result,
                "audit: {}",
                entry.description
            );
        }

        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Logs a plain event with no hostname context.
    pub async fn log_event(
        &self,
        event_type: AuditEventType,
        actor: &str,
        description: &str,
        result: AuditResult,
    ) {
        self.log(AuditLogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            actor: actor.to_string(),
            hostname: None,
            description: description.to_string(),
            details: serde_json::json!({}),
            result,
        })
        .await;
    }

    /// Logs a resolution-scoped event.
    pub async fn log_resolution_event(
        &self,
        event_type: AuditEventType,
        actor: &str,
        hostname: &str,
        description: &str,
        details: serde_json::Value,
        result: AuditResult,
    ) {
        self.log(AuditLogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            actor: actor.to_string(),
            hostname: Some(hostname.to_string()),
            description: description.to_string(),
            details,
            result,
        })
        .await;
    }

    /// Gets all entries.
    pub async fn get_entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Gets entries for a specific hostname.
    pub async fn get_hostname_entries(&self, hostname: &str) -> Vec<AuditLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.hostname.as_deref() == Some(hostname))
            .cloned()
            .collect()
    }

    /// Gets entries by actor.
    pub async fn get_entries_by_actor(&self, actor: &str) -> Vec<AuditLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.actor == actor)
            .cloned()
            .collect()
    }

    /// Exports entries as JSON.
    pub async fn export_json(&self) -> String {
        let entries = self.get_entries().await;
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Gets the number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Checks if the audit log is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(10000)
    }
}
