//! Terminal resolution outcome.
//!
//! The cascade always yields exactly one of `Authorized` or `Denied`;
//! intermediate per-source failures are logged but never surfaced here.

use crate::asset::AssetRecord;
use serde::{Deserialize, Serialize};

/// The externally observable result of one resolution request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// The hostname is a known, active, managed asset.
    Authorized {
        hostname: String,
        owner_email: String,
        owner_team: String,
        environment: String,
        cost_center: String,
        /// Name of the source that produced the winning record.
        source: String,
    },
    /// No authoritative active record was found.
    Denied { hostname: String, reason: String },
}

impl ResolutionOutcome {
    /// Builds the authorized outcome from the winning source's record.
    pub fn authorized(record: AssetRecord, source: impl Into<String>) -> Self {
        ResolutionOutcome::Authorized {
            hostname: record.hostname,
            owner_email: record.owner_email,
            owner_team: record.owner_team,
            environment: record.environment,
            cost_center: record.cost_center,
            source: source.into(),
        }
    }

    /// Builds the denial used when the cascade is exhausted.
    pub fn not_found(hostname: &str) -> Self {
        ResolutionOutcome::Denied {
            hostname: hostname.to_string(),
            reason: format!("Device '{}' not found in any inventory source", hostname),
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, ResolutionOutcome::Authorized { .. })
    }

    /// The pipe-delimited line emitted on stdout:
    /// `AUTHORIZED|<team>|<environment>|<costCenter>` or `DENIED|<reason>`.
    pub fn output_line(&self) -> String {
        match self {
            ResolutionOutcome::Authorized {
                owner_team,
                environment,
                cost_center,
                ..
            } => format!("AUTHORIZED|{}|{}|{}", owner_team, environment, cost_center),
            ResolutionOutcome::Denied { reason, .. } => format!("DENIED|{}", reason),
        }
    }

    /// Process exit status for the invocation contract: 0 authorized,
    /// 1 denied. Usage errors exit 2 before a resolution is attempted.
    pub fn exit_code(&self) -> i32 {
        if self.is_authorized() {
            0
        } else {
            1
        }
    }
}
