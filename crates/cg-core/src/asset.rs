//! Asset record model.
//!
//! An `AssetRecord` is the answer one inventory source gives for one
//! hostname. It is an immutable value type: the cascade returns the record
//! from exactly one source and never merges fields across sources.

use serde::{Deserialize, Serialize};

/// Sentinel used when a source has no value for owner team or environment.
pub const UNKNOWN: &str = "unknown";

/// Lifecycle status of a device as reported by a source.
///
/// Only `Active` records are usable for authorization; an `Inactive` record
/// is treated identically to "not found" by the cascade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Active,
    Inactive,
}

impl AssetStatus {
    /// Parses a source-reported status string. Anything that is not
    /// exactly `active` is inactive.
    pub fn parse(s: &str) -> Self {
        if s == "active" {
            AssetStatus::Active
        } else {
            AssetStatus::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == AssetStatus::Active
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetStatus::Active => write!(f, "active"),
            AssetStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// One managed device as known to a single inventory source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRecord {
    /// The lookup key, matched case-sensitively as given.
    pub hostname: String,
    /// Owner email, or the unknown-owner sentinel for the organization.
    pub owner_email: String,
    /// Owning team, `unknown` when the source has none.
    pub owner_team: String,
    /// Deployment environment (production, staging, ...), `unknown` when absent.
    pub environment: String,
    /// Cost center, may be empty.
    pub cost_center: String,
    /// Lifecycle status.
    pub status: AssetStatus,
}

impl AssetRecord {
    /// Creates an active record with every metadata field populated.
    pub fn active(
        hostname: impl Into<String>,
        owner_email: impl Into<String>,
        owner_team: impl Into<String>,
        environment: impl Into<String>,
        cost_center: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            owner_email: owner_email.into(),
            owner_team: owner_team.into(),
            environment: environment.into(),
            cost_center: cost_center.into(),
            status: AssetStatus::Active,
        }
    }

    /// Returns whether this record can authorize a certificate action.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Builds the unknown-owner sentinel address for a domain
/// (e.g. `unknown@contoso.com`).
pub fn unknown_owner_email(domain: &str) -> String {
    format!("unknown@{}", domain.trim_start_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(AssetStatus::parse("active"), AssetStatus::Active);
        assert_eq!(AssetStatus::parse("inactive"), AssetStatus::Inactive);
        assert_eq!(AssetStatus::parse("retired"), AssetStatus::Inactive);
        assert_eq!(AssetStatus::parse(""), AssetStatus::Inactive);
        // Not normalized: status strings are matched exactly.
        assert_eq!(AssetStatus::parse("Active"), AssetStatus::Inactive);
    }

    #[test]
    fn test_active_constructor() {
        let record = AssetRecord::active(
            "webapp01.contoso.com",
            "owner@contoso.com",
            "team-web-apps",
            "production",
            "12345",
        );
        assert!(record.is_active());
        assert_eq!(record.owner_team, "team-web-apps");
        assert_eq!(record.cost_center, "12345");
    }

    #[test]
    fn test_unknown_owner_email() {
        assert_eq!(unknown_owner_email("contoso.com"), "unknown@contoso.com");
        assert_eq!(unknown_owner_email(".contoso.com"), "unknown@contoso.com");
    }

    #[test]
    fn test_record_serialization_round_trip() {
        let record = AssetRecord {
            hostname: "db01".to_string(),
            owner_email: "dba@contoso.com".to_string(),
            owner_team: "team-dba".to_string(),
            environment: "staging".to_string(),
            cost_center: String::new(),
            status: AssetStatus::Inactive,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"inactive\""));
        let back: AssetRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
