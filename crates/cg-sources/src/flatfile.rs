//! Flat-file (CSV) inventory source adapter.
//!
//! The last resort of the cascade: a periodically exported CSV of asset
//! records. The whole file is ingested into a [`SnapshotCache`] and served
//! from memory for an hour before the next lookup re-reads it. A missing
//! file is not an error; the source simply knows nothing.

use crate::cache::SnapshotCache;
use crate::traits::{
    InventorySource, SourceError, SourceHealth, SourceKind, SourceResult,
};
use async_trait::async_trait;
use cg_core::{unknown_owner_email, AssetRecord, AssetStatus, UNKNOWN};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error};

/// Default snapshot freshness window.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(3600);

/// CSV export adapter.
pub struct FlatFileSource {
    name: String,
    csv_path: PathBuf,
    cache: SnapshotCache,
    owner_domain: String,
}

/// One row of the export. Every column except `hostname` is optional;
/// absent ownership columns fall back to the unknown sentinels.
#[derive(Debug, Deserialize)]
struct CsvRow {
    hostname: String,
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

impl FlatFileSource {
    pub fn new(
        name: impl Into<String>,
        csv_path: impl Into<PathBuf>,
        owner_domain: impl Into<String>,
    ) -> Self {
        Self::with_freshness(name, csv_path, owner_domain, DEFAULT_FRESHNESS)
    }

    pub fn with_freshness(
        name: impl Into<String>,
        csv_path: impl Into<PathBuf>,
        owner_domain: impl Into<String>,
        freshness: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            csv_path: csv_path.into(),
            cache: SnapshotCache::new(freshness),
            owner_domain: owner_domain.into(),
        }
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Reads the export and keeps only active rows. Malformed rows are
    /// skipped with a warning rather than poisoning the whole snapshot.
    fn load_snapshot(path: &Path, owner_domain: &str) -> SourceResult<HashMap<String, AssetRecord>> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| SourceError::ConnectionFailed(format!("{}: {}", path.display(), e)))?;

        let mut records = HashMap::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "skipping malformed row");
                    continue;
                }
            };

            let active = row
                .status
                .as_deref()
                .map(|s| AssetStatus::parse(s).is_active())
                .unwrap_or(false);
            if !active {
                continue;
            }

            let record = AssetRecord::active(
                row.hostname.clone(),
                row.owner_email
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| unknown_owner_email(owner_domain)),
                row.owner_team
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                row.environment
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                row.cost_center.unwrap_or_default(),
            );
            records.insert(row.hostname, record);
        }

        Ok(records)
    }
}

#[async_trait]
impl InventorySource for FlatFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::FlatFile
    }

    async fn resolve(&self, hostname: &str) -> SourceResult<Option<AssetRecord>> {
        if !self.csv_path.exists() {
            debug!(path = %self.csv_path.display(), "export file missing");
            return Ok(None);
        }

        let path = self.csv_path.clone();
        let owner_domain = self.owner_domain.clone();
        self.cache
            .lookup(hostname, || async move {
                // File IO stays off the async worker threads.
                match tokio::task::spawn_blocking(move || {
                    Self::load_snapshot(&path, &owner_domain)
                })
                .await
                {
                    Ok(result) => result,
                    Err(e) => Err(SourceError::Internal(e.to_string())),
                }
            })
            .await
    }

    async fn health_check(&self) -> SourceResult<SourceHealth> {
        if self.csv_path.exists() {
            Ok(SourceHealth::Healthy)
        } else {
            Ok(SourceHealth::Degraded(format!(
                "export file missing: {}",
                self.csv_path.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_CSV: &str = "\
hostname,owner_email,owner_team,environment,cost_center,status
webapp01.contoso.com,alice@contoso.com,team-web-apps,production,12345,active
db01.contoso.com,bob@contoso.com,team-data,production,12346,decommissioned
cache01.contoso.com,,,staging,,active
";

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_resolves_active_row() {
        let file = write_csv(SAMPLE_CSV);
        let source = FlatFileSource::new("csv", file.path(), "contoso.com");

        let record = source.resolve("webapp01.contoso.com").await.unwrap().unwrap();
        assert_eq!(record.owner_team, "team-web-apps");
        assert_eq!(record.environment, "production");
        assert_eq!(record.cost_center, "12345");
    }

    #[tokio::test]
    async fn test_inactive_row_is_absent() {
        let file = write_csv(SAMPLE_CSV);
        let source = FlatFileSource::new("csv", file.path(), "contoso.com");
        assert!(source.resolve("db01.contoso.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_hostname_is_absent() {
        let file = write_csv(SAMPLE_CSV);
        let source = FlatFileSource::new("csv", file.path(), "contoso.com");
        assert!(source.resolve("ghost.contoso.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_columns_fall_back_to_sentinels() {
        let file = write_csv(SAMPLE_CSV);
        let source = FlatFileSource::new("csv", file.path(), "contoso.com");

        let record = source.resolve("cache01.contoso.com").await.unwrap().unwrap();
        assert_eq!(record.owner_email, "unknown@contoso.com");
        assert_eq!(record.owner_team, "unknown");
        assert_eq!(record.environment, "staging");
        assert_eq!(record.cost_center, "");
    }

    #[tokio::test]
    async fn test_missing_file_is_absent_not_error() {
        let source = FlatFileSource::new("csv", "/nonexistent/export.csv", "contoso.com");
        assert!(source.resolve("webapp01.contoso.com").await.unwrap().is_none());
        assert_eq!(
            source.health_check().await.unwrap(),
            SourceHealth::Degraded("export file missing: /nonexistent/export.csv".to_string())
        );
    }

    #[tokio::test]
    async fn test_case_sensitive_lookup() {
        let file = write_csv(SAMPLE_CSV);
        let source = FlatFileSource::new("csv", file.path(), "contoso.com");
        assert!(source.resolve("WEBAPP01.contoso.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_served_after_file_changes() {
        let file = write_csv(SAMPLE_CSV);
        let source = FlatFileSource::new("csv", file.path(), "contoso.com");

        assert!(source.resolve("webapp01.contoso.com").await.unwrap().is_some());

        // Rewrite the file; the fresh snapshot still answers.
        std::fs::write(file.path(), "hostname,status\nother.contoso.com,active\n").unwrap();
        assert!(source.resolve("webapp01.contoso.com").await.unwrap().is_some());
    }
}
