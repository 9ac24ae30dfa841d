//! Configurable mock source for cascade and CLI tests.

use crate::traits::{
    InventorySource, SourceError, SourceHealth, SourceKind, SourceResult,
};
use async_trait::async_trait;
use cg_core::AssetRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock inventory source with scripted records, an optional failure, and
/// an optional applicability suffix. Counts resolve calls so tests can
/// assert short-circuiting and gating.
pub struct MockSource {
    name: String,
    kind: SourceKind,
    records: HashMap<String, AssetRecord>,
    fail_with: Option<SourceError>,
    applies_suffix: Option<String>,
    resolve_calls: AtomicUsize,
}

impl MockSource {
    pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            records: HashMap::new(),
            fail_with: None,
            applies_suffix: None,
            resolve_calls: AtomicUsize::new(0),
        }
    }

    /// Adds a record the mock will return for its hostname.
    pub fn with_record(mut self, record: AssetRecord) -> Self {
        self.records.insert(record.hostname.clone(), record);
        self
    }

    /// Makes every resolve call fail with the given error.
    pub fn with_failure(mut self, error: SourceError) -> Self {
        self.fail_with = Some(error);
        self
    }

    /// Restricts applicability to hostnames ending with `suffix`.
    pub fn with_applicability_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.applies_suffix = Some(suffix.into());
        self
    }

    /// Number of resolve calls made so far.
    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventorySource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn applies_to(&self, hostname: &str) -> bool {
        match &self.applies_suffix {
            Some(suffix) => hostname.ends_with(suffix.as_str()),
            None => true,
        }
    }

    async fn resolve(&self, hostname: &str) -> SourceResult<Option<AssetRecord>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        Ok(self.records.get(hostname).cloned())
    }

    async fn health_check(&self) -> SourceResult<SourceHealth> {
        match &self.fail_with {
            Some(error) => Ok(SourceHealth::Unhealthy(error.to_string())),
            None => Ok(SourceHealth::Healthy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AssetRecord {
        AssetRecord::active(
            "webapp01.contoso.com",
            "alice@contoso.com",
            "team-web-apps",
            "production",
            "12345",
        )
    }

    #[tokio::test]
    async fn test_scripted_record() {
        let source = MockSource::new("mock-cmdb", SourceKind::Cmdb).with_record(sample_record());

        let hit = source.resolve("webapp01.contoso.com").await.unwrap();
        assert!(hit.is_some());
        let miss = source.resolve("other.contoso.com").await.unwrap();
        assert!(miss.is_none());
        assert_eq!(source.resolve_calls(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let source = MockSource::new("mock-db", SourceKind::Relational)
            .with_failure(SourceError::Timeout("deadline exceeded".to_string()));

        assert!(source.resolve("webapp01.contoso.com").await.is_err());
        assert!(matches!(
            source.health_check().await.unwrap(),
            SourceHealth::Unhealthy(_)
        ));
    }

    #[test]
    fn test_applicability_suffix() {
        let source = MockSource::new("mock-k8s", SourceKind::ClusterMetadata)
            .with_applicability_suffix(".svc.cluster.local");
        assert!(source.applies_to("api.payments.svc.cluster.local"));
        assert!(!source.applies_to("webapp01.contoso.com"));
    }
}
