//! End-to-end cascade tests over real and mock adapters.

use cg_observability::{AuditEventType, AuditLog};
use cg_resolver::ResolutionCascade;
use cg_sources::{FlatFileSource, MockSource, SourceError, SourceKind};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const EXPORT_CSV: &str = "\
hostname,owner_email,owner_team,environment,cost_center,status
webapp01.contoso.com,alice@contoso.com,team-web-apps,production,12345,active
legacy01.contoso.com,bob@contoso.com,team-legacy,production,12346,decommissioned
";

fn export_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(EXPORT_CSV.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn record(hostname: &str, team: &str) -> cg_core::AssetRecord {
    cg_core::AssetRecord::active(hostname, "owner@contoso.com", team, "staging", "CC-9")
}

#[tokio::test]
async fn flat_file_backstops_failing_upstream_sources() {
    let file = export_file();
    let cascade = ResolutionCascade::builder()
        .with_source(Arc::new(
            MockSource::new("cmdb", SourceKind::Cmdb)
                .with_failure(SourceError::ConnectionFailed("refused".to_string())),
        ))
        .with_source(Arc::new(
            MockSource::new("db", SourceKind::Relational)
                .with_failure(SourceError::Timeout("deadline".to_string())),
        ))
        .with_source(Arc::new(FlatFileSource::new(
            "csv",
            file.path(),
            "contoso.com",
        )))
        .build();

    let outcome = cascade.resolve("webapp01.contoso.com", None).await;
    assert_eq!(
        outcome.output_line(),
        "AUTHORIZED|team-web-apps|production|12345"
    );
    assert_eq!(outcome.exit_code(), 0);
}

#[tokio::test]
async fn decommissioned_export_row_denies() {
    let file = export_file();
    let cascade = ResolutionCascade::builder()
        .with_source(Arc::new(FlatFileSource::new(
            "csv",
            file.path(),
            "contoso.com",
        )))
        .build();

    let outcome = cascade.resolve("legacy01.contoso.com", None).await;
    assert_eq!(
        outcome.output_line(),
        "DENIED|Device 'legacy01.contoso.com' not found in any inventory source"
    );
    assert_eq!(outcome.exit_code(), 1);
}

#[tokio::test]
async fn upstream_hit_shadows_flat_file() {
    let file = export_file();
    let cascade = ResolutionCascade::builder()
        .with_source(Arc::new(FlatFileSource::new(
            "csv",
            file.path(),
            "contoso.com",
        )))
        .with_source(Arc::new(
            MockSource::new("cmdb", SourceKind::Cmdb)
                .with_record(record("webapp01.contoso.com", "team-cmdb-wins")),
        ))
        .build();

    let outcome = cascade.resolve("webapp01.contoso.com", None).await;
    assert_eq!(outcome.output_line(), "AUTHORIZED|team-cmdb-wins|staging|CC-9");
}

#[tokio::test]
async fn gated_sources_skip_out_of_scope_hostnames() {
    let cloud = Arc::new(
        MockSource::new("azure", SourceKind::CloudInventory)
            .with_applicability_suffix(".contoso.com"),
    );
    let cluster = Arc::new(
        MockSource::new("k8s", SourceKind::ClusterMetadata)
            .with_applicability_suffix(".svc.cluster.local"),
    );
    let cascade = ResolutionCascade::builder()
        .with_source(cloud.clone())
        .with_source(cluster.clone())
        .build();

    cascade.resolve("printer.example.org", None).await;
    assert_eq!(cloud.resolve_calls(), 0);
    assert_eq!(cluster.resolve_calls(), 0);

    cascade.resolve("api.payments.svc.cluster.local", None).await;
    assert_eq!(cloud.resolve_calls(), 0);
    assert_eq!(cluster.resolve_calls(), 1);
}

#[tokio::test]
async fn full_audit_trail_for_a_denied_resolution() {
    let audit_log = Arc::new(AuditLog::without_tracing(100));
    let cascade = ResolutionCascade::builder()
        .with_source(Arc::new(
            MockSource::new("cmdb", SourceKind::Cmdb)
                .with_failure(SourceError::AuthenticationFailed("401".to_string())),
        ))
        .with_source(Arc::new(MockSource::new("csv", SourceKind::FlatFile)))
        .with_audit_log(audit_log.clone())
        .build();

    let outcome = cascade
        .resolve("ghost.contoso.com", Some("requester@contoso.com"))
        .await;
    assert!(!outcome.is_authorized());

    let entries = audit_log.get_hostname_entries("ghost.contoso.com").await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].event_type, AuditEventType::SourceUnavailable);
    assert_eq!(entries[1].event_type, AuditEventType::ResolutionDenied);
    assert!(entries.iter().all(|e| e.actor == "requester@contoso.com"));
}

#[tokio::test]
async fn case_sensitive_resolution() {
    let file = export_file();
    let cascade = ResolutionCascade::builder()
        .with_source(Arc::new(FlatFileSource::new(
            "csv",
            file.path(),
            "contoso.com",
        )))
        .build();

    let outcome = cascade.resolve("WebApp01.contoso.com", None).await;
    assert!(!outcome.is_authorized());
}
