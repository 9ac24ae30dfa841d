//! Builds the resolution cascade from application configuration.
//!
//! Only configured sources are registered; everything else is left out of
//! the cascade entirely, which is how an unconfigured source comes to
//! behave as "absent" for every hostname. A source whose adapter cannot
//! even be constructed is skipped with a warning rather than aborting the
//! resolver.

use crate::config::AppConfig;
use cg_observability::AuditLog;
use cg_resolver::{CascadeBuilder, ResolutionCascade};
use cg_sources::{
    AuthConfig, AzureResourceGraphSource, FlatFileSource, KubernetesNamespaceSource,
    PostgresSource, SecureString, ServiceNowCmdbSource, SourceConfig,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const CMDB_SOURCE_NAME: &str = "servicenow";
pub const DATABASE_SOURCE_NAME: &str = "asset-db";
pub const CLOUD_SOURCE_NAME: &str = "azure";
pub const CLUSTER_SOURCE_NAME: &str = "kubernetes";
pub const FLAT_FILE_SOURCE_NAME: &str = "csv-export";

/// Builds the cascade from configuration.
pub async fn build_cascade(config: &AppConfig, audit_log: Arc<AuditLog>) -> ResolutionCascade {
    let mut builder = ResolutionCascade::builder().with_audit_log(audit_log);

    builder = register_cmdb(builder, config);
    builder = register_database(builder, config);
    builder = register_cloud(builder, config);
    builder = register_cluster(builder, config).await;
    builder = register_flat_file(builder, config);

    builder.build()
}

fn register_cmdb(builder: CascadeBuilder, config: &AppConfig) -> CascadeBuilder {
    if !config.cmdb.is_configured() {
        info!(source = CMDB_SOURCE_NAME, "source unconfigured, skipping");
        return builder;
    }

    let source_config = SourceConfig {
        name: CMDB_SOURCE_NAME.to_string(),
        base_url: instance_url(&config.cmdb.instance),
        auth: AuthConfig::Basic {
            username: config.cmdb.username.clone(),
            password: config.cmdb.password.clone(),
        },
        timeout_secs: config.cmdb.timeout_secs,
        max_retries: config.cmdb.max_retries,
        verify_tls: config.cmdb.verify_tls,
        headers: HashMap::new(),
    };

    match ServiceNowCmdbSource::new(source_config, &config.owner_domain) {
        Ok(source) => builder.with_source(Arc::new(source)),
        Err(e) => {
            warn!(source = CMDB_SOURCE_NAME, error = %e, "failed to construct source, skipping");
            builder
        }
    }
}

fn register_database(builder: CascadeBuilder, config: &AppConfig) -> CascadeBuilder {
    if !config.database.is_configured() {
        info!(source = DATABASE_SOURCE_NAME, "source unconfigured, skipping");
        return builder;
    }

    let url = SecureString::from(config.database.url());
    match PostgresSource::new(DATABASE_SOURCE_NAME, &url) {
        Ok(source) => builder.with_source(Arc::new(source)),
        Err(e) => {
            warn!(source = DATABASE_SOURCE_NAME, error = %e, "failed to construct source, skipping");
            builder
        }
    }
}

fn register_cloud(builder: CascadeBuilder, config: &AppConfig) -> CascadeBuilder {
    if !config.cloud.is_configured() {
        info!(source = CLOUD_SOURCE_NAME, "source unconfigured, skipping");
        return builder;
    }

    let source_config = SourceConfig {
        name: CLOUD_SOURCE_NAME.to_string(),
        base_url: config.cloud.management_url.clone(),
        auth: AuthConfig::OAuth2 {
            client_id: config.cloud.client_id.clone(),
            client_secret: config.cloud.client_secret.clone(),
            token_url: config.cloud.token_url(),
            scopes: vec!["https://management.azure.com/.default".to_string()],
        },
        timeout_secs: config.cloud.timeout_secs,
        max_retries: config.cloud.max_retries,
        verify_tls: true,
        headers: HashMap::new(),
    };

    match AzureResourceGraphSource::new(
        source_config,
        &config.cloud.subscription_id,
        &config.cloud.domain_suffix,
        &config.owner_domain,
    ) {
        Ok(source) => builder.with_source(Arc::new(source)),
        Err(e) => {
            warn!(source = CLOUD_SOURCE_NAME, error = %e, "failed to construct source, skipping");
            builder
        }
    }
}

async fn register_cluster(builder: CascadeBuilder, config: &AppConfig) -> CascadeBuilder {
    if !config.cluster.enabled {
        info!(source = CLUSTER_SOURCE_NAME, "source unconfigured, skipping");
        return builder;
    }

    // No kubeconfig and no in-cluster service account means no cluster
    // source; the cascade proceeds without it.
    match KubernetesNamespaceSource::connect(CLUSTER_SOURCE_NAME, &config.owner_domain).await {
        Ok(source) => builder.with_source(Arc::new(source)),
        Err(e) => {
            warn!(source = CLUSTER_SOURCE_NAME, error = %e, "no cluster access, skipping");
            builder
        }
    }
}

fn register_flat_file(builder: CascadeBuilder, config: &AppConfig) -> CascadeBuilder {
    if !config.flat_file.is_configured() {
        info!(source = FLAT_FILE_SOURCE_NAME, "source unconfigured, skipping");
        return builder;
    }

    let source = FlatFileSource::with_freshness(
        FLAT_FILE_SOURCE_NAME,
        &config.flat_file.csv_path,
        &config.owner_domain,
        Duration::from_secs(config.flat_file.cache_secs),
    );
    builder.with_source(Arc::new(source))
}

fn instance_url(instance: &str) -> String {
    if instance.starts_with("http://") || instance.starts_with("https://") {
        instance.to_string()
    } else {
        format!("https://{}", instance)
    }
}
