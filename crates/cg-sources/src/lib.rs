//! # cg-sources
//!
//! Inventory source adapters for CertGate.
//!
//! Each adapter answers one capability, `resolve(hostname) -> AssetRecord |
//! absent`, over its own transport: ServiceNow CMDB, a Postgres lookup
//! function, Azure Resource Graph, Kubernetes namespace metadata, and a
//! flat-file CSV export. Adapters never propagate transport errors to the
//! cascade; an unreachable or unconfigured source behaves as "absent".

pub mod cache;
pub mod cloud;
pub mod cluster;
pub mod cmdb;
pub mod flatfile;
pub mod http;
pub mod mock;
pub mod relational;
pub mod secure_string;
pub mod testing;
pub mod traits;

pub use cache::SnapshotCache;
pub use cloud::AzureResourceGraphSource;
pub use cluster::KubernetesNamespaceSource;
pub use cmdb::ServiceNowCmdbSource;
pub use flatfile::FlatFileSource;
pub use mock::MockSource;
pub use relational::PostgresSource;
pub use secure_string::SecureString;
pub use traits::{
    AuthConfig, InventorySource, SourceConfig, SourceError, SourceHealth, SourceKind, SourceResult,
};
