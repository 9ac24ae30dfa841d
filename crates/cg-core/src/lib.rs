//! # cg-core
//!
//! Core data model for CertGate, the device authorization resolver.
//!
//! This crate defines the `AssetRecord` value type returned by inventory
//! sources, hostname classification helpers used by the cascade's
//! applicability gates, and the terminal `ResolutionOutcome`.

pub mod asset;
pub mod hostname;
pub mod outcome;

pub use asset::{unknown_owner_email, AssetRecord, AssetStatus, UNKNOWN};
pub use hostname::{cloud_scope_matches, cluster_namespace, CLUSTER_SUFFIX};
pub use outcome::ResolutionOutcome;
