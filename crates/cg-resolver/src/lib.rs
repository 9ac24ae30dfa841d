//! # cg-resolver
//!
//! The resolution cascade: an ordered walk over the configured inventory
//! sources that turns a hostname into exactly one authorization outcome.
//!
//! Ordering is fixed (CMDB, relational, cloud inventory, cluster metadata,
//! flat file) and the first source with an active record wins. Sources that
//! fail, answer inactive, or know nothing are passed over; only exhaustion
//! of the whole cascade denies.

pub mod engine;

pub use engine::{CascadeBuilder, ResolutionCascade, SourceStatus};
