//! # cg-observability
//!
//! Structured logging and the resolution audit trail for CertGate.

pub mod audit;
pub mod logging;

pub use audit::{AuditEventType, AuditLog, AuditLogEntry, AuditResult, ANONYMOUS_ACTOR};
pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
