//! CMDB source adapters.

mod servicenow;

pub use servicenow::ServiceNowCmdbSource;
