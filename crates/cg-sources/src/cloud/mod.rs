//! Cloud inventory source adapters.

mod azure;

pub use azure::AzureResourceGraphSource;
