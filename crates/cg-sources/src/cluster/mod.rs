//! Cluster metadata source adapters.

mod kubernetes;

pub use kubernetes::KubernetesNamespaceSource;
