//! Hostname classification for the cascade's applicability gates.
//!
//! Hostnames are matched case-sensitively as given; no normalization is
//! performed anywhere in the resolver.

/// Suffix identifying in-cluster service hostnames
/// (`service.namespace.svc.cluster.local`).
pub const CLUSTER_SUFFIX: &str = ".svc.cluster.local";

/// Extracts the namespace segment from a cluster-form hostname.
///
/// Returns `None` unless the hostname has the exact shape
/// `service.namespace.svc.cluster.local` (the third label must be `svc`).
///
/// # Example
///
/// ```
/// use cg_core::hostname::cluster_namespace;
///
/// assert_eq!(cluster_namespace("api.payments.svc.cluster.local"), Some("payments"));
/// assert_eq!(cluster_namespace("api.payments.pod.cluster.local"), None);
/// ```
pub fn cluster_namespace(hostname: &str) -> Option<&str> {
    if !hostname.ends_with(CLUSTER_SUFFIX) {
        return None;
    }
    let parts: Vec<&str> = hostname.split('.').collect();
    if parts.len() < 4 || parts[2] != "svc" {
        return None;
    }
    if parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(parts[1])
}

/// Applicability gate for the cloud-inventory source: the hostname must end
/// with the organization's domain suffix or carry an `internal` marker.
pub fn cloud_scope_matches(hostname: &str, domain_suffix: &str) -> bool {
    let suffix = if domain_suffix.starts_with('.') {
        domain_suffix.to_string()
    } else {
        format!(".{}", domain_suffix)
    };
    hostname.ends_with(&suffix) || hostname.contains("internal")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_namespace_valid() {
        assert_eq!(
            cluster_namespace("web.frontend.svc.cluster.local"),
            Some("frontend")
        );
        assert_eq!(
            cluster_namespace("api.payments.svc.cluster.local"),
            Some("payments")
        );
    }

    #[test]
    fn test_cluster_namespace_wrong_suffix() {
        assert_eq!(cluster_namespace("web.frontend.svc.cluster"), None);
        assert_eq!(cluster_namespace("webapp01.contoso.com"), None);
    }

    #[test]
    fn test_cluster_namespace_wrong_shape() {
        // Third label must be `svc`.
        assert_eq!(cluster_namespace("web.frontend.pod.cluster.local"), None);
        // Too few labels before the suffix.
        assert_eq!(cluster_namespace("svc.cluster.local"), None);
        assert_eq!(cluster_namespace(".frontend.svc.cluster.local"), None);
    }

    #[test]
    fn test_cluster_namespace_extra_service_labels() {
        // Only the canonical four-part form is applicable.
        assert_eq!(cluster_namespace("a.b.c.svc.cluster.local"), None);
    }

    #[test]
    fn test_cloud_scope_domain_suffix() {
        assert!(cloud_scope_matches("webapp01.contoso.com", "contoso.com"));
        assert!(cloud_scope_matches("webapp01.contoso.com", ".contoso.com"));
        assert!(!cloud_scope_matches("webapp01.fabrikam.com", "contoso.com"));
        // The suffix match requires a label boundary.
        assert!(!cloud_scope_matches("evilcontoso.com", "contoso.com"));
    }

    #[test]
    fn test_cloud_scope_internal_marker() {
        assert!(cloud_scope_matches("db01.internal.lan", "contoso.com"));
        assert!(cloud_scope_matches("internal-build-02", "contoso.com"));
        assert!(!cloud_scope_matches("db01.external.lan", "contoso.com"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!cloud_scope_matches("webapp01.CONTOSO.COM", "contoso.com"));
        assert_eq!(cluster_namespace("web.frontend.SVC.cluster.local"), None);
    }
}
