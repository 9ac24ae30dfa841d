//! Shared helpers for adapter tests.

use crate::secure_string::SecureString;
use crate::traits::{AuthConfig, SourceConfig};
use std::collections::HashMap;

/// A minimal source configuration for tests.
pub fn test_source_config(name: &str, base_url: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        base_url: base_url.to_string(),
        auth: AuthConfig::None,
        timeout_secs: 5,
        max_retries: 0,
        verify_tls: true,
        headers: HashMap::new(),
    }
}

/// A source configuration with basic auth, as the CMDB adapter uses.
pub fn test_basic_auth_config(name: &str, base_url: &str) -> SourceConfig {
    SourceConfig {
        auth: AuthConfig::Basic {
            username: "svc-certgate".to_string(),
            password: SecureString::from("test-password"),
        },
        ..test_source_config(name, base_url)
    }
}
