//! HTTP utilities shared by the CMDB and cloud-inventory adapters.
//!
//! A thin reqwest wrapper with per-call timeouts, bounded retries with
//! exponential backoff, and the auth schemes the sources need (basic,
//! API key, bearer, OAuth2 client credentials).

use crate::secure_string::SecureString;
use crate::traits::{AuthConfig, SourceConfig, SourceError, SourceResult};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// HTTP client with retry and auth support.
pub struct HttpClient {
    client: Client,
    config: SourceConfig,
    /// Current OAuth2 token (if using OAuth2 auth).
    oauth_token: Arc<RwLock<Option<OAuthToken>>>,
}

/// OAuth2 token with expiration. The access token is held in a
/// `SecureString` so it is zeroized once replaced.
#[derive(Clone)]
struct OAuthToken {
    access_token: SecureString,
    expires_at: std::time::Instant,
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl HttpClient {
    /// Creates a new HTTP client from source configuration.
    pub fn new(config: SourceConfig) -> SourceResult<Self> {
        // TLS verification cannot be disabled in release builds.
        let verify_tls = if !config.verify_tls {
            #[cfg(debug_assertions)]
            {
                warn!(
                    base_url = %config.base_url,
                    source_name = %config.name,
                    "TLS certificate verification DISABLED in development mode"
                );
                false
            }
            #[cfg(not(debug_assertions))]
            {
                warn!(
                    base_url = %config.base_url,
                    source_name = %config.name,
                    "Attempted to disable TLS verification in production - request IGNORED"
                );
                true
            }
        } else {
            true
        };

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!verify_tls)
            .pool_max_idle_per_host(4);

        let mut headers = reqwest::header::HeaderMap::new();
        for (key, value) in &config.headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::try_from(key.as_str()),
                reqwest::header::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, val);
            }
        }
        builder = builder.default_headers(headers);

        let client = builder
            .build()
            .map_err(|e| SourceError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            oauth_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Builds a URL from a path.
    pub fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Executes a GET request with retry logic.
    pub async fn get(&self, path: &str) -> SourceResult<Response> {
        let url = self.build_url(path);
        let request = self.client.get(&url);
        self.execute_with_retry(request).await
    }

    /// Executes a GET request and deserializes the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SourceResult<T> {
        let response = self.get(path).await?;
        self.parse_json_response(response).await
    }

    /// Executes a POST request with retry logic.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> SourceResult<Response> {
        let url = self.build_url(path);
        let request = self.client.post(&url).json(body);
        self.execute_with_retry(request).await
    }

    /// Executes a POST request and deserializes the JSON response.
    pub async fn post_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> SourceResult<R> {
        let response = self.post(path, body).await?;
        self.parse_json_response(response).await
    }

    /// Parses a JSON response.
    async fn parse_json_response<T: DeserializeOwned>(&self, response: Response) -> SourceResult<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| {
            SourceError::InvalidResponse(format!(
                "Failed to parse response (status {}): {} - Body: {}",
                status,
                e,
                text.chars().take(500).collect::<String>()
            ))
        })
    }

    /// Executes a request with authentication, retries, and error handling.
    async fn execute_with_retry(
        &self,
        mut request: reqwest::RequestBuilder,
    ) -> SourceResult<Response> {
        request = self.add_auth(request).await?;

        let mut last_error = None;
        let mut delay = Duration::from_millis(100);

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!("Retry attempt {} after {:?}", attempt, delay);
                sleep(delay).await;
                delay = std::cmp::min(delay * 2 + rand_jitter(), Duration::from_secs(10));
            }

            let request_clone = request
                .try_clone()
                .ok_or_else(|| SourceError::Internal("Failed to clone request".to_string()))?;

            match request_clone.send().await {
                Ok(response) => {
                    let status = response.status();

                    // Server errors are retried; client errors are not.
                    if status.is_server_error() && attempt < self.config.max_retries {
                        warn!("Server error {}, retrying...", status);
                        last_error = Some(SourceError::RequestFailed(format!(
                            "Server error: {}",
                            status
                        )));
                        continue;
                    }

                    if status.is_client_error() {
                        return match status {
                            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(
                                SourceError::AuthenticationFailed(format!("HTTP {}", status)),
                            ),
                            _ => Err(SourceError::RequestFailed(format!(
                                "Client error: {}",
                                status
                            ))),
                        };
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(SourceError::Timeout(e.to_string()));
                    } else if e.is_connect() {
                        last_error = Some(SourceError::ConnectionFailed(e.to_string()));
                    } else {
                        last_error = Some(SourceError::RequestFailed(e.to_string()));
                    }

                    if attempt >= self.config.max_retries {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::Internal("Unknown error".to_string())))
    }

    /// Adds authentication to a request.
    async fn add_auth(
        &self,
        request: reqwest::RequestBuilder,
    ) -> SourceResult<reqwest::RequestBuilder> {
        match &self.config.auth {
            AuthConfig::None => Ok(request),

            AuthConfig::ApiKey { key, header_name } => {
                Ok(request.header(header_name, key.expose_secret()))
            }

            AuthConfig::BearerToken { token } => {
                Ok(request.header("Authorization", format!("Bearer {}", token.expose_secret())))
            }

            AuthConfig::Basic { username, password } => {
                Ok(request.basic_auth(username, Some(password.expose_secret())))
            }

            AuthConfig::OAuth2 {
                client_id,
                client_secret,
                token_url,
                scopes,
            } => {
                let token = self
                    .get_oauth_token(client_id, client_secret, token_url, scopes)
                    .await?;
                Ok(request.header("Authorization", format!("Bearer {}", token.expose_secret())))
            }
        }
    }

    /// Gets or refreshes an OAuth2 token.
    async fn get_oauth_token(
        &self,
        client_id: &str,
        client_secret: &SecureString,
        token_url: &str,
        scopes: &[String],
    ) -> SourceResult<SecureString> {
        {
            let token = self.oauth_token.read().await;
            if let Some(t) = &*token {
                if t.expires_at > std::time::Instant::now() + Duration::from_secs(60) {
                    return Ok(t.access_token.clone());
                }
            }
        }

        info!("Fetching new OAuth2 token");

        let scope = scopes.join(" ");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .client
            .post(token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| SourceError::AuthenticationFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::AuthenticationFailed(format!(
                "OAuth2 token request failed: {}",
                response.status()
            )));
        }

        #[derive(serde::Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        let secure_access_token = SecureString::new(token_response.access_token);

        {
            let mut token = self.oauth_token.write().await;
            *token = Some(OAuthToken {
                access_token: secure_access_token.clone(),
                expires_at: std::time::Instant::now()
                    + Duration::from_secs(token_response.expires_in),
            });
        }

        Ok(secure_access_token)
    }
}

/// Small pseudo-random jitter for exponential backoff.
fn rand_jitter() -> Duration {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::time::Instant::now().hash(&mut hasher);
    Duration::from_millis(hasher.finish() % 100)
}
