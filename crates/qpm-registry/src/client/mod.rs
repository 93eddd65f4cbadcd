//! HTTP client implementation with connection pooling and retry logic

use std::time::Duration;

use reqwest::{header, Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use qpm_core::error::QpmError;
use qpm_core::types::{PackageName, Version};
use qpm_core::utils::IntegrityHasher;

use crate::api::{
    DeleteResponse, DownloadSummary, ErrorResponse, PackageListResponse, PackageMetadata,
    UploadResponse, VersionIndex,
};
use crate::RegistryResult;

/// Timeout for metadata requests
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for archive uploads and downloads
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// HTTP client for the qpm registry
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Registry base URL, no trailing slash
    base_url: String,
    /// Bearer token for publish and delete
    token: Option<String>,
}

impl RegistryClient {
    /// Create a client for the registry at `base_url`
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        Self::with_config(base_url.into(), None, RetryConfig::default())
    }

    /// Create a client that authenticates mutating requests with `token`
    pub fn with_token(base_url: impl Into<String>, token: Option<String>) -> RegistryResult<Self> {
        Self::with_config(base_url.into(), token, RetryConfig::default())
    }

    /// Create a registry client with custom configuration
    pub fn with_config(
        base_url: String,
        token: Option<String>,
        retry_config: RetryConfig,
    ) -> RegistryResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url).map_err(|e| QpmError::ConfigValidation {
            field: "registryUrl".to_string(),
            reason: format!("'{}' is not a valid URL: {}", base_url, e),
        })?;

        let client = ClientBuilder::new()
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .user_agent(concat!("qpm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QpmError::network("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            retry_config,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn package_url(&self, name: &PackageName) -> String {
        format!("{}/packages/{}/{}", self.base_url, name.scope(), name.name())
    }

    fn version_url(&self, name: &PackageName, version: &Version) -> String {
        format!("{}/{}", self.package_url(name), version)
    }

    fn bearer(&self) -> RegistryResult<&str> {
        self.token.as_deref().ok_or_else(|| QpmError::Authentication {
            message: "this operation needs a registry token".to_string(),
        })
    }

    /// Execute a request with exponential backoff for transient failures
    async fn with_retry<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) if attempt < self.retry_config.max_retries && error.is_recoverable() => {
                    attempt += 1;
                    warn!(attempt, error = %error, "registry request failed, retrying");
                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry_config.multiplier) as u64,
                        ),
                        self.retry_config.max_delay,
                    );
                },
                Err(error) => return Err(error),
            }
        }
    }

    /// Send a request and turn non-success statuses into errors
    async fn send(&self, request: RequestBuilder, subject: &str) -> RegistryResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| QpmError::network(format!("Request for {} failed", subject), e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(QpmError::PackageNotFound {
                name: subject.to_string(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(error) => QpmError::Registry {
                status: status.as_u16(),
                code: Some(error.error),
                message: error.message,
            },
            Err(_) => QpmError::Registry {
                status: status.as_u16(),
                code: None,
                message: if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected response")
                        .to_string()
                } else {
                    body.trim().to_string()
                },
            },
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, subject: &str) -> RegistryResult<T> {
        self.with_retry(move || async move {
            let response = self
                .send(self.client.get(url).timeout(METADATA_TIMEOUT), subject)
                .await?;
            parse_json(response).await
        })
        .await
    }

    /// Fetch the version index of a package
    pub async fn fetch_version_index(&self, name: &PackageName) -> RegistryResult<VersionIndex> {
        debug!(package = %name, "fetching version index");
        self.get_json(&self.package_url(name), &name.to_string())
            .await
    }

    /// Fetch metadata for one version
    pub async fn fetch_package_metadata(
        &self,
        name: &PackageName,
        version: &Version,
    ) -> RegistryResult<PackageMetadata> {
        let url = format!("{}/metadata", self.version_url(name, version));
        self.get_json(&url, &format!("{}@{}", name, version)).await
    }

    /// List all packages in the registry
    pub async fn list_packages(&self) -> RegistryResult<PackageListResponse> {
        self.get_json(&format!("{}/packages", self.base_url), "packages")
            .await
    }

    /// Stream a package archive into `writer`, hashing it on the way
    pub async fn download_package<W>(
        &self,
        name: &PackageName,
        version: &Version,
        writer: &mut W,
    ) -> RegistryResult<DownloadSummary>
    where
        W: AsyncWrite + Unpin,
    {
        let url = self.version_url(name, version);
        let subject = format!("{}@{}", name, version);
        let (url_ref, subject_ref) = (url.as_str(), subject.as_str());

        // Only the request is retried; a body that has started streaming is not
        let mut response = self
            .with_retry(move || {
                self.send(self.client.get(url_ref).timeout(TRANSFER_TIMEOUT), subject_ref)
            })
            .await?;

        let mut hasher = IntegrityHasher::new();
        let mut bytes = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| QpmError::network(format!("Download of {} failed", subject), e))?
        {
            hasher.update(&chunk);
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| QpmError::io(format!("Failed to write {}", subject), e))?;
            bytes += chunk.len() as u64;
        }
        writer
            .flush()
            .await
            .map_err(|e| QpmError::io(format!("Failed to write {}", subject), e))?;

        debug!(package = %subject, bytes, "downloaded package");
        Ok(DownloadSummary {
            bytes,
            integrity: hasher.finish(),
        })
    }

    /// Upload a package archive
    pub async fn upload_package(
        &self,
        name: &PackageName,
        version: &Version,
        archive: Vec<u8>,
    ) -> RegistryResult<UploadResponse> {
        let token = self.bearer()?;
        let request = self
            .client
            .post(self.version_url(name, version))
            .timeout(TRANSFER_TIMEOUT)
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/gzip")
            .body(archive);

        // Uploads are not idempotent and are never retried
        let response = self.send(request, &format!("{}@{}", name, version)).await?;
        parse_json(response).await
    }

    /// Delete a published version
    pub async fn delete_package_version(
        &self,
        name: &PackageName,
        version: &Version,
    ) -> RegistryResult<DeleteResponse> {
        let token = self.bearer()?;
        let request = self
            .client
            .delete(self.version_url(name, version))
            .timeout(METADATA_TIMEOUT)
            .bearer_auth(token);

        let response = self.send(request, &format!("{}@{}", name, version)).await?;
        parse_json(response).await
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> RegistryResult<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| QpmError::network("Failed to read registry response", e))?;
    serde_json::from_slice(&body).map_err(|e| QpmError::JsonParse {
        message: format!("unexpected registry response: {}", e),
    })
}
