//! HTTP access to the newsdesk admin API.
//!
//! # Architecture
//!
//! - [`AdminClient`]: request/response calls (login, listing, creating and
//!   updating sources)
//! - [`JobSource`]: trait for anything that can start a job and hand back its
//!   output as a stream of byte chunks; the console is generic over it
//! - [`HttpJobSource`]: the real implementation, a `POST` to the scrape
//!   trigger endpoint whose chunked response body is passed through unbuffered
//!
//! Credentials are never stored here; callers pass the bearer token per call.

use crate::config::Endpoints;
use crate::error::{ApiError, ConsoleError};
use crate::models::{ApiMessage, LoginRequest, LoginResponse, Website, WebsiteInput};
use crate::utils::{mask_token, truncate_for_log};
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, Response};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Raw output of a running job, one item per transport chunk.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, ConsoleError>>;

/// Starts a remote job and exposes its output as a chunk stream.
///
/// Errors returned from `start` itself are connection-level (nothing was
/// streamed). Errors yielded by the stream happen mid-flight.
pub trait JobSource: Send + Sync + 'static {
    fn start(
        &self,
        job_id: &str,
        token: &str,
    ) -> impl Future<Output = Result<ChunkStream, ConsoleError>> + Send;
}

/// [`JobSource`] backed by `POST {websites}/{id}/scrape`.
#[derive(Debug, Clone)]
pub struct HttpJobSource {
    client: Client,
    endpoints: Endpoints,
}

impl HttpJobSource {
    pub fn new(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }
}

impl JobSource for HttpJobSource {
    fn start(
        &self,
        job_id: &str,
        token: &str,
    ) -> impl Future<Output = Result<ChunkStream, ConsoleError>> + Send {
        let client = self.client.clone();
        let url = self.endpoints.scrape(job_id);
        let bearer = format!("Bearer {token}");
        let masked = mask_token(token);

        async move {
            let url = url.map_err(ConsoleError::connection)?;
            info!(%url, token = %masked, "Triggering job");

            let t0 = Instant::now();
            let response = client
                .post(url)
                .header(AUTHORIZATION, bearer)
                .send()
                .await
                .map_err(|e| {
                    warn!(error = %e, "Job trigger request failed");
                    ConsoleError::connection(e)
                })?;

            let status = response.status();
            if !status.is_success() {
                warn!(%status, "Job trigger rejected");
                return Err(ConsoleError::rejected(status));
            }
            debug!(
                %status,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Job stream opened"
            );

            let stream = response.bytes_stream().map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(ConsoleError::interrupted)
            });
            Ok(stream.boxed())
        }
    }
}

/// Client for the request/response parts of the admin API.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: Client,
    endpoints: Endpoints,
}

impl AdminClient {
    pub fn new(endpoints: Endpoints) -> Result<Self, ApiError> {
        // No overall timeout: job streams stay open as long as the backend works.
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, endpoints })
    }

    /// A job source sharing this client's connection pool.
    pub fn job_source(&self) -> HttpJobSource {
        HttpJobSource::new(self.client.clone(), self.endpoints.clone())
    }

    /// Exchange email and password for a bearer token.
    ///
    /// # Arguments
    ///
    /// * `email` - Account email
    /// * `password` - Account password; never logged
    ///
    /// # Returns
    ///
    /// The token and user fields on success. A non-2xx answer becomes
    /// [`ApiError::Rejected`] carrying the server's `message`, or
    /// `"Login failed"` when it sent none.
    #[instrument(level = "info", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoints.login()?)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Login failed").await);
        }

        let login: LoginResponse = response.json().await?;
        info!("Login succeeded");
        Ok(login)
    }

    /// Fetch every configured news source.
    #[instrument(level = "info", skip_all)]
    pub async fn list_websites(&self, token: Option<&str>) -> Result<Vec<Website>, ApiError> {
        let mut request = self.client.get(self.endpoints.websites()?);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Listing websites failed");
            return Err(ApiError::Status {
                context: "Failed to fetch websites",
                status,
            });
        }

        let websites: Vec<Website> = response.json().await?;
        info!(count = websites.len(), "Fetched websites");
        Ok(websites)
    }

    /// Register a new news source.
    ///
    /// # Arguments
    ///
    /// * `token` - Bearer token of a logged-in operator
    /// * `input` - The complete source document
    ///
    /// # Returns
    ///
    /// The source as stored, with its server-assigned id.
    #[instrument(level = "info", skip(self, token, input), fields(name = %input.name))]
    pub async fn create_website(
        &self,
        token: &str,
        input: &WebsiteInput,
    ) -> Result<Website, ApiError> {
        let url = self.endpoints.websites()?;
        let site = self.save_website(Method::POST, url, token, input).await?;
        info!(id = %site.id, "Created website");
        Ok(site)
    }

    /// Replace the stored document of source `id` with `input`.
    ///
    /// # Arguments
    ///
    /// * `token` - Bearer token of a logged-in operator
    /// * `id` - Identifier of the source to update
    /// * `input` - The complete new document; fields left out are not kept
    ///
    /// # Returns
    ///
    /// The source as stored after the update.
    #[instrument(level = "info", skip(self, token, input))]
    pub async fn update_website(
        &self,
        token: &str,
        id: &str,
        input: &WebsiteInput,
    ) -> Result<Website, ApiError> {
        let url = self.endpoints.website(id)?;
        let site = self.save_website(Method::PUT, url, token, input).await?;
        info!("Updated website");
        Ok(site)
    }

    async fn save_website(
        &self,
        method: Method,
        url: url::Url,
        token: &str,
        input: &WebsiteInput,
    ) -> Result<Website, ApiError> {
        debug!(%method, %url, token = %mask_token(token), "Saving website");
        let response = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(input)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Operation failed").await);
        }
        Ok(response.json().await?)
    }
}

/// Turn a non-2xx answer into [`ApiError::Rejected`], preferring the
/// server's JSON `message` over `fallback`.
async fn rejection(response: Response, fallback: &str) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!(%status, body = %truncate_for_log(&body, 200), "Request rejected");
    let message = serde_json::from_str::<ApiMessage>(&body)
        .ok()
        .and_then(|m| m.message)
        .unwrap_or_else(|| fallback.to_string());
    ApiError::Rejected(message)
}
