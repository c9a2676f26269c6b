//! HTTP client for the glasses backend.
//!
//! Endpoints (relative to the configured base URL):
//! - `GET  discover`   -> `[{device_name, device_address}]`
//! - `POST connect`    <- form `device_name`, `device_address`
//! - `GET  disconnect`
//! - `POST encode`     <- `{glasses_frame}` -> `{glasses_frame}`
//! - `POST display`    <- `{glasses_frame}`
//!
//! Failures come back as a non-2xx status with a `{message}` body, which is surfaced
//! unchanged. Transport problems are turned into a [`ServiceError`] describing them.

use super::{GlassesService, ServiceError};
use crate::directory::Device;
use crate::error::{AppResult, GlassesError};
use crate::frame::{EncodedFrame, FrameMatrix, FramePayload};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use tracing::{debug, warn};

/// [`GlassesService`] over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct HttpGlassesService {
    client: Client,
    base_url: Url,
}

impl HttpGlassesService {
    /// Create a client for the backend at `base_url` (e.g. `http://127.0.0.1:8000`).
    pub fn new(base_url: &str) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| GlassesError::Config(format!("Invalid service URL '{}': {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(GlassesError::Config(format!(
                "Service URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }
        // Url::join replaces the last segment unless the path ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::new(format!("Invalid endpoint '{}': {}", path, e)))
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    warn!(error = %err, "Glasses service request failed");
    ServiceError::new(format!("Request to glasses service failed: {}", err))
}

/// Pass successful responses through; decode the `{message}` body of failures.
async fn check(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.map_err(transport_error)?;
    match serde_json::from_str::<ServiceError>(&body) {
        Ok(err) => Err(err),
        Err(_) => Err(ServiceError::new(format!(
            "Glasses service returned {}",
            status
        ))),
    }
}

#[async_trait]
impl GlassesService for HttpGlassesService {
    async fn discover(&self) -> Result<Vec<Device>, ServiceError> {
        let url = self.endpoint("discover")?;
        debug!(%url, "GET discover");

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        check(response)
            .await?
            .json::<Vec<Device>>()
            .await
            .map_err(transport_error)
    }

    async fn connect(&self, device: &Device) -> Result<(), ServiceError> {
        let url = self.endpoint("connect")?;
        debug!(%url, device = %device, "POST connect");

        let response = self
            .client
            .post(url)
            .form(device)
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await.map(|_| ())
    }

    async fn disconnect(&self) -> Result<(), ServiceError> {
        let url = self.endpoint("disconnect")?;
        debug!(%url, "GET disconnect");

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        check(response).await.map(|_| ())
    }

    async fn encode(&self, matrix: &FrameMatrix) -> Result<EncodedFrame, ServiceError> {
        let url = self.endpoint("encode")?;
        debug!(%url, rows = matrix.len(), "POST encode");

        let response = self
            .client
            .post(url)
            .json(&FramePayload {
                glasses_frame: matrix,
            })
            .send()
            .await
            .map_err(transport_error)?;
        let payload = check(response)
            .await?
            .json::<FramePayload<EncodedFrame>>()
            .await
            .map_err(transport_error)?;
        Ok(payload.glasses_frame)
    }

    async fn display(&self, frame: &EncodedFrame) -> Result<(), ServiceError> {
        let url = self.endpoint("display")?;
        debug!(%url, "POST display");

        let response = self
            .client
            .post(url)
            .json(&FramePayload {
                glasses_frame: frame,
            })
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await.map(|_| ())
    }

    fn describe(&self) -> String {
        format!("HTTP glasses service at {}", self.base_url)
    }
}
