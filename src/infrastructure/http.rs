//! HTTP client for the advisory service.
//!
//! Four JSON endpoints are consumed:
//!
//! - `POST /recommend`: any non-2xx status is reported as [`ApiError::Status`]
//! - `POST /ask`: the status is not inspected; the body is either an answer or `{error}`
//! - `GET /tips`: any non-2xx status is reported as [`ApiError::Status`]
//! - `POST /tips`: only success or failure matters, the body is ignored
//!
//! Requests carry no timeout and cannot be aborted once sent.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::{
    ApiError, ApiResult, NewTip, QaRequest, QaResponse, RecommendationRequest,
    RecommendationResponse, TipEntry, TipsEnvelope,
};

/// The advisory service as seen by the request coordinator.
#[async_trait]
pub trait AdvisoryApi: Send + Sync {
    async fn recommend(&self, request: &RecommendationRequest) -> ApiResult<RecommendationResponse>;

    async fn ask(&self, request: &QaRequest) -> ApiResult<QaResponse>;

    async fn fetch_tips(&self) -> ApiResult<Vec<TipEntry>>;

    async fn post_tip(&self, tip: &NewTip) -> ApiResult<()>;
}

/// reqwest-backed [`AdvisoryApi`].
pub struct HttpAdvisoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAdvisoryClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AdvisoryApi for HttpAdvisoryClient {
    async fn recommend(&self, request: &RecommendationRequest) -> ApiResult<RecommendationResponse> {
        let url = self.endpoint("recommend");
        debug!(%url, farm_acres = request.farm_acres, language = %request.language, "posting recommendation request");
        let response = self.client.post(&url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        decode(&body)
    }

    async fn ask(&self, request: &QaRequest) -> ApiResult<QaResponse> {
        let url = self.endpoint("ask");
        debug!(%url, language = %request.language, "posting question");
        let response = self.client.post(&url).json(request).send().await?;
        let body = response.text().await?;
        decode(&body)
    }

    async fn fetch_tips(&self) -> ApiResult<Vec<TipEntry>> {
        let url = self.endpoint("tips");
        debug!(%url, "fetching tips");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        let envelope: TipsEnvelope = decode(&body)?;
        Ok(envelope.tips)
    }

    async fn post_tip(&self, tip: &NewTip) -> ApiResult<()> {
        let url = self.endpoint("tips");
        debug!(%url, author = %tip.author, "posting tip");
        let response = self.client.post(&url).json(tip).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(ApiError::from)
}
