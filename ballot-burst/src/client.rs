//! Thin request/response layer over `reqwest` shared by setup and vote traffic.
use crate::batch::execute_batch;
use ballot_burst_core::{LoadTestConfig, VoterToken};
use reqwest::{header::AUTHORIZATION, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::num::NonZeroUsize;

/// Description of one API request. Tokens are sent verbatim as the `Authorization` value.
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

impl ApiRequest {
    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: Method::POST,
            url,
            body: Some(body),
            authorization: None,
        }
    }

    pub fn authorization(mut self, token: &str) -> Self {
        self.authorization = Some(token.to_string());
        self
    }

    pub fn voter(self, token: Option<&VoterToken>) -> Self {
        match token {
            Some(token) => self.authorization(token.as_str()),
            None => self,
        }
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("body", &self.body)
            .field("authorized", &self.authorization.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    batch_parallelism: NonZeroUsize,
}

impl ApiClient {
    pub fn new(config: &LoadTestConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            batch_parallelism: config.batch_parallelism,
        })
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, reqwest::Error> {
        let mut builder = self.http.request(request.method, request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = &request.authorization {
            builder = builder.header(AUTHORIZATION, token);
        }

        let res = builder.send().await?;
        let status = res.status();
        let body = res.text().await?;
        Ok(ApiResponse { status, body })
    }

    /// Send every request concurrently; see [`execute_batch`].
    pub async fn batch(
        &self,
        requests: Vec<ApiRequest>,
    ) -> Vec<Result<ApiResponse, reqwest::Error>> {
        execute_batch(self, requests, self.batch_parallelism).await
    }
}
