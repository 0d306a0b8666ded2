//! Blocking HTTP plumbing shared by the collaborator clients
//!
//! Every call has a bounded timeout and any transport failure, non-2xx status
//! or malformed body is an [`ApiError`]. Nothing is retried.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to an external collaborator
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    #[error("{method} {url} returned a malformed body: {reason}")]
    Decode {
        method: Method,
        url: String,
        reason: String,
    },
}

impl ApiError {
    /// Response body of a non-2xx reply, if that is what this error is
    pub fn status_body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Turn `host` + `port` into a base URL, keeping any explicit scheme
pub fn base_url(host: &str, port: u16) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// A base URL plus a client with a fixed timeout
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: Client,
    base_url: String,
}

impl HttpEndpoint {
    /// Create an endpoint whose every request times out after `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(HttpEndpoint {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request without a body and require a 2xx reply
    pub fn send(&self, method: Method, path: &str) -> Result<Response, ApiError> {
        let url = self.url(path);
        let builder = self.client.request(method.clone(), &url);
        Self::finish(method, url, builder)
    }

    /// Send a JSON body and require a 2xx reply
    pub fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        let builder = self.client.request(method.clone(), &url).json(body);
        Self::finish(method, url, builder)
    }

    /// Send a request without a body and decode the JSON reply
    pub fn receive_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.send(method.clone(), path)?;
        response.json().map_err(|e| ApiError::Decode {
            method,
            url,
            reason: e.to_string(),
        })
    }

    fn finish(method: Method, url: String, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().map_err(|source| ApiError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                method,
                url,
                status,
                body,
            });
        }

        Ok(response)
    }
}
