//! k6 external-executor control over its REST API
//!
//! Every command is a `PATCH /v1/status` carrying a JSON:API status document
//! with only the attributes being changed.

use super::{LoadGenerator, LoadGeneratorError};
use crate::http::{ApiError, HttpEndpoint};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const STATUS_RESOURCE: &str = "/v1/status";

/// Error details k6 returns when a pause is requested while nothing is running
const NOT_RUNNING_MARKERS: [&str; 2] = [
    "cannot pause the externally controlled executor before it has started",
    "test execution was already paused",
];

#[derive(Debug, Serialize)]
struct StatusDocument {
    data: StatusData,
}

#[derive(Debug, Serialize)]
struct StatusData {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'static str,
    attributes: StatusAttributes,
}

#[derive(Debug, Default, Serialize)]
struct StatusAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vus: Option<u32>,
}

impl StatusDocument {
    fn new(attributes: StatusAttributes) -> Self {
        StatusDocument {
            data: StatusData {
                kind: "status",
                id: "default",
                attributes,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorDocument {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

/// Message from a k6 error body, falling back to the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorDocument>(body) {
        Ok(doc) if !doc.errors.is_empty() => doc
            .errors
            .iter()
            .map(|e| {
                if e.detail.is_empty() {
                    e.title.clone()
                } else {
                    format!("{}: {}", e.title, e.detail)
                }
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.to_string(),
    }
}

/// Whether a k6 reply says the test is already at rest
fn is_not_running(body: &str) -> bool {
    let message = error_message(body);
    NOT_RUNNING_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Client for a k6 instance started with the externally-controlled executor
#[derive(Debug, Clone)]
pub struct K6Generator {
    endpoint: HttpEndpoint,
}

impl K6Generator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Ok(K6Generator {
            endpoint: HttpEndpoint::new(base_url, timeout)?,
        })
    }

    fn patch_status(&self, attributes: StatusAttributes) -> Result<(), ApiError> {
        self.endpoint.send_json(
            Method::PATCH,
            STATUS_RESOURCE,
            &StatusDocument::new(attributes),
        )?;
        Ok(())
    }
}

impl LoadGenerator for K6Generator {
    fn start(&mut self) -> Result<(), LoadGeneratorError> {
        self.patch_status(StatusAttributes {
            paused: Some(false),
            ..Default::default()
        })?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), LoadGeneratorError> {
        self.patch_status(StatusAttributes {
            paused: Some(true),
            ..Default::default()
        })
        .map_err(|e| match e.status_body() {
            Some(body) if is_not_running(body) => {
                LoadGeneratorError::NotRunning(error_message(body))
            }
            _ => LoadGeneratorError::Api(e),
        })
    }

    fn set_level(&mut self, level: u32) -> Result<(), LoadGeneratorError> {
        self.patch_status(StatusAttributes {
            vus: Some(level),
            ..Default::default()
        })?;
        Ok(())
    }
}
