//! Reseeding of shared backing data between trials
//!
//! When the system under test keeps state in a datastore (carts, sessions),
//! each trial starts from a freshly populated store so earlier trials cannot
//! skew later measurements.

use crate::http::{ApiError, HttpEndpoint};
use reqwest::Method;
use std::time::Duration;

/// Wipes and repopulates backing data before a trial
pub trait DataReseeder {
    fn reseed(&mut self) -> Result<(), ApiError>;
}

/// `DELETE /db` followed by `PUT /db/{rows}`
#[derive(Debug, Clone)]
pub struct HttpReseeder {
    endpoint: HttpEndpoint,
    rows: u64,
}

impl HttpReseeder {
    pub fn new(base_url: impl Into<String>, rows: u64, timeout: Duration) -> Result<Self, ApiError> {
        Ok(HttpReseeder {
            endpoint: HttpEndpoint::new(base_url, timeout)?,
            rows,
        })
    }

    /// Number of rows written on each reseed
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl DataReseeder for HttpReseeder {
    fn reseed(&mut self) -> Result<(), ApiError> {
        self.endpoint.send(Method::DELETE, "/db")?;
        self.endpoint
            .send(Method::PUT, &format!("/db/{}", self.rows))?;
        Ok(())
    }
}

/// Placeholder for runs without a reseeding collaborator
impl DataReseeder for std::convert::Infallible {
    fn reseed(&mut self) -> Result<(), ApiError> {
        match *self {}
    }
}
