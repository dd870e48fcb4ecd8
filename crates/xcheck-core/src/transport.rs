//! HTTP transport seam.
//!
//! The client talks to the API only through [`Transport`], so tests and
//! embedders can swap in their own adapter. [`ReqwestTransport`] is the
//! default, built on `reqwest::blocking`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::error::{Result, XcheckError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Bound on the whole exchange.
    pub timeout: Duration,
    /// Bound on connection establishment alone.
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(
        &self,
        request: &TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        (**self).send(request)
    }
}

// ---------------------------------------------------------------------------
// ReqwestTransport
// ---------------------------------------------------------------------------

/// Blocking transport with TLS verification on and a bounded redirect chain.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    connect_timeout: Duration,
    max_redirects: usize,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration, max_redirects: usize) -> Result<Self> {
        let client = build_client(connect_timeout, max_redirects)?;
        Ok(Self {
            client,
            connect_timeout,
            max_redirects,
        })
    }

    // reqwest fixes the connect timeout per client, so a request asking for
    // a different one gets a dedicated client.
    fn client_for(
        &self,
        connect_timeout: Duration,
    ) -> std::result::Result<reqwest::blocking::Client, TransportError> {
        if connect_timeout == self.connect_timeout {
            return Ok(self.client.clone());
        }
        build_client(connect_timeout, self.max_redirects)
            .map_err(|e| TransportError::Other(e.to_string()))
    }
}

fn build_client(connect_timeout: Duration, max_redirects: usize) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .connect_timeout(connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(max_redirects))
        .danger_accept_invalid_certs(false)
        .build()
        .map_err(|e| XcheckError::TransportSetup(e.to_string()))
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: &TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let client = self.client_for(request.connect_timeout)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = client
            .request(method, request.url.as_str())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let resp = builder.send().map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().map_err(map_reqwest_error)?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}
