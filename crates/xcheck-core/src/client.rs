//! Blocking client for the verification API.
//!
//! Every call follows the same path:
//!
//! ```text
//! ActionRequest ─► TransportRequest ─► Transport::send
//!                                          │
//!                       Network ◄── err ───┤
//!                                          ▼
//!                              ApiResult::decode ── err ──► Decode
//!                                          │
//!                                          ▼
//!                              classify::interpret ── err ─► HttpStatus | Application
//!                                          │
//!                                          ▼
//!                                   envelope `result`
//! ```
//!
//! No call is retried here.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::batch::{ActionOutcome, BatchRunner, Pacing};
use crate::classify;
use crate::config::ClientConfig;
use crate::envelope::ApiResult;
use crate::error::ApiError;
use crate::transport::{Method, ReqwestTransport, Transport, TransportRequest};
use crate::types::ActionRequest;

pub const HEALTH_PATH: &str = "/api/health";
pub const STATS_PATH: &str = "/api/stats";
pub const API_KEY_HEADER: &str = "X-API-Key";

pub struct ActionClient {
    base_url: String,
    api_key: String,
    user_agent: String,
    timeout: Duration,
    connect_timeout: Duration,
    pacing: Pacing,
    transport: Box<dyn Transport>,
}

impl ActionClient {
    /// Build a client backed by [`ReqwestTransport`].
    pub fn new(config: &ClientConfig) -> crate::Result<Self> {
        config.ensure_valid()?;
        let transport = ReqwestTransport::new(config.connect_timeout(), config.max_redirects)?;
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: &ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            base_url: config.normalized_base_url().to_string(),
            api_key: config.api_key.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            pacing: Pacing::from_config(&config.pacing),
            transport: Box::new(transport),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Run one verification and return the envelope's `result` object.
    pub fn execute(&self, request: &ActionRequest) -> Result<Value, ApiError> {
        let kind = request.kind();
        self.call(Method::Post, kind.endpoint(), Some(request.body()))
    }

    pub fn health(&self) -> Result<Value, ApiError> {
        self.call(Method::Get, HEALTH_PATH, None)
    }

    pub fn stats(&self) -> Result<Value, ApiError> {
        self.call(Method::Get, STATS_PATH, None)
    }

    pub fn check_follow(&self, target_user: &str) -> Result<Value, ApiError> {
        self.execute(&ActionRequest::follow(target_user))
    }

    pub fn check_like(&self, tweet_url: &str) -> Result<Value, ApiError> {
        self.execute(&ActionRequest::like(tweet_url))
    }

    pub fn check_repost(&self, tweet_url: &str) -> Result<Value, ApiError> {
        self.execute(&ActionRequest::repost(tweet_url))
    }

    pub fn check_comment(&self, tweet_url: &str, checking_user: &str) -> Result<Value, ApiError> {
        self.execute(&ActionRequest::comment(tweet_url, checking_user))
    }

    /// Check several actions in order using this client's pacing policy.
    pub fn check_multiple<K>(&self, items: Vec<(K, ActionRequest)>) -> Vec<ActionOutcome<K>> {
        BatchRunner::new(self).run_all(items)
    }

    fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let request = self.build_request(method, path, body)?;
        debug!(method = method.as_str(), path, "sending request");

        let response = self
            .transport
            .send(&request)
            .map_err(|e| ApiError::Network(e.to_string()))?;
        debug!(
            path,
            status = response.status,
            bytes = response.body.len(),
            "received response"
        );

        classify::interpret(ApiResult::decode(response)?)
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<TransportRequest, ApiError> {
        let body = body
            .map(|b| serde_json::to_vec(&b))
            .transpose()
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(TransportRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                (API_KEY_HEADER.to_string(), self.api_key.clone()),
                ("User-Agent".to_string(), self.user_agent.clone()),
            ],
            body,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{ok, ScriptedTransport};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    fn client_for(server: &mockito::ServerGuard) -> ActionClient {
        ActionClient::new(&ClientConfig::new(server.url(), "test-key")).unwrap()
    }

    #[test]
    fn check_follow_posts_body_and_unwraps_result() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/check/follow")
            .match_header("x-api-key", "test-key")
            .match_header("content-type", "application/json")
            .match_header("user-agent", Matcher::Regex("^XScrapingAPI-Rust-Client/".into()))
            .match_body(Matcher::Json(json!({ "target_user": "@user" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": true, "action": "follow",
                    "result": {"is_following": true, "button_state": "Following"}}"#,
            )
            .create();

        let result = client_for(&server).check_follow("@user").unwrap();
        assert_eq!(result["is_following"], true);
        assert_eq!(result["button_state"], "Following");
        mock.assert();
    }

    #[test]
    fn check_comment_sends_checking_user() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/check/comment")
            .match_body(Matcher::Json(json!({
                "tweet_url": "https://x.com/a/status/1",
                "checking_user": "@bob"
            })))
            .with_status(200)
            .with_body(r#"{"success": true, "result": {"has_commented": false}}"#)
            .create();

        let result = client_for(&server)
            .check_comment("https://x.com/a/status/1", "@bob")
            .unwrap();
        assert_eq!(result["has_commented"], false);
        mock.assert();
    }

    #[test]
    fn rate_limited_like_surfaces_retry_after() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/check/like")
            .with_status(429)
            .with_body(r#"{"success": false, "error": {"code": "RATE_LIMITED", "retry_after": 45}}"#)
            .create();

        let err = client_for(&server)
            .check_like("https://x.com/a/status/1")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
        assert_eq!(err.retry_after_seconds(), Some(45));
    }

    #[test]
    fn application_failure_is_reported() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/check/repost")
            .with_status(200)
            .with_body(r#"{"success": false, "error": {"code": "SCRAPING_ERROR", "message": "timeout"}}"#)
            .create();

        let err = client_for(&server)
            .check_repost("https://x.com/a/status/1")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.message(), "API Error [SCRAPING_ERROR]: timeout");
    }

    #[test]
    fn html_error_page_is_a_decode_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/health")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create();

        let err = client_for(&server).health().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn health_and_stats_use_get() {
        let mut server = mockito::Server::new();
        let health = server
            .mock("GET", "/api/health")
            .with_status(200)
            .with_body(r#"{"success": true, "result": {"status": "healthy", "version": "1.0.0"}}"#)
            .create();
        let stats = server
            .mock("GET", "/api/stats")
            .with_status(200)
            .with_body(r#"{"success": true, "result": {"minute_requests": 3}}"#)
            .create();

        let client = client_for(&server);
        assert_eq!(client.health().unwrap()["status"], "healthy");
        assert_eq!(client.stats().unwrap()["minute_requests"], 3);
        health.assert();
        stats.assert();
    }

    #[test]
    fn too_many_redirects_is_a_network_error() {
        let mut server = mockito::Server::new();
        let url = server.url();
        let mut hops = vec![server
            .mock("GET", HEALTH_PATH)
            .with_status(302)
            .with_header("location", &format!("{url}/r1"))
            .create()];
        for i in 1..=4 {
            hops.push(
                server
                    .mock("GET", format!("/r{i}").as_str())
                    .with_status(302)
                    .with_header("location", &format!("{url}/r{}", i + 1))
                    .create(),
            );
        }

        let err = client_for(&server).health().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn unreachable_server_is_a_network_error() {
        let client = ActionClient::new(&ClientConfig::new("http://127.0.0.1:1", "k")).unwrap();
        let err = client.check_follow("@user").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn trailing_slash_in_base_url_is_trimmed() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok(
            json!({ "success": true, "result": {} }),
        )]));
        let client = ActionClient::with_transport(
            &ClientConfig::new("https://api.example.test//", "k"),
            transport.clone(),
        );
        client.health().unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].url, "https://api.example.test/api/health");
        assert_eq!(sent[0].method, Method::Get);
        assert!(sent[0].body.is_none());
        assert_eq!(sent[0].timeout, Duration::from_secs(30));
        assert_eq!(sent[0].connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(ActionClient::new(&ClientConfig::new("localhost:5000", "k")).is_err());
    }
}
