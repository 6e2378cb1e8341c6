//! HTTP access to the abstracts site
//!
//! Every request first goes out with certificate verification; only a TLS
//! failure triggers one retry through a client that skips verification.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ScrapeConfig;
use crate::parse;
use crate::types::{FetchStatus, Project};

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    insecure: reqwest::Client,
    base_url: String,
}

impl Fetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        let insecure = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .danger_accept_invalid_certs(true)
            .build()
            .context("Failed to create fallback HTTP client")?;

        Ok(Fetcher {
            client,
            insecure,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn project_url(&self, id: u32) -> String {
        format!("{}/Home/FullAbstract?projectId={}", self.base_url, id)
    }

    /// GET a page; the body is only returned for a 200 response
    pub async fn get_text(&self, url: &str) -> Result<(FetchStatus, Option<String>)> {
        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) if is_tls_error(&e) => {
                debug!("TLS failure on {}, retrying without verification", url);
                self.insecure
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("Request to {} failed", url))?
            }
            Err(e) => return Err(e).with_context(|| format!("Request to {} failed", url)),
        };

        let code = response.status().as_u16();
        if code != 200 {
            return Ok((FetchStatus::from_http(code), None));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;
        Ok((FetchStatus::Ok, Some(body)))
    }

    /// Fetch and parse one project; every failure collapses to `None`
    pub async fn fetch_project(&self, id: u32) -> Option<Project> {
        let html = self.fetch_page(id).await?;
        parse::parse_project(&html, id)
    }

    /// Fetch a project page and pull the finalist's name from it
    pub async fn fetch_finalist_name(&self, id: u32) -> Option<String> {
        let html = self.fetch_page(id).await?;
        parse::parse_finalist_name(&html)
    }

    async fn fetch_page(&self, id: u32) -> Option<String> {
        let url = self.project_url(id);
        match self.get_text(&url).await {
            Ok((_, Some(body))) => Some(body),
            Ok((status, None)) => {
                debug!("Project {}: {}", id, status);
                None
            }
            Err(e) => {
                let status = e
                    .downcast_ref::<reqwest::Error>()
                    .map(classify_error)
                    .unwrap_or(FetchStatus::Unknown);
                warn!("Error fetching project {} ({}): {:#}", id, status, e);
                None
            }
        }
    }
}

/// Classify a transport error
pub fn classify_error(e: &reqwest::Error) -> FetchStatus {
    if is_tls_error(e) {
        FetchStatus::TlsError
    } else if e.is_timeout() {
        FetchStatus::Timeout
    } else if e.is_connect() || e.is_request() {
        FetchStatus::NetworkError
    } else {
        FetchStatus::Unknown
    }
}

/// reqwest has no TLS error kind, so look for it in the error's sources
///
/// The top-level message carries the request url and is skipped.
fn is_tls_error(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        if mentions_tls(&cause.to_string()) {
            return true;
        }
        source = cause.source();
    }
    false
}

fn mentions_tls(message: &str) -> bool {
    let message = message.to_lowercase();
    ["certificate", "ssl", "tls", "handshake"]
        .iter()
        .any(|marker| message.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Port with nothing listening on it
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    async fn send_error(url: &str) -> reqwest::Error {
        reqwest::Client::new().get(url).send().await.unwrap_err()
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error_whatever_the_url() {
        let port = closed_port();
        for path in ["/Home/FullAbstract?projectId=1", "/tls-mirror/ssl/certificate"] {
            let err = send_error(&format!("http://127.0.0.1:{}{}", port, path)).await;
            assert_eq!(classify_error(&err), FetchStatus::NetworkError, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_handshake_failure_is_tls_error() {
        // A plain HTTP server cannot complete a TLS handshake
        let server = wiremock::MockServer::start().await;
        let url = server.uri().replacen("http://", "https://", 1);

        let err = send_error(&url).await;
        assert_eq!(classify_error(&err), FetchStatus::TlsError);
    }

    #[tokio::test]
    async fn test_tls_failure_is_retried_once_then_reported() {
        let server = wiremock::MockServer::start().await;
        let config = ScrapeConfig {
            base_url: server.uri().replacen("http://", "https://", 1),
            timeout_secs: 5,
            ..Default::default()
        };
        let fetcher = Fetcher::new(&config).unwrap();

        // The fallback client skips verification but still cannot talk TLS
        // to a plain server, so the retry's error comes back.
        let err = fetcher.get_text(&fetcher.project_url(1)).await.unwrap_err();
        let status = err.downcast_ref::<reqwest::Error>().map(classify_error);
        assert_eq!(status, Some(FetchStatus::TlsError));
        assert!(fetcher.fetch_project(1).await.is_none());
    }

    #[test]
    fn test_mentions_tls() {
        assert!(mentions_tls("error:0A00010B:SSL routines:ssl3_get_record:wrong version number"));
        assert!(mentions_tls("invalid peer certificate: UnknownIssuer"));
        assert!(!mentions_tls("tcp connect error: Connection refused (os error 111)"));
    }

    #[test]
    fn test_project_url_trims_trailing_slash() {
        let config = ScrapeConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        };
        let fetcher = Fetcher::new(&config).unwrap();
        assert_eq!(
            fetcher.project_url(1234),
            "http://localhost:9000/Home/FullAbstract?projectId=1234"
        );
    }
}
