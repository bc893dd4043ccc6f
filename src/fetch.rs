//! HTTP fetching.
//!
//! Wraps a pooled blocking `reqwest` client with a fixed identifying
//! `User-Agent` and request timeout, and maps transport failures onto the
//! error taxonomy. No retries, and no redirect handling beyond the
//! client's defaults: the caller re-invokes on failure. The outbound call
//! is the pipeline's sole suspension point and is bounded by the timeout.

use std::sync::LazyLock;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::url_utils;

/// Request timeout for a single GET, covering connect through body read.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed User-Agent identifying the tool.
const USER_AGENT: &str = concat!("pagecopy/", env!("CARGO_PKG_VERSION"));

/// Pooled HTTP client, built once and reused across fetches.
#[allow(clippy::expect_used)]
static HTTP_CLIENT: LazyLock<reqwest::blocking::Client> = LazyLock::new(|| {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .expect("valid client configuration")
});

/// A fetched document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Raw response body, exactly as received.
    pub body: Vec<u8>,

    /// URL the response was served from, after any redirects.
    pub final_url: String,

    /// HTTP status code of the final response.
    pub status: u16,
}

/// Fetch `url` with a single GET.
///
/// The URL must parse as a well-formed absolute HTTP(S) URL; otherwise
/// this fails with [`Error::InvalidUrl`] before any network call. Non-2xx
/// responses surface as [`Error::HttpStatus`] with the body discarded.
pub fn fetch(url: &str) -> Result<FetchedPage> {
    let parsed = url_utils::parse_http_url(url)?;
    debug!(url = %parsed, "fetching page");

    let response = HTTP_CLIENT
        .get(parsed)
        .send()
        .map_err(classify_transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus(status.as_u16()));
    }

    let final_url = response.url().to_string();
    let body = response.bytes().map_err(classify_transport)?.to_vec();
    debug!(bytes = body.len(), %final_url, "fetched page");

    Ok(FetchedPage {
        body,
        final_url,
        status: status.as_u16(),
    })
}

/// Map a transport-level failure onto the error taxonomy.
///
/// `reqwest` flattens DNS failures and refused connections into one
/// connect error, so the source chain is inspected to tell them apart.
fn classify_transport(err: reqwest::Error) -> Error {
    let detail = source_chain(&err);

    if err.is_timeout() {
        Error::Timeout(detail)
    } else if is_dns_failure(&detail) {
        Error::DnsFailure(detail)
    } else if err.is_connect() {
        Error::ConnectionRefused(detail)
    } else {
        Error::RequestFailed(detail)
    }
}

fn source_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

fn is_dns_failure(detail: &str) -> bool {
    let detail = detail.to_ascii_lowercase();
    detail.contains("dns") || detail.contains("lookup")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_rejects_malformed_url_without_network() {
        assert!(matches!(fetch("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(fetch(""), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn fetch_rejects_non_http_scheme() {
        assert!(matches!(
            fetch("ftp://example.com/file"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn user_agent_identifies_the_tool() {
        assert!(USER_AGENT.starts_with("pagecopy/"));
    }

    #[test]
    fn dns_detail_is_recognized() {
        assert!(is_dns_failure(
            "error sending request: failed to lookup address information"
        ));
        assert!(is_dns_failure("dns error: no record found"));
        assert!(!is_dns_failure("connection reset by peer"));
    }
}
