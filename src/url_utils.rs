//! URL Utility Functions
//!
//! Validation, relative resolution, and origin comparison for anchor
//! hrefs and fetch targets. Everything here is built on the `url` crate's
//! standard resolution rules.

use url::Url;

use crate::error::{Error, Result};

/// Parse a string as a well-formed absolute HTTP(S) URL.
///
/// Used as the fetcher's pre-flight check: failure here means no network
/// call is attempted.
pub fn parse_http_url(s: &str) -> Result<Url> {
    let s = s.trim();

    if s.is_empty() {
        return Err(Error::InvalidUrl("empty URL".to_string()));
    }

    let url = Url::parse(s).map_err(|err| Error::InvalidUrl(format!("{s}: {err}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::InvalidUrl(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }

    if url.host().is_none() {
        return Err(Error::InvalidUrl(format!("{s}: missing host")));
    }

    Ok(url)
}

/// Parse the base URL used for link resolution.
///
/// Same shape check as [`parse_http_url`], surfaced as the pre-flight
/// [`Error::BaseUrl`] so callers can tell a bad document URL apart from a
/// bad fetch target.
pub fn parse_base_url(s: &str) -> Result<Url> {
    parse_http_url(s).map_err(|_| Error::BaseUrl(s.trim().to_string()))
}

/// Resolve an anchor href against the document base.
///
/// Scheme-relative, path-relative, and query/fragment-only references all
/// resolve per standard rules. Returns `None` when the href is malformed;
/// callers keep the raw href string in that case instead of erroring.
#[must_use]
pub fn resolve_href(href: &str, base: &Url) -> Option<String> {
    base.join(href).ok().map(|resolved| resolved.to_string())
}

/// `scheme://host[:port]` of a URL, for prefix-based comparison.
#[must_use]
pub fn origin_str(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Whether a stored link URL points outside the origin of `base` over
/// HTTP(S).
///
/// The primary path compares parsed origins strictly. When `link_url`
/// does not parse (the raw-href fallback from resolution), a looser
/// prefix heuristic is used instead: starts with `http` but not with the
/// base origin string. The heuristic is deliberately preserved as-is and
/// must not be relied on for access control.
#[must_use]
pub fn is_external(link_url: &str, base: &Url) -> bool {
    match Url::parse(link_url) {
        Ok(url) => {
            let is_http = url.scheme() == "http" || url.scheme() == "https";
            is_http && url.origin() != base.origin()
        }
        Err(_) => link_url.starts_with("http") && !link_url.starts_with(&origin_str(base)),
    }
}
