//! Hostname extraction from tab URLs
//!
//! Parsing follows the WHATWG URL standard (the same rules as the browser's
//! `URL.hostname`): backslashes act as path separators in special schemes,
//! percent-escapes in the host are decoded and IDN hosts come back as
//! punycode, which is how the cookie store keys its domains.

use ::url::Url;

/// Hostname of a URL as the browser reports it.
///
/// `None` for unparsable URLs and for URLs without a host.
#[inline]
pub fn extract_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(str::to_string)
}

/// Domain of a tab URL, lowercased.
///
/// Returns `None` for URLs without an authority (`about:blank`, `data:`),
/// with an empty host or that fail to parse, so callers treat them as
/// "no domain".
pub fn domain_from_url(url: &str) -> Option<String> {
    let host = extract_host(url)?;
    let host = host.strip_suffix('.').unwrap_or(&host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}
