//! Validator and cache-metadata header formatting
//!
//! Entity tags are treated as opaque strings; comparison strips the
//! configured quote character from both ends and is otherwise exact.
//! The weak/strong validator distinction of RFC 7232 §2.3 (the `W/`
//! prefix) is intentionally not modeled.

use axum::http::{header, HeaderMap, HeaderName};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

pub use gantry_common::FEATURE_CODE_HEADER as FEATURE_CODE;

pub const PREFERENCE_APPLIED: &str = "preference-applied";
pub const REFRESH: &str = "refresh";
pub const SERVER_TIMING: &str = "server-timing";

/// Wildcard entity tag matching any current representation
pub const WILDCARD: &str = "*";

/// Strip the quote character from both ends of an entity tag, once each
pub fn strip_quotes(tag: &str, quote: char) -> &str {
    let tag = tag.trim();
    let tag = tag.strip_prefix(quote).unwrap_or(tag);
    tag.strip_suffix(quote).unwrap_or(tag)
}

/// Quote an entity tag for emission, unless it is already quoted
pub fn quote_etag(tag: &str, quote: char) -> String {
    if tag.len() >= 2 && tag.starts_with(quote) && tag.ends_with(quote) {
        tag.to_string()
    } else {
        format!("{quote}{tag}{quote}")
    }
}

/// True when `candidate` appears in `tags` after quote-stripping, or the
/// list carries the `*` wildcard
pub fn tag_matches(tags: &[String], candidate: &str, quote: char) -> bool {
    let candidate = strip_quotes(candidate, quote);
    tags.iter()
        .any(|t| t == WILDCARD || strip_quotes(t, quote) == candidate)
}

/// Format a timestamp as an IMF-fixdate HTTP date
pub fn fmt_http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP date, accepting IMF-fixdate plus the two obsolete
/// formats RFC 7231 requires recipients to understand
pub fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc2822(s) {
        return Some(t.with_timezone(&Utc));
    }
    // RFC 850: Sunday, 06-Nov-94 08:49:37 GMT
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%A, %d-%b-%y %H:%M:%S GMT") {
        return Some(t.and_utc());
    }
    // asctime: Sun Nov  6 08:49:37 1994
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%a %b %e %H:%M:%S %Y") {
        return Some(t.and_utc());
    }
    None
}

/// `Retry-After` header value: delay in seconds or an absolute HTTP date
#[derive(Debug, Clone, PartialEq)]
pub enum RetryAfter {
    Seconds(u64),
    Date(DateTime<Utc>),
}

impl fmt::Display for RetryAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryAfter::Seconds(secs) => write!(f, "{secs}"),
            RetryAfter::Date(date) => write!(f, "{}", fmt_http_date(*date)),
        }
    }
}

/// One `Server-Timing` metric: `name;dur=<ms>[;desc=<text>]`
#[derive(Debug, Clone, PartialEq)]
pub struct ServerTiming {
    pub name: String,
    pub dur_ms: Option<f64>,
    pub desc: Option<String>,
}

impl ServerTiming {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dur_ms: None,
            desc: None,
        }
    }

    pub fn dur(mut self, ms: f64) -> Self {
        self.dur_ms = Some(ms);
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }
}

impl fmt::Display for ServerTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(dur) = self.dur_ms {
            write!(f, ";dur={dur}")?;
        }
        if let Some(desc) = &self.desc {
            // Tokens with whitespace need the quoted-string form
            if desc.chars().any(|c| c.is_whitespace() || c == ';' || c == ',') {
                write!(f, ";desc=\"{desc}\"")?;
            } else {
                write!(f, ";desc={desc}")?;
            }
        }
        Ok(())
    }
}

/// Render a metric list as one comma-joined `Server-Timing` value
pub fn render_server_timing(metrics: &[ServerTiming]) -> String {
    metrics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Refresh` header value: `<seconds>[; url=<url>]`
#[derive(Debug, Clone, PartialEq)]
pub struct Refresh {
    pub seconds: u64,
    pub url: Option<String>,
}

impl Refresh {
    pub fn after(seconds: u64) -> Self {
        Self { seconds, url: None }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl fmt::Display for Refresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{}; url={url}", self.seconds),
            None => write!(f, "{}", self.seconds),
        }
    }
}

/// Cache metadata attached to conditional responses on every branch,
/// including 304s that carry no body
#[derive(Debug, Clone, Default)]
pub struct CacheHeaders {
    pub feature_code: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub preference_applied: Option<String>,
    pub refresh: Option<Refresh>,
    pub retry_after: Option<RetryAfter>,
    pub server_timing: Vec<ServerTiming>,
}

impl CacheHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature_code(mut self, code: impl Into<String>) -> Self {
        self.feature_code = Some(code.into());
        self
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn preference_applied(mut self, preference: impl Into<String>) -> Self {
        self.preference_applied = Some(preference.into());
        self
    }

    pub fn refresh(mut self, refresh: Refresh) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn retry_after(mut self, retry_after: RetryAfter) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn server_timing(mut self, metric: ServerTiming) -> Self {
        self.server_timing.push(metric);
        self
    }

    /// Write every present header into the map, skipping values the HTTP
    /// layer would reject
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(code) = &self.feature_code {
            insert(headers, HeaderName::from_static(FEATURE_CODE), code);
        }
        if let Some(at) = self.expires {
            insert(headers, header::EXPIRES, &fmt_http_date(at));
        }
        if let Some(preference) = &self.preference_applied {
            insert(
                headers,
                HeaderName::from_static(PREFERENCE_APPLIED),
                preference,
            );
        }
        if let Some(refresh) = &self.refresh {
            insert(headers, HeaderName::from_static(REFRESH), &refresh.to_string());
        }
        if let Some(retry_after) = &self.retry_after {
            insert(headers, header::RETRY_AFTER, &retry_after.to_string());
        }
        if !self.server_timing.is_empty() {
            insert(
                headers,
                HeaderName::from_static(SERVER_TIMING),
                &render_server_timing(&self.server_timing),
            );
        }
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = value.parse() {
        headers.insert(name, value);
    }
}
