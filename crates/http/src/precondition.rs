//! Extraction of RFC 7232 validator request headers
//!
//! The extractor never rejects: malformed dates are treated as absent and
//! tag lists keep their quote characters (stripping happens at comparison
//! time in the conditional builders).

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderName},
};
use chrono::{DateTime, Utc};
use std::convert::Infallible;

use crate::headers::parse_http_date;

/// Client-supplied validators for one conditional request
#[derive(Debug, Clone, Default)]
pub struct Preconditions {
    /// `If-Match`: ordered entity-tag list, may contain `*`
    pub if_match: Vec<String>,
    /// `If-None-Match`: ordered entity-tag list, may contain `*`
    pub if_none_match: Vec<String>,
    /// `If-Modified-Since`
    pub if_modified_since: Option<DateTime<Utc>>,
    /// `If-Unmodified-Since`
    pub if_unmodified_since: Option<DateTime<Utc>>,
}

impl Preconditions {
    /// Parse all four validator headers from a header map
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            if_match: tag_list(headers, &header::IF_MATCH),
            if_none_match: tag_list(headers, &header::IF_NONE_MATCH),
            if_modified_since: date(headers, &header::IF_MODIFIED_SINCE),
            if_unmodified_since: date(headers, &header::IF_UNMODIFIED_SINCE),
        }
    }

    /// True when the request supplied at least one validator
    pub fn has_any(&self) -> bool {
        !self.if_match.is_empty()
            || !self.if_none_match.is_empty()
            || self.if_modified_since.is_some()
            || self.if_unmodified_since.is_some()
    }
}

/// Collect a comma-separated entity-tag list across all values of a header
fn tag_list(headers: &HeaderMap, name: &HeaderName) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn date(headers: &HeaderMap, name: &HeaderName) -> Option<DateTime<Utc>> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
}

impl<S> FromRequestParts<S> for Preconditions
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Preconditions::from_headers(&parts.headers))
    }
}
