//! Conditional response builders — precondition evaluation per RFC 7232
//!
//! [`ConditionalGet`] decides whether a read can short-circuit to 304 and
//! [`ConditionalUpdate`] gates a write on client validators. Both follow
//! the same precedence rule: entity tags are strong validators and always
//! win over timestamps when both are supplied.
//!
//! The body supplier handed to [`ConditionalGet`] is memoized: it runs at
//! most once per call even when both tag computation and body serialization
//! need its result, and not at all when an explicit tag short-circuits.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use gantry_common::{Error, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::headers::{fmt_http_date, quote_etag, tag_matches, CacheHeaders};
use crate::precondition::Preconditions;

/// Conditional read-path builder
pub struct ConditionalGet<T, F>
where
    T: Serialize,
    F: FnOnce() -> Result<T>,
{
    if_none_match: Vec<String>,
    if_modified_since: Option<DateTime<Utc>>,
    etag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
    require_validator: bool,
    quote: char,
    cache: CacheHeaders,
    supplier: Option<F>,
    body: Option<Vec<u8>>,
}

impl<T, F> ConditionalGet<T, F>
where
    T: Serialize,
    F: FnOnce() -> Result<T>,
{
    pub fn new(supplier: F) -> Self {
        Self {
            if_none_match: Vec::new(),
            if_modified_since: None,
            etag: None,
            last_modified: None,
            require_validator: false,
            quote: '"',
            cache: CacheHeaders::default(),
            supplier: Some(supplier),
            body: None,
        }
    }

    /// Take `If-None-Match` and `If-Modified-Since` from parsed request headers
    pub fn preconditions(mut self, preconditions: &Preconditions) -> Self {
        self.if_none_match = preconditions.if_none_match.clone();
        self.if_modified_since = preconditions.if_modified_since;
        self
    }

    pub fn if_none_match(mut self, tags: Vec<String>) -> Self {
        self.if_none_match = tags;
        self
    }

    pub fn if_modified_since(mut self, bound: Option<DateTime<Utc>>) -> Self {
        self.if_modified_since = bound;
        self
    }

    /// Supply the resource's tag directly instead of hashing the body
    pub fn etag(mut self, tag: impl Into<String>) -> Self {
        self.etag = Some(tag.into());
        self
    }

    pub fn last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    /// Fail with 428 when the request carries no validator at all
    pub fn require_validator(mut self, required: bool) -> Self {
        self.require_validator = required;
        self
    }

    pub fn quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    pub fn cache(mut self, cache: CacheHeaders) -> Self {
        self.cache = cache;
        self
    }

    /// Evaluate the preconditions and build the response
    pub fn respond(mut self) -> Result<Response> {
        let has_tag_validator = !self.if_none_match.is_empty();
        let has_time_validator = self.if_modified_since.is_some();

        if self.require_validator && !has_tag_validator && !has_time_validator {
            return Err(Error::PreconditionRequired(
                "If-None-Match or If-Modified-Since must be supplied".to_string(),
            ));
        }

        let mut resolved_tag = self.etag.clone();

        // Tag validators take precedence over the timestamp check
        let not_modified = if has_tag_validator {
            let tag = match resolved_tag.clone() {
                Some(tag) => tag,
                None => {
                    let tag = self.computed_tag()?;
                    resolved_tag = Some(tag.clone());
                    tag
                }
            };
            tag_matches(&self.if_none_match, &tag, self.quote)
        } else if let (Some(bound), Some(last_modified)) =
            (self.if_modified_since, self.last_modified)
        {
            // HTTP dates carry second precision
            last_modified.timestamp() <= bound.timestamp()
        } else {
            false
        };

        if not_modified {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            self.cache.apply(response.headers_mut());
            if let Some(tag) = &resolved_tag {
                insert_etag(&mut response, tag, self.quote);
            }
            if let Some(last_modified) = self.last_modified {
                insert_last_modified(&mut response, last_modified);
            }
            return Ok(response);
        }

        let tag = match resolved_tag {
            Some(tag) => tag,
            None => self.computed_tag()?,
        };
        self.materialize()?;
        let bytes = self
            .body
            .take()
            .ok_or_else(|| Error::Internal("response body already consumed".to_string()))?;

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .map_err(|e| Error::Internal(format!("failed to build response: {e}")))?;
        self.cache.apply(response.headers_mut());
        insert_etag(&mut response, &tag, self.quote);
        if let Some(last_modified) = self.last_modified {
            insert_last_modified(&mut response, last_modified);
        }
        Ok(response)
    }

    /// Run the supplier and serialize its value, at most once per builder
    fn materialize(&mut self) -> Result<()> {
        if self.body.is_none() {
            let supplier = self
                .supplier
                .take()
                .ok_or_else(|| Error::Internal("body supplier already consumed".to_string()))?;
            let value = supplier()?;
            self.body = Some(serde_json::to_vec(&value)?);
        }
        Ok(())
    }

    fn computed_tag(&mut self) -> Result<String> {
        self.materialize()?;
        let bytes = self.body.as_deref().unwrap_or_default();
        Ok(hex::encode(Sha256::digest(bytes)))
    }
}

/// Conditional write-path builder
///
/// The update action yields `Some(body)` for a 200 response or `None` for
/// 204 No Content; it runs exactly once and only after every supplied
/// precondition passed.
pub struct ConditionalUpdate<T, A>
where
    T: Serialize,
    A: FnOnce() -> Result<Option<T>>,
{
    if_match: Vec<String>,
    if_unmodified_since: Option<DateTime<Utc>>,
    current_etag: Option<String>,
    current_etag_fn: Option<Box<dyn FnOnce() -> Result<Option<String>>>>,
    current_last_modified: Option<DateTime<Utc>>,
    require_validator: bool,
    quote: char,
    new_etag: Option<String>,
    new_last_modified: Option<DateTime<Utc>>,
    cache: CacheHeaders,
    action: Option<A>,
}

impl<T, A> ConditionalUpdate<T, A>
where
    T: Serialize,
    A: FnOnce() -> Result<Option<T>>,
{
    pub fn new(action: A) -> Self {
        Self {
            if_match: Vec::new(),
            if_unmodified_since: None,
            current_etag: None,
            current_etag_fn: None,
            current_last_modified: None,
            require_validator: false,
            quote: '"',
            new_etag: None,
            new_last_modified: None,
            cache: CacheHeaders::default(),
            action: Some(action),
        }
    }

    /// Take `If-Match` and `If-Unmodified-Since` from parsed request headers
    pub fn preconditions(mut self, preconditions: &Preconditions) -> Self {
        self.if_match = preconditions.if_match.clone();
        self.if_unmodified_since = preconditions.if_unmodified_since;
        self
    }

    pub fn if_match(mut self, tags: Vec<String>) -> Self {
        self.if_match = tags;
        self
    }

    pub fn if_unmodified_since(mut self, bound: Option<DateTime<Utc>>) -> Self {
        self.if_unmodified_since = bound;
        self
    }

    /// The stored resource's tag before the update
    pub fn current_etag(mut self, tag: impl Into<String>) -> Self {
        self.current_etag = Some(tag.into());
        self
    }

    /// Compute the stored resource's tag lazily, only when `If-Match` is present
    pub fn current_etag_with(
        mut self,
        f: impl FnOnce() -> Result<Option<String>> + 'static,
    ) -> Self {
        self.current_etag_fn = Some(Box::new(f));
        self
    }

    pub fn current_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.current_last_modified = Some(at);
        self
    }

    pub fn require_validator(mut self, required: bool) -> Self {
        self.require_validator = required;
        self
    }

    pub fn quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Tag of the updated resource, echoed in the response
    pub fn new_etag(mut self, tag: impl Into<String>) -> Self {
        self.new_etag = Some(tag.into());
        self
    }

    pub fn new_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.new_last_modified = Some(at);
        self
    }

    pub fn cache(mut self, cache: CacheHeaders) -> Self {
        self.cache = cache;
        self
    }

    /// Evaluate the preconditions, run the update, and build the response
    pub fn respond(mut self) -> Result<Response> {
        let has_tag_validator = !self.if_match.is_empty();
        let has_time_validator = self.if_unmodified_since.is_some();

        if self.require_validator && !has_tag_validator && !has_time_validator {
            return Err(Error::PreconditionRequired(
                "If-Match or If-Unmodified-Since must be supplied".to_string(),
            ));
        }

        let current_tag = if has_tag_validator {
            self.resolve_current_tag()?
        } else {
            None
        };

        match current_tag {
            Some(tag) => {
                if !tag_matches(&self.if_match, &tag, self.quote) {
                    return Err(Error::PreconditionFailed(format!(
                        "entity tag {} does not match If-Match",
                        quote_etag(&tag, self.quote)
                    )));
                }
            }
            None => {
                if let (Some(bound), Some(previous)) =
                    (self.if_unmodified_since, self.current_last_modified)
                {
                    if previous.timestamp() > bound.timestamp() {
                        return Err(Error::PreconditionFailed(
                            "resource was modified after If-Unmodified-Since".to_string(),
                        ));
                    }
                }
            }
        }

        let action = self
            .action
            .take()
            .ok_or_else(|| Error::Internal("update action already consumed".to_string()))?;

        let mut response = match action()? {
            Some(body) => {
                let bytes = serde_json::to_vec(&body)?;
                Response::builder()
                    .status(StatusCode::OK)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(bytes))
                    .map_err(|e| Error::Internal(format!("failed to build response: {e}")))?
            }
            None => StatusCode::NO_CONTENT.into_response(),
        };

        self.cache.apply(response.headers_mut());
        if let Some(tag) = &self.new_etag {
            insert_etag(&mut response, tag, self.quote);
        }
        if let Some(last_modified) = self.new_last_modified {
            insert_last_modified(&mut response, last_modified);
        }
        Ok(response)
    }

    fn resolve_current_tag(&mut self) -> Result<Option<String>> {
        if self.current_etag.is_some() {
            return Ok(self.current_etag.clone());
        }
        if let Some(f) = self.current_etag_fn.take() {
            let tag = f()?;
            self.current_etag = tag.clone();
            return Ok(tag);
        }
        Ok(None)
    }
}

fn insert_etag(response: &mut Response, tag: &str, quote: char) {
    if let Ok(value) = HeaderValue::from_str(&quote_etag(tag, quote)) {
        response.headers_mut().insert(header::ETAG, value);
    }
}

fn insert_last_modified(response: &mut Response, at: DateTime<Utc>) {
    if let Ok(value) = HeaderValue::from_str(&fmt_http_date(at)) {
        response.headers_mut().insert(header::LAST_MODIFIED, value);
    }
}
