//! Conditional HTTP response building for Gantry
//!
//! This crate augments axum handlers with RFC 7232 style conditional
//! request handling:
//! - [`Preconditions`]: extractor for the four validator request headers
//! - [`ConditionalGet`] / [`ConditionalUpdate`]: response builders that
//!   evaluate client validators against server resource state
//! - [`headers`]: validator and cache-metadata header formatting
//! - [`Yaml`]: an alternate content-type extractor/responder

pub mod conditional;
pub mod headers;
pub mod precondition;
pub mod yaml;

pub use conditional::{ConditionalGet, ConditionalUpdate};
pub use headers::{CacheHeaders, Refresh, RetryAfter, ServerTiming};
pub use precondition::Preconditions;
pub use yaml::Yaml;
