//! Shared utilities, configuration, and error handling for Gantry
//!
//! This crate provides common functionality used across the Gantry utility
//! library:
//! - Error types with a uniform HTTP status mapping and problem payload
//! - Configuration management following 12-factor principles
//! - Pagination and sort query helpers for list endpoints

pub mod config;
pub mod error;
pub mod pagination;

pub use config::Config;
pub use error::{Error, Problem, Result, FEATURE_CODE_HEADER};
pub use pagination::{Direction, PageRequest, Pagination, SortKey};
