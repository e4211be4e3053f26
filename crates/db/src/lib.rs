//! Repository conveniences for Gantry
//!
//! A thin layer over domain repositories: get-or-error lookups, sorted and
//! paginated listing, and explicit example matching compiled to SQL via
//! `sqlx::QueryBuilder`. The underlying storage contract stays with the
//! repository implementations.

pub mod example;
pub mod query;
pub mod repository;

pub use example::{Example, Match};
pub use query::{push_order_by, push_page};
pub use repository::Repository;
