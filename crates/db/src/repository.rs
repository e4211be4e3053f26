//! Repository convenience trait
//!
//! The five required operations mirror what every Gantry domain repository
//! already exposes; the provided methods add the get-or-error wrappers on
//! top. Error semantics of the required operations belong to the
//! implementations.

use async_trait::async_trait;
use gantry_common::{Error, PageRequest, Result};
use std::fmt::Display;

use crate::example::Example;

#[async_trait]
pub trait Repository<T, Id>
where
    T: Send + Sync,
    Id: Send + Sync + Display,
{
    /// Existence check without loading the entity
    async fn exists(&self, id: &Id) -> Result<bool>;

    async fn find(&self, id: &Id) -> Result<Option<T>>;

    /// Sorted, paginated listing, optionally narrowed by an example filter
    async fn find_all(&self, page: &PageRequest, example: Option<&Example<T>>) -> Result<Vec<T>>;

    async fn save(&self, entity: T) -> Result<T>;

    async fn delete(&self, id: &Id) -> Result<()>;

    /// Find by id, failing with `Error::NotFound` when absent
    async fn get(&self, id: &Id) -> Result<T> {
        self.find(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no record with id {id}")))
    }

    /// Find by id, failing with a caller-chosen error when absent
    async fn get_or<F>(&self, id: &Id, err: F) -> Result<T>
    where
        F: FnOnce() -> Error + Send,
    {
        self.find(id).await?.ok_or_else(err)
    }
}
