use core::fmt;
use std::hash::Hash;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::db::StoreResult;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// A document stored in one collection of the document store.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync;
    type SortField: Copy + fmt::Debug + Send + Sync;

    const COLLECTION: &'static str;

    fn id(&self) -> &Self::Id;

    /// In-process sort key for `field`.
    fn sort_key(&self, field: Self::SortField) -> SortKey;

    /// SQL expression over the `doc` column that orders by `field`.
    fn sort_expr(field: Self::SortField) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Int(i64),
    Time(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Single-field ordering. Ties fall back to insertion order, walked in the same direction.
#[derive(Debug, Clone, Copy)]
pub struct OrderBy<F> {
    pub field: F,
    pub direction: Direction,
}

impl<F> OrderBy<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }
}

impl Direction {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Create/read/update/delete access to one collection.
///
/// Every call is a single attempt against the backing store; failures surface as
/// [`StoreError`](crate::db::StoreError) and are never retried here.
#[async_trait]
pub trait Repository<D: Document>: Send + Sync {
    /// Stores a new document, failing with `Conflict` when the id is already taken.
    async fn create(&self, doc: &D) -> StoreResult<D::Id>;

    async fn get(&self, id: &D::Id) -> StoreResult<Option<D>>;

    /// Lists documents, optionally ordered and capped. `None` means the whole collection.
    async fn list(&self, order: Option<OrderBy<D::SortField>>, limit: Option<i64>)
    -> StoreResult<Vec<D>>;

    /// Replaces the stored document with the same id; `Ok(false)` when there is none.
    async fn update(&self, doc: &D) -> StoreResult<bool>;

    /// Removes a document; `Ok(false)` when there is none.
    async fn delete(&self, id: &D::Id) -> StoreResult<bool>;
}
