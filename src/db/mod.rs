use std::sync::LazyLock;

use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::util::env::{self, Var};
use crate::var;

pub mod models;
pub mod repositories;

pub mod prelude {
    pub use crate::db::db_pool;
    pub use crate::db::{StoreError, StoreResult};

    pub use crate::db::models::prelude::*;
    pub use crate::db::repositories::postgres::PgRepository;
    pub use crate::db::repositories::{Document, OrderBy, Repository};
}

static DB_POOL: LazyLock<OnceCell<Db>> = LazyLock::new(OnceCell::new);

/// Connects on first use and applies pending migrations.
pub async fn db_pool() -> StoreResult<&'static PgPool> {
    Ok(&DB_POOL
        .get_or_try_init(|| async { Db::new_pool().await })
        .await?
        .pool)
}

struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn new_pool() -> StoreResult<Self> {
        let db_url = var!(Var::DatabaseUrl).await?;
        let pool = sqlx::PgPool::connect(db_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("document store migrations applied");

        Ok(Self { pool })
    }
}

pub type StoreResult<T> = core::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    SqlxError(#[from] sqlx::Error),

    #[error(transparent)]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("malformed document: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("{collection}/{id} already exists")]
    Conflict { collection: &'static str, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    EnvError(#[from] env::EnvErr),
}
