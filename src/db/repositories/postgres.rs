use core::marker::PhantomData;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use tracing::instrument;

use super::{Document, OrderBy, Repository};
use crate::db::{StoreError, StoreResult};

/// JSONB-backed collection: one table per collection holding `(id, seq, doc)`.
#[derive(Debug)]
pub struct PgRepository<D> {
    pool: &'static Pool<Postgres>,
    _doc: PhantomData<fn() -> D>,
}

impl<D: Document> PgRepository<D> {
    pub fn new(pool: &'static Pool<Postgres>) -> Self {
        Self {
            pool,
            _doc: PhantomData,
        }
    }

    fn decode(value: serde_json::Value) -> StoreResult<D> {
        serde_json::from_value(value).map_err(StoreError::from)
    }

    /// Rows whose sort field does not cast (`NULL`) go last in either direction.
    fn order_clause(order: Option<OrderBy<D::SortField>>) -> String {
        match order {
            Some(order) => format!(
                "ORDER BY {expr} {dir} NULLS LAST, seq {dir}",
                expr = D::sort_expr(order.field),
                dir = order.direction.as_sql()
            ),
            None => String::from("ORDER BY seq ASC"),
        }
    }
}

#[async_trait]
impl<D: Document> Repository<D> for PgRepository<D> {
    #[instrument(skip(self, doc), fields(collection = D::COLLECTION, id = %doc.id()))]
    async fn create(&self, doc: &D) -> StoreResult<D::Id> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
            D::COLLECTION
        ))
        .bind(doc.id().to_string())
        .bind(Json(doc))
        .execute(self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "document insertion failure"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                collection: D::COLLECTION,
                id: doc.id().to_string(),
            });
        }

        Ok(doc.id().clone())
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION))]
    async fn get(&self, id: &D::Id) -> StoreResult<Option<D>> {
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = $1", D::COLLECTION))
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(value): Json<serde_json::Value> = row.try_get("doc")?;
                Ok(Some(Self::decode(value)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION))]
    async fn list(
        &self,
        order: Option<OrderBy<D::SortField>>,
        limit: Option<i64>,
    ) -> StoreResult<Vec<D>> {
        let rows = sqlx::query(&format!(
            "SELECT id, doc FROM {} {} LIMIT $1",
            D::COLLECTION,
            Self::order_clause(order)
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let mut output = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let Json(value): Json<serde_json::Value> = row.try_get("doc")?;

            match Self::decode(value) {
                Ok(doc) => output.push(doc),
                Err(e) => {
                    tracing::warn!(error = ?e, id = %id, "skipping undecodable document");
                }
            }
        }

        Ok(output)
    }

    #[instrument(skip(self, doc), fields(collection = D::COLLECTION, id = %doc.id()))]
    async fn update(&self, doc: &D) -> StoreResult<bool> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET doc = $2 WHERE id = $1",
            D::COLLECTION
        ))
        .bind(doc.id().to_string())
        .bind(Json(doc))
        .execute(self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "document update failure"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION))]
    async fn delete(&self, id: &D::Id) -> StoreResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", D::COLLECTION))
            .bind(id.to_string())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::models::event::{EventSort, PointEvent};
    use crate::db::models::goal::{Goal, GoalSort};

    #[test]
    fn test_order_clause_tolerates_malformed_fields() {
        assert_eq!(
            PgRepository::<Goal>::order_clause(Some(OrderBy::asc(GoalSort::Point))),
            "ORDER BY trunc(try_numeric(doc->>'point')) ASC NULLS LAST, seq ASC"
        );
        assert_eq!(
            PgRepository::<PointEvent>::order_clause(Some(OrderBy::desc(EventSort::CreatedAt))),
            "ORDER BY try_timestamptz(doc->>'createdAt') DESC NULLS LAST, seq DESC"
        );
        assert_eq!(PgRepository::<Goal>::order_clause(None), "ORDER BY seq ASC");
    }

    #[test]
    fn test_sort_exprs_avoid_raw_casts() {
        for expr in [
            Goal::sort_expr(GoalSort::Point),
            PointEvent::sort_expr(EventSort::CreatedAt),
        ] {
            assert!(!expr.contains("::"), "raw cast in {expr}");
        }
    }
}
