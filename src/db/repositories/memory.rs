use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Direction, Document, OrderBy, Repository};
use crate::db::{StoreError, StoreResult};

/// In-process collection used by the service tests. Keeps insertion order and can be switched
/// offline to exercise store failures.
#[derive(Debug)]
pub struct MemoryRepository<D> {
    docs: RwLock<Vec<D>>,
    offline: AtomicBool,
}

impl<D: Document> MemoryRepository<D> {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> Vec<D> {
        self.docs.read().await.clone()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!(
                "{} collection is offline",
                D::COLLECTION
            )))
        } else {
            Ok(())
        }
    }
}

impl<D: Document> Default for MemoryRepository<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: Document> Repository<D> for MemoryRepository<D> {
    async fn create(&self, doc: &D) -> StoreResult<D::Id> {
        self.check_online()?;
        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.id() == doc.id()) {
            return Err(StoreError::Conflict {
                collection: D::COLLECTION,
                id: doc.id().to_string(),
            });
        }

        docs.push(doc.clone());
        Ok(doc.id().clone())
    }

    async fn get(&self, id: &D::Id) -> StoreResult<Option<D>> {
        self.check_online()?;
        Ok(self.docs.read().await.iter().find(|d| d.id() == id).cloned())
    }

    async fn list(
        &self,
        order: Option<OrderBy<D::SortField>>,
        limit: Option<i64>,
    ) -> StoreResult<Vec<D>> {
        self.check_online()?;
        let mut docs = self.docs.read().await.clone();

        if let Some(order) = order {
            match order.direction {
                Direction::Asc => docs.sort_by_key(|d| d.sort_key(order.field)),
                Direction::Desc => {
                    // newest insertion first among equal keys
                    docs.reverse();
                    docs.sort_by(|a, b| b.sort_key(order.field).cmp(&a.sort_key(order.field)));
                }
            }
        }

        if let Some(limit) = limit {
            docs.truncate(usize::try_from(limit).unwrap_or(0));
        }

        Ok(docs)
    }

    async fn update(&self, doc: &D) -> StoreResult<bool> {
        self.check_online()?;
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.id() == doc.id()) {
            Some(existing) => {
                *existing = doc.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &D::Id) -> StoreResult<bool> {
        self.check_online()?;
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.id() != id);
        Ok(docs.len() != before)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::models::goal::{Goal, GoalSort};

    fn goal(id: &str, point: i64) -> Goal {
        Goal {
            id: id.into(),
            point,
            label: id.into(),
        }
    }

    #[tokio::test]
    async fn test_default_starts_empty_and_online() {
        let repo = MemoryRepository::<Goal>::default();
        assert!(repo.snapshot().await.is_empty());

        repo.create(&goal("a", 20)).await.unwrap();
        repo.create(&goal("b", 10)).await.unwrap();
        assert!(matches!(
            repo.create(&goal("a", 5)).await,
            Err(StoreError::Conflict { .. })
        ));

        let listed = repo
            .list(Some(OrderBy::asc(GoalSort::Point)), Some(0))
            .await
            .unwrap();
        assert!(listed.is_empty());

        let listed = repo
            .list(Some(OrderBy::asc(GoalSort::Point)), None)
            .await
            .unwrap();
        assert_eq!(listed, vec![goal("b", 10), goal("a", 20)]);

        repo.set_offline(true);
        assert!(matches!(repo.get(&"a".into()).await, Err(StoreError::Unavailable(_))));
    }
}
