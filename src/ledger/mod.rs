//! Point ledger: recording, revising and removing events, and the running total.
//!
//! The total is never persisted. It is recomputed from the full event set on every read, which
//! keeps concurrent writers from racing on a shared counter.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::auth::Actor;
use crate::auth::matrix::{Operation, authorize};
use crate::constants::{DEFAULT_EVENT_PAGE, MAX_EVENT_PAGE};
use crate::db::models::EventId;
use crate::db::models::event::{EventSort, PointEvent};
use crate::db::repositories::{Document, OrderBy, Repository};
use crate::error::{CoreError, CoreResult, ValidationError};

pub mod validate;

pub use validate::{EventInput, EventRevision};

/// Sum of all deltas. Order-independent, `0` for no events, saturating at the `i64` bounds.
pub fn total<'a, I>(events: I) -> i64
where
    I: IntoIterator<Item = &'a PointEvent>,
{
    events
        .into_iter()
        .fold(0i64, |acc, event| acc.saturating_add(event.delta))
}

/// Resolves a requested page size, defaulting to `DEFAULT_EVENT_PAGE`.
///
/// `0` is honoured and yields an empty page. Negative sizes are rejected; anything above
/// `MAX_EVENT_PAGE` is capped.
pub fn page_limit(requested: Option<i64>) -> Result<i64, ValidationError> {
    match requested.unwrap_or(DEFAULT_EVENT_PAGE) {
        n if n < 0 => Err(ValidationError::NegativePageLimit(n)),
        n => Ok(n.min(MAX_EVENT_PAGE)),
    }
}

#[derive(Clone)]
pub struct LedgerEngine {
    events: Arc<dyn Repository<PointEvent>>,
}

impl LedgerEngine {
    pub fn new(events: Arc<dyn Repository<PointEvent>>) -> Self {
        Self { events }
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.id, delta = input.delta))]
    pub async fn record_event(&self, actor: &Actor, input: EventInput) -> CoreResult<PointEvent> {
        authorize(actor, None, Operation::CreateEvent)?;
        let fields = input.validate()?;

        let now = Utc::now();
        let event = PointEvent {
            id: EventId::generate(),
            delta: fields.delta,
            occurred_on: fields.occurred_on,
            reason_code: fields.reason_code,
            reason_text: fields.reason_text,
            note: fields.note,
            created_by: actor.id.clone(),
            created_by_name: actor.name.clone(),
            created_at: now,
            updated_at: now,
        };

        self.events.create(&event).await?;
        tracing::info!(id = %event.id, "recorded event");

        Ok(event)
    }

    #[instrument(skip(self, actor, revision), fields(actor = %actor.id))]
    pub async fn revise_event(
        &self,
        id: &EventId,
        revision: EventRevision,
        actor: &Actor,
    ) -> CoreResult<PointEvent> {
        let mut event = self.load(id).await?;
        authorize(actor, Some(&event.created_by), Operation::EditEvent)?;

        let fields = revision.fields.validate()?;
        if revision.created_by.is_some_and(|by| by != event.created_by) {
            return Err(ValidationError::ImmutableField("createdBy").into());
        }
        if revision.created_at.is_some_and(|at| at != event.created_at) {
            return Err(ValidationError::ImmutableField("createdAt").into());
        }

        event.delta = fields.delta;
        event.occurred_on = fields.occurred_on;
        event.reason_code = fields.reason_code;
        event.reason_text = fields.reason_text;
        event.note = fields.note;
        event.updated_at = Utc::now().max(event.created_at);

        // deleted between our read and this write
        if !self.events.update(&event).await? {
            return Err(CoreError::not_found(PointEvent::COLLECTION, id));
        }

        tracing::info!("revised event");
        Ok(event)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn remove_event(&self, id: &EventId, actor: &Actor) -> CoreResult<()> {
        let event = self.load(id).await?;
        authorize(actor, Some(&event.created_by), Operation::DeleteEvent)?;

        if !self.events.delete(id).await? {
            return Err(CoreError::not_found(PointEvent::COLLECTION, id));
        }

        tracing::info!("removed event");
        Ok(())
    }

    pub async fn get_event(&self, id: &EventId) -> CoreResult<PointEvent> {
        self.load(id).await
    }

    /// Most recent first, sized by [`page_limit`].
    #[instrument(skip(self))]
    pub async fn list_events(&self, limit: Option<i64>) -> CoreResult<Vec<PointEvent>> {
        let limit = page_limit(limit)?;
        Ok(self
            .events
            .list(Some(OrderBy::desc(EventSort::CreatedAt)), Some(limit))
            .await?)
    }

    /// Re-reads every event and sums the deltas.
    #[instrument(skip(self))]
    pub async fn current_total(&self) -> CoreResult<i64> {
        let events = self.events.list(None, None).await?;
        let total = total(&events);
        tracing::debug!(total, events = events.len(), "recomputed total");

        Ok(total)
    }

    async fn load(&self, id: &EventId) -> CoreResult<PointEvent> {
        self.events
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(PointEvent::COLLECTION, id))
    }
}
