use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::middleware::verify_identity::CurrentActor;
use crate::api::server::{AppState, JsonResult, RouteError};
use crate::auth::Actor;
use crate::db::models::EventPage;
use crate::db::models::event::ReasonEntry;
use crate::db::prelude::*;
use crate::goals::{Celebration, GoalInput, Progress};
use crate::ledger::{EventInput, EventRevision};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    #[serde(default)]
    pub last_celebrated: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub progress: Progress,
    pub celebrate: bool,
    pub last_celebrated: Option<GoalId>,
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct NameChange {
    pub name: String,
}

pub async fn me(CurrentActor(actor): CurrentActor) -> Json<Actor> {
    Json(actor)
}

pub async fn reasons() -> Json<Vec<ReasonEntry>> {
    Json(ReasonCode::catalogue())
}

/// Recomputes the total and goal standing, then feeds the caller's celebration memory
/// (`lastCelebrated`) through it.
#[instrument(skip(state))]
pub async fn progress(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> JsonResult<ProgressResponse> {
    let total = state.ledger.current_total().await?;
    let progress = state.goals.progress(total).await?;

    let memory = Celebration::new(
        query
            .last_celebrated
            .filter(|id| !id.trim().is_empty())
            .map(GoalId::from),
    );
    let (memory, celebrate) = memory.observe(progress.latest_achieved.as_ref());

    Ok(Json(ProgressResponse {
        progress,
        celebrate,
        last_celebrated: memory.last_celebrated,
    }))
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(page): Query<EventPage>,
) -> JsonResult<Vec<PointEvent>> {
    Ok(Json(state.ledger.list_events(page.limit).await?))
}

#[instrument(skip(state, actor))]
pub async fn record_event(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<EventInput>,
) -> Result<(StatusCode, Json<PointEvent>), RouteError> {
    let event = state.ledger.record_event(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[instrument(skip(state, actor))]
pub async fn revise_event(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<EventId>,
    Json(revision): Json<EventRevision>,
) -> JsonResult<PointEvent> {
    Ok(Json(state.ledger.revise_event(&id, revision, &actor).await?))
}

#[instrument(skip(state, actor))]
pub async fn remove_event(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<EventId>,
) -> Result<StatusCode, RouteError> {
    state.ledger.remove_event(&id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_goals(State(state): State<Arc<AppState>>) -> JsonResult<Vec<Goal>> {
    Ok(Json(state.goals.list_goals().await?))
}

#[instrument(skip(state, actor))]
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<GoalInput>,
) -> Result<(StatusCode, Json<Goal>), RouteError> {
    let goal = state.goals.create_goal(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

#[instrument(skip(state, actor))]
pub async fn edit_goal(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<GoalId>,
    Json(input): Json<GoalInput>,
) -> JsonResult<Goal> {
    Ok(Json(state.goals.edit_goal(&actor, &id, input).await?))
}

#[instrument(skip(state, actor))]
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<GoalId>,
) -> Result<StatusCode, RouteError> {
    state.goals.delete_goal(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, actor))]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
) -> JsonResult<Vec<Account>> {
    Ok(Json(state.accounts.list_accounts(&actor).await?))
}

#[instrument(skip(state, actor))]
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<AccountId>,
    Json(change): Json<RoleChange>,
) -> JsonResult<Account> {
    Ok(Json(state.accounts.set_role(&actor, &id, change.role).await?))
}

#[instrument(skip(state, actor))]
pub async fn set_display_name(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<AccountId>,
    Json(change): Json<NameChange>,
) -> JsonResult<Account> {
    Ok(Json(
        state
            .accounts
            .set_display_name(&actor, &id, &change.name)
            .await?,
    ))
}
