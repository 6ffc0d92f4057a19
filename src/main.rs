use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use points_tree_server::api::server::{AppState, RouteError, start_server};
use points_tree_server::auth::prelude::AccountService;
use points_tree_server::db::prelude::*;
use points_tree_server::goals::GoalBook;
use points_tree_server::ledger::LedgerEngine;
use points_tree_server::util::env::{self, EnvErr, Var};
use points_tree_server::util::telemetry;
use points_tree_server::var;

#[derive(Debug, Error)]
enum RunnerErr {
    #[error(transparent)]
    Env(#[from] EnvErr),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Std(#[from] Box<dyn std::error::Error>),
}

type Result<T> = core::result::Result<T, RunnerErr>;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_registry = telemetry::Telemetry::new().await?.register();

    tracing::info!("starting points tree server");

    let config = env::config().await?;
    let pool = db_pool().await?;

    let accounts = AccountService::new(
        Arc::new(PgRepository::<Account>::new(pool)),
        &config.admin_emails,
    );
    let ledger = LedgerEngine::new(Arc::new(PgRepository::<PointEvent>::new(pool)));
    let goals = GoalBook::new(Arc::new(PgRepository::<Goal>::new(pool)));

    let secret = var!(Var::IdentitySharedSecret).await?;
    let state = AppState::new(ledger, goals, accounts, secret);

    let handles = start_server(state).await?;
    _ = join_all(handles).await;

    telemetry_registry.shutdown();
    Ok(())
}
