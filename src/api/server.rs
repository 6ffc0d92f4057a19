use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::ParseIntError;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{Next, from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use http::StatusCode;
use ring::hmac::Key;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::handler::*;
use crate::api::middleware::verify_identity::{identity_key, verify_identity};
use crate::api::middleware::{MiddlewareErr, cors};
use crate::auth::prelude::AccountService;
use crate::error::CoreError;
use crate::goals::GoalBook;
use crate::ledger::LedgerEngine;
use crate::util::env::{EnvErr, Var};
use crate::var;

pub type JsonResult<T> = core::result::Result<Json<T>, RouteError>;

#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerEngine,
    pub goals: GoalBook,
    pub accounts: AccountService,
    pub identity_key: Key,
}

impl AppState {
    pub fn new(
        ledger: LedgerEngine,
        goals: GoalBook,
        accounts: AccountService,
        identity_secret: &str,
    ) -> Self {
        Self {
            ledger,
            goals,
            accounts,
            identity_key: identity_key(identity_secret),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .route("/me", get(me))
        .route("/reasons", get(reasons))
        .route("/progress", get(progress))
        //
        // ledger
        .route("/events", get(list_events).post(record_event))
        .route("/events/{id}", put(revise_event).delete(remove_event))
        //
        // goals
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/{id}", put(edit_goal).delete(delete_goal))
        //
        // account administration
        .route("/accounts", get(list_accounts))
        .route("/accounts/{id}/role", put(set_role))
        .route("/accounts/{id}/name", put(set_display_name))
        .route_layer(from_fn_with_state(state.clone(), verify_identity));

    Router::new()
        .merge(authenticated)
        .route("/", get(|| async { Response::new(Body::empty()) }))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method();
                let uri = req.uri();

                let matched_path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|matched| matched.as_str());

                tracing::debug_span!("api_request", ?method, ?uri, ?matched_path)
            }),
        )
        .layer(from_fn(log_route_errors))
        .with_state(state)
}

/// Logs any `RouteError` a handler stashed in the response extensions.
#[instrument(skip(request, next), fields(uri = request.uri().to_string()))]
async fn log_route_errors(request: Request, next: Next) -> Response {
    let res = next.run(request).await;
    if let Some(err) = res.extensions().get::<Arc<RouteError>>() {
        tracing::error!(error = ?err, "error occurred inside route handler");
    }

    res
}

/// Binds `SERVER_API_PORT` and serves until ctrl-c.
#[instrument(skip(state))]
pub async fn start_server(state: AppState) -> Result<Vec<JoinHandle<()>>, RouteError> {
    let port = var!(Var::ServerApiPort).await?.parse::<u16>()?;
    let app = router(Arc::new(state)).layer(cors().await?);

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port);
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;

    tracing::info!(
        server_url = &format!("http://127.0.0.1:{}", socket_addr.port()),
        "server ready"
    );

    let server_handle = tokio::task::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            tracing::error!(error = ?e, "server exited with error");
        }
    });

    Ok(vec![server_handle])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "unable to listen for shutdown signal");
        return;
    }

    tracing::info!("shutdown requested");
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Env(#[from] EnvErr),

    #[error(transparent)]
    Middleware(#[from] MiddlewareErr),

    #[error("invalid port: {0}")]
    InvalidPort(#[from] ParseIntError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let message = self.to_string();
        let (status, err) = match &self {
            RouteError::Core(core) => match core {
                // caller mistakes, not ours to log
                CoreError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, None),
                CoreError::Forbidden { .. } => (StatusCode::FORBIDDEN, None),
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, None),
                CoreError::NotAuthenticated(_) => (StatusCode::UNAUTHORIZED, None),
                CoreError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, Some(self)),
            },

            RouteError::Env(_)
            | RouteError::Middleware(_)
            | RouteError::InvalidPort(_)
            | RouteError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, Some(self)),
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();
        if let Some(err) = err {
            response.extensions_mut().insert(Arc::new(err));
        }

        response
    }
}
