pub mod verify_identity;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, Method};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::constants::{
    IDENTITY_EMAIL_HEADER, IDENTITY_ID_HEADER, IDENTITY_SIGNATURE_HEADER,
    IDENTITY_TIMESTAMP_HEADER,
};
use crate::util::env::{EnvErr, Var};
use crate::var;

pub type MiddlewareResult<T> = core::result::Result<T, MiddlewareErr>;

#[derive(Debug, Error)]
pub enum MiddlewareErr {
    #[error(transparent)]
    EnvErr(#[from] EnvErr),

    #[error("invalid CORS origin '{0}'")]
    InvalidOrigin(String),
}

/// CORS from `CORS_ALLOW_ORIGINS`: `*` or a comma-separated list of exact origins.
pub async fn cors() -> MiddlewareResult<CorsLayer> {
    cors_for(var!(Var::CorsAllowOrigins).await?)
}

fn cors_for(allowed: &str) -> MiddlewareResult<CorsLayer> {
    let origins = if allowed.trim() == "*" {
        AllowOrigin::any()
    } else {
        let list = allowed
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| MiddlewareErr::InvalidOrigin(o.to_owned()))
            })
            .collect::<MiddlewareResult<Vec<_>>>()?;

        AllowOrigin::list(list)
    };

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(IDENTITY_ID_HEADER),
            HeaderName::from_static(IDENTITY_EMAIL_HEADER),
            HeaderName::from_static(IDENTITY_TIMESTAMP_HEADER),
            HeaderName::from_static(IDENTITY_SIGNATURE_HEADER),
        ])
        .allow_origin(origins))
}
