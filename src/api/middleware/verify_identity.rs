use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::HeaderMap;
use http::request::Parts;
use ring::hmac::{self, Key};

use crate::api::server::{AppState, RouteError};
use crate::auth::Actor;
use crate::auth::identity::Identity;
use crate::constants::{
    HMAC_PREFIX, IDENTITY_EMAIL_HEADER, IDENTITY_ID_HEADER, IDENTITY_SIGNATURE_HEADER,
    IDENTITY_TIMESTAMP_HEADER,
};
use crate::error::{CoreError, NotAuthenticated};

/// Key shared with the identity gateway.
pub fn identity_key(secret: &str) -> Key {
    Key::new(hmac::HMAC_SHA256, secret.as_bytes())
}

/// The actor resolved from the verified identity headers.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

/// Rejects requests whose identity headers are missing or not signed with the shared key, then
/// resolves (bootstrapping on first sight) the caller's account.
pub async fn verify_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, RouteError> {
    let identity = match verified_identity(&state.identity_key, req.headers()) {
        Ok(identity) => identity,
        Err(reason) => {
            tracing::warn!(reason, uri = %req.uri(), "rejected identity headers");
            return Err(CoreError::from(NotAuthenticated).into());
        }
    };

    let actor = state.accounts.actor_for(&identity).await?;
    req.extensions_mut().insert(CurrentActor(actor));

    Ok(next.run(req).await)
}

fn verified_identity(key: &Key, headers: &HeaderMap) -> Result<Identity, &'static str> {
    let id = header(headers, IDENTITY_ID_HEADER)
        .filter(|id| !id.trim().is_empty())
        .ok_or("missing identity id")?;
    let email = header(headers, IDENTITY_EMAIL_HEADER).filter(|email| !email.is_empty());
    let timestamp = header(headers, IDENTITY_TIMESTAMP_HEADER).ok_or("missing timestamp")?;

    let signature = header(headers, IDENTITY_SIGNATURE_HEADER)
        .and_then(|s| s.strip_prefix(HMAC_PREFIX))
        .ok_or("missing signature")?;
    let signature = hex::decode(signature).map_err(|_| "signature is not hex")?;

    let message = signed_message(id, email.unwrap_or_default(), timestamp);
    hmac::verify(key, &message, &signature).map_err(|_| "signature mismatch")?;

    Ok(Identity {
        id: id.trim().into(),
        email: email.map(str::to_owned),
    })
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `id \n email \n timestamp`. Header values cannot carry a newline, so field boundaries are
/// unambiguous.
fn signed_message(id: &str, email: &str, timestamp: &str) -> Vec<u8> {
    [id, email, timestamp].join("\n").into_bytes()
}

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = RouteError;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentActor>()
            .cloned()
            .ok_or_else(|| CoreError::from(NotAuthenticated).into())
    }
}

/// Produces the signature header value the gateway would send.
#[cfg(test)]
pub fn sign_identity(key: &Key, id: &str, email: Option<&str>, timestamp: &str) -> String {
    let tag = hmac::sign(key, &signed_message(id, email.unwrap_or_default(), timestamp));
    format!("{}{}", HMAC_PREFIX, hex::encode(tag))
}
