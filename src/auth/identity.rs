//! Identity boundary.
//!
//! Whatever authenticates users publishes the signed-in [`Identity`] into an [`IdentityFeed`].
//! Consumers subscribe through [`AccountService::watch`](super::accounts::AccountService::watch),
//! which resolves each identity to an [`Actor`] with its stored role and re-emits whenever the
//! identity or any account's role or name changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::Actor;
use super::accounts::AccountService;
use crate::db::models::AccountId;
use crate::error::CoreResult;

/// What the identity provider vouches for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: AccountId,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IdentityFeed {
    tx: Arc<watch::Sender<Option<Identity>>>,
}

impl IdentityFeed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn sign_in(&self, identity: Identity) {
        tracing::debug!(id = %identity.id, "identity signed in");
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        tracing::debug!("identity signed out");
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

impl Default for IdentityFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorState {
    SignedIn(Actor),
    SignedOut,
}

/// Subscription to actor changes. Dropping it (or calling [`ActorWatch::cancel`]) unsubscribes.
pub struct ActorWatch {
    identity: watch::Receiver<Option<Identity>>,
    revisions: watch::Receiver<u64>,
    accounts: AccountService,
    primed: bool,
}

impl ActorWatch {
    pub(super) fn new(
        identity: watch::Receiver<Option<Identity>>,
        revisions: watch::Receiver<u64>,
        accounts: AccountService,
    ) -> Self {
        Self {
            identity,
            revisions,
            accounts,
            primed: false,
        }
    }

    /// Waits for the next actor state. The first call resolves the current state immediately;
    /// `None` means the identity feed has gone away.
    pub async fn next(&mut self) -> Option<CoreResult<ActorState>> {
        if self.primed {
            tokio::select! {
                changed = self.identity.changed() => changed.ok()?,
                changed = self.revisions.changed() => changed.ok()?,
            }
        }

        self.primed = true;
        self.revisions.borrow_and_update();
        let identity = self.identity.borrow_and_update().clone();

        Some(match identity {
            Some(identity) => self
                .accounts
                .actor_for(&identity)
                .await
                .map(ActorState::SignedIn),
            None => Ok(ActorState::SignedOut),
        })
    }

    pub fn cancel(self) {}
}
