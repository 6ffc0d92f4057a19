use serde::Serialize;

use crate::db::models::AccountId;
use crate::db::models::account::{Account, Role};

pub mod accounts;
pub mod identity;
pub mod matrix;

pub mod prelude {
    pub use super::Actor;
    pub use super::accounts::AccountService;
    pub use super::identity::{ActorState, ActorWatch, Identity, IdentityFeed};
    pub use super::matrix::{Operation, Ownership, authorize, can_perform};
}

/// The authenticated account performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: AccountId,
    pub email: Option<String>,
    pub name: String,
    pub role: Role,
}

impl From<Account> for Actor {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            role: account.role,
        }
    }
}
