//! Permission matrix.
//!
//! Every mutation in the service asks [`can_perform`] (or [`authorize`]) and nothing else. Note
//! that deleting an event is narrower than editing one: an admin may correct anyone's event but
//! may only delete their own.

use core::fmt;

use serde::Serialize;

use crate::auth::Actor;
use crate::db::models::AccountId;
use crate::db::models::account::Role;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    CreateEvent,
    EditEvent,
    DeleteEvent,
    CreateGoal,
    EditGoal,
    DeleteGoal,
    ChangeRole,
    ChangeDisplayName,
    ListAccounts,
}

/// How the acting account relates to the resource's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Own,
    Other,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::CreateEvent,
        Operation::EditEvent,
        Operation::DeleteEvent,
        Operation::CreateGoal,
        Operation::EditGoal,
        Operation::DeleteGoal,
        Operation::ChangeRole,
        Operation::ChangeDisplayName,
        Operation::ListAccounts,
    ];
}

impl Ownership {
    pub fn of(actor: &AccountId, owner: &AccountId) -> Self {
        if actor == owner {
            Ownership::Own
        } else {
            Ownership::Other
        }
    }
}

/// The decision table. `ownership` is ignored by operations that have no owner.
pub const fn can_perform(role: Role, ownership: Ownership, operation: Operation) -> bool {
    use Operation::*;
    use Ownership::*;
    use Role::*;

    match (operation, role, ownership) {
        (CreateEvent, Editor | Admin, _) => true,
        (EditEvent, Editor, Own) => true,
        (EditEvent, Admin, _) => true,
        (DeleteEvent, Editor | Admin, Own) => true,
        (CreateGoal | EditGoal | DeleteGoal, Admin, _) => true,
        (ChangeRole, Admin, Other) => true,
        (ChangeDisplayName, Viewer | Editor, Own) => true,
        (ChangeDisplayName, Admin, _) => true,
        (ListAccounts, Admin, _) => true,
        _ => false,
    }
}

/// Checks `operation` for `actor` against a resource owned by `owner` (if it has one).
pub fn authorize(actor: &Actor, owner: Option<&AccountId>, operation: Operation) -> CoreResult<()> {
    let ownership = owner.map_or(Ownership::Other, |owner| Ownership::of(&actor.id, owner));

    if can_perform(actor.role, ownership, operation) {
        Ok(())
    } else {
        tracing::debug!(actor = %actor.id, role = %actor.role, ?operation, ?ownership, "denied");
        Err(CoreError::forbidden(operation))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::CreateEvent => "create events",
            Operation::EditEvent => "edit this event",
            Operation::DeleteEvent => "delete this event",
            Operation::CreateGoal => "create goals",
            Operation::EditGoal => "edit goals",
            Operation::DeleteGoal => "delete goals",
            Operation::ChangeRole => "change this account's role",
            Operation::ChangeDisplayName => "rename this account",
            Operation::ListAccounts => "list accounts",
        })
    }
}
