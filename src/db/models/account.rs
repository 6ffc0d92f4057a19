use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AccountId;
use crate::db::repositories::{Document, SortKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

/// Account document, `accounts/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "Role::initial")]
    pub role: Role,
    #[serde(default)]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub enum AccountSort {
    CreatedAt,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Editor, Role::Admin];

    /// Role held by an account that was not bootstrapped from the admin allow-list.
    pub const fn initial() -> Self {
        Role::Viewer
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Document for Account {
    type Id = AccountId;
    type SortField = AccountSort;

    const COLLECTION: &'static str = "accounts";

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn sort_key(&self, field: Self::SortField) -> SortKey {
        match field {
            AccountSort::CreatedAt => SortKey::Time(self.created_at),
        }
    }

    fn sort_expr(field: Self::SortField) -> &'static str {
        match field {
            AccountSort::CreatedAt => "(doc->>'createdAt')::timestamptz",
        }
    }
}
