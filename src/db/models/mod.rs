use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_EVENT_PAGE;

pub mod account;
pub mod event;
pub mod goal;

/// Declares a string-backed document identifier.
macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

document_id!(
    /// Identity-provider subject id; doubles as the account document id.
    AccountId
);
document_id!(EventId);
document_id!(GoalId);

#[inline]
fn default_event_page() -> Option<i64> {
    Some(DEFAULT_EVENT_PAGE)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventPage {
    #[serde(default = "default_event_page")]
    pub limit: Option<i64>,
}

pub mod prelude {
    pub use super::account::{Account, Role};
    pub use super::event::{PointEvent, ReasonCode};
    pub use super::goal::Goal;
    pub use super::{AccountId, EventId, GoalId};
}
