use core::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, EventId};
use crate::db::repositories::{Document, SortKey};
use crate::util::normalize::lenient_i64;

/// Fixed reason catalogue; `Other` requires free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasonCode {
    Help,
    Kind,
    Smile,
    Clean,
    Promise,
    Other,
}

/// Point event document, `events/{id}`
///
/// `delta` is decoded leniently: documents written by other clients with a missing or
/// non-numeric delta read back as `0` so they never poison the running total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointEvent {
    pub id: EventId,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub delta: i64,
    pub occurred_on: NaiveDate,
    pub reason_code: ReasonCode,
    #[serde(default)]
    pub reason_text: String,
    #[serde(default)]
    pub note: String,
    pub created_by: AccountId,
    #[serde(default)]
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub enum EventSort {
    CreatedAt,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReasonEntry {
    pub code: ReasonCode,
    pub label: &'static str,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 6] = [
        ReasonCode::Help,
        ReasonCode::Kind,
        ReasonCode::Smile,
        ReasonCode::Clean,
        ReasonCode::Promise,
        ReasonCode::Other,
    ];

    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(code))
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Help => "help",
            ReasonCode::Kind => "kind",
            ReasonCode::Smile => "smile",
            ReasonCode::Clean => "clean",
            ReasonCode::Promise => "promise",
            ReasonCode::Other => "other",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            ReasonCode::Help => "helped out",
            ReasonCode::Kind => "said something kind",
            ReasonCode::Smile => "made someone smile",
            ReasonCode::Clean => "tidied or cleaned up",
            ReasonCode::Promise => "kept a promise",
            ReasonCode::Other => "other (free text)",
        }
    }

    pub fn catalogue() -> Vec<ReasonEntry> {
        Self::ALL
            .into_iter()
            .map(|code| ReasonEntry {
                code,
                label: code.label(),
            })
            .collect()
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Document for PointEvent {
    type Id = EventId;
    type SortField = EventSort;

    const COLLECTION: &'static str = "events";

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn sort_key(&self, field: Self::SortField) -> SortKey {
        match field {
            EventSort::CreatedAt => SortKey::Time(self.created_at),
        }
    }

    fn sort_expr(field: Self::SortField) -> &'static str {
        match field {
            EventSort::CreatedAt => "try_timestamptz(doc->>'createdAt')",
        }
    }
}
