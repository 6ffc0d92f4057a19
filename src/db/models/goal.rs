use serde::{Deserialize, Serialize};

use super::GoalId;
use crate::db::repositories::{Document, SortKey};
use crate::util::normalize::lenient_i64;

/// Goal document, `goals/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub point: i64,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Copy)]
pub enum GoalSort {
    Point,
}

impl Document for Goal {
    type Id = GoalId;
    type SortField = GoalSort;

    const COLLECTION: &'static str = "goals";

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn sort_key(&self, field: Self::SortField) -> SortKey {
        match field {
            GoalSort::Point => SortKey::Int(self.point),
        }
    }

    fn sort_expr(field: Self::SortField) -> &'static str {
        match field {
            GoalSort::Point => "trunc(try_numeric(doc->>'point'))",
        }
    }
}
