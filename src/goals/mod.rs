use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use crate::auth::Actor;
use crate::auth::matrix::{Operation, authorize};
use crate::db::models::GoalId;
use crate::db::models::goal::{Goal, GoalSort};
use crate::db::repositories::{Document, OrderBy, Repository};
use crate::error::{CoreError, CoreResult, ValidationError};

pub mod celebrate;
pub mod resolver;

pub use celebrate::Celebration;
pub use resolver::Progress;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalInput {
    pub point: i64,
    pub label: String,
}

impl GoalInput {
    fn validate(&self) -> Result<(i64, String), ValidationError> {
        if self.point <= 0 {
            return Err(ValidationError::InvalidGoalPoint(self.point));
        }

        let label = self.label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptyGoalLabel);
        }

        Ok((self.point, label.to_owned()))
    }
}

/// Goal administration and progress lookups.
#[derive(Clone)]
pub struct GoalBook {
    goals: Arc<dyn Repository<Goal>>,
}

impl GoalBook {
    pub fn new(goals: Arc<dyn Repository<Goal>>) -> Self {
        Self { goals }
    }

    /// Ascending by point; equal points keep insertion order. Stored goals whose point decodes
    /// to zero or below are not real goals and are left out.
    #[instrument(skip(self))]
    pub async fn list_goals(&self) -> CoreResult<Vec<Goal>> {
        let mut goals = self
            .goals
            .list(Some(OrderBy::asc(GoalSort::Point)), None)
            .await?;

        goals.retain(|goal| {
            let valid = goal.point > 0;
            if !valid {
                tracing::warn!(id = %goal.id, point = goal.point, "skipping goal without a positive point");
            }
            valid
        });

        Ok(goals)
    }

    #[instrument(skip(self))]
    pub async fn progress(&self, total: i64) -> CoreResult<Progress> {
        let goals = self.list_goals().await?;
        Ok(resolver::resolve(&goals, total))
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn create_goal(&self, actor: &Actor, input: GoalInput) -> CoreResult<Goal> {
        authorize(actor, None, Operation::CreateGoal)?;
        let (point, label) = input.validate()?;

        let goal = Goal {
            id: GoalId::generate(),
            point,
            label,
        };

        self.goals.create(&goal).await?;
        tracing::info!(id = %goal.id, point, "created goal");
        Ok(goal)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn edit_goal(&self, actor: &Actor, id: &GoalId, input: GoalInput) -> CoreResult<Goal> {
        authorize(actor, None, Operation::EditGoal)?;
        let (point, label) = input.validate()?;

        let goal = Goal {
            id: id.clone(),
            point,
            label,
        };

        if !self.goals.update(&goal).await? {
            return Err(CoreError::not_found(Goal::COLLECTION, id));
        }

        Ok(goal)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_goal(&self, actor: &Actor, id: &GoalId) -> CoreResult<()> {
        authorize(actor, None, Operation::DeleteGoal)?;

        if !self.goals.delete(id).await? {
            return Err(CoreError::not_found(Goal::COLLECTION, id));
        }

        Ok(())
    }
}
