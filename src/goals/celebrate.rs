use serde::{Deserialize, Serialize};

use crate::db::models::GoalId;
use crate::db::models::goal::Goal;

/// Per-session memory of the last goal that was celebrated.
///
/// The value is owned by the caller and threaded through [`Celebration::observe`]; nothing here
/// is shared between sessions or persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Celebration {
    pub last_celebrated: Option<GoalId>,
}

impl Celebration {
    pub fn new(last_celebrated: Option<GoalId>) -> Self {
        Self { last_celebrated }
    }

    /// Feeds the current most-recently-achieved goal, returning the updated memory and whether
    /// to celebrate.
    ///
    /// Fires only when an achieved goal differs from the one last celebrated. Having no achieved
    /// goal leaves the memory alone, so falling below a goal and climbing back to it stays quiet.
    #[must_use]
    pub fn observe(self, latest_achieved: Option<&Goal>) -> (Self, bool) {
        match latest_achieved {
            Some(goal) if self.last_celebrated.as_ref() != Some(&goal.id) => {
                tracing::debug!(goal = %goal.id, "goal achieved");
                (Self::new(Some(goal.id.clone())), true)
            }
            _ => (self, false),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::goals::resolver::latest_achieved;

    fn goals() -> Vec<Goal> {
        vec![
            Goal {
                id: "a".into(),
                point: 100,
                label: "A".into(),
            },
            Goal {
                id: "b".into(),
                point: 300,
                label: "B".into(),
            },
        ]
    }

    /// Runs the totals through the resolver and returns which observations fired.
    fn fire_pattern(totals: &[i64]) -> Vec<bool> {
        let goals = goals();
        let mut memory = Celebration::default();
        let mut fired = Vec::new();

        for total in totals {
            let (next, celebrate) = memory.observe(latest_achieved(&goals, *total));
            memory = next;
            fired.push(celebrate);
        }

        fired
    }

    #[test]
    fn test_repeated_recompute_fires_once() {
        assert_eq!(
            fire_pattern(&[150, 150, 150, 160]),
            [true, false, false, false]
        );
    }

    #[test]
    fn test_each_new_goal_fires_once() {
        assert_eq!(
            fire_pattern(&[50, 120, 320, 330, 500]),
            [false, true, true, false, false]
        );
    }

    #[test]
    fn test_dip_below_and_restore_does_not_refire() {
        assert_eq!(fire_pattern(&[120, 80, 120]), [true, false, false]);
    }

    #[test]
    fn test_identity_change_rearms() {
        // b celebrated, corrected back down to a: a differs from b, so it fires again
        assert_eq!(fire_pattern(&[320, 150, 150]), [true, true, false]);
    }

    #[test]
    fn test_memory_threads_through_caller() {
        let goals = goals();
        let memory = Celebration::new(Some("a".into()));

        let (memory, fired) = memory.observe(latest_achieved(&goals, 150));
        assert!(!fired);
        assert_eq!(memory.last_celebrated, Some("a".into()));

        let (memory, fired) = memory.observe(latest_achieved(&goals, 300));
        assert!(fired);
        assert_eq!(memory.last_celebrated, Some("b".into()));
    }
}
