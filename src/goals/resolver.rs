use serde::Serialize;

use crate::db::models::goal::Goal;

/// Where a total stands against the goal list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total: i64,
    pub next_goal: Option<Goal>,
    pub remaining: i64,
    pub latest_achieved: Option<Goal>,
}

/// First unmet goal: smallest `point` above `total`, earliest listed among ties.
pub fn next_goal(goals: &[Goal], total: i64) -> Option<&Goal> {
    goals
        .iter()
        .filter(|g| g.point > total)
        .min_by_key(|g| g.point)
}

/// Highest goal already met: largest `point` at or below `total`, latest listed among ties.
///
/// Does not assume `goals` is sorted.
pub fn latest_achieved(goals: &[Goal], total: i64) -> Option<&Goal> {
    goals
        .iter()
        .filter(|g| g.point <= total)
        .max_by_key(|g| g.point)
}

pub fn remaining(next: Option<&Goal>, total: i64) -> i64 {
    next.map_or(0, |g| g.point.saturating_sub(total).max(0))
}

pub fn resolve(goals: &[Goal], total: i64) -> Progress {
    let next = next_goal(goals, total);

    Progress {
        total,
        remaining: remaining(next, total),
        next_goal: next.cloned(),
        latest_achieved: latest_achieved(goals, total).cloned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn goal(id: &str, point: i64) -> Goal {
        Goal {
            id: id.into(),
            point,
            label: id.to_uppercase(),
        }
    }

    #[test]
    fn test_between_goals() {
        let goals = [goal("a", 100), goal("b", 300)];
        let progress = resolve(&goals, 250);

        assert_eq!(progress.next_goal, Some(goal("b", 300)));
        assert_eq!(progress.remaining, 50);
        assert_eq!(progress.latest_achieved, Some(goal("a", 100)));
    }

    #[test]
    fn test_no_goals() {
        let progress = resolve(&[], 42);
        assert_eq!(progress.next_goal, None);
        assert_eq!(progress.latest_achieved, None);
        assert_eq!(progress.remaining, 0);
    }

    #[test]
    fn test_boundaries() {
        let goals = [goal("a", 100), goal("b", 300)];

        // exactly on a threshold counts as achieved
        assert_eq!(latest_achieved(&goals, 100), Some(&goals[0]));
        assert_eq!(next_goal(&goals, 100), Some(&goals[1]));

        assert_eq!(latest_achieved(&goals, 99), None);
        assert_eq!(next_goal(&goals, 99), Some(&goals[0]));
        assert_eq!(remaining(next_goal(&goals, 99), 99), 1);

        assert_eq!(next_goal(&goals, 300), None);
        assert_eq!(latest_achieved(&goals, 300), Some(&goals[1]));
        assert_eq!(remaining(None, 300), 0);

        assert_eq!(latest_achieved(&goals, -50), None);
        assert_eq!(remaining(next_goal(&goals, -50), -50), 150);
    }

    #[test]
    fn test_none_iff_properties() {
        let goals = [goal("a", 30), goal("b", 10), goal("c", 20)];
        let max = 30;
        let min = 10;

        for total in -5..=40 {
            assert_eq!(next_goal(&goals, total).is_none(), total >= max, "{total}");
            assert_eq!(latest_achieved(&goals, total).is_none(), total < min, "{total}");

            if let Some(achieved) = latest_achieved(&goals, total) {
                let best = goals
                    .iter()
                    .map(|g| g.point)
                    .filter(|p| *p <= total)
                    .max()
                    .unwrap();
                assert_eq!(achieved.point, best);
            }
        }
    }

    #[test]
    fn test_unsorted_input_still_yields_max_achieved() {
        let goals = [goal("big", 300), goal("small", 100), goal("mid", 200)];
        assert_eq!(latest_achieved(&goals, 250).unwrap().id, "mid".into());
        assert_eq!(next_goal(&goals, 250).unwrap().id, "big".into());
    }

    #[test]
    fn test_ties_follow_list_order() {
        let goals = [goal("first", 100), goal("second", 100), goal("next", 200)];

        assert_eq!(next_goal(&goals, 50).unwrap().id, "first".into());
        assert_eq!(latest_achieved(&goals, 150).unwrap().id, "second".into());
    }
}
