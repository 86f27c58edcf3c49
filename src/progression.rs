//! Progression math: map a user's total XP onto the level table.
//!
//! Everything here is pure. The same `(total_xp, table)` always yields the same summary,
//! and a summary is either fully computed or not produced at all.

use crate::domain::{Level, NextLevel, UserExperienceSummary};
use crate::error::{ProgressionError, ProgressionResult};
use crate::levels::LevelTable;

pub struct ProgressionCalculator;

impl ProgressionCalculator {
    pub fn summarize(
        user_id: &str,
        total_xp: i64,
        table: &LevelTable,
    ) -> ProgressionResult<UserExperienceSummary> {
        let total = u64::try_from(total_xp).map_err(|_| ProgressionError::InvalidXp(total_xp))?;

        let current = table.level_for(total)?;
        let next = match table.next_level_for(total) {
            Some(next) => Some(NextLevel {
                level: next.clone(),
                xp_remaining: next.xp_required - total,
                progress_percentage: Self::progress_percentage(total, current, next)?,
            }),
            None => None,
        };

        Ok(UserExperienceSummary {
            user_id: user_id.to_string(),
            total_xp: total,
            current_level: current.clone(),
            next,
        })
    }

    /// `floor(100 * (total - current) / (next - current))`, clamped to `[0, 100]`.
    pub fn progress_percentage(total: u64, current: &Level, next: &Level) -> ProgressionResult<u8> {
        if next.xp_required <= current.xp_required {
            return Err(ProgressionError::InvalidLevelTable(format!(
                "level {} ({} xp) does not sit above level {} ({} xp)",
                next.level, next.xp_required, current.level, current.xp_required
            )));
        }
        let span = u128::from(next.xp_required - current.xp_required);
        let earned = u128::from(total.saturating_sub(current.xp_required));
        let pct = (earned * 100 / span).min(100);
        // clamped above
        Ok(pct as u8)
    }

    /// Rank difference between two summaries. Negative after a reversal drops a level.
    pub fn level_change(before: &UserExperienceSummary, after: &UserExperienceSummary) -> i64 {
        i64::from(after.current_level.level) - i64::from(before.current_level.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{level, three_level_table};

    #[test]
    fn scenario_start_of_table() {
        let s = ProgressionCalculator::summarize("u1", 0, &three_level_table()).unwrap();
        assert_eq!(s.total_xp, 0);
        assert_eq!(s.current_level.level, 1);
        let next = s.next.expect("next level");
        assert_eq!(next.level.level, 2);
        assert_eq!(next.xp_remaining, 100);
        assert_eq!(next.progress_percentage, 0);
    }

    #[test]
    fn scenario_mid_level() {
        let s = ProgressionCalculator::summarize("u1", 150, &three_level_table()).unwrap();
        assert_eq!(s.current_level.level, 2);
        let next = s.next.expect("next level");
        assert_eq!(next.level.level, 3);
        assert_eq!(next.xp_remaining, 150);
        assert_eq!(next.progress_percentage, 25);
    }

    #[test]
    fn scenario_max_level() {
        let s = ProgressionCalculator::summarize("u1", 300, &three_level_table()).unwrap();
        assert_eq!(s.current_level.level, 3);
        assert!(s.next.is_none());
        assert!(s.is_max_level());
    }

    #[test]
    fn scenario_negative_total() {
        let err = ProgressionCalculator::summarize("u1", -5, &three_level_table()).unwrap_err();
        assert_eq!(err, ProgressionError::InvalidXp(-5));
    }

    #[test]
    fn percentage_floors_and_stays_in_range() {
        let table = three_level_table();
        for xp in 0..=350i64 {
            let s = ProgressionCalculator::summarize("u1", xp, &table).unwrap();
            if let Some(next) = &s.next {
                assert!(next.progress_percentage <= 100);
                assert_eq!(next.xp_remaining, next.level.xp_required - s.total_xp);
                if s.total_xp == s.current_level.xp_required {
                    assert_eq!(next.progress_percentage, 0);
                }
            }
        }
        let s = ProgressionCalculator::summarize("u1", 99, &table).unwrap();
        assert_eq!(s.next.unwrap().progress_percentage, 99);
        let s = ProgressionCalculator::summarize("u1", 299, &table).unwrap();
        assert_eq!(s.next.unwrap().progress_percentage, 99);
    }

    #[test]
    fn equal_thresholds_are_refused() {
        let a = level(1, 1, 100);
        let b = level(2, 2, 100);
        let err = ProgressionCalculator::progress_percentage(100, &a, &b).unwrap_err();
        assert!(matches!(err, ProgressionError::InvalidLevelTable(_)));
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let table = three_level_table();
        let first = ProgressionCalculator::summarize("u1", 175, &table).unwrap();
        let second = ProgressionCalculator::summarize("u1", 175, &table).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn level_change_counts_ranks() {
        let table = three_level_table();
        let before = ProgressionCalculator::summarize("u1", 50, &table).unwrap();
        let after = ProgressionCalculator::summarize("u1", 320, &table).unwrap();
        assert_eq!(ProgressionCalculator::level_change(&before, &after), 2);
        assert_eq!(ProgressionCalculator::level_change(&after, &before), -2);
    }
}
