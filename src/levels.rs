//! The level table: an ordered, validated catalog of ranks and their XP thresholds.
//!
//! Table policy (enforced by `validate`):
//!   - at least one level, and the lowest level has a zero threshold (the floor)
//!   - ranks start at 1 and are contiguous, no duplicates
//!   - ids are unique and increase with rank
//!   - thresholds strictly increase with rank

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::Level;
use crate::error::{ProgressionError, ProgressionResult};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl LevelTable {
    /// Sort by rank and validate. A `LevelTable` that exists is always valid.
    pub fn new(mut levels: Vec<Level>) -> ProgressionResult<Self> {
        levels.sort_by_key(|l| l.level);
        let table = Self { levels };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> ProgressionResult<()> {
        let floor = self
            .levels
            .first()
            .ok_or(ProgressionError::NoLevelForXp { xp: 0 })?;

        if floor.level != 1 {
            return Err(ProgressionError::InvalidLevelTable(format!(
                "lowest level is {}, expected 1",
                floor.level
            )));
        }
        if floor.xp_required != 0 {
            return Err(ProgressionError::NoLevelForXp { xp: 0 });
        }

        let mut ids = HashSet::with_capacity(self.levels.len());
        for l in &self.levels {
            if !ids.insert(l.id) {
                return Err(ProgressionError::InvalidLevelTable(format!(
                    "duplicate level id {}",
                    l.id
                )));
            }
        }

        for pair in self.levels.windows(2) {
            let (lower, higher) = (&pair[0], &pair[1]);
            if higher.level == lower.level {
                return Err(ProgressionError::InvalidLevelTable(format!(
                    "duplicate level {}",
                    higher.level
                )));
            }
            if higher.level != lower.level + 1 {
                return Err(ProgressionError::InvalidLevelTable(format!(
                    "levels must be contiguous: {} is followed by {}",
                    lower.level, higher.level
                )));
            }
            if higher.id <= lower.id {
                return Err(ProgressionError::InvalidLevelTable(format!(
                    "level {} has id {} which does not increase over level {} (id {})",
                    higher.level, higher.id, lower.level, lower.id
                )));
            }
            if higher.xp_required <= lower.xp_required {
                return Err(ProgressionError::InvalidLevelTable(format!(
                    "level {} requires {} xp, not above level {} ({} xp)",
                    higher.level, higher.xp_required, lower.level, lower.xp_required
                )));
            }
        }
        Ok(())
    }

    /// Greatest-threshold level whose `xp_required <= total_xp`, falling back to the floor.
    pub fn level_for(&self, total_xp: u64) -> ProgressionResult<&Level> {
        self.levels
            .iter()
            .rev()
            .find(|l| l.xp_required <= total_xp)
            .or_else(|| self.floor())
            .ok_or(ProgressionError::NoLevelForXp { xp: total_xp })
    }

    /// Smallest-threshold level whose `xp_required > total_xp`; `None` at max level.
    pub fn next_level_for(&self, total_xp: u64) -> Option<&Level> {
        self.levels.iter().find(|l| l.xp_required > total_xp)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn floor(&self) -> Option<&Level> {
        self.levels.first()
    }

    pub fn max_level(&self) -> Option<&Level> {
        self.levels.last()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
pub(crate) fn level(id: u32, rank: u32, xp_required: u64) -> Level {
    Level {
        id,
        level: rank,
        xp_required,
        title: format!("Level {rank}"),
        icon: None,
        color: None,
        rewards: None,
    }
}

#[cfg(test)]
pub(crate) fn three_level_table() -> LevelTable {
    LevelTable::new(vec![level(1, 1, 0), level(2, 2, 100), level(3, 3, 300)])
        .expect("valid table")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_in_any_input_order() {
        let table = LevelTable::new(vec![level(3, 3, 300), level(1, 1, 0), level(2, 2, 100)])
            .unwrap();
        let ranks: Vec<u32> = table.levels().iter().map(|l| l.level).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(table.max_level().unwrap().level, 3);
        assert_eq!(table.floor().unwrap().xp_required, 0);
    }

    #[test]
    fn rejects_duplicate_threshold() {
        let err = LevelTable::new(vec![level(1, 1, 0), level(2, 2, 100), level(3, 3, 100)])
            .unwrap_err();
        assert!(matches!(err, ProgressionError::InvalidLevelTable(_)));
    }

    #[test]
    fn rejects_decreasing_threshold() {
        let err = LevelTable::new(vec![level(1, 1, 0), level(2, 2, 300), level(3, 3, 100)])
            .unwrap_err();
        assert!(matches!(err, ProgressionError::InvalidLevelTable(_)));
    }

    #[test]
    fn rejects_duplicate_rank() {
        let err = LevelTable::new(vec![level(1, 1, 0), level(2, 2, 100), level(3, 2, 200)])
            .unwrap_err();
        assert!(matches!(err, ProgressionError::InvalidLevelTable(msg) if msg.contains("duplicate level 2")));
    }

    #[test]
    fn rejects_gap_in_ranks() {
        let err = LevelTable::new(vec![level(1, 1, 0), level(2, 3, 100)]).unwrap_err();
        assert!(matches!(err, ProgressionError::InvalidLevelTable(msg) if msg.contains("contiguous")));
    }

    #[test]
    fn rejects_ids_out_of_rank_order() {
        let err = LevelTable::new(vec![level(5, 1, 0), level(2, 2, 100)]).unwrap_err();
        assert!(matches!(err, ProgressionError::InvalidLevelTable(_)));

        let err = LevelTable::new(vec![level(1, 1, 0), level(1, 2, 100)]).unwrap_err();
        assert!(matches!(err, ProgressionError::InvalidLevelTable(msg) if msg.contains("duplicate level id")));
    }

    #[test]
    fn rejects_missing_floor() {
        assert_eq!(
            LevelTable::new(vec![]).unwrap_err(),
            ProgressionError::NoLevelForXp { xp: 0 }
        );
        assert_eq!(
            LevelTable::new(vec![level(1, 1, 10), level(2, 2, 100)]).unwrap_err(),
            ProgressionError::NoLevelForXp { xp: 0 }
        );
    }

    #[test]
    fn threshold_resolves_to_that_level() {
        let table = three_level_table();
        assert_eq!(table.level_for(0).unwrap().level, 1);
        assert_eq!(table.level_for(99).unwrap().level, 1);
        assert_eq!(table.level_for(100).unwrap().level, 2);
        assert_eq!(table.level_for(299).unwrap().level, 2);
        assert_eq!(table.level_for(300).unwrap().level, 3);
        assert_eq!(table.level_for(u64::MAX).unwrap().level, 3);
    }

    #[test]
    fn next_level_is_absent_at_max() {
        let table = three_level_table();
        assert_eq!(table.next_level_for(0).unwrap().level, 2);
        assert_eq!(table.next_level_for(100).unwrap().level, 3);
        assert!(table.next_level_for(300).is_none());
        assert!(table.next_level_for(10_000).is_none());
    }

    #[test]
    fn lookups_hold_over_an_xp_sweep() {
        let table = three_level_table();
        for xp in 0..=400u64 {
            let current = table.level_for(xp).unwrap();
            assert!(current.xp_required <= xp);
            assert!(table
                .levels()
                .iter()
                .all(|l| l.xp_required > xp || l.xp_required <= current.xp_required));

            if let Some(next) = table.next_level_for(xp) {
                assert!(next.xp_required > xp);
                assert!(table
                    .levels()
                    .iter()
                    .all(|l| l.xp_required <= xp || l.xp_required >= next.xp_required));
                assert_eq!(next.level, current.level + 1);
            }
        }
    }
}
