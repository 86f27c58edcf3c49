//! Built-in level table used when no configuration file provides one.

use crate::domain::{Level, LevelRewards};

/// Ten ranks with a zero floor. Guarantees the service is usable without any config.
pub fn seed_levels() -> Vec<Level> {
  let rows: [(u32, u64, &str, &str, &str); 10] = [
    (1, 0, "Newcomer", "seedling", "#9CA3AF"),
    (2, 100, "Reader", "book-open", "#60A5FA"),
    (3, 300, "Quiz Taker", "pencil", "#34D399"),
    (4, 600, "Scholar", "graduation-cap", "#10B981"),
    (5, 1_000, "Bookworm", "library", "#F59E0B"),
    (6, 1_500, "Sage", "lightbulb", "#F97316"),
    (7, 2_200, "Mentor", "compass", "#EF4444"),
    (8, 3_000, "Master", "star", "#A855F7"),
    (9, 4_000, "Grandmaster", "crown", "#6366F1"),
    (10, 5_500, "Legend", "trophy", "#EAB308"),
  ];

  rows
    .iter()
    .map(|&(rank, xp_required, title, icon, color)| Level {
      id: rank,
      level: rank,
      xp_required,
      title: title.into(),
      icon: Some(icon.into()),
      color: Some(color.into()),
      rewards: seed_rewards(rank),
    })
    .collect()
}

fn seed_rewards(rank: u32) -> Option<LevelRewards> {
  match rank {
    3 => Some(LevelRewards {
      badges: vec!["first_steps".into()],
      ..Default::default()
    }),
    5 => Some(LevelRewards {
      badges: vec!["bookworm".into()],
      feature_unlocks: vec!["custom_quizzes".into()],
      daily_bonus: Some(10),
      ..Default::default()
    }),
    8 => Some(LevelRewards {
      badges: vec!["master".into()],
      xp_multiplier: Some(1.1),
      daily_bonus: Some(20),
      ..Default::default()
    }),
    10 => Some(LevelRewards {
      badges: vec!["legend".into()],
      feature_unlocks: vec!["profile_frame".into()],
      xp_multiplier: Some(1.25),
      daily_bonus: Some(50),
    }),
    _ => None,
  }
}
