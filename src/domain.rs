//! Domain models: level definitions, experience ledger entries, and the derived summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One rank in the level table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
  pub id: u32,
  pub level: u32,
  /// Minimum cumulative XP needed to hold this rank.
  pub xp_required: u64,
  pub title: String,
  #[serde(default)] pub icon: Option<String>,
  #[serde(default)] pub color: Option<String>,
  #[serde(default)] pub rewards: Option<LevelRewards>,
}

/// Bonuses attached to a level. Carried through to clients untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelRewards {
  #[serde(default)] pub badges: Vec<String>,
  #[serde(default)] pub feature_unlocks: Vec<String>,
  #[serde(default)] pub xp_multiplier: Option<f64>,
  #[serde(default)] pub daily_bonus: Option<u32>,
}

/// Where an XP grant came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceSource {
  QuizCompleted,
  QuizPerfectScore,
  ChapterCompleted,
  BookCompleted,
  ReadingStreak,
  DailyBonus,
  Achievement,
  AdminAdjustment,
  /// Offsetting entry written by the ledger itself; never accepted from clients.
  Reversal,
}

impl ExperienceSource {
  pub fn as_str(&self) -> &'static str {
    match self {
      ExperienceSource::QuizCompleted => "quiz_completed",
      ExperienceSource::QuizPerfectScore => "quiz_perfect_score",
      ExperienceSource::ChapterCompleted => "chapter_completed",
      ExperienceSource::BookCompleted => "book_completed",
      ExperienceSource::ReadingStreak => "reading_streak",
      ExperienceSource::DailyBonus => "daily_bonus",
      ExperienceSource::Achievement => "achievement",
      ExperienceSource::AdminAdjustment => "admin_adjustment",
      ExperienceSource::Reversal => "reversal",
    }
  }
}

impl std::fmt::Display for ExperienceSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Immutable ledger row. A user's total XP is the sum of their entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperienceLogEntry {
  pub id: String,
  pub user_id: String,
  pub source: ExperienceSource,
  #[serde(default)] pub source_id: Option<String>,
  pub xp: i64,
  #[serde(default)] pub description: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Read-time projection of a user's progression. Never stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserExperienceSummary {
  pub user_id: String,
  pub total_xp: u64,
  pub current_level: Level,
  /// `None` once the top threshold is reached.
  pub next: Option<NextLevel>,
}

impl UserExperienceSummary {
  pub fn is_max_level(&self) -> bool {
    self.next.is_none()
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NextLevel {
  pub level: Level,
  pub xp_remaining: u64,
  pub progress_percentage: u8,
}
