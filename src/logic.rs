//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Building a user's summary from the ledger total and the live level table
//!   - Granting XP and reporting level-ups
//!   - Reversing a previous grant
//!   - History and leaderboard reads

use tracing::{info, instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::ledger::{AppendReceipt, NewEntry};
use crate::progression::ProgressionCalculator;
use crate::protocol::{
  summary_out, validate_user_id, GrantOut, GrantXpIn, HistoryOut, LeaderboardRow, SummaryOut,
};
use crate::state::AppState;

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn summarize_user(state: &AppState, user_id: &str) -> ApiResult<SummaryOut> {
  validate_user_id(user_id).map_err(ApiError::Validation)?;
  let total = state.ledger.total_xp_for(user_id).await?;
  let table = state.level_table().await;
  let summary = ProgressionCalculator::summarize(user_id, total, &table)?;
  Ok(summary_out(&summary))
}

#[instrument(level = "info", skip(state, grant), fields(%user_id, source = %grant.source_type, xp = grant.xp))]
pub async fn grant_experience(state: &AppState, user_id: &str, grant: GrantXpIn) -> ApiResult<GrantOut> {
  validate_user_id(user_id).map_err(ApiError::Validation)?;
  grant.validate(&state.policy).map_err(ApiError::Validation)?;

  let receipt = state
    .ledger
    .append_entry(NewEntry {
      user_id: user_id.to_string(),
      source: grant.source_type,
      source_id: grant.source_id,
      xp: grant.xp,
      description: grant.description,
    })
    .await?;
  progression_outcome(state, user_id, receipt).await
}

#[instrument(level = "info", skip(state, description), fields(%user_id, %entry_id))]
pub async fn reverse_experience(
  state: &AppState,
  user_id: &str,
  entry_id: &str,
  description: Option<String>,
) -> ApiResult<GrantOut> {
  validate_user_id(user_id).map_err(ApiError::Validation)?;
  let receipt = state.ledger.reverse_entry(user_id, entry_id, description).await?;
  progression_outcome(state, user_id, receipt).await
}

/// Summaries on both sides of an append. The ledger has already refused any append that
/// would take the total below zero, so both totals are valid inputs here.
async fn progression_outcome(state: &AppState, user_id: &str, receipt: AppendReceipt) -> ApiResult<GrantOut> {
  let table = state.level_table().await;
  let after = ProgressionCalculator::summarize(user_id, receipt.new_total, &table)?;
  let before = ProgressionCalculator::summarize(user_id, receipt.previous_total, &table)?;
  let previous_level = before.current_level.level;
  let levels_gained = ProgressionCalculator::level_change(&before, &after);

  if levels_gained > 0 {
    info!(target: "xp_progression", %user_id, from = previous_level, to = after.current_level.level, total_xp = after.total_xp, "Level up");
  } else if levels_gained < 0 {
    warn!(target: "xp_progression", %user_id, from = previous_level, to = after.current_level.level, total_xp = after.total_xp, "Level lost after correction");
  }

  Ok(GrantOut {
    entry: receipt.entry,
    summary: summary_out(&after),
    previous_level,
    levels_gained,
    leveled_up: levels_gained > 0,
  })
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn user_history(state: &AppState, user_id: &str, limit: Option<usize>) -> ApiResult<HistoryOut> {
  validate_user_id(user_id).map_err(ApiError::Validation)?;
  let limit = limit.unwrap_or(state.policy.history_limit).min(state.policy.history_limit.max(1));
  let total_xp = state.ledger.total_xp_for(user_id).await?;
  let entries = state.ledger.entries_for(user_id, limit).await;
  Ok(HistoryOut { user_id: user_id.to_string(), total_xp, entries })
}

/// Highest totals first; ties broken by user id so the order is stable.
#[instrument(level = "info", skip(state))]
pub async fn leaderboard(state: &AppState, limit: Option<usize>) -> ApiResult<Vec<LeaderboardRow>> {
  let limit = limit.unwrap_or(state.policy.leaderboard_limit).min(state.policy.leaderboard_limit.max(1));
  let mut totals = state.ledger.totals().await?;
  totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

  let table = state.level_table().await;
  let mut rows = Vec::new();
  for (user_id, total) in totals.into_iter().take(limit) {
    let summary = ProgressionCalculator::summarize(&user_id, total, &table)?;
    rows.push(LeaderboardRow {
      rank: rows.len() + 1,
      user_id,
      total_xp: summary.total_xp,
      level: summary.current_level.level,
      title: summary.current_level.title,
    });
  }
  Ok(rows)
}
