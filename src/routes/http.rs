//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, Json};
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthOut> {
  let table = state.level_table().await;
  Json(HealthOut { ok: true, levels: table.len(), max_level: table.max_level().map(|l| l.level) })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_levels(State(state): State<Arc<AppState>>) -> Json<LevelsOut> {
  let table = state.level_table().await;
  Json(LevelsOut { levels: table.levels().to_vec() })
}

#[instrument(level = "info", skip(state, body), fields(count = body.levels.len()))]
pub async fn http_put_levels(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ReplaceLevelsIn>,
) -> ApiResult<Json<LevelsOut>> {
  let table = state.replace_levels(body.levels).await.map_err(ApiError::LevelTableRejected)?;
  Ok(Json(LevelsOut { levels: table.levels().to_vec() }))
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn http_get_summary(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
) -> ApiResult<Json<SummaryOut>> {
  let summary = summarize_user(&state, &user_id).await?;
  info!(target: "xp_progression", %user_id, total_xp = summary.total_xp, level = summary.current_level.level, "HTTP summary served");
  Ok(Json(summary))
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn http_get_history(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  Query(q): Query<LimitQuery>,
) -> ApiResult<Json<HistoryOut>> {
  Ok(Json(user_history(&state, &user_id, q.limit).await?))
}

#[instrument(level = "info", skip(state, body), fields(%user_id, source = %body.source_type, xp = body.xp))]
pub async fn http_post_experience(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  Json(body): Json<GrantXpIn>,
) -> ApiResult<Json<GrantOut>> {
  let out = grant_experience(&state, &user_id, body).await?;
  info!(target: "xp_progression", %user_id, entry_id = %out.entry.id, leveled_up = out.leveled_up, "HTTP grant recorded");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%user_id, %entry_id))]
pub async fn http_post_reversal(
  State(state): State<Arc<AppState>>,
  Path((user_id, entry_id)): Path<(String, String)>,
  body: Option<Json<ReversalIn>>,
) -> ApiResult<Json<GrantOut>> {
  let description = body.and_then(|Json(b)| b.description);
  let out = reverse_experience(&state, &user_id, &entry_id, description).await?;
  info!(target: "xp_progression", %user_id, %entry_id, reversal_id = %out.entry.id, "HTTP reversal recorded");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LimitQuery>,
) -> ApiResult<Json<LeaderboardOut>> {
  let entries = leaderboard(&state, q.limit).await?;
  Ok(Json(LeaderboardOut { entries }))
}
