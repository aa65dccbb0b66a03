use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::{RecordActivityRequest, TodayQuery};
use crate::error::{AppError, AppResult};
use crate::ledger::{ActivityOutcome, GoalBoard, SessionContext};
use crate::models::activity::ActivityRecord;
use crate::store::Gateway;
use crate::AppState;

use super::resolve_local_date;

/// Record a completed daily goal. Point values come from the fixed schedule;
/// a kind already checked off today is rejected with a conflict.
pub async fn record_activity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<RecordActivityRequest>,
) -> AppResult<Json<ActivityOutcome>> {
    let ctx = SessionContext {
        user_id: auth_user.id,
        today: resolve_local_date(body.local_date)?,
        emergency_mode: body.emergency_mode,
    };

    let outcome = state.ledger.record_activity(&ctx, body.kind).await?;
    Ok(Json(outcome))
}

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<Vec<ActivityRecord>>> {
    // Verify entry ownership
    let entry = state
        .store
        .get_daily_entry(entry_id)
        .await?
        .filter(|e| e.user_id == auth_user.id)
        .ok_or_else(|| AppError::NotFound("Entry not found".into()))?;

    let activities = state.store.get_activities(entry.id).await?;
    Ok(Json(activities))
}

pub async fn goals_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<TodayQuery>,
) -> AppResult<Json<GoalBoard>> {
    let ctx = SessionContext {
        user_id: auth_user.id,
        today: resolve_local_date(query.local_date)?,
        emergency_mode: query.emergency_mode.unwrap_or(false),
    };

    let board = state.ledger.goal_board(&ctx).await?;
    Ok(Json(board))
}
