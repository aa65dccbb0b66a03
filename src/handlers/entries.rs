use axum::{
    extract::{Query, State},
    Extension, Json,
};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{LimitQuery, RecordWeightRequest, TodayQuery, UpdateTodayRequest};
use crate::error::AppResult;
use crate::ledger::{ActivityOutcome, GoalBoard, SessionContext};
use crate::models::entry::DailyEntry;
use crate::store::Gateway;
use crate::AppState;

use super::resolve_local_date;

#[derive(Debug, serde::Serialize)]
pub struct TodayResponse {
    pub entry: DailyEntry,
    pub goals: GoalBoard,
}

/// Get-or-create for today's entry, plus the goal board the home screen
/// renders next to it.
pub async fn get_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<TodayQuery>,
) -> AppResult<Json<TodayResponse>> {
    let ctx = SessionContext {
        user_id: auth_user.id,
        today: resolve_local_date(query.local_date)?,
        emergency_mode: query.emergency_mode.unwrap_or(false),
    };

    let entry = state.ledger.ensure_today_entry(&ctx).await?;
    let goals = state.ledger.goal_board(&ctx).await?;

    Ok(Json(TodayResponse { entry, goals }))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<DailyEntry>>> {
    let limit = query.limit.unwrap_or(30).clamp(1, 365);
    let entries = state.store.get_daily_entries(auth_user.id, limit).await?;
    Ok(Json(entries))
}

/// Set today's mood and/or note. Neither earns points.
pub async fn update_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateTodayRequest>,
) -> AppResult<Json<DailyEntry>> {
    body.validate()?;

    let ctx = SessionContext {
        user_id: auth_user.id,
        today: resolve_local_date(body.local_date)?,
        emergency_mode: false,
    };

    let entry = state.ledger.update_today(&ctx, body.mood, body.note).await?;
    Ok(Json(entry))
}

/// Store today's weigh-in. The first submission of the day earns the
/// weigh-in point; later ones only update the measurement.
pub async fn record_weight(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<RecordWeightRequest>,
) -> AppResult<Json<ActivityOutcome>> {
    body.validate()?;

    let ctx = SessionContext {
        user_id: auth_user.id,
        today: resolve_local_date(body.local_date)?,
        emergency_mode: false,
    };

    let outcome = state.ledger.record_weight(&ctx, body.weight_kg).await?;
    Ok(Json(outcome))
}
