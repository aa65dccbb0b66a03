use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;

use crate::auth::middleware::AuthUser;
use crate::dto::{LimitQuery, TodayQuery};
use crate::error::AppResult;
use crate::ledger::{ProgressSummary, SessionContext};
use crate::store::Gateway;
use crate::AppState;

use super::resolve_local_date;

#[derive(Debug, serde::Serialize)]
pub struct StreakResponse {
    pub streak: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct WeightPoint {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<TodayQuery>,
) -> AppResult<Json<ProgressSummary>> {
    let ctx = SessionContext {
        user_id: auth_user.id,
        today: resolve_local_date(query.local_date)?,
        emergency_mode: query.emergency_mode.unwrap_or(false),
    };

    let progress = state.ledger.progress(&ctx).await?;
    Ok(Json(progress))
}

pub async fn streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<TodayQuery>,
) -> AppResult<Json<StreakResponse>> {
    let ctx = SessionContext {
        user_id: auth_user.id,
        today: resolve_local_date(query.local_date)?,
        emergency_mode: false,
    };

    let streak = state.ledger.current_streak(&ctx).await?;
    Ok(Json(StreakResponse { streak }))
}

/// Recent weigh-ins, newest first, for the weight chart.
pub async fn weight_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<WeightPoint>>> {
    let limit = query.limit.unwrap_or(90).clamp(1, 365);
    let entries = state.store.get_daily_entries(auth_user.id, limit).await?;

    let points: Vec<WeightPoint> = entries
        .into_iter()
        .filter_map(|e| {
            e.weight_kg.map(|weight_kg| WeightPoint {
                date: e.entry_date,
                weight_kg,
            })
        })
        .collect();

    Ok(Json(points))
}
