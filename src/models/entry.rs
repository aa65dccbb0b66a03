use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row per (user, calendar date). Holds the day's point total plus the
/// optional weigh-in measurement, mood and note.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub total_points: i32,
    pub mood: Option<Mood>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "mood", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Good,
    Okay,
    Bad,
}

/// Fields for entry creation. A fresh day starts at zero points with nothing
/// else filled in.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub weight_kg: Option<f64>,
    pub total_points: i32,
    pub mood: Option<Mood>,
    pub note: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub weight_kg: Option<f64>,
    pub total_points: Option<i32>,
    pub mood: Option<Mood>,
    pub note: Option<String>,
}
