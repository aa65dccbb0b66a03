use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single logged completion of one of the four daily goals.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub daily_entry_id: Uuid,
    pub kind: ActivityKind,
    pub points: i32,
    pub completed_at: DateTime<Utc>,
}

/// The closed set of daily goals. Adding a kind is a compile-time decision:
/// the point schedule below must be extended or the match will not compile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "activity_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    WeighIn,
    Exercise,
    HealthyMeal,
    Water,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::WeighIn,
        ActivityKind::Exercise,
        ActivityKind::HealthyMeal,
        ActivityKind::Water,
    ];

    /// Fixed point schedule. Emergency mode halves the exercise target;
    /// the water threshold drops from 2L to 1L but stays worth one point.
    pub fn points(self, emergency_mode: bool) -> i32 {
        match self {
            ActivityKind::WeighIn => 1,
            ActivityKind::Exercise => {
                if emergency_mode {
                    1
                } else {
                    2
                }
            }
            ActivityKind::HealthyMeal => 1,
            ActivityKind::Water => 1,
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActivityKind::WeighIn => "weigh_in",
            ActivityKind::Exercise => "exercise",
            ActivityKind::HealthyMeal => "healthy_meal",
            ActivityKind::Water => "water",
        };
        f.write_str(name)
    }
}
