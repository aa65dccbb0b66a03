//! Request DTOs for the HTTP surface.
//!
//! Conventions:
//! - `*Request` → deserialized from client JSON body, `*Query` from query params
//! - Validation is expressed via `validator` derive macros and runs before
//!   any store call
//! - `local_date` is the client's calendar day; handlers clamp it to ±1 day
//!   of server-now

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::activity::ActivityKind;
use crate::models::entry::Mood;
use crate::models::user::User;

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/signup
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(range(min = 100, max = 250, message = "Height must be 100-250 cm"))]
    pub height_cm: i32,

    #[validate(range(min = 30.0, max = 300.0, message = "Start weight must be 30-300 kg"))]
    pub start_weight_kg: f64,

    #[validate(range(min = 30.0, max = 300.0, message = "Target weight must be 30-300 kg"))]
    pub target_weight_kg: f64,

    #[validate(range(min = 16, max = 120, message = "Age must be 16-120"))]
    pub age: i32,
}

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// POST /api/auth/refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/auth/resend-confirmation
#[derive(Debug, Deserialize, Validate)]
pub struct ResendConfirmationRequest {
    #[validate(email)]
    pub email: String,
}

/// GET /api/auth/confirm?token=
#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token: String,
}

/// Profile shape returned by /api/me. Never exposes credential material.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub height_cm: i32,
    pub start_weight_kg: f64,
    pub target_weight_kg: f64,
    pub age: i32,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            height_cm: u.height_cm,
            start_weight_kg: u.start_weight_kg,
            target_weight_kg: u.target_weight_kg,
            age: u.age,
            email_confirmed: u.email_confirmed_at.is_some(),
            created_at: u.created_at,
        }
    }
}

// ============================================================================
// Entries & activities
// ============================================================================

/// GET /api/entries/today and GET /api/goals/today
#[derive(Debug, Deserialize)]
pub struct TodayQuery {
    pub local_date: Option<NaiveDate>,
    pub emergency_mode: Option<bool>,
}

/// PUT /api/entries/today
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTodayRequest {
    pub mood: Option<Mood>,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,

    pub local_date: Option<NaiveDate>,
}

/// PUT /api/entries/today/weight
#[derive(Debug, Deserialize, Validate)]
pub struct RecordWeightRequest {
    #[validate(range(min = 30.0, max = 300.0, message = "Weight must be 30-300 kg"))]
    pub weight_kg: f64,

    pub local_date: Option<NaiveDate>,
}

/// POST /api/activities
#[derive(Debug, Deserialize)]
pub struct RecordActivityRequest {
    pub kind: ActivityKind,

    #[serde(default)]
    pub emergency_mode: bool,

    pub local_date: Option<NaiveDate>,
}

/// GET /api/entries and GET /api/stats/weights
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}
