use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Gateway, StoreError, StoreResult};
use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::entry::{DailyEntry, EntryPatch, NewEntry};
use crate::models::user::{NewUser, User};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Unique violations surface as `Conflict` so callers can distinguish
/// "already there" from a real database failure.
fn map_insert_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => StoreError::Conflict,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl Gateway for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name, height_cm,
                               start_weight_kg, target_weight_kg, age, confirm_token_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.height_cm)
        .bind(user.start_weight_kg)
        .bind(user.target_weight_kg)
        .bind(user.age)
        .bind(&user.confirm_token_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_err)?;

        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row)
    }

    async fn create_daily_entry(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        fields: NewEntry,
    ) -> StoreResult<DailyEntry> {
        // Two near-simultaneous creates for the same day must resolve to one
        // row: the no-op conflict update makes RETURNING yield the winner.
        let row = sqlx::query_as::<_, DailyEntry>(
            r#"
            INSERT INTO daily_entries (id, user_id, entry_date, weight_kg, total_points, mood, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, entry_date) DO UPDATE
                SET total_points = daily_entries.total_points
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(date)
        .bind(fields.weight_kg)
        .bind(fields.total_points)
        .bind(fields.mood)
        .bind(&fields.note)
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    async fn get_daily_entry(&self, entry_id: Uuid) -> StoreResult<Option<DailyEntry>> {
        let row = sqlx::query_as::<_, DailyEntry>("SELECT * FROM daily_entries WHERE id = $1")
            .bind(entry_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row)
    }

    async fn get_daily_entries(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<DailyEntry>> {
        let rows = sqlx::query_as::<_, DailyEntry>(
            r#"
            SELECT * FROM daily_entries
            WHERE user_id = $1
            ORDER BY entry_date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn update_daily_entry(
        &self,
        entry_id: Uuid,
        patch: EntryPatch,
    ) -> StoreResult<DailyEntry> {
        let row = sqlx::query_as::<_, DailyEntry>(
            r#"
            UPDATE daily_entries SET
                weight_kg = COALESCE($2, weight_kg),
                total_points = COALESCE($3, total_points),
                mood = COALESCE($4, mood),
                note = COALESCE($5, note),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(entry_id)
        .bind(patch.weight_kg)
        .bind(patch.total_points)
        .bind(patch.mood)
        .bind(&patch.note)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(row)
    }

    async fn add_activity(
        &self,
        entry_id: Uuid,
        kind: ActivityKind,
        points: i32,
    ) -> StoreResult<ActivityRecord> {
        let row = sqlx::query_as::<_, ActivityRecord>(
            r#"
            INSERT INTO activities (id, daily_entry_id, kind, points)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry_id)
        .bind(kind)
        .bind(points)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_err)?;

        Ok(row)
    }

    async fn get_activities(&self, entry_id: Uuid) -> StoreResult<Vec<ActivityRecord>> {
        let rows = sqlx::query_as::<_, ActivityRecord>(
            r#"
            SELECT * FROM activities
            WHERE daily_entry_id = $1
            ORDER BY completed_at DESC
            "#,
        )
        .bind(entry_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn scoring_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT entry_date FROM daily_entries
            WHERE user_id = $1 AND total_points >= 1
            ORDER BY entry_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(dates)
    }

    async fn total_points(&self, user_id: Uuid) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(total_points), 0) FROM daily_entries WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(total)
    }
}
