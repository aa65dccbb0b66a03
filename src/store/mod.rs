//! Persistence gateway. The ledger talks to storage exclusively through the
//! [`Gateway`] trait so its rules stay decoupled from SQL; [`PgStore`] is the
//! production implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::entry::{DailyEntry, EntryPatch, NewEntry};
use crate::models::user::{NewUser, User};

mod postgres;

#[cfg(test)]
pub(crate) mod memory;

pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    #[error("conflicts with an existing row")]
    Conflict,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Get-or-create semantics: if an entry already exists for
    /// (user, date), the existing row is returned unchanged.
    async fn create_daily_entry(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        fields: NewEntry,
    ) -> StoreResult<DailyEntry>;

    async fn get_daily_entry(&self, entry_id: Uuid) -> StoreResult<Option<DailyEntry>>;

    /// Entries ordered by date descending, newest first.
    async fn get_daily_entries(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<DailyEntry>>;

    async fn update_daily_entry(
        &self,
        entry_id: Uuid,
        patch: EntryPatch,
    ) -> StoreResult<DailyEntry>;

    /// Fails with [`StoreError::Conflict`] if the kind is already recorded
    /// on this entry.
    async fn add_activity(
        &self,
        entry_id: Uuid,
        kind: ActivityKind,
        points: i32,
    ) -> StoreResult<ActivityRecord>;

    async fn get_activities(&self, entry_id: Uuid) -> StoreResult<Vec<ActivityRecord>>;

    /// Dates of entries worth at least one point, newest first. Input to the
    /// streak scan.
    async fn scoring_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>>;

    /// Lifetime point sum across all entries.
    async fn total_points(&self, user_id: Uuid) -> StoreResult<i64>;
}
