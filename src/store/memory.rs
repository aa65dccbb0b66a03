//! In-memory gateway used by the ledger tests. Mirrors the Postgres
//! semantics: get-or-create on (user, date), unique activity kind per entry.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{Gateway, StoreError, StoreResult};
use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::entry::{DailyEntry, EntryPatch, NewEntry};
use crate::models::user::{NewUser, User};

#[derive(Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    entries: Vec<DailyEntry>,
    activities: Vec<ActivityRecord>,
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }
        let now = Utc::now();
        let row = User {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            height_cm: user.height_cm,
            start_weight_kg: user.start_weight_kg,
            target_weight_kg: user.target_weight_kg,
            age: user.age,
            email_confirmed_at: None,
            confirm_token_hash: Some(user.confirm_token_hash),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn create_daily_entry(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        fields: NewEntry,
    ) -> StoreResult<DailyEntry> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .entries
            .iter()
            .find(|e| e.user_id == user_id && e.entry_date == date)
        {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let entry = DailyEntry {
            id: Uuid::new_v4(),
            user_id,
            entry_date: date,
            weight_kg: fields.weight_kg,
            total_points: fields.total_points,
            mood: fields.mood,
            note: fields.note,
            created_at: now,
            updated_at: now,
        };
        inner.entries.push(entry.clone());
        Ok(entry)
    }

    async fn get_daily_entry(&self, entry_id: Uuid) -> StoreResult<Option<DailyEntry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.entries.iter().find(|e| e.id == entry_id).cloned())
    }

    async fn get_daily_entries(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<DailyEntry>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<DailyEntry> = inner
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn update_daily_entry(
        &self,
        entry_id: Uuid,
        patch: EntryPatch,
    ) -> StoreResult<DailyEntry> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or(StoreError::NotFound)?;
        if let Some(weight) = patch.weight_kg {
            entry.weight_kg = Some(weight);
        }
        if let Some(points) = patch.total_points {
            entry.total_points = points;
        }
        if let Some(mood) = patch.mood {
            entry.mood = Some(mood);
        }
        if let Some(note) = patch.note {
            entry.note = Some(note);
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn add_activity(
        &self,
        entry_id: Uuid,
        kind: ActivityKind,
        points: i32,
    ) -> StoreResult<ActivityRecord> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .activities
            .iter()
            .any(|a| a.daily_entry_id == entry_id && a.kind == kind)
        {
            return Err(StoreError::Conflict);
        }
        let record = ActivityRecord {
            id: Uuid::new_v4(),
            daily_entry_id: entry_id,
            kind,
            points,
            completed_at: Utc::now(),
        };
        inner.activities.push(record.clone());
        Ok(record)
    }

    async fn get_activities(&self, entry_id: Uuid) -> StoreResult<Vec<ActivityRecord>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<ActivityRecord> = inner
            .activities
            .iter()
            .filter(|a| a.daily_entry_id == entry_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(rows)
    }

    async fn scoring_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>> {
        let inner = self.inner.lock().unwrap();
        let mut dates: Vec<NaiveDate> = inner
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.total_points >= 1)
            .map(|e| e.entry_date)
            .collect();
        dates.sort_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    async fn total_points(&self, user_id: Uuid) -> StoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| i64::from(e.total_points))
            .sum())
    }
}
