//! The engagement ledger: daily-entry reconciliation, activity recording,
//! and the derived values (level, streak, goal board) the client renders.
//!
//! Every operation takes an explicit [`SessionContext`] instead of ambient
//! session state, and recomputes derived values from the rows the gateway
//! returns rather than from optimistic deltas.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::entry::{DailyEntry, EntryPatch, Mood, NewEntry};
use crate::store::{Gateway, StoreError};

pub mod scoring;

/// Per-request session state: who, which calendar day, and whether the
/// reduced emergency targets apply. Emergency mode is never persisted; it
/// resets to off whenever the client stops sending it.
#[derive(Debug, Clone, Copy)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub today: NaiveDate,
    pub emergency_mode: bool,
}

/// Result of an award-carrying operation. `celebrate` fires when the day
/// crosses the celebration threshold or a level boundary.
#[derive(Debug, Serialize)]
pub struct ActivityOutcome {
    pub activity: Option<ActivityRecord>,
    pub entry: DailyEntry,
    pub points_awarded: i32,
    pub daily_points: i32,
    pub total_points: i64,
    pub level: i32,
    pub leveled_up: bool,
    pub celebrate: bool,
}

#[derive(Debug, Serialize)]
pub struct GoalStatus {
    pub kind: ActivityKind,
    pub points: i32,
    pub completed: bool,
}

/// Today's checkbox board: one slot per activity kind.
#[derive(Debug, Serialize)]
pub struct GoalBoard {
    pub goals: Vec<GoalStatus>,
    pub completed_count: usize,
    pub daily_points: i32,
    pub max_daily_points: i32,
    pub emergency_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct ProgressSummary {
    pub daily_points: i32,
    pub total_points: i64,
    pub level: i32,
    pub level_progress: f64,
    pub points_to_next_level: i64,
    pub streak: u32,
}

#[derive(Clone)]
pub struct Ledger<G> {
    store: G,
}

impl<G: Gateway> Ledger<G> {
    pub fn new(store: G) -> Self {
        Self { store }
    }

    /// Get-or-create for today's entry. Reuses the newest entry when its
    /// date is today; otherwise creates a zeroed entry. Creation failure is
    /// a distinct condition; callers must not write against a missing entry.
    pub async fn ensure_today_entry(&self, ctx: &SessionContext) -> AppResult<DailyEntry> {
        let recent = self.store.get_daily_entries(ctx.user_id, 1).await?;
        if let Some(newest) = recent.into_iter().next() {
            if newest.entry_date == ctx.today {
                return Ok(newest);
            }
        }

        match self
            .store
            .create_daily_entry(ctx.user_id, ctx.today, NewEntry::default())
            .await
        {
            Ok(entry) => Ok(entry),
            Err(err) => {
                tracing::error!(user_id = %ctx.user_id, error = %err, "daily entry creation failed");
                Err(AppError::EntryNotCreated)
            }
        }
    }

    /// Record a completed goal. Each kind is a one-shot daily checkbox:
    /// a repeat is rejected with a conflict before anything is written.
    pub async fn record_activity(
        &self,
        ctx: &SessionContext,
        kind: ActivityKind,
    ) -> AppResult<ActivityOutcome> {
        let entry = self.ensure_today_entry(ctx).await?;
        self.check_not_completed(&entry, kind).await?;
        self.award(ctx, entry, kind, None).await
    }

    /// Store today's weigh-in. The measurement always updates the entry;
    /// the weigh-in point is awarded only on the first submission of the day.
    pub async fn record_weight(
        &self,
        ctx: &SessionContext,
        weight_kg: f64,
    ) -> AppResult<ActivityOutcome> {
        let entry = self.ensure_today_entry(ctx).await?;
        let activities = self.store.get_activities(entry.id).await?;
        let already_weighed = activities
            .iter()
            .any(|a| a.kind == ActivityKind::WeighIn);

        if already_weighed {
            let entry = self
                .store
                .update_daily_entry(
                    entry.id,
                    EntryPatch {
                        weight_kg: Some(weight_kg),
                        ..Default::default()
                    },
                )
                .await?;
            let total_points = self.store.total_points(ctx.user_id).await?;
            return Ok(ActivityOutcome {
                activity: None,
                points_awarded: 0,
                daily_points: entry.total_points,
                total_points,
                level: scoring::level_for(total_points),
                leveled_up: false,
                celebrate: false,
                entry,
            });
        }

        self.award(ctx, entry, ActivityKind::WeighIn, Some(weight_kg))
            .await
    }

    /// Set today's mood and/or note. Awards nothing.
    pub async fn update_today(
        &self,
        ctx: &SessionContext,
        mood: Option<Mood>,
        note: Option<String>,
    ) -> AppResult<DailyEntry> {
        let entry = self.ensure_today_entry(ctx).await?;
        let entry = self
            .store
            .update_daily_entry(
                entry.id,
                EntryPatch {
                    mood,
                    note,
                    ..Default::default()
                },
            )
            .await?;
        Ok(entry)
    }

    /// The per-kind checkbox view for today. Read-only: a day the user has
    /// not touched yet yields an empty board without creating an entry.
    pub async fn goal_board(&self, ctx: &SessionContext) -> AppResult<GoalBoard> {
        let entry = self.today_entry(ctx).await?;
        let activities = match &entry {
            Some(entry) => self.store.get_activities(entry.id).await?,
            None => Vec::new(),
        };

        let goals: Vec<GoalStatus> = ActivityKind::ALL
            .iter()
            .map(|&kind| GoalStatus {
                kind,
                points: kind.points(ctx.emergency_mode),
                completed: activities.iter().any(|a| a.kind == kind),
            })
            .collect();
        let completed_count = goals.iter().filter(|g| g.completed).count();

        Ok(GoalBoard {
            goals,
            completed_count,
            daily_points: entry.map(|e| e.total_points).unwrap_or(0),
            max_daily_points: scoring::max_daily_points(ctx.emergency_mode),
            emergency_mode: ctx.emergency_mode,
        })
    }

    pub async fn current_streak(&self, ctx: &SessionContext) -> AppResult<u32> {
        let dates = self.store.scoring_dates(ctx.user_id).await?;
        Ok(scoring::streak_len(ctx.today, &dates))
    }

    pub async fn progress(&self, ctx: &SessionContext) -> AppResult<ProgressSummary> {
        let total_points = self.store.total_points(ctx.user_id).await?;
        let daily_points = self
            .today_entry(ctx)
            .await?
            .map(|e| e.total_points)
            .unwrap_or(0);
        let streak = self.current_streak(ctx).await?;

        Ok(ProgressSummary {
            daily_points,
            total_points,
            level: scoring::level_for(total_points),
            level_progress: scoring::level_progress(total_points),
            points_to_next_level: scoring::points_to_next_level(total_points),
            streak,
        })
    }

    async fn today_entry(&self, ctx: &SessionContext) -> AppResult<Option<DailyEntry>> {
        let recent = self.store.get_daily_entries(ctx.user_id, 1).await?;
        Ok(recent
            .into_iter()
            .next()
            .filter(|e| e.entry_date == ctx.today))
    }

    async fn check_not_completed(&self, entry: &DailyEntry, kind: ActivityKind) -> AppResult<()> {
        let activities = self.store.get_activities(entry.id).await?;
        if activities.iter().any(|a| a.kind == kind) {
            return Err(already_completed(kind));
        }
        Ok(())
    }

    /// Shared award tail: append the activity, bump the entry total, then
    /// derive level/celebration from the store's authoritative rows.
    async fn award(
        &self,
        ctx: &SessionContext,
        entry: DailyEntry,
        kind: ActivityKind,
        weight_kg: Option<f64>,
    ) -> AppResult<ActivityOutcome> {
        let points = kind.points(ctx.emergency_mode);

        let activity = self
            .store
            .add_activity(entry.id, kind, points)
            .await
            .map_err(|e| match e {
                StoreError::Conflict => already_completed(kind),
                other => other.into(),
            })?;

        let entry = self
            .store
            .update_daily_entry(
                entry.id,
                EntryPatch {
                    weight_kg,
                    total_points: Some(entry.total_points + points),
                    ..Default::default()
                },
            )
            .await?;

        let total_points = self.store.total_points(ctx.user_id).await?;
        let level = scoring::level_for(total_points);
        let leveled_up = level > scoring::level_for(total_points - i64::from(points));
        let celebrate = leveled_up || entry.total_points >= scoring::CELEBRATION_THRESHOLD;

        Ok(ActivityOutcome {
            activity: Some(activity),
            points_awarded: points,
            daily_points: entry.total_points,
            total_points,
            level,
            leveled_up,
            celebrate,
            entry,
        })
    }
}

fn already_completed(kind: ActivityKind) -> AppError {
    AppError::Conflict(format!("{kind} already completed today"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryGateway;
    use chrono::{Duration, NaiveDate};

    fn ctx(user_id: Uuid, today: NaiveDate) -> SessionContext {
        SessionContext {
            user_id,
            today,
            emergency_mode: false,
        }
    }

    fn today() -> NaiveDate {
        "2024-03-10".parse().unwrap()
    }

    fn ledger() -> Ledger<MemoryGateway> {
        Ledger::new(MemoryGateway::default())
    }

    #[tokio::test]
    async fn ensure_today_entry_is_idempotent() {
        let ledger = ledger();
        let ctx = ctx(Uuid::new_v4(), today());

        let first = ledger.ensure_today_entry(&ctx).await.unwrap();
        let second = ledger.ensure_today_entry(&ctx).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.total_points, 0);
        assert!(first.mood.is_none());
    }

    #[tokio::test]
    async fn new_day_gets_a_fresh_entry() {
        let ledger = ledger();
        let user = Uuid::new_v4();

        let yesterday = ledger
            .ensure_today_entry(&ctx(user, today() - Duration::days(1)))
            .await
            .unwrap();
        let entry = ledger.ensure_today_entry(&ctx(user, today())).await.unwrap();

        assert_ne!(yesterday.id, entry.id);
        assert_eq!(entry.entry_date, today());
    }

    #[tokio::test]
    async fn recording_awards_scheduled_points() {
        let ledger = ledger();
        let ctx = ctx(Uuid::new_v4(), today());

        let outcome = ledger
            .record_activity(&ctx, ActivityKind::Exercise)
            .await
            .unwrap();

        assert_eq!(outcome.points_awarded, 2);
        assert_eq!(outcome.daily_points, 2);
        assert_eq!(outcome.total_points, 2);
        assert_eq!(outcome.level, 1);
        assert!(!outcome.leveled_up);
        assert!(!outcome.celebrate);
    }

    #[tokio::test]
    async fn repeat_kind_same_day_is_rejected() {
        let ledger = ledger();
        let ctx = ctx(Uuid::new_v4(), today());

        ledger
            .record_activity(&ctx, ActivityKind::Water)
            .await
            .unwrap();
        let err = ledger
            .record_activity(&ctx, ActivityKind::Water)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));

        let board = ledger.goal_board(&ctx).await.unwrap();
        assert_eq!(board.daily_points, 1);
    }

    #[tokio::test]
    async fn emergency_mode_reduces_exercise_points() {
        let ledger = ledger();
        let mut ctx = ctx(Uuid::new_v4(), today());
        ctx.emergency_mode = true;

        let outcome = ledger
            .record_activity(&ctx, ActivityKind::Exercise)
            .await
            .unwrap();

        assert_eq!(outcome.points_awarded, 1);
    }

    #[tokio::test]
    async fn completing_every_goal_triggers_celebration() {
        let ledger = ledger();
        let ctx = ctx(Uuid::new_v4(), today());

        let mut last = None;
        for kind in ActivityKind::ALL {
            last = Some(ledger.record_activity(&ctx, kind).await.unwrap());
        }

        let outcome = last.unwrap();
        assert_eq!(outcome.daily_points, 5);
        assert!(outcome.celebrate);
    }

    #[tokio::test]
    async fn weight_awards_once_then_only_updates() {
        let ledger = ledger();
        let ctx = ctx(Uuid::new_v4(), today());

        let first = ledger.record_weight(&ctx, 71.5).await.unwrap();
        assert_eq!(first.points_awarded, 1);
        assert_eq!(first.entry.weight_kg, Some(71.5));

        let second = ledger.record_weight(&ctx, 71.0).await.unwrap();
        assert_eq!(second.points_awarded, 0);
        assert_eq!(second.entry.weight_kg, Some(71.0));
        assert_eq!(second.daily_points, 1);
        assert!(second.activity.is_none());
    }

    #[tokio::test]
    async fn mood_update_awards_nothing() {
        let ledger = ledger();
        let ctx = ctx(Uuid::new_v4(), today());

        let entry = ledger
            .update_today(&ctx, Some(Mood::Good), Some("solid day".into()))
            .await
            .unwrap();

        assert_eq!(entry.mood, Some(Mood::Good));
        assert_eq!(entry.note.as_deref(), Some("solid day"));
        assert_eq!(entry.total_points, 0);
    }

    #[tokio::test]
    async fn streak_spans_consecutive_scoring_days() {
        let ledger = ledger();
        let user = Uuid::new_v4();

        for offset in (0..3).rev() {
            let day_ctx = ctx(user, today() - Duration::days(offset));
            ledger
                .record_activity(&day_ctx, ActivityKind::Water)
                .await
                .unwrap();
        }

        assert_eq!(ledger.current_streak(&ctx(user, today())).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn streak_is_zero_without_points_today() {
        let ledger = ledger();
        let user = Uuid::new_v4();

        let yesterday = ctx(user, today() - Duration::days(1));
        ledger
            .record_activity(&yesterday, ActivityKind::Water)
            .await
            .unwrap();

        assert_eq!(ledger.current_streak(&ctx(user, today())).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn streak_for_new_user_is_zero() {
        let ledger = ledger();
        assert_eq!(
            ledger
                .current_streak(&ctx(Uuid::new_v4(), today()))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn goal_board_reads_without_creating_an_entry() {
        let ledger = ledger();
        let ctx = ctx(Uuid::new_v4(), today());

        let board = ledger.goal_board(&ctx).await.unwrap();
        assert_eq!(board.completed_count, 0);
        assert_eq!(board.daily_points, 0);
        assert_eq!(board.max_daily_points, 5);

        // Still no entry: the board is a pure read.
        let entries = ledger.store.get_daily_entries(ctx.user_id, 10).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn progress_reflects_store_totals() {
        let ledger = ledger();
        let user = Uuid::new_v4();

        // Seed 99 points yesterday, then record one today to cross a level.
        let yesterday = today() - Duration::days(1);
        let seeded = ledger
            .store
            .create_daily_entry(
                user,
                yesterday,
                NewEntry {
                    total_points: 99,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(seeded.total_points, 99);

        let ctx = ctx(user, today());
        let outcome = ledger
            .record_activity(&ctx, ActivityKind::WeighIn)
            .await
            .unwrap();
        assert!(outcome.leveled_up);
        assert!(outcome.celebrate);

        let progress = ledger.progress(&ctx).await.unwrap();
        assert_eq!(progress.total_points, 100);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.daily_points, 1);
        assert_eq!(progress.points_to_next_level, 100);
        assert_eq!(progress.streak, 2);
    }
}
