pub mod activities;
pub mod auth;
pub mod entries;
pub mod health;
pub mod stats;

use chrono::{NaiveDate, Utc};

use crate::error::{AppError, AppResult};

/// Resolve the client's calendar day. The device clock may straddle the
/// server's midnight, so a day of drift is allowed; anything further off is
/// rejected.
pub(crate) fn resolve_local_date(local_date: Option<NaiveDate>) -> AppResult<NaiveDate> {
    let today = Utc::now().date_naive();
    let date = local_date.unwrap_or(today);
    if (date - today).num_days().abs() > 1 {
        return Err(AppError::Validation(
            "local_date must be within one day of the server date".into(),
        ));
    }
    Ok(date)
}
