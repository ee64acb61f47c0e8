//! Expiration alert policy.
//!
//! Pure functions over a region's deadline and alert window. Day counts use
//! ceiling division, so a deadline 1 hour away is "1 day" away and one
//! 1 hour past is "0 days".

use crate::models::Region;
use chrono::{DateTime, NaiveTime, Utc};

const DAY_MS: i64 = 86_400_000;

/// Whole days until the deadline, rounded up. `None` when no deadline is set.
#[must_use]
pub fn days_until_expiration(region: &Region, now: DateTime<Utc>) -> Option<i64> {
    region.expiration_date.map(|expiration| {
        let ms = (expiration - now).num_milliseconds();
        ms.div_euclid(DAY_MS) + i64::from(ms.rem_euclid(DAY_MS) != 0)
    })
}

/// Deadline falls strictly before the start of `now`'s day.
#[must_use]
pub fn is_overdue_at(region: &Region, now: DateTime<Utc>) -> bool {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    region.expiration_date.is_some_and(|expiration| expiration < today)
}

/// Whether the region is inside its alert window at `now`.
///
/// Overdue regions are always expiring, whatever the alert window.
#[must_use]
pub fn is_expiring_at(region: &Region, now: DateTime<Utc>) -> bool {
    days_until_expiration(region, now)
        .is_some_and(|days| days <= region.alert_days || is_overdue_at(region, now))
}

/// [`is_expiring_at`] evaluated at the current time.
#[must_use]
pub fn is_expiring(region: &Region) -> bool {
    is_expiring_at(region, Utc::now())
}
