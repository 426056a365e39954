use chrono::{DateTime, Duration, Utc};

pub const STALE_PENALTY: f64 = 0.8;
pub const MIN_FRESHNESS: f64 = 0.1;
/// Freshness reported when a request had no snapshot at all to rely on.
pub const NO_DATA_FRESHNESS: f64 = 0.5;

pub fn is_stale(timestamp: &DateTime<Utc>, max_age: Duration, now: &DateTime<Utc>) -> bool {
    *now - *timestamp > max_age
}

pub fn freshness(timestamp: &DateTime<Utc>, max_age: Duration, now: &DateTime<Utc>) -> f64 {
    let age = *now - *timestamp;
    if age <= max_age {
        return 1.0;
    }
    let max_secs = max_age.num_seconds().max(1) as f64;
    let overdue = (age - max_age).num_seconds() as f64 / max_secs;
    (STALE_PENALTY * 0.5_f64.powf(overdue)).max(MIN_FRESHNESS)
}

/// Mean freshness over a set of snapshot timestamps.
pub fn mean_freshness<'a, I>(timestamps: I, max_age: Duration, now: &DateTime<Utc>) -> f64
where
    I: IntoIterator<Item = &'a DateTime<Utc>>,
{
    let (sum, count) = timestamps
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), ts| (sum + freshness(ts, max_age, now), n + 1));
    if count == 0 {
        NO_DATA_FRESHNESS
    } else {
        sum / count as f64
    }
}
