pub mod auth;
pub mod error;
pub mod ideas;
pub mod messages;
pub mod middleware;
pub mod users;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; fall back to RFC 3339 first in case a
/// row was written with an explicit offset.
pub(crate) fn parse_timestamp(raw: &str, ctx: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, ctx, e);
            DateTime::default()
        })
}

pub(crate) fn parse_uuid_lossy(raw: &str, ctx: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", raw, ctx, e);
        Uuid::default()
    })
}
