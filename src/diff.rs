// src/diff.rs
//! Change detection between a fresh snapshot and the watermark.
//!
//! The page lists day groups newest first and transactions newest first within
//! a day. Walking both levels in reverse yields oldest-first order, so whatever
//! passes the watermark comes out chronologically. Items are produced lazily:
//! the poll loop can hand each one to the delivery queue before the rest of the
//! snapshot is looked at.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::models::{NewTransaction, Snapshot};

/// Layout of `transactionTime` on the page; fractional seconds are optional
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Error)]
pub enum EventTimeError {
    #[error("{0}")]
    Malformed(#[from] chrono::ParseError),
    #[error("no such local time in {0}")]
    Nonexistent(Tz),
}

/// Per-transaction failure; the rest of the snapshot is still diffed.
#[derive(Debug, Error)]
#[error("transaction {id}: bad time {raw:?}: {kind}")]
pub struct TimeParseError {
    pub id: String,
    pub raw: String,
    #[source]
    pub kind: EventTimeError,
}

/// Interpret a naive page timestamp in the fixed zone.
///
/// Ambiguous wall times (DST fold) resolve to the earlier instant.
pub fn parse_event_time(raw: &str, tz: Tz) -> Result<DateTime<Utc>, EventTimeError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), EVENT_TIME_FORMAT)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or(EventTimeError::Nonexistent(tz))
}

/// Transactions in `snapshot` strictly newer than `watermark`, oldest first.
///
/// A transaction whose time cannot be interpreted yields an `Err` in its slot
/// and the walk continues with the next one. Direction is not looked at here.
pub fn changes_since(
    snapshot: &Snapshot,
    watermark: DateTime<Utc>,
    tz: Tz,
) -> impl Iterator<Item = Result<NewTransaction, TimeParseError>> + '_ {
    snapshot
        .groups
        .iter()
        .rev()
        .flat_map(|group| group.transactions.iter().rev())
        .filter_map(move |tx| match parse_event_time(&tx.transaction_time, tz) {
            Ok(occurred_at) if occurred_at > watermark => Some(Ok(NewTransaction {
                transaction: tx.clone(),
                occurred_at,
            })),
            Ok(_) => None,
            Err(kind) => Some(Err(TimeParseError {
                id: tx.id.clone(),
                raw: tx.transaction_time.clone(),
                kind,
            })),
        })
}
