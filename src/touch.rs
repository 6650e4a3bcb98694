//! Touch records and the store operations over them.
//!
//! A touch is one recorded interaction with a recognized marketing
//! descriptor. The store is a plain ordered list in first-seen order,
//! materialized fresh from the cookie on every request; all operations
//! here are pure functions over owned data, with `now` supplied by the
//! caller for deterministic testing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolver::Descriptor;
use crate::wire::{self, Transport};

/// One recorded campaign touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchRecord {
    /// Campaign name, free text. May contain the wire delimiters.
    pub name: String,
    /// Campaign type (`visit`, `email`, a UTM `source_medium` pair, ...).
    /// May be empty.
    #[serde(rename = "type")]
    pub kind: String,
    /// Milliseconds since epoch. `None` when the wire field was missing
    /// or malformed; such records never survive the expiry filter.
    pub timestamp: Option<i64>,
}

impl TouchRecord {
    /// Create a record touched at `now`.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>, now: i64) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            timestamp: Some(now),
        }
    }

    /// Whether this record matches a descriptor's composite key,
    /// case-sensitive and exact.
    #[must_use]
    pub fn matches(&self, descriptor: &Descriptor) -> bool {
        self.name == descriptor.name && self.kind == descriptor.kind
    }

    /// Whether this record is inside the attribution window ending at
    /// `cutoff`. Records without a timestamp count as expired.
    #[must_use]
    pub fn is_live(&self, cutoff: i64) -> bool {
        self.timestamp.is_some_and(|t| t >= cutoff)
    }
}

/// Filter records down to those still inside the attribution window.
///
/// Keeps exactly the records with `timestamp >= now - ttl_ms`, preserving
/// order. Pure; does not deduplicate.
#[must_use]
pub fn query(records: Vec<TouchRecord>, now: i64, ttl_ms: i64) -> Vec<TouchRecord> {
    let cutoff = now.saturating_sub(ttl_ms);
    records.into_iter().filter(|r| r.is_live(cutoff)).collect()
}

/// Merge a descriptor into the touch list.
///
/// An existing record with the same `(name, type)` key gets its timestamp
/// updated in place, keeping its first-seen position; otherwise a new
/// record is appended. Expiry is not applied here: callers filter with
/// [`query`] first so merging happens only among still-valid touches.
#[must_use]
pub fn upsert(mut records: Vec<TouchRecord>, descriptor: &Descriptor, now: i64) -> Vec<TouchRecord> {
    if let Some(existing) = records.iter_mut().find(|r| r.matches(descriptor)) {
        debug!(name = %descriptor.name, kind = %descriptor.kind, "refreshing existing touch");
        existing.timestamp = Some(now);
    } else {
        debug!(name = %descriptor.name, kind = %descriptor.kind, "recording new touch");
        records.push(TouchRecord::new(
            descriptor.name.clone(),
            descriptor.kind.clone(),
            now,
        ));
    }
    records
}

/// Decode a raw cookie value and drop expired touches in one step.
#[must_use]
pub fn load(raw: &str, now: i64, ttl_ms: i64) -> Vec<TouchRecord> {
    query(wire::decode(raw), now, ttl_ms)
}

/// Encode a touch list back into a raw cookie value. Cookie attributes
/// (`Max-Age`, `Path`) are applied by the HTTP layer on write.
#[must_use]
pub fn persist(records: &[TouchRecord], transport: Transport) -> String {
    wire::encode(records, transport)
}
