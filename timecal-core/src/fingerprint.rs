//! Stable identity for imported events.
//!
//! A fingerprint is the first 8 hex characters of the MD5 digest of
//! `"{title}_{start}_{end}"`, with both instants in ISO-8601 at the precision
//! Toggl reported them (seconds kept, microseconds only when non-zero). It is
//! embedded in the notes of every event timecal creates, so a later run can
//! recognise the event even after its title was edited. Collisions are
//! possible and accepted: a colliding entry is reported as a duplicate.

use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, Timelike};
use md5::{Digest, Md5};

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventFingerprint(String);

impl EventFingerprint {
    /// Derive the fingerprint of an event. Instants are hashed untruncated;
    /// dropping seconds is the calendar store's concern.
    pub fn derive(title: &str, start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> Self {
        let canonical = format!(
            "{}_{}_{}",
            title,
            iso(start),
            iso(end)
        );

        let digest = Md5::digest(canonical.as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(FINGERPRINT_LEN);
        EventFingerprint(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shorthand for [`EventFingerprint::derive`].
pub fn fingerprint(
    title: &str,
    start: &DateTime<FixedOffset>,
    end: &DateTime<FixedOffset>,
) -> EventFingerprint {
    EventFingerprint::derive(title, start, end)
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

/// ISO-8601 with explicit offset, e.g. `2025-07-30T09:00:42+00:00`, or
/// `2025-07-30T09:00:42.500000+00:00` when there is a fractional second.
fn iso(dt: &DateTime<FixedOffset>) -> String {
    let precision = if dt.nanosecond() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    dt.to_rfc3339_opts(precision, false)
}
