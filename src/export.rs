//! CSV export of ledger snapshots.
//!
//! The export collaborator serializes the five guaranteed violation fields.
//! Timestamps are RFC 3339 with millisecond precision and a trailing `Z`.

use chrono::SecondsFormat;

use crate::violation::Violation;

pub const CSV_HEADER: &str = "Timestamp,Violation Type,License Plate,Location,Confidence";

/// Serialize a snapshot to CSV, newest entry first (snapshot order).
pub fn violations_to_csv(violations: &[Violation]) -> String {
    let mut out = String::with_capacity((violations.len() + 1) * 64);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for violation in violations {
        out.push_str(&format!(
            "{},{},{},{},{}%\n",
            violation
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            violation.violation_type,
            violation.plate,
            violation.location,
            violation.confidence
        ));
    }
    out
}
