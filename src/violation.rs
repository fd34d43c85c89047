//! Violation records.
//!
//! A `Violation` is the interchange record consumed by every downstream
//! collaborator (dashboard, statistics, CSV export, fining). Records are
//! immutable once created: the ledger only inserts and evicts them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Typed traffic violation categories.
///
/// `Unknown` is reserved for model classes without a mapping entry. The
/// current model class list is closed, so the normal detection path never
/// produces it, but exports and statistics handle it uniformly.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    Helmetless,
    Overspeeding,
    RedLight,
    TripleRiding,
    Unknown,
}

impl ViolationType {
    pub const ALL: [ViolationType; 5] = [
        ViolationType::Helmetless,
        ViolationType::Overspeeding,
        ViolationType::RedLight,
        ViolationType::TripleRiding,
        ViolationType::Unknown,
    ];

    /// Wire name, as serialized into exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::Helmetless => "helmetless",
            ViolationType::Overspeeding => "overspeeding",
            ViolationType::RedLight => "red_light",
            ViolationType::TripleRiding => "triple_riding",
            ViolationType::Unknown => "unknown",
        }
    }

    /// Human-readable label for alerts and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ViolationType::Helmetless => "Helmetless Driving",
            ViolationType::Overspeeding => "Overspeeding",
            ViolationType::RedLight => "Red Light Violation",
            ViolationType::TripleRiding => "Triple Riding",
            ViolationType::Unknown => "Unknown Violation",
        }
    }

    /// Fine amount in rupees for this violation category.
    pub fn fine_rupees(&self) -> u32 {
        match self {
            ViolationType::Helmetless => 1000,
            ViolationType::Overspeeding => 2000,
            ViolationType::RedLight => 5000,
            ViolationType::TripleRiding => 1500,
            ViolationType::Unknown => 1000,
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected traffic violation.
///
/// The five fields consumed by the export collaborator (timestamp, type,
/// plate, location, confidence) are always present and non-null.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Violation {
    /// Unique, monotonically increasing per process lifetime.
    pub id: u64,
    pub violation_type: ViolationType,
    /// License plate identifier (synthesized until a real OCR stage lands).
    pub plate: String,
    /// Camera source identifier (e.g. "cam:junction_1").
    pub location: String,
    /// Capture instant of the frame the violation was detected in.
    pub timestamp: DateTime<Utc>,
    /// Integer percent, 0..=100.
    pub confidence: u8,
}
