//! Detection-to-violation mapping.
//!
//! The mapper turns a transient `Detection` into an immutable `Violation`
//! record: it assigns the process-wide id, stamps the capture instant and
//! camera source, applies the class-to-violation table, and attaches a
//! plate identifier through a pluggable reader capability.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detect::{Detection, ModelClass};
use crate::violation::{Violation, ViolationType};

/// Shared monotonic violation id source, one per process.
pub fn violation_id_source() -> Arc<AtomicU64> {
    Arc::new(AtomicU64::new(1))
}

/// Fixed mapping from model classes to violation types.
///
/// The model class enumeration is closed, so this match is total. A model
/// class added without an entry here belongs to `ViolationType::Unknown`
/// rather than any specific category.
pub fn violation_type_for(class: ModelClass) -> ViolationType {
    match class {
        ModelClass::NoHelmet => ViolationType::Helmetless,
        ModelClass::RedLightCrossing => ViolationType::RedLight,
        ModelClass::TripleRiding => ViolationType::TripleRiding,
        ModelClass::Overspeeding => ViolationType::Overspeeding,
    }
}

/// Plate identification capability.
///
/// Detections carry no plate today, so the synthetic reader stands in for a
/// real OCR stage; swapping in one does not touch the mapper's contract.
pub trait PlateReader: Send {
    fn read_plate(&mut self, detection: &Detection) -> String;
}

/// Synthesizes plates of the form `AAA-1234` from a seedable RNG.
pub struct SyntheticPlateReader {
    rng: StdRng,
}

impl SyntheticPlateReader {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic reader for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SyntheticPlateReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PlateReader for SyntheticPlateReader {
    fn read_plate(&mut self, _detection: &Detection) -> String {
        let letters: String = (0..3)
            .map(|_| char::from(b'A' + self.rng.gen_range(0..26u8)))
            .collect();
        format!("{}-{}", letters, self.rng.gen_range(1000..10000u32))
    }
}

/// Maps detections from one camera into violation records.
pub struct ViolationMapper {
    ids: Arc<AtomicU64>,
    plates: Box<dyn PlateReader>,
}

impl ViolationMapper {
    pub fn new(ids: Arc<AtomicU64>, plates: Box<dyn PlateReader>) -> Self {
        Self { ids, plates }
    }

    pub fn map(&mut self, detection: &Detection, source: &str, now: DateTime<Utc>) -> Violation {
        Violation {
            id: self.ids.fetch_add(1, Ordering::Relaxed),
            violation_type: violation_type_for(detection.class),
            plate: self.plates.read_plate(detection),
            location: source.to_string(),
            timestamp: now,
            confidence: detection.confidence,
        }
    }
}
