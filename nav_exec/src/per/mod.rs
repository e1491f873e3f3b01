//! # Perception module
//!
//! Target detections arrive from the vision pipeline independently of the control tick. This
//! module resolves which camera is in use and filters the incoming detections down to a single
//! [`TargetObservation`] per tick.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cam_mode;
pub use cam_mode::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Duration;

use log::{debug, warn};
use util::time::secs_to_duration;

use crate::snapshot::SnapshotReader;

pub use comms_if::detection::{Detection, TargetObservation};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Provides the latest target observation from the active camera.
#[derive(Debug, Clone)]
pub struct TargetMgr {
    source: SnapshotReader<Detection>,

    /// The camera whose detections are accepted
    cam_mode: CameraMode,

    /// Detections older than this are treated as no detection
    max_age: Duration,

    /// Sequence number of the last detection rejected for its frame, to warn only once per
    /// message
    last_rejected_seq: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TargetMgr {
    /// Create a new manager. A non-positive `max_age_s` makes every detection stale.
    pub fn new(source: SnapshotReader<Detection>, cam_mode: CameraMode, max_age_s: f64) -> Self {
        Self {
            source,
            cam_mode,
            max_age: secs_to_duration(max_age_s),
            last_rejected_seq: 0,
        }
    }

    /// The camera this manager accepts detections from.
    pub fn cam_mode(&self) -> CameraMode {
        self.cam_mode
    }

    /// Get the current observation.
    ///
    /// Returns `TargetObservation::None` if nothing has been detected, the latest detection is
    /// older than the maximum age, or the detection came from a frame other than the active
    /// camera's.
    pub fn get_observation(&mut self) -> TargetObservation {
        let snapshot = match self.source.latest() {
            Some(s) => s,
            None => return TargetObservation::None,
        };

        if snapshot.stamp.elapsed() > self.max_age {
            debug!(
                "Latest detection is {:.3} s old, treating as no detection",
                snapshot.stamp.elapsed().as_secs_f64()
            );
            return TargetObservation::None;
        }

        let detection = snapshot.value;

        if detection.obs.is_some() && detection.frame_id != self.cam_mode.frame_id() {
            if snapshot.seq != self.last_rejected_seq {
                warn!(
                    "Ignoring detection in frame \"{}\", expected \"{}\" for {:?} camera",
                    detection.frame_id,
                    self.cam_mode.frame_id(),
                    self.cam_mode
                );
                self.last_rejected_seq = snapshot.seq;
            }
            return TargetObservation::None;
        }

        detection.obs
    }
}
