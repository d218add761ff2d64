//! Per-bone animation tracks

use glam::{Quat, Vec4};

use crate::error::Result;
use crate::keyframe::{KeyframeStore, Sample};

/// Opaque integers stored around each bone block of the binary format
///
/// Their meaning is unknown; they are carried through decode and encode
/// unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackTags {
    /// Written before the keyframe count
    pub leading: i32,
    /// First value written after the rotation keys
    pub trailing_a: i32,
    /// Second value written after the rotation keys
    pub trailing_b: i32,
}

/// Rotation (and optional position) keyframes of a single bone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTrack {
    pub rotations: KeyframeStore<Quat>,
    /// Only ever populated for the root bone
    pub positions: Option<KeyframeStore<Vec4>>,
    pub tags: TrackTags,
}

impl BoneTrack {
    /// Create an empty track
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a track from rotation keys
    pub fn from_rotations(frames: impl IntoIterator<Item = (f32, Quat)>) -> Self {
        Self {
            rotations: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Number of rotation keys
    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    /// Sample the rotation at `time`
    pub fn interpolated_rotation(&self, time: f32) -> Result<Sample<Quat>> {
        self.rotations.get_interpolated(time)
    }

    /// Sample the position at `time`; tracks without positions report zero
    pub fn interpolated_position(&self, time: f32) -> Result<Sample<Vec4>> {
        match &self.positions {
            Some(positions) => positions.get_interpolated(time),
            None => Ok(Sample {
                value: Vec4::ZERO,
                lower: time,
                upper: time,
            }),
        }
    }

    /// Add a rotation key
    pub fn push_rotation(&mut self, time: f32, rotation: Quat) {
        self.rotations.insert(time, rotation);
    }
}
