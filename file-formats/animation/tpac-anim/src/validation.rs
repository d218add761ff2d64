//! Non-fatal consistency checks on decoded animations
//!
//! Nothing reported here stops an animation from being used or re-encoded.
//! The binary format is only partially understood, so surprises in reserved
//! fields are surfaced for inspection rather than rejected.

use thiserror::Error;

use crate::animation::{ReservedFields, SkeletalAnimation};

/// A single finding of [`validate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A reserved field holds something other than the value seen in every known file
    #[error("reserved field {field} is {actual}, expected {expected}")]
    ReservedValue {
        field: &'static str,
        expected: i32,
        actual: i32,
    },

    /// The stored trailing offset disagrees with the section length
    #[error("trailing offset is {stored}, section length implies {computed}")]
    TrailingOffset { stored: i32, computed: i32 },

    /// The activity matrix covers a different number of bones than there are tracks
    #[error("activity matrix covers {activity} bones but the animation has {tracks} tracks")]
    ActivityBoneCount { activity: usize, tracks: usize },

    /// The activity matrix covers a different number of frames than the header
    #[error("activity matrix covers {activity} frames but the header declares {frames}")]
    ActivityFrameCount { activity: usize, frames: usize },

    /// A bone track has no rotation keys
    #[error("bone {bone} has no rotation keys")]
    EmptyTrack { bone: usize },

    /// A key lies outside `[0, duration]`
    #[error("bone {bone} has a key at {time}, outside [0, {duration}]")]
    KeyOutsideDuration { bone: usize, time: f32, duration: f32 },
}

/// Findings for one animation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether no diagnostics were reported
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Print the report to the console
    pub fn print(&self) {
        if self.is_clean() {
            println!("No validation issues found.");
            return;
        }
        println!("Validation Warnings:");
        for diagnostic in &self.diagnostics {
            println!("  - {diagnostic}");
        }
    }
}

fn check_reserved(report: &mut ValidationReport, field: &'static str, expected: i32, actual: i32) {
    if expected != actual {
        report.push(Diagnostic::ReservedValue {
            field,
            expected,
            actual,
        });
    }
}

/// Check an animation for surprises in the partially understood fields
pub fn validate(anim: &SkeletalAnimation) -> ValidationReport {
    let mut report = ValidationReport::new();
    let known = ReservedFields::default();
    let reserved = &anim.reserved;

    check_reserved(&mut report, "header_a", known.header_a, reserved.header_a);
    check_reserved(&mut report, "header_b", known.header_b, reserved.header_b);
    check_reserved(
        &mut report,
        "activity_lead",
        known.activity_lead,
        reserved.activity_lead,
    );
    check_reserved(
        &mut report,
        "activity_flag",
        i32::from(known.activity_flag),
        i32::from(reserved.activity_flag),
    );
    check_reserved(
        &mut report,
        "activity_tail",
        known.activity_tail,
        reserved.activity_tail,
    );

    if let Some(stored) = reserved.trailing_offset {
        if let Ok(computed) = anim.computed_trailing_offset() {
            if stored != computed {
                report.push(Diagnostic::TrailingOffset { stored, computed });
            }
        }
    }

    if anim.activity.bone_count() != anim.bone_tracks.len() {
        report.push(Diagnostic::ActivityBoneCount {
            activity: anim.activity.bone_count(),
            tracks: anim.bone_tracks.len(),
        });
    }
    if anim.activity.frame_count() != anim.frame_count {
        report.push(Diagnostic::ActivityFrameCount {
            activity: anim.activity.frame_count(),
            frames: anim.frame_count,
        });
    }

    for (bone, track) in anim.bone_tracks.iter().enumerate() {
        if track.is_empty() {
            report.push(Diagnostic::EmptyTrack { bone });
            continue;
        }
        let outside = track
            .rotations
            .times()
            .find(|&t| t < 0.0 || t > anim.duration);
        if let Some(time) = outside {
            report.push(Diagnostic::KeyOutsideDuration {
                bone,
                time,
                duration: anim.duration,
            });
        }
    }

    report
}
