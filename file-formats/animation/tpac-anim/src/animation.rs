//! In-memory skeletal animation

use glam::{Vec3, Vec4};

use crate::activity::BoneActivityMatrix;
use crate::error::{AnimError, Result};
use crate::keyframe::KeyframeStore;
use crate::track::BoneTrack;

/// Identifier used to look animations up in an [`AnimationSource`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(transparent))]
pub struct AnimationId(pub String);

impl AnimationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnimationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnimationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Values of the binary format that are stored but not understood
///
/// Decoding captures them, encoding writes them back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedFields {
    /// First header integer, always 1 in known files
    pub header_a: i32,
    /// Second header integer, always 1 in known files
    pub header_b: i32,
    /// Integer before the activity block, always 0 in known files
    pub activity_lead: i32,
    /// Byte before the activity bone count, always 1 in known files
    pub activity_flag: u8,
    /// Integer after the activity frame count, always 0 in known files
    pub activity_tail: i32,
    /// Trailing offset as read from the file; `None` for animations built in memory
    pub trailing_offset: Option<i32>,
}

impl Default for ReservedFields {
    fn default() -> Self {
        Self {
            header_a: 1,
            header_b: 1,
            activity_lead: 0,
            activity_flag: 1,
            activity_tail: 0,
            trailing_offset: None,
        }
    }
}

/// A decoded skeletal animation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletalAnimation {
    /// Asset name, not part of the binary section
    pub name: String,
    /// Name of the skeleton this animation targets
    pub skeleton: String,
    pub frame_count: usize,
    /// Playback length in time units; decoding sets it to `frame_count - 1`
    pub duration: f32,
    /// Tracks index-aligned with the skeleton's bones
    pub bone_tracks: Vec<BoneTrack>,
    pub root_positions: KeyframeStore<Vec4>,
    pub activity: BoneActivityMatrix,
    pub reserved: ReservedFields,
}

impl SkeletalAnimation {
    /// Create an empty animation for `skeleton`
    pub fn new(name: impl Into<String>, skeleton: impl Into<String>, frame_count: usize) -> Self {
        Self {
            name: name.into(),
            skeleton: skeleton.into(),
            frame_count,
            duration: frame_count.saturating_sub(1) as f32,
            ..Self::default()
        }
    }

    /// Identifier of this animation in an animation table
    pub fn id(&self) -> AnimationId {
        AnimationId::new(self.name.clone())
    }

    pub fn bone_count(&self) -> usize {
        self.bone_tracks.len()
    }

    /// Track of `bone`
    pub fn bone_track(&self, bone: usize) -> Result<&BoneTrack> {
        self.bone_tracks
            .get(bone)
            .ok_or_else(|| AnimError::out_of_range("bone track", bone, self.bone_tracks.len()))
    }

    /// Track of bone 0, which frames every generated track
    pub fn reference_track(&self) -> Result<&BoneTrack> {
        let track = self.bone_tracks.first().ok_or_else(|| {
            AnimError::EmptyTrack(format!("animation '{}' has no bone tracks", self.name))
        })?;
        if track.is_empty() {
            return Err(AnimError::EmptyTrack(format!(
                "animation '{}' has no keyframes on bone 0",
                self.name
            )));
        }
        Ok(track)
    }

    /// Root offset at `time`; animations without root keys stay at the origin
    pub fn root_position_at(&self, time: f32) -> Result<Vec3> {
        if self.root_positions.is_empty() {
            return Ok(Vec3::ZERO);
        }
        Ok(self.root_positions.get_interpolated(time)?.value.truncate())
    }

    /// Replace or append the track of `bone`
    ///
    /// Tracks stay index-aligned, so `bone` may be at most one past the
    /// current track count.
    pub fn set_bone_track(&mut self, bone: usize, track: BoneTrack) -> Result<()> {
        match bone.cmp(&self.bone_tracks.len()) {
            std::cmp::Ordering::Less => {
                self.bone_tracks[bone] = track;
                Ok(())
            }
            std::cmp::Ordering::Equal => {
                self.bone_tracks.push(track);
                Ok(())
            }
            std::cmp::Ordering::Greater => Err(AnimError::out_of_range(
                "bone track",
                bone,
                self.bone_tracks.len(),
            )),
        }
    }
}

/// Lookup of animations by identifier
///
/// Generation methods only hold identifiers; the table that owns the
/// animations is supplied at generation time.
pub trait AnimationSource {
    fn animation(&self, id: &AnimationId) -> Option<&SkeletalAnimation>;
}

impl AnimationSource for std::collections::HashMap<AnimationId, SkeletalAnimation> {
    fn animation(&self, id: &AnimationId) -> Option<&SkeletalAnimation> {
        self.get(id)
    }
}

impl AnimationSource for std::collections::BTreeMap<AnimationId, SkeletalAnimation> {
    fn animation(&self, id: &AnimationId) -> Option<&SkeletalAnimation> {
        self.get(id)
    }
}

impl AnimationSource for [SkeletalAnimation] {
    fn animation(&self, id: &AnimationId) -> Option<&SkeletalAnimation> {
        self.iter().find(|anim| anim.name == id.0)
    }
}

impl AnimationSource for Vec<SkeletalAnimation> {
    fn animation(&self, id: &AnimationId) -> Option<&SkeletalAnimation> {
        self.as_slice().animation(id)
    }
}

/// Resolve `id` or fail with [`AnimError::UnknownAnimation`]
pub fn resolve<'a, S: AnimationSource + ?Sized>(
    source: &'a S,
    id: &AnimationId,
) -> Result<&'a SkeletalAnimation> {
    source
        .animation(id)
        .ok_or_else(|| AnimError::UnknownAnimation(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_new_sets_duration_from_frames() {
        let anim = SkeletalAnimation::new("walk", "human_skeleton", 31);
        assert_eq!(anim.duration, 30.0);
        assert_eq!(anim.reserved, ReservedFields::default());
    }

    #[test]
    fn test_reference_track_requires_keys() {
        let mut anim = SkeletalAnimation::new("idle", "human_skeleton", 2);
        assert!(matches!(
            anim.reference_track(),
            Err(AnimError::EmptyTrack(_))
        ));

        anim.bone_tracks.push(BoneTrack::new());
        assert!(matches!(
            anim.reference_track(),
            Err(AnimError::EmptyTrack(_))
        ));

        anim.bone_tracks[0].push_rotation(0.0, Quat::IDENTITY);
        assert!(anim.reference_track().is_ok());
    }

    #[test]
    fn test_set_bone_track_keeps_alignment() {
        let mut anim = SkeletalAnimation::new("idle", "human_skeleton", 2);
        anim.set_bone_track(0, BoneTrack::new()).unwrap();
        assert!(matches!(
            anim.set_bone_track(2, BoneTrack::new()),
            Err(AnimError::IndexOutOfRange { index: 2, len: 1, .. })
        ));
    }

    #[test]
    fn test_slice_source_resolves_by_name() {
        let anims = vec![
            SkeletalAnimation::new("walk", "human_skeleton", 2),
            SkeletalAnimation::new("run", "human_skeleton", 2),
        ];
        assert_eq!(resolve(&anims, &"run".into()).unwrap().name, "run");
        assert!(matches!(
            resolve(&anims, &"jump".into()),
            Err(AnimError::UnknownAnimation(_))
        ));
    }

    #[test]
    fn test_root_position_defaults_to_origin() {
        let anim = SkeletalAnimation::new("idle", "human_skeleton", 2);
        assert_eq!(anim.root_position_at(1.0).unwrap(), Vec3::ZERO);
    }
}
