use std::sync::Arc;

use glam::Quat;
use log::trace;

use crate::animation::{AnimationId, AnimationSource, SkeletalAnimation, resolve};
use crate::error::{AnimError, Result};
use crate::skeleton::SkeletonDefinition;
use crate::track::BoneTrack;

use super::{BaseTarget, MethodOwner, reference_times};

/// How the source timeline is mapped onto the generated one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum CopyMode {
    /// Scale the source so it spans the target exactly once
    #[default]
    Stretch,
    /// Scale the source so a whole number of repetitions spans the target
    Loop,
}

/// Copies the rotation of a bone from another animation
#[derive(Debug, Clone)]
pub struct CopyFrom {
    pub owner: MethodOwner,
    /// Animation to copy from; mirrors always read the animation being generated
    pub copied_animation: Option<AnimationId>,
    pub copied_bone: usize,
    /// Added to every output time before mapping it onto the source
    pub time_offset: f32,
    /// Apply the copied rotation relative to its rest pose on top of the base rotation
    pub add_from_base: bool,
    /// Leave the first output frame at the base rotation and shift copying back one frame
    pub skip_this_zero_frame: bool,
    /// Never read the source's first frame
    pub skip_source_zero_frame: bool,
    pub base: BaseTarget,
    pub mode: CopyMode,
}

impl CopyFrom {
    fn with_mode(bone: usize, skeleton: Arc<SkeletonDefinition>, mode: CopyMode) -> Self {
        Self {
            owner: MethodOwner::new(bone, skeleton),
            copied_animation: None,
            copied_bone: bone,
            time_offset: 0.0,
            add_from_base: false,
            skip_this_zero_frame: false,
            skip_source_zero_frame: false,
            base: BaseTarget::rest(bone),
            mode,
        }
    }

    pub fn stretch(bone: usize, skeleton: Arc<SkeletonDefinition>) -> Self {
        Self::with_mode(bone, skeleton, CopyMode::Stretch)
    }

    pub fn looped(bone: usize, skeleton: Arc<SkeletonDefinition>) -> Self {
        Self::with_mode(bone, skeleton, CopyMode::Loop)
    }

    /// Configuration used by mirror methods: stretched, copying bone 0 until changed
    pub fn mirror(bone: usize, skeleton: Arc<SkeletonDefinition>) -> Self {
        let mut copy = Self::stretch(bone, skeleton);
        copy.copied_bone = 0;
        copy
    }

    pub(super) fn generate<S: AnimationSource + ?Sized>(
        &self,
        target: &SkeletalAnimation,
        assets: &S,
    ) -> Result<BoneTrack> {
        let id = self.copied_animation.as_ref().ok_or_else(|| {
            AnimError::Config(format!(
                "bone {} copies from no animation",
                self.owner.bone
            ))
        })?;
        let source = resolve(assets, id)?;
        self.copy_onto(target, source, self.mode, assets)
    }

    pub(super) fn generate_mirrored<S: AnimationSource + ?Sized>(
        &self,
        target: &SkeletalAnimation,
        assets: &S,
    ) -> Result<BoneTrack> {
        self.copy_onto(target, target, CopyMode::Stretch, assets)
    }

    /// Ratio between source time and output time
    ///
    /// Non-positive durations map every output time onto the source start.
    pub fn time_scale(mode: CopyMode, duration: f32, source_duration: f32) -> f32 {
        if duration <= 0.0 || source_duration <= 0.0 {
            return 0.0;
        }
        match mode {
            CopyMode::Stretch => source_duration / duration,
            CopyMode::Loop => {
                let repeats = (duration / source_duration).ceil().max(1.0);
                source_duration * repeats / duration
            }
        }
    }

    fn copy_onto<S: AnimationSource + ?Sized>(
        &self,
        target: &SkeletalAnimation,
        source: &SkeletalAnimation,
        mode: CopyMode,
        assets: &S,
    ) -> Result<BoneTrack> {
        let times = reference_times(target)?;
        let base = self.base.rotation(&self.owner, assets)?;
        let copied_track = source.bone_track(self.copied_bone)?;
        let copied_rest = if self.add_from_base {
            self.owner.rest_rotation(self.copied_bone)?.conjugate()
        } else {
            Quat::IDENTITY
        };

        let skip_this = if self.skip_this_zero_frame { 1.0 } else { 0.0 };
        let skip_source = if self.skip_source_zero_frame { 1.0 } else { 0.0 };
        let duration = target.duration - skip_this;
        let source_duration = source.duration - skip_source;
        let scale = Self::time_scale(mode, duration, source_duration);
        trace!(
            "Bone {} copies bone {} of '{}' with scale {scale}",
            self.owner.bone, self.copied_bone, source.name
        );

        let mut track = BoneTrack::new();
        for (index, &time) in times.iter().enumerate() {
            if index == 0 && self.skip_this_zero_frame {
                track.push_rotation(time, base);
                continue;
            }

            let mut copy_time = (time + self.time_offset - skip_this) * scale;
            if mode == CopyMode::Loop && source_duration > 0.0 {
                copy_time = copy_time.rem_euclid(source_duration);
            }
            copy_time += skip_source;

            let copied = copied_track.interpolated_rotation(copy_time)?.value;
            let rotation = if self.add_from_base {
                copied_rest * copied * base
            } else {
                copied
            };
            track.push_rotation(time, rotation);
        }
        Ok(track)
    }

    pub(super) fn create_copy(
        &self,
        new_bone: usize,
        new_skeleton: Arc<SkeletonDefinition>,
        keep_bone_indices: bool,
    ) -> Self {
        let fresh = Self::with_mode(new_bone, new_skeleton, self.mode);
        let (copied_bone, base_bone) = if keep_bone_indices {
            (fresh.copied_bone, fresh.base.bone)
        } else {
            (self.copied_bone, self.base.bone)
        };

        Self {
            copied_animation: self.copied_animation.clone(),
            copied_bone,
            time_offset: self.time_offset,
            add_from_base: self.add_from_base,
            skip_this_zero_frame: self.skip_this_zero_frame,
            skip_source_zero_frame: self.skip_source_zero_frame,
            base: BaseTarget {
                animation: self.base.animation.clone(),
                bone: base_bone,
                frame: self.base.frame,
            },
            ..fresh
        }
    }
}
