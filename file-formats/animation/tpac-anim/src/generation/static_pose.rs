use std::sync::Arc;

use crate::animation::{AnimationSource, SkeletalAnimation};
use crate::error::Result;
use crate::skeleton::SkeletonDefinition;
use crate::track::BoneTrack;

use super::{BaseTarget, MethodOwner, reference_times};

/// Holds one rotation for every frame
///
/// The rotation is the owner bone's rest rotation or a single key copied
/// from another animation.
#[derive(Debug, Clone)]
pub struct StaticPose {
    pub owner: MethodOwner,
    pub base: BaseTarget,
}

impl StaticPose {
    pub fn new(bone: usize, skeleton: Arc<SkeletonDefinition>) -> Self {
        Self {
            owner: MethodOwner::new(bone, skeleton),
            base: BaseTarget::rest(bone),
        }
    }

    pub(super) fn generate<S: AnimationSource + ?Sized>(
        &self,
        target: &SkeletalAnimation,
        assets: &S,
    ) -> Result<BoneTrack> {
        let times = reference_times(target)?;
        let rotation = self.base.rotation(&self.owner, assets)?;
        Ok(BoneTrack::from_rotations(
            times.into_iter().map(|time| (time, rotation)),
        ))
    }

    pub(super) fn create_copy(
        &self,
        new_bone: usize,
        new_skeleton: Arc<SkeletonDefinition>,
        keep_bone_indices: bool,
    ) -> Self {
        let mut copy = Self::new(new_bone, new_skeleton);
        copy.base.animation.clone_from(&self.base.animation);
        copy.base.frame = self.base.frame;
        if !keep_bone_indices {
            copy.base.bone = self.base.bone;
        }
        copy
    }
}
