//! Procedural bone-track generation
//!
//! Every bone of a [`Skeleton`](crate::skeleton::Skeleton) owns one
//! [`GenerationMethod`]. A method synthesizes a rotation track for its bone,
//! framed by the keys of bone 0 in the animation being generated:
//!
//! - [`StaticPose`] holds a single rotation for every frame
//! - [`CopyFrom`] retargets a bone of another animation, stretched or looped
//! - Mirror is a [`CopyFrom`] that reads another bone of the animation itself
//! - [`Tail`] wraps any method and adds simulated follow-through
//!
//! Methods never own the animations they read. They refer to them by
//! [`AnimationId`] and resolve them through an [`AnimationSource`] when
//! generating.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use tpac_anim::generation::{CopyFrom, GenerationMethod, Tail};
//! use tpac_anim::{SkeletalAnimation, SkeletonDefinition};
//!
//! # fn run(definition: SkeletonDefinition, walk: SkeletalAnimation) -> tpac_anim::Result<()> {
//! let definition = Arc::new(definition);
//! let mut assets = HashMap::new();
//! assets.insert(walk.id(), walk.clone());
//!
//! let mut copy = CopyFrom::stretch(3, definition.clone());
//! copy.copied_animation = Some(walk.id());
//! copy.copied_bone = 2;
//!
//! let method = GenerationMethod::Tail(Tail::new(GenerationMethod::CopyFrom(copy), 3, definition));
//! let track = method.generate_bone_anim(&walk, &assets)?;
//! println!("{} keys", track.len());
//! # Ok(())
//! # }
//! ```

mod copy_from;
mod static_pose;
mod table;
mod tail;

pub use copy_from::{CopyFrom, CopyMode};
pub use static_pose::StaticPose;
pub use table::{BoneMethodTable, METHOD_SLOTS};
pub use tail::{Tail, TailParams};

use std::fmt;
use std::sync::Arc;

use glam::Quat;

use crate::animation::{AnimationId, AnimationSource, SkeletalAnimation, resolve};
use crate::error::{AnimError, Result};
use crate::skeleton::SkeletonDefinition;
use crate::track::BoneTrack;

/// Identification tag of a generation method
///
/// The tail variants sit at the plain tag plus [`GenerateFramesMethod::Tail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum GenerateFramesMethod {
    Static = 0,
    CopyFromStretch = 1,
    CopyFromLoop = 2,
    Mirror = 3,
    Tail = 4,
    TailAndCopyFromStretch = 5,
    TailAndCopyFromLoop = 6,
    TailAndMirror = 7,
}

impl GenerateFramesMethod {
    pub const ALL: [Self; 8] = [
        Self::Static,
        Self::CopyFromStretch,
        Self::CopyFromLoop,
        Self::Mirror,
        Self::Tail,
        Self::TailAndCopyFromStretch,
        Self::TailAndCopyFromLoop,
        Self::TailAndMirror,
    ];

    /// Convert from the raw tag value
    pub fn from_raw(raw: i32) -> Option<Self> {
        usize::try_from(raw).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn to_raw(self) -> i32 {
        self as i32
    }

    pub fn is_tail(self) -> bool {
        self >= Self::Tail
    }

    /// The tail variant wrapping this method; tail tags map to themselves
    pub fn with_tail(self) -> Self {
        if self.is_tail() {
            self
        } else {
            Self::ALL[self as usize + Self::Tail as usize]
        }
    }

    /// The method wrapped by a tail tag; plain tags map to themselves
    pub fn without_tail(self) -> Self {
        if self.is_tail() {
            Self::ALL[self as usize - Self::Tail as usize]
        } else {
            self
        }
    }
}

impl fmt::Display for GenerateFramesMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Static => "Static",
            Self::CopyFromStretch => "CopyFromStretch",
            Self::CopyFromLoop => "CopyFromLoop",
            Self::Mirror => "Mirror",
            Self::Tail => "Tail",
            Self::TailAndCopyFromStretch => "TailAndCopyFromStretch",
            Self::TailAndCopyFromLoop => "TailAndCopyFromLoop",
            Self::TailAndMirror => "TailAndMirror",
        };
        f.write_str(name)
    }
}

/// The bone a method generates for and the skeleton it belongs to
#[derive(Debug, Clone)]
pub struct MethodOwner {
    pub bone: usize,
    pub skeleton: Arc<SkeletonDefinition>,
}

impl MethodOwner {
    pub fn new(bone: usize, skeleton: Arc<SkeletonDefinition>) -> Self {
        Self { bone, skeleton }
    }

    /// Rest rotation of `bone` in the owner skeleton
    pub fn rest_rotation(&self, bone: usize) -> Result<Quat> {
        Ok(self.skeleton.bone(bone)?.rest_rotation())
    }
}

/// Where the base rotation of a method comes from
///
/// Without an animation the owner bone's rest rotation is used. Otherwise
/// the rotation is the key at position `frame` of track `bone` in that
/// animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTarget {
    pub animation: Option<AnimationId>,
    pub bone: usize,
    pub frame: usize,
}

impl BaseTarget {
    /// Rest pose of `bone`
    pub fn rest(bone: usize) -> Self {
        Self {
            animation: None,
            bone,
            frame: 0,
        }
    }

    /// Resolve the base rotation
    pub fn rotation<S: AnimationSource + ?Sized>(
        &self,
        owner: &MethodOwner,
        assets: &S,
    ) -> Result<Quat> {
        let Some(id) = &self.animation else {
            return owner.rest_rotation(owner.bone);
        };

        let anim = resolve(assets, id)?;
        let track = anim.bone_track(self.bone)?;
        track
            .rotations
            .nth(self.frame)
            .map(|key| key.value)
            .ok_or_else(|| AnimError::out_of_range("base frame", self.frame, track.len()))
    }
}

/// A configured strategy producing the rotation track of one bone
#[derive(Debug, Clone)]
pub enum GenerationMethod {
    Static(StaticPose),
    CopyFrom(CopyFrom),
    /// Copy from another bone of the animation being generated, always stretched
    Mirror(CopyFrom),
    Tail(Tail),
}

impl GenerationMethod {
    /// Default method for `tag`, generating for `bone`
    pub fn from_tag(tag: GenerateFramesMethod, bone: usize, skeleton: Arc<SkeletonDefinition>) -> Self {
        let base = match tag.without_tail() {
            GenerateFramesMethod::CopyFromStretch => {
                Self::CopyFrom(CopyFrom::stretch(bone, skeleton.clone()))
            }
            GenerateFramesMethod::CopyFromLoop => {
                Self::CopyFrom(CopyFrom::looped(bone, skeleton.clone()))
            }
            GenerateFramesMethod::Mirror => Self::Mirror(CopyFrom::mirror(bone, skeleton.clone())),
            _ => Self::Static(StaticPose::new(bone, skeleton.clone())),
        };

        if tag.is_tail() {
            Self::Tail(Tail::new(base, bone, skeleton))
        } else {
            base
        }
    }

    /// Identification tag of this method
    pub fn tag(&self) -> GenerateFramesMethod {
        match self {
            Self::Static(_) => GenerateFramesMethod::Static,
            Self::CopyFrom(copy) => match copy.mode {
                CopyMode::Stretch => GenerateFramesMethod::CopyFromStretch,
                CopyMode::Loop => GenerateFramesMethod::CopyFromLoop,
            },
            Self::Mirror(_) => GenerateFramesMethod::Mirror,
            Self::Tail(tail) => tail.base.tag().with_tail(),
        }
    }

    pub fn owner(&self) -> &MethodOwner {
        match self {
            Self::Static(method) => &method.owner,
            Self::CopyFrom(method) | Self::Mirror(method) => &method.owner,
            Self::Tail(method) => &method.owner,
        }
    }

    /// Bone this method generates for
    pub fn owner_bone(&self) -> usize {
        self.owner().bone
    }

    /// Generate the rotation track of the owner bone for `target`
    ///
    /// The output has one key per key of bone 0 in `target`. Fails with
    /// [`AnimError::FormatMismatch`] when the owner skeleton is not a tree.
    pub fn generate_bone_anim<S: AnimationSource + ?Sized>(
        &self,
        target: &SkeletalAnimation,
        assets: &S,
    ) -> Result<BoneTrack> {
        self.owner().skeleton.validate()?;
        match self {
            Self::Static(method) => method.generate(target, assets),
            Self::CopyFrom(method) => method.generate(target, assets),
            Self::Mirror(method) => method.generate_mirrored(target, assets),
            Self::Tail(method) => method.generate(target, assets),
        }
    }

    /// Copy this method for another bone and skeleton
    ///
    /// Referenced animations are shared. With `keep_bone_indices` the bone
    /// index fields are reset to what a fresh method for `new_bone` would
    /// hold; otherwise they are copied from this method.
    pub fn create_copy(
        &self,
        new_bone: usize,
        new_skeleton: Arc<SkeletonDefinition>,
        keep_bone_indices: bool,
    ) -> Self {
        match self {
            Self::Static(method) => {
                Self::Static(method.create_copy(new_bone, new_skeleton, keep_bone_indices))
            }
            Self::CopyFrom(method) => {
                Self::CopyFrom(method.create_copy(new_bone, new_skeleton, keep_bone_indices))
            }
            Self::Mirror(method) => {
                let mut copy = method.create_copy(new_bone, new_skeleton, keep_bone_indices);
                if keep_bone_indices {
                    copy.copied_bone = 0;
                }
                Self::Mirror(copy)
            }
            Self::Tail(method) => {
                Self::Tail(method.create_copy(new_bone, new_skeleton, keep_bone_indices))
            }
        }
    }
}

/// Times of the keys that frame a generated track
fn reference_times(target: &SkeletalAnimation) -> Result<Vec<f32>> {
    Ok(target.reference_track()?.rotations.times().collect())
}
