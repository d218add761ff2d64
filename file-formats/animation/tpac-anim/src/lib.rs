//! Reading and writing of shortened optimized skeletal animations, plus
//! procedural generation of bone tracks for custom skeletons.
//!
//! # Example
//!
//! ```rust,no_run
//! use tpac_anim::{SkeletalAnimation, validate};
//!
//! let anim = SkeletalAnimation::load("walk.anim")?;
//! println!("{}: {} frames, {} bones", anim.name, anim.frame_count, anim.bone_count());
//!
//! let report = validate(&anim);
//! report.print();
//!
//! anim.save("walk_copy.anim")?;
//! # Ok::<(), tpac_anim::AnimError>(())
//! ```

pub mod activity;
pub mod animation;
pub mod batch;
pub mod codec;
pub mod error;
pub mod generation;
mod io_ext;
pub mod keyframe;
pub mod kinematics;
#[cfg(feature = "serde-support")]
pub mod plan;
pub mod skeleton;
pub mod track;
pub mod validation;

// Re-export common types
pub use activity::BoneActivityMatrix;
pub use animation::{AnimationId, AnimationSource, ReservedFields, SkeletalAnimation};
pub use batch::{BatchReport, BatchRequest, generate_animations};
pub use codec::{decode, encode};
pub use error::{AnimError, Result};
pub use keyframe::{Keyframe, KeyframeStore};
pub use skeleton::{Bone, Skeleton, SkeletonDefinition};
pub use track::BoneTrack;
pub use validation::{ValidationReport, validate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
