//! Batch generation of animations for a custom skeleton
//!
//! A custom skeleton usually extends a stock one with extra bones (tails,
//! ears, cloth). Batch generation takes animations made for the stock
//! skeleton, copies them, and fills in a track for every extra bone using
//! the generation method configured for that bone.

use log::{debug, info, warn};

use crate::animation::{AnimationId, AnimationSource, SkeletalAnimation, resolve};
use crate::error::{AnimError, Result};
use crate::skeleton::{Skeleton, SkeletonDefinition};

/// What to generate
#[derive(Debug, Clone)]
pub struct BatchRequest<'a> {
    /// Custom skeleton holding the generation methods
    pub skeleton: &'a Skeleton,
    /// Skeleton the source animations were made for
    pub reference: &'a SkeletonDefinition,
    /// Source animations, looked up in the asset table
    pub animations: Vec<AnimationId>,
    /// Prepended to the name of every generated animation
    pub prefix: String,
}

impl<'a> BatchRequest<'a> {
    pub fn new(skeleton: &'a Skeleton, reference: &'a SkeletonDefinition) -> Self {
        Self {
            skeleton,
            reference,
            animations: Vec::new(),
            prefix: String::new(),
        }
    }

    /// Bones of the custom skeleton that need generated tracks
    pub fn extra_bones(&self) -> Vec<usize> {
        self.skeleton.definition.bones_missing_from(self.reference)
    }
}

/// Outcome of a batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub generated: Vec<SkeletalAnimation>,
    /// Items that failed, by source name
    pub failed: Vec<(String, AnimError)>,
    /// The progress callback asked to stop; `generated` is empty
    pub cancelled: bool,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed.is_empty()
    }
}

/// Generate the extra bone tracks of one animation
pub fn generate_animation<S: AnimationSource + ?Sized>(
    source: &SkeletalAnimation,
    skeleton: &Skeleton,
    extra_bones: &[usize],
    prefix: &str,
    assets: &S,
) -> Result<SkeletalAnimation> {
    skeleton.definition.validate()?;

    let mut generated = source.clone();
    generated.name = format!("{prefix}{}", source.name);
    generated.skeleton = skeleton.name().to_string();

    // Bones are generated in order so later methods can see earlier tracks
    for &bone in extra_bones {
        let track = skeleton.methods.generate_bone_anim(bone, &generated, assets)?;
        debug!(
            "Generated {} keys for bone {bone} of '{}'",
            track.len(),
            generated.name
        );
        generated.set_bone_track(bone, track)?;
    }
    Ok(generated)
}

/// Generate every animation of `request`
///
/// `progress` receives `(current, total, item_name, is_complete)`. It is
/// called before each item with a 1-based index and once at the end with
/// `is_complete` set; returning `false` cancels the batch and discards
/// everything generated so far. Failing items are logged and skipped.
pub fn generate_animations<S, F>(
    request: &BatchRequest<'_>,
    assets: &S,
    mut progress: F,
) -> BatchReport
where
    S: AnimationSource + ?Sized,
    F: FnMut(usize, usize, &str, bool) -> bool,
{
    let extra_bones = request.extra_bones();
    let total = request.animations.len();
    info!(
        "Generating {total} animations for '{}' with {} extra bones",
        request.skeleton.name(),
        extra_bones.len()
    );

    let mut report = BatchReport::default();
    for (index, id) in request.animations.iter().enumerate() {
        if !progress(index + 1, total, id.as_str(), false) {
            info!("Generation cancelled at item {}", index + 1);
            report.generated.clear();
            report.cancelled = true;
            return report;
        }

        let result = resolve(assets, id).and_then(|source| {
            generate_animation(source, request.skeleton, &extra_bones, &request.prefix, assets)
        });
        match result {
            Ok(anim) => report.generated.push(anim),
            Err(e) => {
                warn!("Skipping animation '{id}': {e}");
                report.failed.push((id.to_string(), e));
            }
        }
    }

    progress(total, total, "", true);
    report
}
