use std::sync::Arc;

use log::debug;

use crate::animation::{AnimationSource, SkeletalAnimation};
use crate::error::{AnimError, Result};
use crate::skeleton::SkeletonDefinition;
use crate::track::BoneTrack;

use super::{GenerateFramesMethod, GenerationMethod, StaticPose};

/// Number of method slots in a table, independent of the bone count
pub const METHOD_SLOTS: usize = 64;

/// Generation method of every bone slot of a skeleton
///
/// The table always has [`METHOD_SLOTS`] entries. Slots past the skeleton's
/// bone count are never generated from.
#[derive(Debug, Clone)]
pub struct BoneMethodTable {
    skeleton: Arc<SkeletonDefinition>,
    slots: Vec<GenerationMethod>,
}

impl BoneMethodTable {
    /// Create a table where every slot holds a static method for its own bone
    pub fn new(skeleton: &Arc<SkeletonDefinition>) -> Self {
        let slots = (0..METHOD_SLOTS)
            .map(|bone| GenerationMethod::Static(StaticPose::new(bone, skeleton.clone())))
            .collect();
        Self {
            skeleton: skeleton.clone(),
            slots,
        }
    }

    pub fn skeleton(&self) -> &Arc<SkeletonDefinition> {
        &self.skeleton
    }

    fn check_slot(&self, bone: usize) -> Result<()> {
        if bone < METHOD_SLOTS {
            Ok(())
        } else {
            Err(AnimError::out_of_range("method slot", bone, METHOD_SLOTS))
        }
    }

    pub fn get(&self, bone: usize) -> Result<&GenerationMethod> {
        self.check_slot(bone)?;
        Ok(&self.slots[bone])
    }

    pub fn get_mut(&mut self, bone: usize) -> Result<&mut GenerationMethod> {
        self.check_slot(bone)?;
        Ok(&mut self.slots[bone])
    }

    /// Replace the method of a slot
    ///
    /// The method must have been built for the same bone.
    pub fn set(&mut self, bone: usize, method: GenerationMethod) -> Result<()> {
        self.check_slot(bone)?;
        if method.owner_bone() != bone {
            return Err(AnimError::Config(format!(
                "method for bone {} placed in slot {bone}",
                method.owner_bone()
            )));
        }
        self.slots[bone] = method;
        Ok(())
    }

    /// Replace a slot with the default method for `tag`
    pub fn set_method_tag(&mut self, bone: usize, tag: GenerateFramesMethod) -> Result<()> {
        self.check_slot(bone)?;
        debug!("Bone {bone} switches to {tag}");
        self.slots[bone] = GenerationMethod::from_tag(tag, bone, self.skeleton.clone());
        Ok(())
    }

    /// Copy the method of slot `from` into slot `to`
    pub fn paste(&mut self, from: usize, to: usize, keep_bone_indices: bool) -> Result<()> {
        self.check_slot(from)?;
        self.check_slot(to)?;
        let copy = self.slots[from].create_copy(to, self.skeleton.clone(), keep_bone_indices);
        self.slots[to] = copy;
        Ok(())
    }

    /// Tags of the slots that correspond to real bones
    pub fn tags(&self) -> Vec<GenerateFramesMethod> {
        self.slots
            .iter()
            .take(self.skeleton.bone_count())
            .map(GenerationMethod::tag)
            .collect()
    }

    /// Generate the track of `bone` from its slot
    pub fn generate_bone_anim<S: AnimationSource + ?Sized>(
        &self,
        bone: usize,
        target: &SkeletalAnimation,
        assets: &S,
    ) -> Result<BoneTrack> {
        if bone >= self.skeleton.bone_count() {
            return Err(AnimError::out_of_range("bone", bone, self.skeleton.bone_count()));
        }
        self.get(bone)?.generate_bone_anim(target, assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationId;
    use crate::generation::tests::{keyed_animation, shared_chain};
    use crate::generation::CopyFrom;
    use crate::skeleton::Skeleton;
    use glam::Quat;
    use std::collections::HashMap;

    #[test]
    fn test_every_slot_starts_static() {
        let table = BoneMethodTable::new(&shared_chain());
        for bone in 0..METHOD_SLOTS {
            let method = table.get(bone).unwrap();
            assert_eq!(method.tag(), GenerateFramesMethod::Static);
            assert_eq!(method.owner_bone(), bone);
        }
        assert!(table.get(METHOD_SLOTS).is_err());
        assert_eq!(table.tags().len(), 3);
    }

    #[test]
    fn test_set_requires_matching_owner() {
        let skeleton = shared_chain();
        let mut table = BoneMethodTable::new(&skeleton);
        let method = GenerationMethod::CopyFrom(CopyFrom::looped(1, skeleton));
        assert!(matches!(
            table.set(2, method.clone()),
            Err(AnimError::Config(_))
        ));
        table.set(1, method).unwrap();
        assert_eq!(table.get(1).unwrap().tag(), GenerateFramesMethod::CopyFromLoop);
    }

    #[test]
    fn test_set_method_tag_and_paste() {
        let mut skeleton = Skeleton::new(crate::skeleton::tests::chain_skeleton());
        skeleton
            .methods
            .set_method_tag(2, GenerateFramesMethod::TailAndMirror)
            .unwrap();
        skeleton.methods.paste(2, 1, true).unwrap();

        let pasted = skeleton.methods.get(1).unwrap();
        assert_eq!(pasted.tag(), GenerateFramesMethod::TailAndMirror);
        assert_eq!(pasted.owner_bone(), 1);
        assert!(skeleton.methods.paste(70, 1, true).is_err());
    }

    #[test]
    fn test_inert_slots_do_not_generate() {
        let table = BoneMethodTable::new(&shared_chain());
        let anim = keyed_animation("walk", 3, |_, _| Quat::IDENTITY);
        let assets: HashMap<AnimationId, SkeletalAnimation> = HashMap::new();

        assert_eq!(table.generate_bone_anim(2, &anim, &assets).unwrap().len(), 3);
        assert!(matches!(
            table.generate_bone_anim(10, &anim, &assets),
            Err(AnimError::IndexOutOfRange { index: 10, .. })
        ));
    }
}
