//! Skeleton hierarchy and rest pose
//!
//! A [`SkeletonDefinition`] is the immutable bone tree shared by animations
//! and generation methods. A [`Skeleton`] pairs a definition with the
//! per-bone generation methods used to synthesize tracks for it.

use std::collections::HashSet;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::error::{AnimError, Result};
use crate::generation::BoneMethodTable;

/// A single bone of a skeleton
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Bone {
    pub name: String,
    /// Index of the parent bone, -1 for the root
    pub parent: i32,
    /// Rest pose relative to the parent bone
    #[cfg_attr(feature = "serde-support", serde(default = "identity"))]
    pub rest_frame: Mat4,
}

#[cfg(feature = "serde-support")]
fn identity() -> Mat4 {
    Mat4::IDENTITY
}

impl Bone {
    pub fn new(name: impl Into<String>, parent: i32, rest_frame: Mat4) -> Self {
        Self {
            name: name.into(),
            parent,
            rest_frame,
        }
    }

    /// Rotation part of the rest pose
    pub fn rest_rotation(&self) -> Quat {
        Quat::from_mat4(&self.rest_frame)
    }

    /// Translation part of the rest pose
    pub fn rest_translation(&self) -> Vec3 {
        self.rest_frame.w_axis.truncate()
    }

    pub fn is_root(&self) -> bool {
        self.parent < 0
    }
}

/// Ordered bone tree; bone 0 is the root
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SkeletonDefinition {
    pub name: String,
    pub bones: Vec<Bone>,
}

impl SkeletonDefinition {
    pub fn new(name: impl Into<String>, bones: Vec<Bone>) -> Self {
        Self {
            name: name.into(),
            bones,
        }
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Bone at `index`
    pub fn bone(&self, index: usize) -> Result<&Bone> {
        self.bones
            .get(index)
            .ok_or_else(|| AnimError::out_of_range("bone", index, self.bones.len()))
    }

    /// Index of the bone called `name`
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Check the tree invariant
    ///
    /// Bone 0 must be the only root and every other bone must point at a
    /// bone with a strictly lower index.
    pub fn validate(&self) -> Result<()> {
        for (index, bone) in self.bones.iter().enumerate() {
            if index == 0 {
                if bone.parent != -1 {
                    return Err(AnimError::FormatMismatch(format!(
                        "root bone '{}' has parent {}, expected -1",
                        bone.name, bone.parent
                    )));
                }
                continue;
            }

            if bone.parent < 0 || bone.parent as usize >= index {
                return Err(AnimError::FormatMismatch(format!(
                    "bone {index} '{}' has invalid parent {}",
                    bone.name, bone.parent
                )));
            }
        }
        Ok(())
    }

    /// Parent index of every bone, -1 for the root
    pub fn parent_lookup(&self) -> Result<Vec<i32>> {
        self.validate()?;
        Ok(self.bones.iter().map(|b| b.parent).collect())
    }

    /// Rest matrices of every bone composed with all of its ancestors
    ///
    /// With `ignore_last_row` the projective row of each local matrix is
    /// reset before composing; some skeletons carry garbage there that
    /// would otherwise leak into the translations.
    pub fn global_rest_matrices(&self, ignore_last_row: bool) -> Result<Vec<Mat4>> {
        self.validate()?;

        let mut globals: Vec<Mat4> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let mut local = bone.rest_frame;
            if ignore_last_row {
                local.x_axis.w = 0.0;
                local.y_axis.w = 0.0;
                local.z_axis.w = 0.0;
                local.w_axis.w = 1.0;
            }

            let global = if bone.is_root() {
                local
            } else {
                // validate() guarantees the parent was already computed
                globals[bone.parent as usize] * local
            };
            globals.push(global);
        }
        Ok(globals)
    }

    /// Indices of bones whose names do not appear in `other`
    ///
    /// For a custom skeleton derived from a stock one these are the extra
    /// bones that need generated tracks.
    pub fn bones_missing_from(&self, other: &Self) -> Vec<usize> {
        let known: HashSet<&str> = other.bones.iter().map(|b| b.name.as_str()).collect();
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| !known.contains(bone.name.as_str()))
            .map(|(index, _)| index)
            .collect()
    }
}

/// A skeleton definition together with the generation method of every bone
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub definition: Arc<SkeletonDefinition>,
    pub methods: BoneMethodTable,
}

impl Skeleton {
    /// Create a skeleton where every slot holds a static method for its own bone
    pub fn new(definition: SkeletonDefinition) -> Self {
        let definition = Arc::new(definition);
        let methods = BoneMethodTable::new(&definition);
        Self {
            definition,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Three-bone chain along +X: root, spine at x=1, tail at x=2
    pub(crate) fn chain_skeleton() -> SkeletonDefinition {
        SkeletonDefinition::new(
            "chain",
            vec![
                Bone::new("root", -1, Mat4::IDENTITY),
                Bone::new("spine", 0, Mat4::from_translation(Vec3::X)),
                Bone::new("tail", 1, Mat4::from_translation(Vec3::X)),
            ],
        )
    }

    #[test]
    fn test_parent_lookup() {
        assert_eq!(chain_skeleton().parent_lookup().unwrap(), vec![-1, 0, 1]);
    }

    #[test]
    fn test_global_rest_matrices_accumulate() {
        let globals = chain_skeleton().global_rest_matrices(false).unwrap();
        assert_eq!(globals[2].w_axis.truncate(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_global_rest_matrices_rotated_parent() {
        let mut skeleton = chain_skeleton();
        skeleton.bones[1].rest_frame = Mat4::from_rotation_translation(
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::X,
        );
        let globals = skeleton.global_rest_matrices(false).unwrap();
        let tail = globals[2].w_axis.truncate();
        assert!((tail - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_ignore_last_row() {
        let mut skeleton = chain_skeleton();
        skeleton.bones[1].rest_frame.x_axis.w = 3.0;
        skeleton.bones[1].rest_frame.w_axis.w = 2.0;

        let globals = skeleton.global_rest_matrices(true).unwrap();
        assert_eq!(globals[2].w_axis.truncate(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(globals[1].x_axis.w, 0.0);

        let raw = skeleton.global_rest_matrices(false).unwrap();
        assert_ne!(raw[2], globals[2]);
    }

    #[test]
    fn test_parent_not_lower_is_rejected() {
        let mut skeleton = chain_skeleton();
        skeleton.bones[1].parent = 2;
        assert!(matches!(
            skeleton.validate(),
            Err(AnimError::FormatMismatch(_))
        ));

        skeleton.bones[1].parent = 1;
        assert!(skeleton.parent_lookup().is_err());
        assert!(skeleton.global_rest_matrices(false).is_err());
    }

    #[test]
    fn test_root_must_have_no_parent() {
        let mut skeleton = chain_skeleton();
        skeleton.bones[0].parent = 0;
        assert!(skeleton.validate().is_err());
    }

    #[test]
    fn test_bones_missing_from() {
        let stock = chain_skeleton();
        let mut custom = chain_skeleton();
        custom.bones.push(Bone::new("tail_tip", 2, Mat4::from_translation(Vec3::X)));
        custom.bones.push(Bone::new("ear", 1, Mat4::IDENTITY));

        assert_eq!(custom.bones_missing_from(&stock), vec![3, 4]);
        assert!(stock.bones_missing_from(&custom).is_empty());
    }

    #[test]
    fn test_rest_rotation_and_translation() {
        let rotation = Quat::from_rotation_y(0.4);
        let bone = Bone::new(
            "b",
            -1,
            Mat4::from_rotation_translation(rotation, Vec3::new(1.0, 2.0, 3.0)),
        );
        assert!(bone.rest_rotation().angle_between(rotation) < 1e-3);
        assert_eq!(bone.rest_translation(), Vec3::new(1.0, 2.0, 3.0));
    }
}
