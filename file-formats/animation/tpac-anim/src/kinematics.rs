//! Forward kinematics over an animated skeleton
//!
//! These helpers walk the parent chain of a bone and accumulate the
//! animated rotations of its ancestors. Ancestors without a track in the
//! animation contribute no rotation.

use glam::{Mat4, Quat, Vec3};

use crate::animation::SkeletalAnimation;
use crate::error::{AnimError, Result};
use crate::skeleton::SkeletonDefinition;

fn parent_of(parents: &[i32], bone: usize) -> Result<i32> {
    parents
        .get(bone)
        .copied()
        .ok_or_else(|| AnimError::out_of_range("bone", bone, parents.len()))
}

/// Apply the animated rotation of every ancestor of `bone` to `quat`
///
/// The closest parent is applied first, so the result maps from the bone's
/// parent space into world space.
pub fn quat_in_world_space(
    anim: &SkeletalAnimation,
    quat: Quat,
    bone: usize,
    time: f32,
    parents: &[i32],
) -> Result<Quat> {
    let mut quat = quat;
    let mut parent = parent_of(parents, bone)?;
    while parent >= 0 {
        let index = parent as usize;
        if let Some(track) = anim.bone_tracks.get(index) {
            quat = track.interpolated_rotation(time)?.value * quat;
        }
        parent = parent_of(parents, index)?;
    }
    Ok(quat)
}

/// Express a world-space vector in the space the bone's rotation is defined in
pub fn vector_in_local_space(
    anim: &SkeletalAnimation,
    v: Vec3,
    bone: usize,
    time: f32,
    parents: &[i32],
) -> Result<Vec3> {
    let world = quat_in_world_space(anim, Quat::IDENTITY, bone, time, parents)?;
    Ok(world.conjugate().mul_vec3(v))
}

/// World position of the head of `bone` at `time`
///
/// `global_rest` holds the composed rest matrices of the skeleton. The root
/// sits at its rest translation moved by the animation's root positions;
/// every other head is its parent's head plus the rest-pose offset between
/// the two, rotated by the animated parent chain.
pub fn bone_head_position(
    anim: &SkeletalAnimation,
    skeleton: &SkeletonDefinition,
    bone: usize,
    time: f32,
    global_rest: &[Mat4],
    parents: &[i32],
) -> Result<Vec3> {
    if bone == 0 {
        let root = skeleton.bone(0)?;
        return Ok(root.rest_translation() + anim.root_position_at(time)?);
    }

    let parent = parent_of(parents, bone)?;
    if parent < 0 {
        return Err(AnimError::FormatMismatch(format!(
            "bone {bone} has no parent but is not the root"
        )));
    }
    let parent = parent as usize;

    let rest = |index: usize| {
        global_rest
            .get(index)
            .ok_or_else(|| AnimError::out_of_range("rest matrix", index, global_rest.len()))
    };
    let bone_rest = rest(bone)?;
    let parent_rest = rest(parent)?;

    let head = bone_head_position(anim, skeleton, parent, time, global_rest, parents)?;
    let offset = bone_rest.w_axis.truncate() - parent_rest.w_axis.truncate();

    // Undo the parent's rest orientation, then apply the animated chain
    let unrest = Quat::from_mat4(parent_rest).conjugate();
    let transform = quat_in_world_space(anim, unrest, bone, time, parents)?;

    Ok(head + transform.mul_vec3(offset))
}

/// Global matrix of every bone at `time`
///
/// Local matrices take the track's rotation and the rest translation; the
/// root additionally moves by the animation's root positions. Bones without
/// a track keep their rest pose.
pub fn global_pose(
    anim: &SkeletalAnimation,
    skeleton: &SkeletonDefinition,
    time: f32,
) -> Result<Vec<Mat4>> {
    let parents = skeleton.parent_lookup()?;
    let root_offset = anim.root_position_at(time)?;

    let mut globals: Vec<Mat4> = Vec::with_capacity(skeleton.bone_count());
    for (index, bone) in skeleton.bones.iter().enumerate() {
        let mut translation = bone.rest_translation();
        if index == 0 {
            translation += root_offset;
        }

        let rotation = match anim.bone_tracks.get(index) {
            Some(track) if !track.is_empty() => track.interpolated_rotation(time)?.value,
            _ => bone.rest_rotation(),
        };
        let local = Mat4::from_rotation_translation(rotation, translation);

        let global = match parents[index] {
            parent if parent < 0 => local,
            parent => globals[parent as usize] * local,
        };
        globals.push(global);
    }
    Ok(globals)
}
