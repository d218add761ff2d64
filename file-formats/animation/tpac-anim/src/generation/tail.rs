use std::sync::Arc;

use glam::{Quat, Vec3};
use log::trace;

use crate::animation::{AnimationSource, SkeletalAnimation};
use crate::error::{AnimError, Result};
use crate::kinematics::{bone_head_position, vector_in_local_space};
use crate::skeleton::SkeletonDefinition;
use crate::track::BoneTrack;

use super::{GenerationMethod, MethodOwner};

const BONE_LENGTH: f32 = 1.0;
const RESTORING_TORQUE: f32 = 0.5;
const INERTIA_FACTOR: f32 = 2.0;

/// Physical constants of the tail simulation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct TailParams {
    pub mass: f32,
    /// Coefficient of drag for linear motion
    pub drag_coefficient: f32,
    /// Fraction of angular velocity removed every frame, 0 to 1
    pub dampen_stiffness: f32,
    /// Copy the first frame unmodified instead of simulating it
    pub ignore_frame_zero: bool,
}

impl Default for TailParams {
    fn default() -> Self {
        Self {
            mass: 6.0,
            drag_coefficient: 70.0,
            dampen_stiffness: 0.5,
            ignore_frame_zero: false,
        }
    }
}

/// Adds simulated follow-through on top of another method
///
/// The bone is treated as a rigid rod hanging off its head. Movement of the
/// head pushes the rod around through inertia and drag while a restoring
/// torque pulls it back towards the base method's rotation.
#[derive(Debug, Clone)]
pub struct Tail {
    pub owner: MethodOwner,
    pub base: Box<GenerationMethod>,
    pub params: TailParams,
}

impl Tail {
    pub fn new(base: GenerationMethod, bone: usize, skeleton: Arc<SkeletonDefinition>) -> Self {
        Self {
            owner: MethodOwner::new(bone, skeleton),
            base: Box::new(base),
            params: TailParams::default(),
        }
    }

    pub(super) fn generate<S: AnimationSource + ?Sized>(
        &self,
        target: &SkeletalAnimation,
        assets: &S,
    ) -> Result<BoneTrack> {
        let base = self.base.generate_bone_anim(target, assets)?;
        self.simulate(target, &base)
    }

    /// Run the simulation over the keys of `base`
    pub fn simulate(&self, anim: &SkeletalAnimation, base: &BoneTrack) -> Result<BoneTrack> {
        let skeleton = &self.owner.skeleton;
        let bone = self.owner.bone;
        if bone >= skeleton.bone_count() {
            return Err(AnimError::out_of_range("bone", bone, skeleton.bone_count()));
        }
        let parents = skeleton.parent_lookup()?;
        let global_rest = skeleton.global_rest_matrices(false)?;
        let TailParams {
            mass,
            drag_coefficient,
            dampen_stiffness,
            ignore_frame_zero,
        } = self.params;

        let mut angular_velocity = Vec3::ZERO;
        let mut previous_velocity = Vec3::ZERO;
        // Time and simulated rotation of the previous key
        let mut previous: Option<(f32, Quat)> = None;
        let mut result = BoneTrack::new();

        for (index, key) in base.rotations.iter().enumerate() {
            let time = key.time;
            if index == 0 && ignore_frame_zero {
                result.push_rotation(time, key.value);
                previous = Some((time, key.value));
                continue;
            }

            let (previous_time, previous_rotation, delta_time) = match previous {
                None => (time, key.value, 1.0),
                Some((t, rotation)) => (t, rotation, time - t),
            };

            let head = bone_head_position(anim, skeleton, bone, time, &global_rest, &parents)?;
            let last_head =
                bone_head_position(anim, skeleton, bone, previous_time, &global_rest, &parents)?;
            let velocity = (head - last_head) / delta_time;
            let acceleration = (velocity - previous_velocity) / delta_time;

            // Inertia of the rod plus air resistance
            let force = -2.0 * INERTIA_FACTOR * mass * acceleration
                - 0.5 * drag_coefficient * velocity.length() * velocity;
            let force = vector_in_local_space(anim, force, bone, time, &parents)?;

            let direction = previous_rotation.mul_vec3(Vec3::X * BONE_LENGTH);
            let rest_direction = key.value.mul_vec3(Vec3::X);
            let restoring = direction.cross(rest_direction) * RESTORING_TORQUE;
            let torque = direction.cross(force) + restoring;

            let angular_acceleration = torque / (mass * BONE_LENGTH * BONE_LENGTH);
            angular_velocity += angular_acceleration * delta_time;
            angular_velocity *= 1.0 - dampen_stiffness;

            let rotation = if angular_velocity == Vec3::ZERO {
                previous_rotation
            } else {
                Quat::from_axis_angle(angular_velocity.normalize(), angular_velocity.length())
                    * previous_rotation
            };
            trace!("Tail bone {bone} at {time}: angular velocity {angular_velocity}");
            result.push_rotation(time, rotation);

            previous = Some((time, rotation));
            previous_velocity = velocity;
        }

        Ok(result)
    }

    pub(super) fn create_copy(
        &self,
        new_bone: usize,
        new_skeleton: Arc<SkeletonDefinition>,
        keep_bone_indices: bool,
    ) -> Self {
        let base = self
            .base
            .create_copy(new_bone, new_skeleton.clone(), keep_bone_indices);
        Self {
            params: self.params,
            ..Self::new(base, new_bone, new_skeleton)
        }
    }
}
