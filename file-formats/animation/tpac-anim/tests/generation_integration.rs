//! Integration tests for procedural bone-track generation

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3, Vec4};
use pretty_assertions::assert_eq;
use test_case::test_case;
use tpac_anim::generation::{CopyFrom, GenerationMethod, StaticPose, Tail};
use tpac_anim::{AnimError, AnimationId, Bone, BoneTrack, SkeletalAnimation, SkeletonDefinition};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn chain() -> Arc<SkeletonDefinition> {
    Arc::new(SkeletonDefinition::new(
        "chain",
        vec![
            Bone::new("root", -1, Mat4::IDENTITY),
            Bone::new("spine", 0, Mat4::from_translation(Vec3::X)),
            Bone::new("tail", 1, Mat4::from_translation(Vec3::X)),
        ],
    ))
}

/// Every bone turns about Z by `rate * time`
fn turning(name: &str, frames: usize, rate: f32) -> SkeletalAnimation {
    let mut anim = SkeletalAnimation::new(name, "chain", frames);
    for _ in 0..3 {
        anim.bone_tracks.push(BoneTrack::from_rotations(
            (0..frames).map(|f| (f as f32, Quat::from_rotation_z(rate * f as f32))),
        ));
    }
    anim
}

fn table(anims: Vec<SkeletalAnimation>) -> HashMap<AnimationId, SkeletalAnimation> {
    anims.into_iter().map(|anim| (anim.id(), anim)).collect()
}

fn angle_z(q: Quat) -> f32 {
    let (axis, angle) = q.to_axis_angle();
    if axis.z < 0.0 { -angle } else { angle }
}

#[test_case(10, 31 ; "source shorter than target")]
#[test_case(31, 10 ; "source longer than target")]
#[test_case(7, 7 ; "equal lengths")]
fn test_loop_lands_on_whole_repeats(source_frames: usize, target_frames: usize) {
    let skeleton = chain();
    let source = turning("swish", source_frames, 0.05);
    let target = turning("walk", target_frames, 0.0);
    let assets = table(vec![source.clone()]);

    let mut copy = CopyFrom::looped(2, skeleton);
    copy.copied_animation = Some(source.id());
    let track = GenerationMethod::CopyFrom(copy)
        .generate_bone_anim(&target, &assets)
        .unwrap();
    assert_eq!(track.len(), target_frames);

    let duration = target.duration;
    let source_duration = source.duration;
    let repeats = (duration / source_duration).ceil().max(1.0);
    let scale = source_duration * repeats / duration;

    for key in track.rotations.iter() {
        let expected = ((key.time * scale).rem_euclid(source_duration)) * 0.05;
        assert!(
            (angle_z(key.value) - expected).abs() < 1e-3,
            "time {}: got {}, expected {expected}",
            key.time,
            angle_z(key.value)
        );
    }

    // The last frame completes the final repeat and wraps to the start
    let last = track.rotations.last().unwrap();
    assert!(angle_z(last.value).abs() < 1e-3);
}

#[test]
fn test_stretch_spans_source_once() {
    let skeleton = chain();
    let source = turning("swish", 5, 0.1);
    let target = turning("walk", 17, 0.0);
    let assets = table(vec![source.clone()]);

    let mut copy = CopyFrom::stretch(2, skeleton);
    copy.copied_animation = Some(source.id());
    let track = GenerationMethod::CopyFrom(copy)
        .generate_bone_anim(&target, &assets)
        .unwrap();

    let first = track.rotations.first().unwrap();
    let last = track.rotations.last().unwrap();
    assert!(angle_z(first.value).abs() < 1e-3);
    assert!((angle_z(last.value) - 0.4).abs() < 1e-3);
}

#[test]
fn test_mirror_equals_stretch_copy_of_self() {
    let skeleton = chain();
    let mut target = turning("walk", 12, 0.0);
    target.bone_tracks[1] =
        BoneTrack::from_rotations((0..12).map(|f| (f as f32, Quat::from_rotation_x(0.2 * f as f32))));
    let assets = table(vec![target.clone()]);

    let mut mirror = CopyFrom::mirror(2, skeleton.clone());
    mirror.copied_bone = 1;
    mirror.time_offset = 1.5;
    let mirrored = GenerationMethod::Mirror(mirror)
        .generate_bone_anim(&target, &assets)
        .unwrap();

    let mut copy = CopyFrom::stretch(2, skeleton);
    copy.copied_animation = Some(target.id());
    copy.copied_bone = 1;
    copy.time_offset = 1.5;
    let copied = GenerationMethod::CopyFrom(copy)
        .generate_bone_anim(&target, &assets)
        .unwrap();

    assert_eq!(mirrored, copied);
}

#[test]
fn test_static_output_is_framed_by_bone_zero() {
    let skeleton = chain();
    let mut target = turning("walk", 4, 0.1);
    target.bone_tracks[0] = BoneTrack::from_rotations([(0.0, Quat::IDENTITY), (2.5, Quat::IDENTITY)]);
    let assets = table(Vec::new());

    let track = GenerationMethod::Static(StaticPose::new(1, skeleton))
        .generate_bone_anim(&target, &assets)
        .unwrap();
    assert_eq!(track.rotations.times().collect::<Vec<_>>(), vec![0.0, 2.5]);
}

#[test]
fn test_tail_settles_after_motion_stops() {
    init_logging();
    let skeleton = chain();
    let mut anim = turning("hop", 80, 0.0);
    anim.root_positions = [
        (0.0, Vec4::ZERO),
        (5.0, Vec4::new(0.0, 3.0, 0.0, 0.0)),
        (10.0, Vec4::ZERO),
        (79.0, Vec4::ZERO),
    ]
    .into_iter()
    .collect();
    let assets = table(Vec::new());

    let base = GenerationMethod::Static(StaticPose::new(2, skeleton.clone()));
    let tail = GenerationMethod::Tail(Tail::new(base, 2, skeleton));
    let track = tail.generate_bone_anim(&anim, &assets).unwrap();

    let peak = track
        .rotations
        .values()
        .map(|q| q.angle_between(Quat::IDENTITY))
        .fold(0.0_f32, f32::max);
    let settled = track.rotations.last().unwrap().value.angle_between(Quat::IDENTITY);
    assert!(peak > 1e-3, "no follow-through: {peak}");
    assert!(settled < peak * 0.5, "settled {settled}, peak {peak}");
}

#[test]
fn test_invalid_skeleton_is_rejected() {
    init_logging();
    let mut definition = (*chain()).clone();
    definition.bones[1].parent = 2;
    let skeleton = Arc::new(definition);
    let anim = turning("walk", 4, 0.1);
    let assets = table(vec![anim.clone()]);

    let mut copy = CopyFrom::stretch(2, skeleton.clone());
    copy.copied_animation = Some(anim.id());
    let mut mirror = CopyFrom::mirror(2, skeleton.clone());
    mirror.copied_bone = 1;
    let methods = [
        GenerationMethod::Static(StaticPose::new(2, skeleton.clone())),
        GenerationMethod::CopyFrom(copy),
        GenerationMethod::Mirror(mirror),
        GenerationMethod::Tail(Tail::new(
            GenerationMethod::Static(StaticPose::new(2, skeleton.clone())),
            2,
            skeleton,
        )),
    ];

    for method in methods {
        let result = method.generate_bone_anim(&anim, &assets);
        assert!(
            matches!(result, Err(AnimError::FormatMismatch(_))),
            "{:?} accepted a cyclic skeleton: {result:?}",
            method.tag()
        );
    }
}

#[test]
fn test_missing_source_animation() {
    init_logging();
    let mut copy = CopyFrom::stretch(1, chain());
    copy.copied_animation = Some("absent".into());
    let anim = turning("walk", 4, 0.1);

    let result = GenerationMethod::CopyFrom(copy).generate_bone_anim(&anim, &table(Vec::new()));
    assert!(matches!(result, Err(AnimError::UnknownAnimation(_))));
}
