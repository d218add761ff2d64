use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Mat4, Quat, Vec3, Vec4};
use std::collections::HashMap;
use std::hint::black_box;
use std::sync::Arc;
use tpac_anim::generation::{CopyFrom, GenerationMethod, StaticPose, Tail};
use tpac_anim::{AnimationId, Bone, BoneTrack, SkeletalAnimation, SkeletonDefinition, decode, encode};

const FRAMES: usize = 120;
const BONES: usize = 24;

fn create_skeleton() -> Arc<SkeletonDefinition> {
    let bones = (0..BONES)
        .map(|i| {
            let parent = i as i32 - 1;
            Bone::new(format!("bone_{i}"), parent, Mat4::from_translation(Vec3::X))
        })
        .collect();
    Arc::new(SkeletonDefinition::new("bench", bones))
}

fn create_animation(name: &str) -> SkeletalAnimation {
    let mut anim = SkeletalAnimation::new(name, "bench", FRAMES);
    for bone in 0..BONES {
        anim.bone_tracks.push(BoneTrack::from_rotations((0..FRAMES).map(|f| {
            let t = f as f32;
            (t, Quat::from_rotation_z((t * 0.05 + bone as f32).sin() * 0.3))
        })));
    }
    anim.root_positions = (0..FRAMES)
        .map(|f| (f as f32, Vec4::new(0.0, (f as f32 * 0.1).sin(), 0.0, 1.0)))
        .collect();
    anim
}

fn bench_codec(c: &mut Criterion) {
    let anim = create_animation("walk");
    let data = encode(&anim).unwrap();

    c.bench_function("decode_animation", |b| {
        b.iter(|| decode(black_box(&data)).unwrap())
    });
    c.bench_function("encode_animation", |b| {
        b.iter(|| encode(black_box(&anim)).unwrap())
    });
}

fn bench_generation(c: &mut Criterion) {
    let skeleton = create_skeleton();
    let walk = create_animation("walk");
    let swish = create_animation("swish");
    let assets: HashMap<AnimationId, SkeletalAnimation> =
        [(walk.id(), walk.clone()), (swish.id(), swish.clone())]
            .into_iter()
            .collect();

    let mut copy = CopyFrom::looped(BONES - 1, skeleton.clone());
    copy.copied_animation = Some(swish.id());
    let copy = GenerationMethod::CopyFrom(copy);
    c.bench_function("copy_from_loop", |b| {
        b.iter(|| copy.generate_bone_anim(black_box(&walk), &assets).unwrap())
    });

    let tail = GenerationMethod::Tail(Tail::new(
        GenerationMethod::Static(StaticPose::new(BONES - 1, skeleton.clone())),
        BONES - 1,
        skeleton,
    ));
    c.bench_function("tail_simulation", |b| {
        b.iter(|| tail.generate_bone_anim(black_box(&walk), &assets).unwrap())
    });
}

criterion_group!(benches, bench_codec, bench_generation);
criterion_main!(benches);
