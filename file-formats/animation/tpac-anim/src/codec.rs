//! Reader and writer for the shortened optimized animation section
//!
//! Layout (all values little-endian):
//!
//! ```text
//! i32 reserved (1)        i32 reserved (1)
//! i32 frame count         sized string skeleton name      i32 frame count (again)
//! i32 bone count
//!   per bone: i32 tag, i32 key count, f32 times[n], quat rotations[n], i32 tag, i32 tag
//! i32 root key count, f32 times[n], vec4 positions[n]
//! i32 reserved (0)  u8 reserved (1)  u8 activity bones  i32 activity frames  i32 reserved (0)
//! u8 activity[frames][bones]
//! i32 trailing offset
//! ```

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, trace, warn};

use crate::activity::BoneActivityMatrix;
use crate::animation::{ReservedFields, SkeletalAnimation};
use crate::error::{AnimError, Result};
use crate::io_ext::{ReadExt, WriteExt};
use crate::keyframe::KeyframeStore;
use crate::track::{BoneTrack, TrackTags};

/// Bytes per activity bone subtracted from the section length in the trailing offset
pub const TRAILING_OFFSET_BONE_STRIDE: usize = 17;

/// Smallest bone record: tag, key count and two trailing tags
const MIN_BONE_SIZE: usize = 16;
/// Time plus a quaternion or Vec4
const KEY_SIZE: usize = 20;

/// Decode an animation section from a byte slice
pub fn decode(bytes: &[u8]) -> Result<SkeletalAnimation> {
    SkeletalAnimation::parse(&mut Cursor::new(bytes))
}

/// Encode an animation into a new byte vector
pub fn encode(anim: &SkeletalAnimation) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(anim.encoded_len());
    anim.write(&mut buffer)?;
    Ok(buffer)
}

/// Fail before allocating for `count` records the rest of the input cannot hold
fn ensure_remaining<R: Seek>(
    reader: &mut R,
    end: u64,
    count: usize,
    record_size: usize,
    what: &str,
) -> Result<()> {
    let remaining = end.saturating_sub(reader.stream_position()?);
    let needed = (count as u64).saturating_mul(record_size as u64);
    if needed > remaining {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{count} {what} need {needed} bytes, only {remaining} left"),
        )
        .into());
    }
    Ok(())
}

fn read_times<R: Read>(reader: &mut R, count: usize) -> Result<Vec<f32>> {
    let mut times = Vec::with_capacity(count);
    for _ in 0..count {
        times.push(reader.read_f32_le()?);
    }
    Ok(times)
}

impl SkeletalAnimation {
    /// Parse an animation section starting at the reader's current position
    ///
    /// The asset name is not part of the section and is left empty.
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let start = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;

        let header_a = reader.read_i32_le()?;
        let header_b = reader.read_i32_le()?;
        let frame_count = reader.read_i32_le()?;
        let skeleton = reader.read_sized_string()?;
        let frame_count_again = reader.read_i32_le()?;
        if frame_count_again != frame_count {
            return Err(AnimError::FormatMismatch(format!(
                "Frames not equal: {frame_count} - {frame_count_again}"
            )));
        }
        let frame_count = usize::try_from(frame_count).map_err(|_| {
            AnimError::FormatMismatch(format!("negative frame count {frame_count}"))
        })?;

        let bone_count = reader.read_count()?;
        ensure_remaining(reader, end, bone_count, MIN_BONE_SIZE, "bone tracks")?;
        let mut bone_tracks = Vec::with_capacity(bone_count);
        for bone in 0..bone_count {
            let leading = reader.read_i32_le()?;
            let key_count = reader.read_count()?;
            ensure_remaining(reader, end, key_count, KEY_SIZE, "rotation keys")?;
            let times = read_times(reader, key_count)?;

            let mut rotations = KeyframeStore::new();
            for &time in &times {
                let rotation = reader.read_quat()?;
                if rotations.insert(time, rotation).is_some() {
                    warn!("Bone {bone} has duplicate key time {time}; keeping the later key");
                }
            }

            let trailing_a = reader.read_i32_le()?;
            let trailing_b = reader.read_i32_le()?;
            trace!("Bone {bone}: {key_count} rotation keys");

            bone_tracks.push(BoneTrack {
                rotations,
                positions: None,
                tags: TrackTags {
                    leading,
                    trailing_a,
                    trailing_b,
                },
            });
        }

        let root_count = reader.read_count()?;
        ensure_remaining(reader, end, root_count, KEY_SIZE, "root position keys")?;
        let root_times = read_times(reader, root_count)?;
        let mut root_positions = KeyframeStore::new();
        for &time in &root_times {
            let position = reader.read_vec4()?;
            if root_positions.insert(time, position).is_some() {
                warn!("Root positions have duplicate key time {time}; keeping the later key");
            }
        }

        let activity_lead = reader.read_i32_le()?;
        let activity_flag = reader.read_u8()?;
        let activity_bones = reader.read_u8()? as usize;
        let activity_frames = reader.read_count()?;
        let activity_tail = reader.read_i32_le()?;

        ensure_remaining(reader, end, activity_frames, activity_bones, "activity rows")?;
        let mut block = vec![0u8; activity_frames * activity_bones];
        reader.read_exact(&mut block)?;
        let activity = BoneActivityMatrix::from_raw_block(&block, activity_frames, activity_bones)?;

        let trailing_offset = reader.read_i32_le()?;
        let length = reader.stream_position()? - start;
        let expected = length as i64 - (activity_bones * TRAILING_OFFSET_BONE_STRIDE) as i64;
        if i64::from(trailing_offset) != expected {
            warn!(
                "Trailing offset {trailing_offset} differs from section length {length} - {activity_bones} x {TRAILING_OFFSET_BONE_STRIDE} = {expected}"
            );
        }

        debug!(
            "Decoded animation for skeleton '{skeleton}': {frame_count} frames, {bone_count} bones, {root_count} root keys, {length} bytes"
        );

        Ok(Self {
            name: String::new(),
            skeleton,
            frame_count,
            duration: frame_count.saturating_sub(1) as f32,
            bone_tracks,
            root_positions,
            activity,
            reserved: ReservedFields {
                header_a,
                header_b,
                activity_lead,
                activity_flag,
                activity_tail,
                trailing_offset: Some(trailing_offset),
            },
        })
    }

    /// Write the animation section
    ///
    /// Counts are recomputed from the in-memory data. Reserved values are
    /// written as captured; a missing trailing offset is derived from the
    /// section length.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let activity_bones = u8::try_from(self.activity.bone_count()).map_err(|_| {
            AnimError::FormatMismatch(format!(
                "activity matrix has {} bones, at most 255 can be stored",
                self.activity.bone_count()
            ))
        })?;
        let rows = self.activity.to_raw_rows()?;

        let mut buffer = Vec::with_capacity(self.encoded_len());
        let reserved = &self.reserved;

        buffer.write_i32_le(reserved.header_a)?;
        buffer.write_i32_le(reserved.header_b)?;
        buffer.write_count(self.frame_count)?;
        buffer.write_sized_string(&self.skeleton)?;
        buffer.write_count(self.frame_count)?;

        buffer.write_count(self.bone_tracks.len())?;
        for track in &self.bone_tracks {
            buffer.write_i32_le(track.tags.leading)?;
            buffer.write_count(track.rotations.len())?;
            for time in track.rotations.times() {
                buffer.write_f32_le(time)?;
            }
            for rotation in track.rotations.values() {
                buffer.write_quat(rotation)?;
            }
            buffer.write_i32_le(track.tags.trailing_a)?;
            buffer.write_i32_le(track.tags.trailing_b)?;
        }

        buffer.write_count(self.root_positions.len())?;
        for time in self.root_positions.times() {
            buffer.write_f32_le(time)?;
        }
        for position in self.root_positions.values() {
            buffer.write_vec4(position)?;
        }

        buffer.write_i32_le(reserved.activity_lead)?;
        buffer.write_u8(reserved.activity_flag)?;
        buffer.write_u8(activity_bones)?;
        buffer.write_count(self.activity.frame_count())?;
        buffer.write_i32_le(reserved.activity_tail)?;
        for row in &rows {
            buffer.write_all(row)?;
        }

        let trailing_offset = match reserved.trailing_offset {
            Some(offset) => offset,
            None => self.computed_trailing_offset()?,
        };
        buffer.write_i32_le(trailing_offset)?;

        debug!(
            "Encoded animation for skeleton '{}': {} bytes",
            self.skeleton,
            buffer.len()
        );
        writer.write_all(&buffer)?;
        Ok(())
    }

    /// Size in bytes of the encoded section
    pub fn encoded_len(&self) -> usize {
        let header = 4 + 4 + 4 + 4 + self.skeleton.len() + 4;
        let bones: usize = 4 + self
            .bone_tracks
            .iter()
            .map(|track| 4 + 4 + track.rotations.len() * (4 + 16) + 4 + 4)
            .sum::<usize>();
        let root = 4 + self.root_positions.len() * (4 + 16);
        let activity_header = 4 + 1 + 1 + 4 + 4;
        let activity = self.activity.frame_count() * self.activity.bone_count();
        header + bones + root + activity_header + activity + 4
    }

    /// Trailing offset derived from the section length
    pub fn computed_trailing_offset(&self) -> Result<i32> {
        let length = self.encoded_len() as i64;
        let stride = (self.activity.bone_count() * TRAILING_OFFSET_BONE_STRIDE) as i64;
        i32::try_from(length - stride).map_err(|_| {
            AnimError::FormatMismatch(format!("section length {length} does not fit the trailing offset"))
        })
    }

    /// Decode from a byte slice
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }

    /// Encode into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Load an animation section from a file, naming it after the file stem
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut anim = Self::parse(&mut file)?;
        if let Some(stem) = path.file_stem() {
            anim.name = stem.to_string_lossy().into_owned();
        }
        Ok(anim)
    }

    /// Save the animation section to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        self.write(&mut file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec4};
    use pretty_assertions::assert_eq;

    fn sample_animation() -> SkeletalAnimation {
        let mut anim = SkeletalAnimation::new("", "human_skeleton", 3);
        anim.bone_tracks.push(BoneTrack {
            rotations: [
                (0.0, Quat::IDENTITY),
                (1.0, Quat::from_rotation_x(0.5)),
                (2.0, Quat::from_rotation_x(1.0)),
            ]
            .into_iter()
            .collect(),
            positions: None,
            tags: TrackTags {
                leading: 7,
                trailing_a: -1,
                trailing_b: 3,
            },
        });
        anim.bone_tracks.push(BoneTrack::from_rotations([
            (0.0, Quat::from_rotation_y(0.25)),
            (2.0, Quat::from_rotation_y(-0.25)),
        ]));
        anim.root_positions = [(0.0, Vec4::ZERO), (2.0, Vec4::new(1.0, 0.0, 0.5, 1.0))]
            .into_iter()
            .collect();

        anim.activity = BoneActivityMatrix::new(3, 2);
        anim.activity.set(0, 0, true);
        anim.activity.set(1, 0, true);
        anim.activity.set(2, 1, true);
        anim
    }

    #[test]
    fn test_round_trip() {
        let anim = sample_animation();
        let bytes = encode(&anim).unwrap();
        assert_eq!(bytes.len(), anim.encoded_len());

        let mut decoded = decode(&bytes).unwrap();
        assert_eq!(
            decoded.reserved.trailing_offset,
            Some(anim.computed_trailing_offset().unwrap())
        );
        decoded.reserved.trailing_offset = None;
        assert_eq!(decoded, anim);
    }

    #[test]
    fn test_byte_for_byte_reencode() {
        let bytes = encode(&sample_animation()).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(encode(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode(&sample_animation()).unwrap();
        assert_eq!(&bytes[0..4], &1i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &3i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &14i32.to_le_bytes());
        assert_eq!(&bytes[16..30], b"human_skeleton");
        assert_eq!(&bytes[30..34], &3i32.to_le_bytes());
        assert_eq!(&bytes[34..38], &2i32.to_le_bytes());
    }

    #[test]
    fn test_frame_count_mismatch() {
        let mut bytes = encode(&sample_animation()).unwrap();
        bytes[30..34].copy_from_slice(&4i32.to_le_bytes());
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, AnimError::FormatMismatch(_)));
        assert!(err.to_string().contains("Frames not equal: 3 - 4"));
    }

    #[test]
    fn test_reserved_values_preserved() {
        let mut anim = sample_animation();
        anim.reserved = ReservedFields {
            header_a: 5,
            header_b: -2,
            activity_lead: 9,
            activity_flag: 0,
            activity_tail: 11,
            trailing_offset: Some(12345),
        };
        let decoded = decode(&encode(&anim).unwrap()).unwrap();
        assert_eq!(decoded.reserved, anim.reserved);
    }

    #[test]
    fn test_truncated_input_is_io_error() {
        let bytes = encode(&sample_animation()).unwrap();
        let err = decode(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, AnimError::Io(_)));
    }

    /// Header up to the bone count, for a skeleton named "s" with two frames
    fn header_with_bone_count(bone_count: i32) -> Vec<u8> {
        let mut bytes = Vec::new();
        for value in [1, 1, 2, 1] {
            bytes.write_i32_le(value).unwrap();
        }
        bytes.push(b's');
        bytes.write_i32_le(2).unwrap();
        bytes.write_i32_le(bone_count).unwrap();
        bytes
    }

    fn assert_unexpected_eof(result: Result<SkeletalAnimation>) {
        match result {
            Err(AnimError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected an unexpected EOF error, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_bone_count_is_rejected() {
        assert_unexpected_eof(decode(&header_with_bone_count(i32::MAX)));
    }

    #[test]
    fn test_oversized_key_count_is_rejected() {
        let mut bytes = header_with_bone_count(1);
        bytes.write_i32_le(0).unwrap();
        bytes.write_i32_le(i32::MAX).unwrap();
        bytes.extend_from_slice(&[0u8; 64]);
        assert_unexpected_eof(decode(&bytes));
    }

    #[test]
    fn test_oversized_skeleton_name_is_rejected() {
        let mut bytes = Vec::new();
        for value in [1, 1, 2, i32::MAX] {
            bytes.write_i32_le(value).unwrap();
        }
        bytes.extend_from_slice(b"short");
        assert_unexpected_eof(decode(&bytes));
    }

    #[test]
    fn test_oversized_activity_block_is_rejected() {
        let mut bytes = encode(&sample_animation()).unwrap();
        // Activity frame count sits before the reserved i32, six rows of bytes and the offset
        let at = bytes.len() - 4 - 6 - 4 - 4;
        bytes[at..at + 4].copy_from_slice(&i32::MAX.to_le_bytes());
        assert_unexpected_eof(decode(&bytes));
    }

    #[test]
    fn test_trailing_offset_formula() {
        let anim = sample_animation();
        let bytes = encode(&anim).unwrap();
        let tail = &bytes[bytes.len() - 4..];
        let offset = i32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        assert_eq!(offset as usize, bytes.len() - 2 * TRAILING_OFFSET_BONE_STRIDE);
    }

    #[test]
    fn test_decode_sets_duration() {
        let decoded = decode(&encode(&sample_animation()).unwrap()).unwrap();
        assert_eq!(decoded.duration, 2.0);
        assert_eq!(decoded.frame_count, 3);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk_tail.anim");
        let anim = sample_animation();
        anim.save(&path).unwrap();

        let loaded = SkeletalAnimation::load(&path).unwrap();
        assert_eq!(loaded.name, "walk_tail");
        assert_eq!(loaded.bone_tracks, anim.bone_tracks);
    }
}
