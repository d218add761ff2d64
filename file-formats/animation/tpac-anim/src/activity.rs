//! Per-frame bone activity flags
//!
//! On disk each frame stores one byte per bone. The first frame's bytes are
//! plain truth values; every later frame marks a bone active when its byte
//! is strictly greater than the byte of the previous frame.

use crate::error::{AnimError, Result};

/// Boolean grid `[frame][bone]` of bones that changed in a frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoneActivityMatrix {
    frame_count: usize,
    bone_count: usize,
    flags: Vec<bool>,
}

impl BoneActivityMatrix {
    /// Create a matrix with every flag cleared
    pub fn new(frame_count: usize, bone_count: usize) -> Self {
        Self {
            frame_count,
            bone_count,
            flags: vec![false; frame_count * bone_count],
        }
    }

    /// Decode raw byte rows, one row per frame
    pub fn from_raw_rows<R: AsRef<[u8]>>(rows: &[R], bone_count: usize) -> Result<Self> {
        let mut matrix = Self::new(rows.len(), bone_count);
        let mut previous: Option<&[u8]> = None;

        for (frame, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != bone_count {
                return Err(AnimError::FormatMismatch(format!(
                    "activity row {frame} has {} bytes, expected {bone_count}",
                    row.len()
                )));
            }

            for (bone, &byte) in row.iter().enumerate() {
                let active = match previous {
                    None => byte != 0,
                    Some(prev) => byte > prev[bone],
                };
                matrix.set(frame, bone, active);
            }
            previous = Some(row);
        }

        Ok(matrix)
    }

    /// Decode `frame_count` rows of `bone_count` bytes stored back to back
    pub fn from_raw_block(block: &[u8], frame_count: usize, bone_count: usize) -> Result<Self> {
        if frame_count.checked_mul(bone_count) != Some(block.len()) {
            return Err(AnimError::FormatMismatch(format!(
                "activity block has {} bytes, expected {frame_count} x {bone_count}",
                block.len()
            )));
        }
        if bone_count == 0 {
            return Ok(Self::new(frame_count, 0));
        }
        let rows: Vec<&[u8]> = block.chunks_exact(bone_count).collect();
        Self::from_raw_rows(&rows, bone_count)
    }

    /// Encode into canonical byte rows
    ///
    /// Frame 0 writes 0/1. Later frames write the previous byte plus one for
    /// an active bone and 0 for an inactive one, so a bone can stay active
    /// for at most 255 consecutive frames.
    pub fn to_raw_rows(&self) -> Result<Vec<Vec<u8>>> {
        let mut rows: Vec<Vec<u8>> = Vec::with_capacity(self.frame_count);

        for frame in 0..self.frame_count {
            let mut row = Vec::with_capacity(self.bone_count);
            for bone in 0..self.bone_count {
                let active = self.is_active(frame, bone);
                let byte = match rows.last() {
                    None => u8::from(active),
                    Some(prev) if active => prev[bone].checked_add(1).ok_or_else(|| {
                        AnimError::FormatMismatch(format!(
                            "bone {bone} is active for more than 255 consecutive frames at frame {frame}"
                        ))
                    })?,
                    Some(_) => 0,
                };
                row.push(byte);
            }
            rows.push(row);
        }

        Ok(rows)
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn bone_count(&self) -> usize {
        self.bone_count
    }

    /// Whether `bone` changed in `frame`; out-of-range cells read as inactive
    pub fn is_active(&self, frame: usize, bone: usize) -> bool {
        if frame < self.frame_count && bone < self.bone_count {
            self.flags[frame * self.bone_count + bone]
        } else {
            false
        }
    }

    /// Set a flag; out-of-range cells are ignored
    pub fn set(&mut self, frame: usize, bone: usize, active: bool) {
        if frame < self.frame_count && bone < self.bone_count {
            self.flags[frame * self.bone_count + bone] = active;
        }
    }

    /// Flags of a single frame
    pub fn frame(&self, frame: usize) -> Option<&[bool]> {
        if frame < self.frame_count {
            let start = frame * self.bone_count;
            Some(&self.flags[start..start + self.bone_count])
        } else {
            None
        }
    }

    /// All frames as nested vectors
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        (0..self.frame_count)
            .filter_map(|f| self.frame(f).map(<[bool]>::to_vec))
            .collect()
    }
}
