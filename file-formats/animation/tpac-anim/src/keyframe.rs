//! Time-keyed keyframe storage and interpolation
//!
//! A [`KeyframeStore`] is an ordered map from time to value. Lookups find
//! the two keys bracketing the requested time and blend between them:
//! positions are linearly interpolated, rotations take the shortest arc.
//! Times outside the stored range clamp to the first or last value.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

use glam::{Quat, Vec4};
use ordered_float::OrderedFloat;

use crate::error::{AnimError, Result};

/// Types that can be blended between two keyframes
pub trait Interpolate: Copy {
    /// Blend from `self` towards `other` by `t` in `[0, 1]`
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Vec4 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolate for Quat {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        // glam flips the end quaternion when the dot product is negative
        self.slerp(*other, t)
    }
}

/// A single keyframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

/// Result of sampling a store: the blended value and the bracketing key times
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    pub value: T,
    /// Time of the key at or before the sampled time
    pub lower: f32,
    /// Time of the key at or after the sampled time
    pub upper: f32,
}

/// Ordered time -> value mapping with unique keys
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeStore<T> {
    frames: BTreeMap<OrderedFloat<f32>, T>,
}

impl<T> Default for KeyframeStore<T> {
    fn default() -> Self {
        Self {
            frames: BTreeMap::new(),
        }
    }
}

impl<T: Interpolate> KeyframeStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyframe, returning the value previously stored at that time
    pub fn insert(&mut self, time: f32, value: T) -> Option<T> {
        self.frames.insert(OrderedFloat(time), value)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Value stored exactly at `time`
    pub fn get(&self, time: f32) -> Option<T> {
        self.frames.get(&OrderedFloat(time)).copied()
    }

    /// Keyframe at position `index` in time order
    pub fn nth(&self, index: usize) -> Option<Keyframe<T>> {
        self.iter().nth(index)
    }

    pub fn first(&self) -> Option<Keyframe<T>> {
        self.frames
            .first_key_value()
            .map(|(t, v)| Keyframe { time: t.0, value: *v })
    }

    pub fn last(&self) -> Option<Keyframe<T>> {
        self.frames
            .last_key_value()
            .map(|(t, v)| Keyframe { time: t.0, value: *v })
    }

    /// Iterate keyframes in ascending time order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Keyframe<T>> + ExactSizeIterator + '_ {
        self.frames
            .iter()
            .map(|(t, v)| Keyframe { time: t.0, value: *v })
    }

    /// Key times in ascending order
    pub fn times(&self) -> impl Iterator<Item = f32> + '_ {
        self.frames.keys().map(|t| t.0)
    }

    /// Values in ascending time order
    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        self.frames.values().copied()
    }

    /// Sample the store at `time`
    ///
    /// Returns the first value for times at or before the first key, the last
    /// value at or after the last key, the stored value on an exact key, and a
    /// blend of the bracketing pair otherwise.
    pub fn get_interpolated(&self, time: f32) -> Result<Sample<T>> {
        let (first, last) = match (self.first(), self.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(AnimError::EmptyTrack(format!(
                    "no keyframes to sample at time {time}"
                )));
            }
        };

        if time <= first.time {
            return Ok(Sample {
                value: first.value,
                lower: first.time,
                upper: first.time,
            });
        }
        if time >= last.time {
            return Ok(Sample {
                value: last.value,
                lower: last.time,
                upper: last.time,
            });
        }

        let key = OrderedFloat(time);
        // Both bounds exist: time lies strictly inside (first, last)
        let before = self.frames.range((Unbounded, Included(key))).next_back();
        let after = self.frames.range((Excluded(key), Unbounded)).next();
        let (Some((t0, v0)), Some((t1, v1))) = (before, after) else {
            return Err(AnimError::EmptyTrack(format!(
                "no bracketing keyframes at time {time}"
            )));
        };

        if t0.0 == time {
            return Ok(Sample {
                value: *v0,
                lower: t0.0,
                upper: t0.0,
            });
        }

        let span = t1.0 - t0.0;
        let t = if span > 0.0 { (time - t0.0) / span } else { 0.0 };
        Ok(Sample {
            value: v0.interpolate(v1, t.clamp(0.0, 1.0)),
            lower: t0.0,
            upper: t1.0,
        })
    }
}

impl<T: Interpolate> FromIterator<(f32, T)> for KeyframeStore<T> {
    fn from_iter<I: IntoIterator<Item = (f32, T)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (time, value) in iter {
            store.insert(time, value);
        }
        store
    }
}

impl<T: Interpolate> Extend<(f32, T)> for KeyframeStore<T> {
    fn extend<I: IntoIterator<Item = (f32, T)>>(&mut self, iter: I) {
        for (time, value) in iter {
            self.insert(time, value);
        }
    }
}
