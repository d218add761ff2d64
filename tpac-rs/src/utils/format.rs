//! Formatting utilities

use humansize::{DECIMAL, format_size};
use tpac_anim::keyframe::KeyframeStore;

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a rotation or position as its four components
pub fn format_components(components: [f32; 4]) -> String {
    let [x, y, z, w] = components;
    format!("({x:.4}, {y:.4}, {z:.4}, {w:.4})")
}

/// Format the time range covered by a keyframe store
pub fn format_time_range<T: tpac_anim::keyframe::Interpolate>(store: &KeyframeStore<T>) -> String {
    match (store.first(), store.last()) {
        (Some(first), Some(last)) => format!("{} - {}", first.time, last.time),
        _ => "-".to_string(),
    }
}
