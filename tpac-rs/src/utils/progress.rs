//! Progress bar utilities

use indicatif::{ProgressBar, ProgressStyle};

/// Create a standard progress bar
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Drive `pb` from a batch generation progress callback
///
/// The returned closure never cancels.
pub fn batch_callback(pb: &ProgressBar) -> impl FnMut(usize, usize, &str, bool) -> bool + '_ {
    move |current, total, name, done| {
        pb.set_length(total as u64);
        if done {
            pb.set_position(total as u64);
        } else {
            pb.set_position(current.saturating_sub(1) as u64);
            pb.set_message(format!("Generating: {name}"));
        }
        true
    }
}
