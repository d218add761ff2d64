use std::io;
use thiserror::Error;

/// Error types for animation decoding, encoding and bone-track generation
#[derive(Error, Debug)]
pub enum AnimError {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A structural invariant of the binary layout or the skeleton was violated
    #[error("Format mismatch: {0}")]
    FormatMismatch(String),

    /// Interpolation or generation was attempted on a track without keyframes
    #[error("Empty track: {0}")]
    EmptyTrack(String),

    /// A bone, frame or track index points past the stored data
    #[error("Index out of range: {what} index {index} (available: {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A referenced animation identifier is not present in the animation table
    #[error("Unknown animation: {0}")]
    UnknownAnimation(String),

    /// A generation method is missing a required configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnimError {
    /// Shorthand for an [`AnimError::IndexOutOfRange`]
    pub fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { what, index, len }
    }
}

/// Result type using AnimError
pub type Result<T> = std::result::Result<T, AnimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AnimError::FormatMismatch("Frames not equal: 3 - 4".to_string());
        assert_eq!(format!("{}", error), "Format mismatch: Frames not equal: 3 - 4");

        let error = AnimError::out_of_range("bone", 7, 5);
        assert_eq!(
            format!("{}", error),
            "Index out of range: bone index 7 (available: 5)"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        let error: AnimError = io_err.into();
        assert!(matches!(error, AnimError::Io(_)));
    }
}
