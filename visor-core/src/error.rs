//! Error types for the Visor analyzers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    /// The caller supplied no image or an undecodable one. Surfaced as a
    /// rejected request, never retried.
    #[error("invalid input: {0}")]
    Input(String),

    /// A model failed to load or was never acquired. Degrades the owning
    /// capability to an explicit error record; other capabilities keep
    /// working.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Unexpected failure mid-pipeline (malformed intermediate geometry,
    /// tensor shape mismatch, ...). Caught at the orchestration boundary.
    #[error("processing error: {0}")]
    Processing(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, VisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VisionError::ModelUnavailable("emotion network".to_string());
        assert!(err.to_string().contains("model unavailable"));
        assert!(err.to_string().contains("emotion network"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VisionError = io_err.into();
        match err {
            VisionError::Io(_) => {}
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_input_error_message() {
        let err = VisionError::Input("no image provided".to_string());
        assert_eq!(err.to_string(), "invalid input: no image provided");
    }
}
