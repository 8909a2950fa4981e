use thiserror::Error;

/// Every failure the detector can report.
///
/// Classification-path errors (`Decode`, `AnalysisUnavailable`) abort a detection.
/// `AuxiliaryDetector` is produced by context detectors and swallowed by the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Pixel analysis unavailable: {0}")]
    AnalysisUnavailable(String),
    #[error("Auxiliary object detector failed: {0}")]
    AuxiliaryDetector(String),
    #[error("Model not trained yet. Train the model before predicting.")]
    ModelNotReady,
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    UploadTooLarge { size: usize, limit: usize },
    #[error("A detection is already running for this session")]
    Busy,
    #[error("Detection was superseded by a newer submission")]
    Superseded,
    #[error("Detection worker failed: {0}")]
    WorkerFailed(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Location required: enter a location name for the hotspot")]
    MissingLocation,
    #[error("No hotspot selected")]
    NoSelection,
    #[error("Failed to write report: {0}")]
    Report(String),
    #[error("Invalid training data: {0}")]
    Training(String),
}

impl From<image::ImageError> for DetectionError {
    fn from(err: image::ImageError) -> Self {
        DetectionError::Decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for DetectionError {
    fn from(err: tokio::task::JoinError) -> Self {
        DetectionError::WorkerFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DetectionError>;
