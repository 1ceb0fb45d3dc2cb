//! Error types for the detector.

use thiserror::Error;

/// Errors raised when a detector is misconfigured or handed an unusable frame.
///
/// Numeric degeneracies (silence, empty threshold windows, an envelope that
/// cannot be fitted) are not errors; they simply lead to fewer detections.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("invalid lag range: m_lo ({m_lo}) must be non-zero and below m_hi ({m_hi})")]
    InvalidLagRange { m_lo: usize, m_hi: usize },

    #[error("m_max ({m_max}) must not be below m_hi ({m_hi})")]
    InvalidHarmonicLimit { m_max: usize, m_hi: usize },

    #[error("max_iterations must be at least 1")]
    ZeroIterations,

    #[error("invalid {name} band: {low} - {high} Hz")]
    InvalidBand {
        name: &'static str,
        low: f64,
        high: f64,
    },

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("empty frame")]
    EmptyFrame,

    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(usize),

    #[error("frame has {actual} samples, detector was built for {expected}")]
    FrameSizeMismatch { expected: usize, actual: usize },
}

/// Result type for detector operations.
pub type DetectionResult<T> = Result<T, DetectionError>;
