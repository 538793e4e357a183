//! Error handling for streamconv
//!
//! Every error here is raised while building or loading a layer, never from
//! a `forward` call.

use thiserror::Error;

/// Result type alias for streamconv operations
pub type Result<T> = std::result::Result<T, ConvError>;

/// Main error type for layer construction and model loading
#[derive(Error, Debug)]
pub enum ConvError {
    // Configuration Errors
    #[error("Invalid {param}: {value} (must be at least 1)")]
    InvalidSize { param: &'static str, value: usize },

    #[error("Weight shape mismatch: expected {expected}, found {found}")]
    WeightShape { expected: String, found: String },

    #[error("Bias length mismatch: expected {expected}, found {found}")]
    BiasShape { expected: usize, found: usize },

    #[error("Layer dimensions overflow: {reason}")]
    SizeOverflow { reason: String },

    #[error("Layer {index} expects {expected} inputs but the previous layer produces {found}")]
    LayerMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    // Model Description Errors
    #[error("Unsupported layer type: {layer_type}")]
    UnsupportedLayer { layer_type: String },

    #[error("Unsupported activation: {activation}")]
    UnsupportedActivation { activation: String },

    #[error("Malformed model description: {reason}")]
    ModelFormat { reason: String },

    #[error("Value {value} cannot be represented in the layer's sample type")]
    NumericConversion { value: f64 },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Invalid signal data at line {line}: {reason}")]
    SignalFormat { line: usize, reason: String },

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConvError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ConvError::InvalidSize { .. } => "INVALID_SIZE",
            ConvError::WeightShape { .. } => "WEIGHT_SHAPE",
            ConvError::BiasShape { .. } => "BIAS_SHAPE",
            ConvError::SizeOverflow { .. } => "SIZE_OVERFLOW",
            ConvError::LayerMismatch { .. } => "LAYER_MISMATCH",
            ConvError::UnsupportedLayer { .. } => "UNSUPPORTED_LAYER",
            ConvError::UnsupportedActivation { .. } => "UNSUPPORTED_ACTIVATION",
            ConvError::ModelFormat { .. } => "MODEL_FORMAT",
            ConvError::NumericConversion { .. } => "NUMERIC_CONVERSION",
            ConvError::Io(_) => "IO_ERROR",
            ConvError::Wav(_) => "WAV_ERROR",
            ConvError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            ConvError::SignalFormat { .. } => "SIGNAL_FORMAT",
            ConvError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error comes from an invalid topology or parameter set
    /// rather than from reading the description itself
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ConvError::InvalidSize { .. }
                | ConvError::WeightShape { .. }
                | ConvError::BiasShape { .. }
                | ConvError::SizeOverflow { .. }
                | ConvError::LayerMismatch { .. }
        )
    }
}
