use thiserror::Error;

/// Validation and contract errors exposed by `agrofuse-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("crop id cannot be empty")]
    EmptyCropId,
    #[error("crop id contains invalid character '{ch}' at index {index}")]
    CropIdInvalidChar { ch: char, index: usize },
    #[error("duplicate crop id '{id}' in catalogue")]
    DuplicateCropId { id: String },
    #[error("crop '{id}' must list at least one {field}")]
    EmptyCropSet { id: String, field: &'static str },

    #[error("invalid soil type '{value}', expected one of clay, loamy, silty, sandy, black, red, alluvial, well_drained")]
    InvalidSoilType { value: String },
    #[error("invalid season '{value}', expected one of kharif, rabi, summer, monsoon, winter, year_round")]
    InvalidSeason { value: String },
    #[error("invalid water level '{value}', expected one of low, medium, high, very_high")]
    InvalidWaterLevel { value: String },
    #[error("invalid experience level '{value}', expected one of beginner, intermediate, expert")]
    InvalidExperienceLevel { value: String },
    #[error("invalid farm size '{value}', expected one of small, medium, large")]
    InvalidFarmSize { value: String },

    #[error("state name cannot be empty")]
    EmptyStateName,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("range '{field}' must satisfy min <= max ({min} > {max})")]
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("pH {value} must be within 0.0..=14.0")]
    PhOutOfBounds { value: f64 },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("date must be formatted YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
