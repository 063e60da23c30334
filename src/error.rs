//! Error types for grid and cloud operations.

use thiserror::Error;

/// Result type alias using DataSetError.
pub type Result<T> = std::result::Result<T, DataSetError>;

/// Errors raised by [`Grid2D`](crate::Grid2D), [`Cloud`](crate::Cloud) and [`GeoDict`](crate::GeoDict).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataSetError {
    /// Data and coordinate arrays disagree on shape.
    #[error("{context}: expected shape {expected:?}, got {found:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("invalid geodict: {0}")]
    InvalidGeoDict(String),

    /// A coordinate lookup fell outside the grid.
    #[error("coordinate (lat={lat}, lon={lon}) is outside the grid")]
    OutOfBounds { lat: f64, lon: f64 },

    #[error("bounds do not contain any cell center of the grid")]
    EmptyIntersection,

    #[error("data set contains no points")]
    EmptyDataSet,

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("shape is missing the '{0}' attribute")]
    MissingAttribute(String),

    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// Failure reported by the interpolation backend.
    #[error("interpolation error: {0}")]
    Interpolation(String),
}

impl DataSetError {
    pub(crate) fn shape_mismatch(
        context: &'static str,
        expected: &[usize],
        found: &[usize],
    ) -> Self {
        Self::ShapeMismatch {
            context,
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = DataSetError::shape_mismatch("Cloud::set_data", &[3], &[4]);
        assert_eq!(
            err.to_string(),
            "Cloud::set_data: expected shape [3], got [4]"
        );
    }

    #[test]
    fn test_not_implemented_message() {
        let err = DataSetError::NotImplemented("interpolation method 'spline'".to_string());
        assert!(err.to_string().starts_with("not implemented"));
    }
}
