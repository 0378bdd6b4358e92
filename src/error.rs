//! Error types for placesim

use thiserror::Error;

/// Placesim error type
#[derive(Debug, Error)]
pub enum SimError {
    /// Parameter outside its valid domain
    #[error("Invalid parameter `{name}`: {reason} (got {value})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Two sequences that must be aligned have different lengths
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Spike matrix shape does not match what the operation needs
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Metadata export failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Largest element count any buffer in the crate may request
pub(crate) const MAX_ELEMENTS: usize = isize::MAX as usize / std::mem::size_of::<f64>();

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value, reason: "must be finite" })
    }
}

pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value, reason: "must be > 0" })
    }
}

pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value, reason: "must be >= 0" })
    }
}

pub(crate) fn ensure_unit_interval(name: &'static str, value: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value, reason: "must lie in [0, 1]" })
    }
}

/// `rows * cols`, or an error when the product cannot be allocated
pub(crate) fn checked_size(name: &'static str, rows: usize, cols: usize) -> Result<usize> {
    match rows.checked_mul(cols) {
        Some(n) if n <= MAX_ELEMENTS => Ok(n),
        _ => Err(SimError::InvalidParameter {
            name,
            value: rows as f64 * cols as f64,
            reason: "too many elements to allocate",
        }),
    }
}

pub(crate) fn ensure_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SimError::LengthMismatch { what, expected, actual })
    }
}
