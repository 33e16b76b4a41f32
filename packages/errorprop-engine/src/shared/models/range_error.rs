//! Range/error pairs and comparison results

use serde::{Deserialize, Serialize};

use super::affine::AffineForm;
use super::fixed_point::FPInterval;

/// Range of a value plus its error.
///
/// `error == None` means "no error data", which is not the same as zero error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeError {
    pub range: FPInterval,
    pub error: Option<AffineForm>,
}

impl RangeError {
    pub fn new(range: FPInterval, error: Option<AffineForm>) -> Self {
        Self { range, error }
    }

    pub fn with_error(range: FPInterval, error: AffineForm) -> Self {
        Self::new(range, Some(error))
    }

    pub fn range_only(range: FPInterval) -> Self {
        Self::new(range, None)
    }

    /// Absolute error bound, if any error data is present
    pub fn abs_error(&self) -> Option<f64> {
        self.error.as_ref().map(AffineForm::noise_bound)
    }
}

/// Outcome of the soundness check on a comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CmpErrorInfo {
    /// Largest error the comparison tolerates without changing its outcome
    pub tolerance: f64,
    pub may_be_wrong: bool,
}

impl CmpErrorInfo {
    pub fn new(tolerance: f64, may_be_wrong: bool) -> Self {
        Self {
            tolerance,
            may_be_wrong,
        }
    }
}
