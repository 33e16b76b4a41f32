//! Input annotations attached by the host
//!
//! These carry the format, range and optional initial error of a value as
//! decided by the earlier stages of the toolchain.

use serde::{Deserialize, Serialize};

use crate::shared::models::{FPInterval, FixedPointFormat};

/// Format, range and initial error of a scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputInfo {
    pub format: FixedPointFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_error: Option<f64>,
}

impl InputInfo {
    pub fn new(format: FixedPointFormat, min: f64, max: f64) -> Self {
        Self {
            format,
            range: Some((min, max)),
            initial_error: None,
        }
    }

    pub fn with_initial_error(mut self, error: f64) -> Self {
        self.initial_error = Some(error);
        self
    }

    /// Range paired with the format, when a range is annotated
    pub fn interval(&self) -> Option<FPInterval> {
        self.range
            .map(|(min, max)| FPInterval::new(self.format, min, max))
    }
}

/// Annotation of a scalar or of an aggregate, field by field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueInfo {
    Scalar(InputInfo),
    Struct(Vec<Option<ValueInfo>>),
}

impl ValueInfo {
    pub fn as_scalar(&self) -> Option<&InputInfo> {
        match self {
            ValueInfo::Scalar(info) => Some(info),
            ValueInfo::Struct(_) => None,
        }
    }
}

impl From<InputInfo> for ValueInfo {
    fn from(info: InputInfo) -> Self {
        ValueInfo::Scalar(info)
    }
}
