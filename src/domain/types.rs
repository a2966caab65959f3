//! Shared domain enumerations aligned with the assessment workflow.

use serde::{Deserialize, Serialize};

/// Whether a participant has completed their assessment.
///
/// Wire values keep the upstream Indonesian terms: `SUDAH` (done) and
/// `BELUM` (not yet done). `BELUM` doubles as the volatile-state signal the
/// cache policy refuses to cache (see `cache::policy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentStatus {
    #[serde(rename = "SUDAH")]
    Sudah,
    #[serde(rename = "BELUM")]
    Belum,
}

impl AssessmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentStatus::Sudah => "SUDAH",
            AssessmentStatus::Belum => "BELUM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}
