//! Domain entities served by the read endpoints.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{AssessmentStatus, Gender};

/// A memorization-assessment participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantRecord {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub status: AssessmentStatus,
    /// Assigned assessor, if the participant has been scheduled.
    pub assessor_id: Option<Uuid>,
    pub regency_id: Uuid,
    pub juz_memorized: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// An assessor qualified to examine participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessorRecord {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub institution: String,
    pub regency_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Reference geography: a province.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceRecord {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

/// Reference geography: a regency or city within a province.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegencyRecord {
    pub id: Uuid,
    pub province_id: Uuid,
    pub code: String,
    pub name: String,
}
