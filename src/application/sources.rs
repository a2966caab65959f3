//! Data-source traits describing read adapters.
//!
//! The subsystem has no knowledge of how a source executes a
//! [`QueryDescriptor`]; these traits are the seam between the query
//! translator and whatever store backs a deployment.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::application::query::{PageSelection, QueryDescriptor};
use crate::domain::entities::{AssessorRecord, ParticipantRecord, ProvinceRecord, RegencyRecord};
use crate::domain::types::{AssessmentStatus, Gender};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data source failure: {0}")]
    Unavailable(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// One page of list results, in the shape list endpoints serialize.
#[derive(Debug, Clone, Serialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    pub total: u64,
}

impl<T> ListPage<T> {
    pub fn new(items: Vec<T>, pages: PageSelection, total: u64) -> Self {
        let (page, limit) = match pages {
            PageSelection::Paged { page, limit } => (Some(page), Some(limit)),
            PageSelection::All => (None, None),
        };
        Self {
            items,
            page,
            limit,
            total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub name: String,
    pub gender: Gender,
    pub status: AssessmentStatus,
    pub regency_id: Uuid,
    pub juz_memorized: i32,
}

#[async_trait]
pub trait ParticipantSource: Send + Sync {
    async fn list(&self, query: &QueryDescriptor)
    -> Result<ListPage<ParticipantRecord>, SourceError>;

    async fn find(&self, id: Uuid) -> Result<Option<ParticipantRecord>, SourceError>;

    /// Participants with no assessor assigned yet. A materialized view over
    /// mutable assignment state; never cached (see `cache::policy`).
    async fn unassessed(
        &self,
        query: &QueryDescriptor,
    ) -> Result<ListPage<ParticipantRecord>, SourceError>;

    /// Participants assigned an assessor but not yet assessed.
    async fn ready(
        &self,
        query: &QueryDescriptor,
    ) -> Result<ListPage<ParticipantRecord>, SourceError>;

    async fn create(&self, new: NewParticipant) -> Result<ParticipantRecord, SourceError>;
}

#[async_trait]
pub trait AssessorSource: Send + Sync {
    async fn list(&self, query: &QueryDescriptor) -> Result<ListPage<AssessorRecord>, SourceError>;

    async fn find(&self, id: Uuid) -> Result<Option<AssessorRecord>, SourceError>;
}

#[async_trait]
pub trait RegionSource: Send + Sync {
    /// Reference data: the descriptor arrives in no-pagination mode, so
    /// every matching province is returned unsliced.
    async fn provinces(
        &self,
        query: &QueryDescriptor,
    ) -> Result<ListPage<ProvinceRecord>, SourceError>;

    async fn regencies(&self, query: &QueryDescriptor)
    -> Result<ListPage<RegencyRecord>, SourceError>;
}
