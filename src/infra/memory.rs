//! In-memory data source.
//!
//! The reference executor for [`QueryDescriptor`]: applies validated
//! filters, sort, and page slicing over plain vectors. Used by the binary
//! and by the integration tests; a deployment backed by a real database
//! implements the same source traits against its own query machinery.

use std::cmp::Ordering;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use uuid::Uuid;

use crate::application::query::{
    FilterClause, FilterPredicate, PageSelection, QueryDescriptor, SortDirection,
};
use crate::application::sources::{
    AssessorSource, ListPage, NewParticipant, ParticipantSource, RegionSource, SourceError,
};
use crate::domain::entities::{AssessorRecord, ParticipantRecord, ProvinceRecord, RegencyRecord};
use crate::domain::types::AssessmentStatus;

/// Field access by wire name, so filter clauses and sort keys resolve
/// against a row without reflection.
pub trait QueryRow {
    fn field(&self, name: &str) -> Option<Value>;
}

// Fixed-width UTC timestamps so lexicographic order is chronological.
static SORTABLE_TIMESTAMP: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

fn timestamp_value(when: OffsetDateTime) -> Option<Value> {
    when.format(SORTABLE_TIMESTAMP).ok().map(Value::String)
}

impl QueryRow for ParticipantRecord {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.to_string())),
            "name" => Some(Value::String(self.name.clone())),
            "gender" => serde_json::to_value(self.gender).ok(),
            "status" => Some(Value::String(self.status.as_str().to_string())),
            "assessor_id" => Some(match self.assessor_id {
                Some(id) => Value::String(id.to_string()),
                None => Value::Null,
            }),
            "regency_id" => Some(Value::String(self.regency_id.to_string())),
            "juz_memorized" => Some(Value::from(self.juz_memorized)),
            "created_at" => timestamp_value(self.created_at),
            "updated_at" => timestamp_value(self.updated_at),
            _ => None,
        }
    }
}

impl QueryRow for AssessorRecord {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.to_string())),
            "name" => Some(Value::String(self.name.clone())),
            "gender" => serde_json::to_value(self.gender).ok(),
            "institution" => Some(Value::String(self.institution.clone())),
            "regency_id" => Some(Value::String(self.regency_id.to_string())),
            "created_at" => timestamp_value(self.created_at),
            "updated_at" => timestamp_value(self.updated_at),
            _ => None,
        }
    }
}

impl QueryRow for ProvinceRecord {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.to_string())),
            "code" => Some(Value::String(self.code.clone())),
            "name" => Some(Value::String(self.name.clone())),
            _ => None,
        }
    }
}

impl QueryRow for RegencyRecord {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.to_string())),
            "province_id" => Some(Value::String(self.province_id.to_string())),
            "code" => Some(Value::String(self.code.clone())),
            "name" => Some(Value::String(self.name.clone())),
            _ => None,
        }
    }
}

// ============================================================================
// Descriptor execution
// ============================================================================

/// JSON values are comparable when both sides are numbers, both strings,
/// or both booleans. RFC 3339 timestamps compare chronologically as
/// strings.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) => Some(text),
        _ => None,
    }
}

fn within_range(actual: &Value, low: &Value, high: &Value) -> bool {
    let lower = compare_values(actual, low);
    let upper = compare_values(actual, high);
    matches!(lower, Some(Ordering::Greater | Ordering::Equal))
        && matches!(upper, Some(Ordering::Less | Ordering::Equal))
}

fn matches_clause(row: &impl QueryRow, clause: &FilterClause) -> bool {
    let actual = row.field(&clause.field).unwrap_or(Value::Null);
    match &clause.predicate {
        FilterPredicate::Eq(expected) => actual == *expected,
        FilterPredicate::Ne(expected) => actual != *expected,
        FilterPredicate::Gt(bound) => {
            matches!(compare_values(&actual, bound), Some(Ordering::Greater))
        }
        FilterPredicate::Gte(bound) => matches!(
            compare_values(&actual, bound),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterPredicate::Lt(bound) => {
            matches!(compare_values(&actual, bound), Some(Ordering::Less))
        }
        FilterPredicate::Lte(bound) => matches!(
            compare_values(&actual, bound),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterPredicate::Like(pattern) => {
            text_of(&actual).is_some_and(|text| text.contains(pattern.as_str()))
        }
        FilterPredicate::ILike(pattern) => text_of(&actual)
            .is_some_and(|text| text.to_lowercase().contains(&pattern.to_lowercase())),
        FilterPredicate::In(items) => items.contains(&actual),
        FilterPredicate::NotIn(items) => !items.contains(&actual),
        FilterPredicate::Between(low, high) => within_range(&actual, low, high),
        FilterPredicate::NotBetween(low, high) => !within_range(&actual, low, high),
        FilterPredicate::IsNull => actual.is_null(),
        FilterPredicate::IsNotNull => !actual.is_null(),
    }
}

/// Apply a descriptor over rows: filter, sort, slice.
pub fn execute<T>(rows: &[T], query: &QueryDescriptor) -> ListPage<T>
where
    T: QueryRow + Clone,
{
    let mut matched: Vec<T> = rows
        .iter()
        .filter(|row| query.filters.iter().all(|clause| matches_clause(*row, clause)))
        .cloned()
        .collect();

    matched.sort_by(|a, b| {
        let left = a.field(&query.sort.field).unwrap_or(Value::Null);
        let right = b.field(&query.sort.field).unwrap_or(Value::Null);
        let ordering = compare_values(&left, &right).unwrap_or(Ordering::Equal);
        match query.sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    let total = matched.len() as u64;
    let items = match query.pages {
        PageSelection::Paged { page, limit } => matched
            .into_iter()
            .skip(((page - 1) as usize).saturating_mul(limit as usize))
            .take(limit as usize)
            .collect(),
        PageSelection::All => matched,
    };

    ListPage::new(items, query.pages, total)
}

// ============================================================================
// Directory
// ============================================================================

fn read_rows<T: Clone>(lock: &RwLock<Vec<T>>) -> Vec<T> {
    lock.read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// In-memory directory of participants, assessors, and reference
/// geography.
pub struct MemoryDirectory {
    participants: RwLock<Vec<ParticipantRecord>>,
    assessors: RwLock<Vec<AssessorRecord>>,
    provinces: Vec<ProvinceRecord>,
    regencies: Vec<RegencyRecord>,
}

impl MemoryDirectory {
    pub fn new(provinces: Vec<ProvinceRecord>, regencies: Vec<RegencyRecord>) -> Self {
        Self {
            participants: RwLock::new(Vec::new()),
            assessors: RwLock::new(Vec::new()),
            provinces,
            regencies,
        }
    }

    /// Directory preloaded with the demo reference geography.
    pub fn with_demo_regions() -> Self {
        let (provinces, regencies) = demo_regions();
        Self::new(provinces, regencies)
    }

    pub fn insert_participant(&self, record: ParticipantRecord) {
        self.participants
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    pub fn insert_assessor(&self, record: AssessorRecord) {
        self.assessors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }
}

#[async_trait]
impl ParticipantSource for MemoryDirectory {
    async fn list(
        &self,
        query: &QueryDescriptor,
    ) -> Result<ListPage<ParticipantRecord>, SourceError> {
        Ok(execute(&read_rows(&self.participants), query))
    }

    async fn find(&self, id: Uuid) -> Result<Option<ParticipantRecord>, SourceError> {
        Ok(read_rows(&self.participants)
            .into_iter()
            .find(|participant| participant.id == id))
    }

    async fn unassessed(
        &self,
        query: &QueryDescriptor,
    ) -> Result<ListPage<ParticipantRecord>, SourceError> {
        let rows: Vec<ParticipantRecord> = read_rows(&self.participants)
            .into_iter()
            .filter(|participant| participant.assessor_id.is_none())
            .collect();
        Ok(execute(&rows, query))
    }

    async fn ready(
        &self,
        query: &QueryDescriptor,
    ) -> Result<ListPage<ParticipantRecord>, SourceError> {
        let rows: Vec<ParticipantRecord> = read_rows(&self.participants)
            .into_iter()
            .filter(|participant| {
                participant.assessor_id.is_some()
                    && participant.status == AssessmentStatus::Belum
            })
            .collect();
        Ok(execute(&rows, query))
    }

    async fn create(&self, new: NewParticipant) -> Result<ParticipantRecord, SourceError> {
        if new.name.trim().is_empty() {
            return Err(SourceError::invalid_input("participant name cannot be empty"));
        }
        if !self.regencies.iter().any(|regency| regency.id == new.regency_id) {
            return Err(SourceError::invalid_input("unknown regency"));
        }

        let now = OffsetDateTime::now_utc();
        let record = ParticipantRecord {
            id: Uuid::new_v4(),
            name: new.name,
            gender: new.gender,
            status: new.status,
            assessor_id: None,
            regency_id: new.regency_id,
            juz_memorized: new.juz_memorized,
            created_at: now,
            updated_at: now,
        };
        self.insert_participant(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl AssessorSource for MemoryDirectory {
    async fn list(&self, query: &QueryDescriptor) -> Result<ListPage<AssessorRecord>, SourceError> {
        Ok(execute(&read_rows(&self.assessors), query))
    }

    async fn find(&self, id: Uuid) -> Result<Option<AssessorRecord>, SourceError> {
        Ok(read_rows(&self.assessors)
            .into_iter()
            .find(|assessor| assessor.id == id))
    }
}

#[async_trait]
impl RegionSource for MemoryDirectory {
    async fn provinces(
        &self,
        query: &QueryDescriptor,
    ) -> Result<ListPage<ProvinceRecord>, SourceError> {
        Ok(execute(&self.provinces, query))
    }

    async fn regencies(
        &self,
        query: &QueryDescriptor,
    ) -> Result<ListPage<RegencyRecord>, SourceError> {
        Ok(execute(&self.regencies, query))
    }
}

/// Demo reference geography for local runs.
pub fn demo_regions() -> (Vec<ProvinceRecord>, Vec<RegencyRecord>) {
    let jabar = ProvinceRecord {
        id: Uuid::new_v4(),
        code: "32".to_string(),
        name: "Jawa Barat".to_string(),
    };
    let jateng = ProvinceRecord {
        id: Uuid::new_v4(),
        code: "33".to_string(),
        name: "Jawa Tengah".to_string(),
    };
    let yogya = ProvinceRecord {
        id: Uuid::new_v4(),
        code: "34".to_string(),
        name: "DI Yogyakarta".to_string(),
    };

    let regencies = vec![
        RegencyRecord {
            id: Uuid::new_v4(),
            province_id: jabar.id,
            code: "3204".to_string(),
            name: "Kabupaten Bandung".to_string(),
        },
        RegencyRecord {
            id: Uuid::new_v4(),
            province_id: jabar.id,
            code: "3273".to_string(),
            name: "Kota Bandung".to_string(),
        },
        RegencyRecord {
            id: Uuid::new_v4(),
            province_id: jateng.id,
            code: "3374".to_string(),
            name: "Kota Semarang".to_string(),
        },
        RegencyRecord {
            id: Uuid::new_v4(),
            province_id: yogya.id,
            code: "3471".to_string(),
            name: "Kota Yogyakarta".to_string(),
        },
    ];

    (vec![jabar, jateng, yogya], regencies)
}
