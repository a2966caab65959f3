//! Generic list-query translation.
//!
//! List endpoints accept declarative filter/sort/paginate parameters and
//! hand the data source a normalized [`QueryDescriptor`]. This module owns
//! that translation: operator validation, field allow-listing, pagination
//! clamping, and the leniency policy for unparsable filter input.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// Filter operators accepted on the wire.
///
/// A closed set: a clause naming an operator outside it is rejected, not
/// silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    Notin,
    Between,
    Notbetween,
    Isnull,
    Isnotnull,
}

impl FilterOp {
    pub fn from_wire(op: &str) -> Option<Self> {
        let parsed = match op {
            "eq" => FilterOp::Eq,
            "ne" => FilterOp::Ne,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "like" => FilterOp::Like,
            "ilike" => FilterOp::Ilike,
            "in" => FilterOp::In,
            "notin" => FilterOp::Notin,
            "between" => FilterOp::Between,
            "notbetween" => FilterOp::Notbetween,
            "isnull" => FilterOp::Isnull,
            "isnotnull" => FilterOp::Isnotnull,
            _ => return None,
        };
        Some(parsed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::Ilike => "ilike",
            FilterOp::In => "in",
            FilterOp::Notin => "notin",
            FilterOp::Between => "between",
            FilterOp::Notbetween => "notbetween",
            FilterOp::Isnull => "isnull",
            FilterOp::Isnotnull => "isnotnull",
        }
    }
}

/// One filter clause as it arrives on the wire, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFilterClause {
    pub field: String,
    pub op: String,
    #[serde(default)]
    pub value: Value,
}

/// A validated filter predicate. Array and range shapes are checked at
/// translation time so the data source never sees a malformed clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Like(String),
    ILike(String),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Between(Value, Value),
    NotBetween(Value, Value),
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub predicate: FilterPredicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Accepts `ASC`/`DESC` case-insensitively; anything else falls back to
    /// the endpoint default (descending).
    fn parse_lenient(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(value) if value.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Page slicing intent. `All` is reserved for internal call sites that need
/// every matching row and bypasses page/limit entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    Paged { page: u32, limit: u32 },
    All,
}

/// Normalized, validated query intent. Built once per request and handed to
/// the data source unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub filters: Vec<FilterClause>,
    pub pages: PageSelection,
    pub sort: Sort,
}

impl QueryDescriptor {
    /// Append a clause built by the endpoint itself (already trusted).
    pub fn with_clause(mut self, field: impl Into<String>, predicate: FilterPredicate) -> Self {
        self.filters.push(FilterClause {
            field: field.into(),
            predicate,
        });
        self
    }
}

/// Per-endpoint allow-lists and bounds consumed by the translator.
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy {
    pub filterable: &'static [&'static str],
    pub sortable: &'static [&'static str],
    pub default_sort: &'static str,
    pub max_limit: u32,
}

impl FieldPolicy {
    fn allows_filter(&self, field: &str) -> bool {
        self.filterable.contains(&field)
    }

    fn allows_sort(&self, field: &str) -> bool {
        self.sortable.contains(&field)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("field `{field}` is not filterable on this endpoint")]
    DisallowedField { field: String },
    #[error("unknown filter operator `{op}` on field `{field}`")]
    UnknownOperator { field: String, op: String },
    #[error("operator `{op}` on field `{field}` requires an array value")]
    ExpectedArray { field: String, op: &'static str },
    #[error("operator `{op}` on field `{field}` requires a two-element array")]
    ExpectedRange { field: String, op: &'static str },
}

/// List-endpoint wire parameters.
///
/// Numeric fields arrive as strings so that malformed values can be clamped
/// instead of failing extraction; see the pagination rules below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    #[serde(alias = "pageSize")]
    pub limit: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
    pub filters: Option<String>,
}

/// Parse a JSON-encoded filter list leniently.
///
/// List endpoints must never hard-fail solely because of unparsable
/// optional filter input: the parse failure is logged and the request
/// proceeds unfiltered. Well-formed-but-invalid clauses are a different
/// case and are rejected by [`translate_clauses`].
pub fn parse_filter_input(raw: &str) -> Vec<RawFilterClause> {
    match serde_json::from_str::<Vec<RawFilterClause>>(raw) {
        Ok(clauses) => clauses,
        Err(err) => {
            warn!(
                target = "tasmik::query",
                error = %err,
                "ignoring unparsable filter input"
            );
            Vec::new()
        }
    }
}

/// Validate raw clauses against an endpoint's field policy.
pub fn translate_clauses(
    clauses: Vec<RawFilterClause>,
    policy: &FieldPolicy,
) -> Result<Vec<FilterClause>, QueryError> {
    clauses
        .into_iter()
        .map(|clause| {
            if !policy.allows_filter(&clause.field) {
                return Err(QueryError::DisallowedField { field: clause.field });
            }
            let op = FilterOp::from_wire(&clause.op).ok_or_else(|| QueryError::UnknownOperator {
                field: clause.field.clone(),
                op: clause.op.clone(),
            })?;
            let predicate = validate_predicate(&clause.field, op, clause.value)?;
            Ok(FilterClause {
                field: clause.field,
                predicate,
            })
        })
        .collect()
}

fn validate_predicate(field: &str, op: FilterOp, value: Value) -> Result<FilterPredicate, QueryError> {
    let predicate = match op {
        FilterOp::Eq => FilterPredicate::Eq(value),
        FilterOp::Ne => FilterPredicate::Ne(value),
        FilterOp::Gt => FilterPredicate::Gt(value),
        FilterOp::Gte => FilterPredicate::Gte(value),
        FilterOp::Lt => FilterPredicate::Lt(value),
        FilterOp::Lte => FilterPredicate::Lte(value),
        FilterOp::Like => FilterPredicate::Like(pattern_text(value)),
        FilterOp::Ilike => FilterPredicate::ILike(pattern_text(value)),
        FilterOp::In => FilterPredicate::In(expect_array(field, op, value)?),
        FilterOp::Notin => FilterPredicate::NotIn(expect_array(field, op, value)?),
        FilterOp::Between => {
            let (low, high) = expect_range(field, op, value)?;
            FilterPredicate::Between(low, high)
        }
        FilterOp::Notbetween => {
            let (low, high) = expect_range(field, op, value)?;
            FilterPredicate::NotBetween(low, high)
        }
        FilterOp::Isnull => FilterPredicate::IsNull,
        FilterOp::Isnotnull => FilterPredicate::IsNotNull,
    };
    Ok(predicate)
}

fn pattern_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn expect_array(field: &str, op: FilterOp, value: Value) -> Result<Vec<Value>, QueryError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(QueryError::ExpectedArray {
            field: field.to_string(),
            op: op.as_str(),
        }),
    }
}

fn expect_range(field: &str, op: FilterOp, value: Value) -> Result<(Value, Value), QueryError> {
    match value {
        Value::Array(items) if items.len() == 2 => {
            let mut items = items.into_iter();
            let low = items.next().unwrap_or(Value::Null);
            let high = items.next().unwrap_or(Value::Null);
            Ok((low, high))
        }
        _ => Err(QueryError::ExpectedRange {
            field: field.to_string(),
            op: op.as_str(),
        }),
    }
}

/// Build the full descriptor from wire parameters and an endpoint policy.
pub fn translate(params: &ListParams, policy: &FieldPolicy) -> Result<QueryDescriptor, QueryError> {
    let clauses = params
        .filters
        .as_deref()
        .map(parse_filter_input)
        .unwrap_or_default();
    let filters = translate_clauses(clauses, policy)?;

    let page = parse_bounded(params.page.as_deref(), DEFAULT_PAGE, u32::MAX);
    let limit = parse_bounded(params.limit.as_deref(), DEFAULT_LIMIT, policy.max_limit);

    Ok(QueryDescriptor {
        filters,
        pages: PageSelection::Paged { page, limit },
        sort: resolve_sort(params, policy),
    })
}

/// Descriptor for internal call sites that need every matching row.
pub fn translate_unpaged(
    clauses: Vec<RawFilterClause>,
    policy: &FieldPolicy,
) -> Result<QueryDescriptor, QueryError> {
    let filters = translate_clauses(clauses, policy)?;
    Ok(QueryDescriptor {
        filters,
        pages: PageSelection::All,
        sort: Sort {
            field: policy.default_sort.to_string(),
            direction: SortDirection::Desc,
        },
    })
}

fn resolve_sort(params: &ListParams, policy: &FieldPolicy) -> Sort {
    let field = match params.sort_by.as_deref() {
        Some(candidate) if policy.allows_sort(candidate) => candidate.to_string(),
        _ => policy.default_sort.to_string(),
    };
    Sort {
        field,
        direction: SortDirection::parse_lenient(params.sort_order.as_deref()),
    }
}

/// Pagination bounds are never hard errors: non-numeric falls back to the
/// default, then the value is clamped into `1..=max`.
fn parse_bounded(raw: Option<&str>, default: u32, max: u32) -> u32 {
    let parsed = raw
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(i64::from(default));
    parsed.clamp(1, i64::from(max)) as u32
}
