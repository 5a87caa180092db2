//! Parsing of list query strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::fields::{Field, FieldKind, Resource};
use super::{DEFAULT_LIMIT, MAX_LIMIT};

/// Keys that control the listing instead of filtering it
const RESERVED: &[&str] = &["select", "sort", "page", "limit"];

/// Error type for list query parsing
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QueryError {
    #[error("Unknown filter field '{0}'")]
    UnknownField(String),

    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Operator '{op}' is not supported for field '{field}'")]
    UnsupportedOperator { field: String, op: String },

    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },

    #[error("Cannot sort by '{0}'")]
    UnknownSortField(String),

    #[error("{0} must be a positive integer")]
    InvalidNumber(&'static str),
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Operator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(Operator::Gt),
            "gte" => Some(Operator::Gte),
            "lt" => Some(Operator::Lt),
            "lte" => Some(Operator::Lte),
            "in" => Some(Operator::In),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
        }
    }

    /// SQL comparison for scalar operators
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "= ANY",
        }
    }
}

/// A parsed, typed filter value
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    TextList(Vec<String>),
    NumberList(Vec<f64>),
    UuidList(Vec<Uuid>),
}

/// One `field[op]=value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static Field,
    pub op: Operator,
    pub value: FilterValue,
}

/// One ORDER BY term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortKey {
    pub field: &'static Field,
    pub descending: bool,
}

/// A fully parsed list request
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub resource: &'static Resource,
    pub filters: Vec<Filter>,
    /// Output keys to keep (`_id` is always kept); `None` keeps everything
    pub select: Option<Vec<String>>,
    /// Empty means the default order (`createdAt` ascending)
    pub sort: Vec<SortKey>,
    pub page: i64,
    pub limit: i64,
}

impl ListQuery {
    /// Parses raw query-string pairs against a resource's field table
    pub fn parse(pairs: &[(String, String)], resource: &'static Resource) -> Result<Self, QueryError> {
        let mut query = ListQuery {
            resource,
            filters: Vec::new(),
            select: None,
            sort: Vec::new(),
            page: 1,
            limit: DEFAULT_LIMIT,
        };

        for (key, value) in pairs {
            match key.as_str() {
                "select" => query.select = Some(split_list(value)),
                "sort" => query.sort = parse_sort(value, resource)?,
                "page" => query.page = parse_positive(value, "page")?,
                "limit" => query.limit = parse_positive(value, "limit")?.min(MAX_LIMIT),
                _ => query.filters.push(parse_filter(key, value, resource)?),
            }
        }

        Ok(query)
    }

    /// Rows skipped before the current page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Whether `key` survives the `select` projection
    pub fn includes(&self, key: &str) -> bool {
        match &self.select {
            None => true,
            Some(keys) => keys.iter().any(|k| k == key),
        }
    }

    /// Applies the `select` projection to one serialized record
    pub fn project(&self, value: Value) -> Value {
        let Some(keys) = &self.select else {
            return value;
        };

        match value {
            Value::Object(map) => {
                let projected: Map<String, Value> = map
                    .into_iter()
                    .filter(|(k, _)| k == "_id" || keys.iter().any(|s| s == k))
                    .collect();
                Value::Object(projected)
            }
            other => other,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_positive(value: &str, name: &'static str) -> Result<i64, QueryError> {
    match value.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(QueryError::InvalidNumber(name)),
    }
}

fn parse_sort(value: &str, resource: &Resource) -> Result<Vec<SortKey>, QueryError> {
    split_list(value)
        .into_iter()
        .map(|term| {
            let (name, descending) = match term.strip_prefix('-') {
                Some(name) => (name.to_string(), true),
                None => (term, false),
            };

            let field = resource
                .field(&name)
                .filter(|f| f.kind.sortable())
                .ok_or(QueryError::UnknownSortField(name))?;

            Ok(SortKey { field, descending })
        })
        .collect()
}

/// Splits `field[op]` into its parts
fn split_key(key: &str) -> Result<(&str, Operator), QueryError> {
    match key.split_once('[') {
        None => Ok((key, Operator::Eq)),
        Some((name, rest)) => {
            let op = rest
                .strip_suffix(']')
                .ok_or_else(|| QueryError::UnknownOperator(rest.to_string()))?;
            let op = Operator::parse(op).ok_or_else(|| QueryError::UnknownOperator(op.to_string()))?;
            Ok((name, op))
        }
    }
}

fn parse_filter(key: &str, value: &str, resource: &Resource) -> Result<Filter, QueryError> {
    let (name, op) = split_key(key)?;

    if RESERVED.contains(&name) {
        return Err(QueryError::UnknownField(name.to_string()));
    }

    let field = resource
        .field(name)
        .ok_or_else(|| QueryError::UnknownField(name.to_string()))?;

    if !field.kind.supports(op) {
        return Err(QueryError::UnsupportedOperator {
            field: name.to_string(),
            op: op.as_str().to_string(),
        });
    }

    let invalid = || QueryError::InvalidValue {
        field: name.to_string(),
        value: value.to_string(),
    };

    let value = if op == Operator::In {
        parse_list(field.kind, value).ok_or_else(invalid)?
    } else {
        parse_scalar(field.kind, value).ok_or_else(invalid)?
    };

    Ok(Filter { field, op, value })
}

fn parse_scalar(kind: FieldKind, raw: &str) -> Option<FilterValue> {
    let raw = raw.trim();
    match kind {
        FieldKind::Text | FieldKind::TextArray => Some(FilterValue::Text(raw.to_string())),
        FieldKind::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FilterValue::Number),
        FieldKind::Bool => raw.parse::<bool>().ok().map(FilterValue::Bool),
        FieldKind::Timestamp => parse_timestamp(raw).map(FilterValue::Timestamp),
        FieldKind::Uuid => Uuid::parse_str(raw).ok().map(FilterValue::Uuid),
        FieldKind::Enum(allowed) => allowed
            .contains(&raw)
            .then(|| FilterValue::Text(raw.to_string())),
    }
}

fn parse_list(kind: FieldKind, raw: &str) -> Option<FilterValue> {
    let items = split_list(raw);
    if items.is_empty() {
        return None;
    }

    match kind {
        FieldKind::Text | FieldKind::TextArray => Some(FilterValue::TextList(items)),
        FieldKind::Enum(allowed) => items
            .iter()
            .all(|i| allowed.contains(&i.as_str()))
            .then_some(FilterValue::TextList(items)),
        FieldKind::Number => items
            .iter()
            .map(|i| i.parse::<f64>().ok().filter(|n| n.is_finite()))
            .collect::<Option<Vec<_>>>()
            .map(FilterValue::NumberList),
        FieldKind::Uuid => items
            .iter()
            .map(|i| Uuid::parse_str(i).ok())
            .collect::<Option<Vec<_>>>()
            .map(FilterValue::UuidList),
        FieldKind::Bool | FieldKind::Timestamp => None,
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
