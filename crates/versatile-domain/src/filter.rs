//! Caller-supplied query narrowing: where / sort / offset / limit.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Parsed `?filter=` value: paging, sort and where clauses.
///
/// `where` entries are ANDed together. Each entry maps field names to either a
/// scalar (implicit equality) or an operator object such as `{"$gt": 3}`;
/// `$and`, `$or` and `$not` nest further entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Map<String, Value>>,
}

impl Filter {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Narrows the filter with one more equality condition.
    pub fn and_equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        let mut condition = Map::new();
        condition.insert(field.to_owned(), value.into());
        self.conditions.push(condition);
        self
    }
}

/// Comparison operators accepted inside a field condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NLike,
    In,
    NIn,
}

impl FilterOp {
    pub fn parse(op: &str) -> Result<Self, FilterError> {
        Ok(match op {
            "$eq" => Self::Eq,
            "$ne" | "$neq" => Self::Neq,
            "$gt" => Self::Gt,
            "$gte" => Self::Gte,
            "$lt" => Self::Lt,
            "$lte" => Self::Lte,
            "$like" => Self::Like,
            "$nlike" => Self::NLike,
            "$in" => Self::In,
            "$nin" => Self::NIn,
            other => return Err(FilterError::UnsupportedOperator(other.to_owned())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
    #[error("invalid field name: {0:?}")]
    InvalidField(String),
    #[error("invalid where clause: {0}")]
    InvalidWhereClause(String),
    #[error("invalid sort entry: {0:?}")]
    InvalidSort(String),
}

/// Accepts dotted identifiers such as `email` or `profile.city`.
pub fn validate_field(field: &str) -> Result<(), FilterError> {
    let valid = !field.is_empty()
        && field.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(FilterError::InvalidField(field.to_owned()))
    }
}

/// Splits `"field"`, `"field ASC"` or `"field DESC"` into its parts.
pub fn parse_sort(entry: &str) -> Result<(&str, SortDirection), FilterError> {
    let mut parts = entry.split_whitespace();
    let field = parts
        .next()
        .ok_or_else(|| FilterError::InvalidSort(entry.to_owned()))?;
    validate_field(field)?;
    let direction = match parts.next().map(str::to_ascii_uppercase).as_deref() {
        None | Some("ASC") => SortDirection::Asc,
        Some("DESC") => SortDirection::Desc,
        Some(_) => return Err(FilterError::InvalidSort(entry.to_owned())),
    };
    if parts.next().is_some() {
        return Err(FilterError::InvalidSort(entry.to_owned()));
    }
    Ok((field, direction))
}
