//! AQL queries and translation of caller filters into AQL clauses.

use serde::Serialize;
use serde_json::{Map, Value};

use versatile_domain::filter::{
    Filter, FilterError, FilterOp, SortDirection, parse_sort, validate_field,
};

/// Query text plus its bind variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    #[serde(rename = "query")]
    pub aql: String,
    #[serde(rename = "bindVars")]
    pub bind_vars: Map<String, Value>,
}

impl Query {
    pub fn new(aql: impl Into<String>) -> Self {
        Self {
            aql: aql.into(),
            bind_vars: Map::new(),
        }
    }

    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.bind_vars.insert(name.to_owned(), value.into());
        self
    }

    pub fn bind_all(mut self, vars: Map<String, Value>) -> Self {
        self.bind_vars.extend(vars);
        self
    }
}

/// Largest integer AQL represents exactly; stands in for "no limit".
const UNBOUNDED: u64 = 9_007_199_254_740_991;

/// FILTER / SORT / LIMIT clauses derived from a [`Filter`].
#[derive(Debug, Default, PartialEq)]
pub struct AqlClauses {
    /// Newline-terminated clauses, empty when the filter is empty.
    pub text: String,
    pub bind_vars: Map<String, Value>,
}

/// Translates `filter` for the loop variable `var`. Values are always bound
/// as `@f<n>` parameters.
pub fn filter_to_aql(var: &str, filter: &Filter) -> Result<AqlClauses, FilterError> {
    let mut translator = Translator {
        var,
        bind_vars: Map::new(),
    };
    let mut text = String::new();

    let conditions = filter
        .conditions
        .iter()
        .map(|condition| translator.object(condition))
        .collect::<Result<Vec<_>, _>>()?;
    if !conditions.is_empty() {
        text.push_str(&format!("FILTER {}\n", conditions.join(" && ")));
    }

    if !filter.sort.is_empty() {
        let keys = filter
            .sort
            .iter()
            .map(|entry| {
                let (field, direction) = parse_sort(entry)?;
                let direction = match direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                };
                Ok(format!("{var}.{field} {direction}"))
            })
            .collect::<Result<Vec<_>, FilterError>>()?;
        text.push_str(&format!("SORT {}\n", keys.join(", ")));
    }

    match (filter.offset, filter.limit) {
        (None, None) => {}
        (offset, limit) => {
            let offset = offset.unwrap_or(0);
            let limit = limit.unwrap_or(UNBOUNDED);
            text.push_str(&format!("LIMIT {offset}, {limit}\n"));
        }
    }

    Ok(AqlClauses {
        text,
        bind_vars: translator.bind_vars,
    })
}

struct Translator<'a> {
    var: &'a str,
    bind_vars: Map<String, Value>,
}

impl Translator<'_> {
    fn bind(&mut self, value: &Value) -> String {
        let name = format!("f{}", self.bind_vars.len());
        self.bind_vars.insert(name.clone(), value.clone());
        name
    }

    fn object(&mut self, condition: &Map<String, Value>) -> Result<String, FilterError> {
        if condition.is_empty() {
            return Err(FilterError::InvalidWhereClause("empty condition".into()));
        }
        let parts = condition
            .iter()
            .map(|(key, value)| match key.as_str() {
                "$and" | "$or" => self.junction(key, value),
                "$not" => {
                    let inner = value.as_object().ok_or_else(|| {
                        FilterError::InvalidWhereClause("$not requires an object".into())
                    })?;
                    Ok(format!("!({})", self.object(inner)?))
                }
                op if op.starts_with('$') => Err(FilterError::UnsupportedOperator(op.to_owned())),
                field => self.field(field, value),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(wrap(parts, " && "))
    }

    fn junction(&mut self, key: &str, value: &Value) -> Result<String, FilterError> {
        let items = value
            .as_array()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| {
                FilterError::InvalidWhereClause(format!("{key} requires a non-empty array"))
            })?;
        let parts = items
            .iter()
            .map(|item| match item {
                Value::Object(inner) => self.object(inner),
                _ => Err(FilterError::InvalidWhereClause(format!(
                    "{key} entries must be objects"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let joiner = if key == "$and" { " && " } else { " || " };
        Ok(format!("({})", parts.join(joiner)))
    }

    fn field(&mut self, field: &str, value: &Value) -> Result<String, FilterError> {
        validate_field(field)?;
        match value {
            Value::Object(ops) => {
                if ops.is_empty() {
                    return Err(FilterError::InvalidWhereClause(format!(
                        "no operator given for {field}"
                    )));
                }
                let parts = ops
                    .iter()
                    .map(|(op, operand)| self.comparison(field, FilterOp::parse(op)?, operand))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(wrap(parts, " && "))
            }
            // Implicit equality: { field: value }
            scalar => self.comparison(field, FilterOp::Eq, scalar),
        }
    }

    fn comparison(
        &mut self,
        field: &str,
        op: FilterOp,
        operand: &Value,
    ) -> Result<String, FilterError> {
        match op {
            FilterOp::In | FilterOp::NIn if !operand.is_array() => {
                return Err(FilterError::InvalidWhereClause(format!(
                    "{field}: $in/$nin require an array"
                )));
            }
            FilterOp::Like | FilterOp::NLike if !operand.is_string() => {
                return Err(FilterError::InvalidWhereClause(format!(
                    "{field}: $like/$nlike require a string"
                )));
            }
            _ => {}
        }
        let target = format!("{}.{}", self.var, field);
        let param = self.bind(operand);
        Ok(match op {
            FilterOp::Eq => format!("{target} == @{param}"),
            FilterOp::Neq => format!("{target} != @{param}"),
            FilterOp::Gt => format!("{target} > @{param}"),
            FilterOp::Gte => format!("{target} >= @{param}"),
            FilterOp::Lt => format!("{target} < @{param}"),
            FilterOp::Lte => format!("{target} <= @{param}"),
            FilterOp::Like => format!("LIKE({target}, @{param}, true)"),
            FilterOp::NLike => format!("!LIKE({target}, @{param}, true)"),
            FilterOp::In => format!("{target} IN @{param}"),
            FilterOp::NIn => format!("{target} NOT IN @{param}"),
        })
    }
}

fn wrap(mut parts: Vec<String>, joiner: &str) -> String {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        format!("({})", parts.join(joiner))
    }
}
