// WHERE clause generation for query-string filters

use super::{GeneratedClause, SqlValue};
use crate::errors::SqlBuildError;
use std::fmt;
use tracing::instrument;

/// Comparison operators a filter may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Lt,
    Gt,
    Like,
    In,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Like => "LIKE",
            Operator::In => "IN",
        }
    }

    /// Render `<column> <op> $<position>`
    ///
    /// `IN` binds a single array parameter, which PostgreSQL spells
    /// `<column> = ANY($N)`.
    fn render(&self, column: &str, position: usize) -> String {
        match self {
            Operator::In => format!("{} = ANY(${})", column, position),
            op => format!("{} {} ${}", column, op.as_sql(), position),
        }
    }

    /// Apply the operator's value transform
    fn transform(&self, value: SqlValue) -> SqlValue {
        match self {
            Operator::Like => SqlValue::Text(format!("%{}%", value)),
            _ => value,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Ordered filter-field → raw value mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPayload {
    entries: Vec<(&'static str, SqlValue)>,
}

impl FilterPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &'static str, value: impl Into<SqlValue>) -> Self {
        self.entries.push((field, value.into()));
        self
    }

    /// Add the field only when a value is present
    pub fn with_opt<V: Into<SqlValue>>(self, field: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(field, value),
            None => self,
        }
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Column, operator and optional replacement value chosen for one field
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub column: &'static str,
    pub operator: Operator,
    pub value_override: Option<SqlValue>,
}

impl ResolvedFilter {
    pub const fn new(column: &'static str, operator: Operator) -> Self {
        Self {
            column,
            operator,
            value_override: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.value_override = Some(value.into());
        self
    }
}

/// Picks a field's filter from the whole payload
pub type FilterResolver = fn(&FilterPayload) -> ResolvedFilter;

/// How one filter field turns into SQL
#[derive(Clone, Copy)]
pub enum FilterRule {
    Static {
        column: &'static str,
        operator: Operator,
    },
    /// Operator (and possibly value) depends on other fields in the payload
    Dynamic(FilterResolver),
}

impl FilterRule {
    pub const fn new(column: &'static str, operator: Operator) -> Self {
        FilterRule::Static { column, operator }
    }

    fn resolve(&self, payload: &FilterPayload) -> ResolvedFilter {
        match self {
            FilterRule::Static { column, operator } => ResolvedFilter::new(*column, *operator),
            FilterRule::Dynamic(resolver) => resolver(payload),
        }
    }
}

impl fmt::Debug for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterRule::Static { column, operator } => f
                .debug_struct("Static")
                .field("column", column)
                .field("operator", operator)
                .finish(),
            FilterRule::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Trusted, code-defined table of filter rules
///
/// Fields without a rule compare their own column with `=`.
#[derive(Debug, Clone, Copy)]
pub struct FilterDescriptor {
    rules: &'static [(&'static str, FilterRule)],
}

impl FilterDescriptor {
    pub const EMPTY: FilterDescriptor = FilterDescriptor::new(&[]);

    pub const fn new(rules: &'static [(&'static str, FilterRule)]) -> Self {
        Self { rules }
    }

    fn resolve(&self, field: &'static str, payload: &FilterPayload) -> ResolvedFilter {
        self.rules
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, rule)| rule.resolve(payload))
            .unwrap_or_else(|| ResolvedFilter::new(field, Operator::Eq))
    }
}

/// Build a `WHERE` clause (without the keyword) from a filter payload
///
/// Every field yields one comparison, joined with `AND`, numbered `$1..$N` in
/// payload order. `LIKE` values are wrapped as `%value%`; all other values
/// are passed through as given.
///
/// # Errors
/// `SqlBuildError::NoFilter` when the payload is empty.
#[instrument(skip_all, fields(fields = payload.len()))]
pub fn sql_for_filtering(
    payload: &FilterPayload,
    descriptor: &FilterDescriptor,
) -> Result<GeneratedClause, SqlBuildError> {
    if payload.is_empty() {
        crate::telemetry::record_clause_build_failure(SqlBuildError::NoFilter.kind());
        return Err(SqlBuildError::NoFilter);
    }

    let mut conditions = Vec::with_capacity(payload.len());
    let mut values = Vec::with_capacity(payload.len());

    for (field, raw) in &payload.entries {
        let resolved = descriptor.resolve(*field, payload);
        let value = resolved.value_override.unwrap_or_else(|| raw.clone());
        values.push(resolved.operator.transform(value));
        conditions.push(resolved.operator.render(resolved.column, values.len()));
    }

    tracing::debug!(conditions = conditions.len(), "Generated filter clause");

    Ok(GeneratedClause {
        clause: conditions.join(" AND "),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPANY_RULES: &[(&str, FilterRule)] = &[
        ("name", FilterRule::new("LOWER(name)", Operator::Like)),
        ("minEmployees", FilterRule::new("num_employees", Operator::Gt)),
        ("maxEmployees", FilterRule::new("num_employees", Operator::Lt)),
    ];
    const COMPANY_FILTERS: FilterDescriptor = FilterDescriptor::new(COMPANY_RULES);

    fn equity_rule(payload: &FilterPayload) -> ResolvedFilter {
        match payload.get("hasEquity") {
            Some(SqlValue::Bool(true)) => {
                ResolvedFilter::new("equity", Operator::Gt).with_value(0.0)
            }
            _ => ResolvedFilter::new("COALESCE(equity, 0)", Operator::In)
                .with_value(SqlValue::list([0.0])),
        }
    }

    const JOB_RULES: &[(&str, FilterRule)] = &[
        ("title", FilterRule::new("LOWER(title)", Operator::Like)),
        ("hasEquity", FilterRule::Dynamic(equity_rule)),
    ];
    const JOB_FILTERS: FilterDescriptor = FilterDescriptor::new(JOB_RULES);

    #[test]
    fn test_company_filters_all_fields() {
        let payload = FilterPayload::new()
            .with("name", "Mickey")
            .with("minEmployees", "800")
            .with("maxEmployees", "900");

        let generated = sql_for_filtering(&payload, &COMPANY_FILTERS).unwrap();

        assert_eq!(
            generated.clause,
            "LOWER(name) LIKE $1 AND num_employees > $2 AND num_employees < $3"
        );
        assert_eq!(
            generated.values,
            vec![
                SqlValue::from("%Mickey%"),
                SqlValue::from("800"),
                SqlValue::from("900"),
            ]
        );
    }

    #[test]
    fn test_company_filters_name_only() {
        let payload = FilterPayload::new().with("name", "Mickey");
        let generated = sql_for_filtering(&payload, &COMPANY_FILTERS).unwrap();
        assert_eq!(generated.clause, "LOWER(name) LIKE $1");
        assert_eq!(generated.values, vec![SqlValue::from("%Mickey%")]);
    }

    #[test]
    fn test_empty_payload_is_no_filter() {
        let result = sql_for_filtering(&FilterPayload::new(), &FilterDescriptor::EMPTY);
        assert_eq!(result, Err(SqlBuildError::NoFilter));
    }

    #[test]
    fn test_unknown_field_defaults_to_equality() {
        let payload = FilterPayload::new().with("handle", "c1");
        let generated = sql_for_filtering(&payload, &COMPANY_FILTERS).unwrap();
        assert_eq!(generated.clause, "handle = $1");
        assert_eq!(generated.values, vec![SqlValue::from("c1")]);
    }

    #[test]
    fn test_numeric_values_pass_through_unparsed() {
        let payload = FilterPayload::new().with("minEmployees", 5_i64);
        let generated = sql_for_filtering(&payload, &COMPANY_FILTERS).unwrap();
        assert_eq!(generated.values, vec![SqlValue::Int(5)]);
    }

    #[test]
    fn test_dynamic_rule_true_compares_greater_than_zero() {
        let payload = FilterPayload::new()
            .with("title", "eng")
            .with("hasEquity", true);

        let generated = sql_for_filtering(&payload, &JOB_FILTERS).unwrap();

        assert_eq!(generated.clause, "LOWER(title) LIKE $1 AND equity > $2");
        assert_eq!(
            generated.values,
            vec![SqlValue::from("%eng%"), SqlValue::Float(0.0)]
        );
    }

    #[test]
    fn test_dynamic_rule_false_widens_to_set_membership() {
        let payload = FilterPayload::new().with("hasEquity", false);
        let generated = sql_for_filtering(&payload, &JOB_FILTERS).unwrap();
        assert_eq!(generated.clause, "COALESCE(equity, 0) = ANY($1)");
        assert_eq!(generated.values, vec![SqlValue::list([0.0])]);
    }

    #[test]
    fn test_with_opt_skips_missing_values() {
        let payload = FilterPayload::new()
            .with_opt("name", Some("net"))
            .with_opt("minEmployees", None::<i64>);
        assert_eq!(payload.len(), 1);
        assert!(payload.get("minEmployees").is_none());
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(Operator::Like.to_string(), "LIKE");
        assert_eq!(Operator::In.render("equity", 2), "equity = ANY($2)");
    }
}
