// Dynamic SQL fragment builders
//
// Models build `SET` and `WHERE` fragments from partial input and splice them
// into hand-written statements. Column and operator text only ever comes from
// `'static` descriptors defined in code; values always travel as `$N`
// positional parameters.

pub mod filter;
pub mod update;
pub mod value;

pub use filter::{
    sql_for_filtering, FilterDescriptor, FilterPayload, FilterResolver, FilterRule, Operator,
    ResolvedFilter,
};
pub use update::{sql_for_partial_update, FieldMap, UpdatePayload};
pub use value::{BindSqlValues, SqlValue};

/// A SQL fragment together with the values for its placeholders
///
/// The Nth `$N` placeholder in `clause` is bound to `values[N - 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedClause {
    pub clause: String,
    pub values: Vec<SqlValue>,
}

impl GeneratedClause {
    /// Placeholder for the first parameter appended after this clause
    ///
    /// `UPDATE jobs SET <clause> WHERE id = <next_placeholder>` with three
    /// values yields `$4`.
    pub fn next_placeholder(&self) -> String {
        format!("${}", self.values.len() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_placeholder_follows_values() {
        let clause = GeneratedClause {
            clause: "\"title\"=$1, \"salary\"=$2".to_string(),
            values: vec![SqlValue::from("Engineer"), SqlValue::from(100_000_i64)],
        };
        assert_eq!(clause.next_placeholder(), "$3");
    }
}
