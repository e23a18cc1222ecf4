// Partial UPDATE ... SET clause generation

use super::{GeneratedClause, SqlValue};
use crate::errors::SqlBuildError;
use tracing::instrument;

/// Field-name to column-name translation for partial updates
///
/// Only built from `'static` pairs, so every column name that reaches SQL text
/// was written in source code. Fields missing from the map are used verbatim.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    entries: &'static [(&'static str, &'static str)],
}

impl FieldMap {
    pub const EMPTY: FieldMap = FieldMap::new(&[]);

    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Column for `field`, falling back to the field name itself
    pub fn column_for(&self, field: &'static str) -> &'static str {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
            .unwrap_or(field)
    }
}

/// Ordered field → value mapping for a partial update
///
/// A field recorded with `None` was not provided and is left out of the
/// generated clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePayload {
    entries: Vec<(&'static str, Option<SqlValue>)>,
}

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &'static str, value: impl Into<SqlValue>) -> Self {
        self.entries.push((field, Some(value.into())));
        self
    }

    pub fn set_opt<V: Into<SqlValue>>(mut self, field: &'static str, value: Option<V>) -> Self {
        self.entries.push((field, value.map(Into::into)));
        self
    }

    /// Number of recorded fields, provided or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fields that carry a value
    pub fn provided(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// Build a `SET` clause from a partial update
///
/// Each provided field becomes `"<column>"=$N`, numbered from 1 over the
/// emitted fields only, so skipped fields never leave gaps:
///
/// ```
/// use common::sql::{sql_for_partial_update, FieldMap, UpdatePayload};
///
/// const USER_COLUMNS: &[(&str, &str)] = &[("firstName", "first_name")];
/// const USER_FIELDS: FieldMap = FieldMap::new(USER_COLUMNS);
///
/// let payload = UpdatePayload::new()
///     .set("firstName", "Aliya")
///     .set_opt("lastName", None::<String>)
///     .set("age", 32_i64);
/// let clause = sql_for_partial_update(&payload, &USER_FIELDS).unwrap();
/// assert_eq!(clause.clause, r#""first_name"=$1, "age"=$2"#);
/// ```
///
/// # Errors
/// `SqlBuildError::NoData` when no field carries a value.
#[instrument(skip_all, fields(fields = payload.len()))]
pub fn sql_for_partial_update(
    payload: &UpdatePayload,
    field_map: &FieldMap,
) -> Result<GeneratedClause, SqlBuildError> {
    let mut columns = Vec::with_capacity(payload.len());
    let mut values = Vec::with_capacity(payload.len());

    for (field, value) in &payload.entries {
        let Some(value) = value else {
            continue;
        };
        values.push(value.clone());
        columns.push(format!(
            "\"{}\"=${}",
            field_map.column_for(*field),
            values.len()
        ));
    }

    if values.is_empty() {
        crate::telemetry::record_clause_build_failure(SqlBuildError::NoData.kind());
        return Err(SqlBuildError::NoData);
    }

    tracing::debug!(columns = values.len(), "Generated partial update clause");

    Ok(GeneratedClause {
        clause: columns.join(", "),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_COLUMNS: &[(&str, &str)] = &[
        ("firstName", "first_name"),
        ("lastName", "last_name"),
        ("isAdmin", "is_admin"),
    ];
    const USER_FIELDS: FieldMap = FieldMap::new(USER_COLUMNS);

    #[test]
    fn test_maps_fields_to_columns_in_order() {
        let payload = UpdatePayload::new()
            .set("firstName", "Mickey")
            .set("lastName", "Mouse")
            .set("email", "mickeyMouse@gmail.com");

        let generated = sql_for_partial_update(&payload, &USER_FIELDS).unwrap();

        assert_eq!(
            generated.clause,
            r#""first_name"=$1, "last_name"=$2, "email"=$3"#
        );
        assert_eq!(
            generated.values,
            vec![
                SqlValue::from("Mickey"),
                SqlValue::from("Mouse"),
                SqlValue::from("mickeyMouse@gmail.com"),
            ]
        );
    }

    #[test]
    fn test_empty_payload_is_no_data() {
        let result = sql_for_partial_update(&UpdatePayload::new(), &FieldMap::EMPTY);
        assert_eq!(result, Err(SqlBuildError::NoData));
    }

    #[test]
    fn test_only_unset_fields_is_no_data() {
        let payload = UpdatePayload::new()
            .set_opt("firstName", None::<String>)
            .set_opt("email", None::<String>);
        let result = sql_for_partial_update(&payload, &USER_FIELDS);
        assert_eq!(result, Err(SqlBuildError::NoData));
    }

    // Placeholders are numbered over the emitted fields, so a skipped field in
    // the middle must not shift later positions past the value list.
    #[test]
    fn test_unset_field_compacts_positions() {
        let payload = UpdatePayload::new()
            .set("firstName", "Mickey")
            .set_opt("lastName", None::<String>)
            .set("isAdmin", true);

        let generated = sql_for_partial_update(&payload, &USER_FIELDS).unwrap();

        assert_eq!(generated.clause, r#""first_name"=$1, "is_admin"=$2"#);
        assert_eq!(
            generated.values,
            vec![SqlValue::from("Mickey"), SqlValue::Bool(true)]
        );
        assert_eq!(generated.next_placeholder(), "$3");
    }

    #[test]
    fn test_unmapped_field_is_used_verbatim() {
        let payload = UpdatePayload::new().set("salary", 100_000_i64);
        let generated = sql_for_partial_update(&payload, &FieldMap::EMPTY).unwrap();
        assert_eq!(generated.clause, r#""salary"=$1"#);
    }

    #[test]
    fn test_column_for_falls_back_to_field() {
        assert_eq!(USER_FIELDS.column_for("isAdmin"), "is_admin");
        assert_eq!(USER_FIELDS.column_for("email"), "email");
    }

    #[test]
    fn test_provided_counts_only_set_fields() {
        let payload = UpdatePayload::new()
            .set("title", "Engineer")
            .set_opt("salary", None::<i64>);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.provided(), 1);
    }
}
