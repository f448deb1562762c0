/// Annexome Table Implementation
///
/// A Table is a named collection of typed columns described by a schema.
/// Tables are built once from fixture data and never mutated afterwards;
/// every filter or view works on index views over a shared table.
///
/// # Examples
///
/// ```
/// use annexome::{ColumnType, ColumnValue, Field, Schema, Table};
///
/// let schema = Schema::new(vec![
///     Field::new("Festival", ColumnType::String),
///     Field::new("Expected_Visitors", ColumnType::Int64),
/// ]);
///
/// let mut table = Table::new("festivals", schema);
/// table
///     .append_row(vec!["Hampi Festival".into(), ColumnValue::Int64(40000)])
///     .unwrap();
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(
///     table.get_value(0, "Festival").unwrap().as_string(),
///     Some("Hampi Festival")
/// );
/// ```

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{Error, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// A named, typed field of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    column_type: ColumnType,
    bounds: Option<(f64, f64)>,
}

impl Field {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Field {
            name: name.into(),
            column_type,
            bounds: None,
        }
    }

    /// Restricts a numeric field to the inclusive range `[low, high]`.
    pub fn with_bounds(mut self, low: f64, high: f64) -> Self {
        self.bounds = Some((low, high));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }
}

/// Schema definition with ordered, typed fields.
///
/// # Examples
///
/// ```
/// use annexome::{ColumnType, Field, Schema};
///
/// let schema = Schema::new(vec![
///     Field::new("Region", ColumnType::String),
///     Field::new("Art_Forms_Count", ColumnType::Int64),
/// ]);
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.get_column_index("Art_Forms_Count"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get_column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.get_field(name).map(|f| f.column_type)
    }
}

/// Root table owning its data.
#[derive(Debug)]
pub struct Table {
    name: String,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Create an empty table; rows are added with [`Table::append_row`]
    /// before the table is shared.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        let columns = schema
            .fields
            .iter()
            .map(|f| Column::with_bounds(f.name.clone(), f.column_type, f.bounds))
            .collect();

        Table {
            name: name.into(),
            schema,
            columns,
            row_count: 0,
        }
    }

    /// Build a table from column-oriented data.
    ///
    /// Every schema field must be present, no extra columns are allowed and
    /// all columns must have the same length.
    pub fn from_columns(
        name: impl Into<String>,
        schema: Schema,
        mut data: HashMap<String, Vec<ColumnValue>>,
    ) -> Result<Self> {
        let mut table = Table::new(name, schema);

        let mut extra: Vec<&String> = data
            .keys()
            .filter(|k| table.schema.get_column_index(k).is_none())
            .collect();
        if !extra.is_empty() {
            extra.sort();
            return Err(Error::fixture(
                &table.name,
                format!("unexpected columns {:?}", extra),
            ));
        }

        let mut row_count = None;
        for (idx, field) in table.schema.fields.iter().enumerate() {
            let values = data.remove(&field.name).ok_or_else(|| {
                Error::fixture(&table.name, format!("missing column '{}'", field.name))
            })?;

            match row_count {
                None => row_count = Some(values.len()),
                Some(n) if n != values.len() => {
                    return Err(Error::fixture(
                        &table.name,
                        format!(
                            "column '{}' has {} values, expected {}",
                            field.name,
                            values.len(),
                            n
                        ),
                    ));
                }
                Some(_) => {}
            }

            for value in values {
                table.columns[idx]
                    .append(value)
                    .map_err(|msg| Error::fixture(&table.name, msg))?;
            }
        }

        table.row_count = row_count.unwrap_or(0);
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Resolve a field name to its column index.
    pub fn resolve(&self, field: &str) -> Result<usize> {
        self.schema
            .get_column_index(field)
            .ok_or_else(|| Error::unknown_field(&self.name, field))
    }

    /// Resolve a field name and require a numeric column.
    pub fn resolve_numeric(&self, field: &str) -> Result<usize> {
        let idx = self.resolve(field)?;
        let ty = self.columns[idx].column_type();
        if !ty.is_numeric() {
            return Err(Error::TypeMismatch {
                dataset: self.name.clone(),
                field: field.to_string(),
                expected: "numeric",
                found: ty.name(),
            });
        }
        Ok(idx)
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<&ColumnValue> {
        let col_idx = self.resolve(column)?;
        self.get_value_by_index(row, col_idx).ok_or_else(|| {
            Error::fixture(
                &self.name,
                format!("row {} out of range [0, {})", row, self.row_count),
            )
        })
    }

    /// Get a value by column index (use when the column was resolved upfront).
    #[inline]
    pub fn get_value_by_index(&self, row: usize, col_idx: usize) -> Option<&ColumnValue> {
        self.columns.get(col_idx).and_then(|c| c.get(row))
    }

    /// Append a row given in schema order. Only used while building a table.
    pub fn append_row(&mut self, row: Vec<ColumnValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::fixture(
                &self.name,
                format!(
                    "row has {} values, schema has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }

        // Validate all values before touching any column
        let validated = self
            .columns
            .iter()
            .zip(row)
            .map(|(col, value)| col.validate_value(value))
            .collect::<std::result::Result<Vec<_>, String>>()
            .map_err(|msg| Error::fixture(&self.name, msg))?;

        for (col, value) in self.columns.iter_mut().zip(validated) {
            col.push_validated(value);
        }
        self.row_count += 1;
        Ok(())
    }

    /// Borrow one row as a [`Record`].
    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        (row < self.row_count).then_some(Record { table: self, row })
    }
}

/// A borrowed row of a table.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> Record<'a> {
    /// Position of the row in its source table.
    pub fn index(&self) -> usize {
        self.row
    }

    pub fn get(&self, field: &str) -> Result<&'a ColumnValue> {
        self.table.get_value(self.row, field)
    }

    #[inline]
    pub fn get_by_index(&self, col_idx: usize) -> Option<&'a ColumnValue> {
        self.table.get_value_by_index(self.row, col_idx)
    }

    /// Values in schema order.
    pub fn values(&self) -> Vec<&'a ColumnValue> {
        (0..self.table.schema.len())
            .filter_map(|i| self.get_by_index(i))
            .collect()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = self.table.schema.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (i, field) in fields.iter().enumerate() {
            if let Some(value) = self.get_by_index(i) {
                map.serialize_entry(field.name(), value)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHS: &[&str] = &["Jan", "Feb", "Mar"];

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("Month", ColumnType::Category(MONTHS)),
            Field::new("Revenue_Crores", ColumnType::Int64),
        ])
    }

    fn columns(months: Vec<&str>, revenue: Vec<i64>) -> HashMap<String, Vec<ColumnValue>> {
        let mut data = HashMap::new();
        data.insert(
            "Month".to_string(),
            months.into_iter().map(ColumnValue::from).collect(),
        );
        data.insert(
            "Revenue_Crores".to_string(),
            revenue.into_iter().map(ColumnValue::from).collect(),
        );
        data
    }

    #[test]
    fn test_from_columns() {
        let table = Table::from_columns("tourism", schema(), columns(vec!["Jan", "Feb"], vec![45, 58])).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get_value(1, "Revenue_Crores").unwrap().as_i64(), Some(58));
        assert_eq!(table.record(0).unwrap().get("Month").unwrap().as_string(), Some("Jan"));
        assert!(table.record(2).is_none());
    }

    #[test]
    fn test_from_columns_rejects_ragged_columns() {
        let err = Table::from_columns("tourism", schema(), columns(vec!["Jan"], vec![45, 58])).unwrap_err();
        assert!(matches!(err, Error::Fixture { .. }));
    }

    #[test]
    fn test_from_columns_rejects_missing_and_extra_columns() {
        let mut data = columns(vec!["Jan"], vec![45]);
        data.remove("Revenue_Crores");
        assert!(Table::from_columns("tourism", schema(), data).is_err());

        let mut data = columns(vec!["Jan"], vec![45]);
        data.insert("Budget".to_string(), vec![ColumnValue::Int64(1)]);
        assert!(Table::from_columns("tourism", schema(), data).is_err());
    }

    #[test]
    fn test_from_columns_rejects_values_outside_domain() {
        let err = Table::from_columns("tourism", schema(), columns(vec!["Smarch"], vec![1])).unwrap_err();
        assert!(err.to_string().contains("Smarch"));
    }

    #[test]
    fn test_append_row_is_atomic() {
        let mut table = Table::new("tourism", schema());
        table.append_row(vec!["Jan".into(), ColumnValue::Int64(45)]).unwrap();
        assert!(table.append_row(vec!["Feb".into(), "lots".into()]).is_err());
        assert_eq!(table.len(), 1);
        assert_eq!(table.column(0).unwrap().len(), 1);
    }

    #[test]
    fn test_append_row_checks_bounds_before_storing() {
        let schema = Schema::new(vec![
            Field::new("Month", ColumnType::Category(MONTHS)),
            Field::new("Occupancy", ColumnType::Float64).with_bounds(0.0, 100.0),
        ]);
        let mut table = Table::new("tourism", schema);
        table.append_row(vec!["Jan".into(), ColumnValue::Int64(80)]).unwrap();
        assert_eq!(table.get_value(0, "Occupancy").unwrap(), &ColumnValue::Float64(80.0));

        let err = table
            .append_row(vec!["Feb".into(), ColumnValue::Float64(120.0)])
            .unwrap_err();
        assert!(matches!(err, Error::Fixture { .. }));
        assert_eq!(table.len(), 1);
        assert_eq!(table.column(0).unwrap().len(), 1);
        assert_eq!(table.column(1).unwrap().len(), 1);
        assert!(table.record(1).is_none());
    }

    #[test]
    fn test_unknown_field() {
        let table = Table::new("tourism", schema());
        assert_eq!(
            table.resolve("Budget").unwrap_err(),
            Error::UnknownField {
                dataset: "tourism".to_string(),
                field: "Budget".to_string()
            }
        );
        assert!(matches!(
            table.resolve_numeric("Month"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_record_serializes_in_schema_order() {
        let table = Table::from_columns("tourism", schema(), columns(vec!["Mar"], vec![78])).unwrap();
        let json = serde_json::to_string(&table.record(0).unwrap()).unwrap();
        assert_eq!(json, r#"{"Month":"Mar","Revenue_Crores":78}"#);
    }
}
