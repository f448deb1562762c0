/// Annexome Row Views
///
/// A RowSet is a read-only, ordered selection of rows from a shared parent
/// table. It maintains a mapping from view positions to parent indices, so
/// filtering and sorting only ever build new index vectors; the parent table
/// is never touched.

use crate::column::ColumnValue;
use crate::error::Result;
use crate::table::{Record, Schema, Table};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::sync::Arc;

/// Sort order specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending order (smallest first)
    #[default]
    Ascending,
    /// Descending order (largest first)
    Descending,
}

/// A single sort key specifying a column and order
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub column: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn ascending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            order: SortOrder::Descending,
        }
    }

    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        SortKey {
            column: column.into(),
            order,
        }
    }
}

/// An ordered subset of a table's rows.
///
/// # Examples
///
/// ```
/// use annexome::{ColumnType, ColumnValue, Field, RowSet, Schema, SortKey, Table};
/// use std::sync::Arc;
///
/// let schema = Schema::new(vec![
///     Field::new("Location", ColumnType::String),
///     Field::new("Annual_Visitors", ColumnType::Int64),
/// ]);
/// let mut table = Table::new("hidden_gems", schema);
/// table.append_row(vec!["Warli".into(), ColumnValue::Int64(8000)]).unwrap();
/// table.append_row(vec!["Gond".into(), ColumnValue::Int64(3000)]).unwrap();
///
/// let rows = RowSet::all(Arc::new(table));
/// let sorted = rows.sorted_by(&[SortKey::ascending("Annual_Visitors")]).unwrap();
/// assert_eq!(sorted.get(0).unwrap().get("Location").unwrap().as_string(), Some("Gond"));
/// // The source order is untouched
/// assert_eq!(rows.get(0).unwrap().get("Location").unwrap().as_string(), Some("Warli"));
/// ```
#[derive(Debug, Clone)]
pub struct RowSet {
    table: Arc<Table>,
    /// view_to_parent[view_pos] = parent_row_index
    view_to_parent: Vec<usize>,
}

impl RowSet {
    /// Every row of the table, in insertion order.
    pub fn all(table: Arc<Table>) -> Self {
        let view_to_parent = (0..table.len()).collect();
        RowSet {
            table,
            view_to_parent,
        }
    }

    pub(crate) fn from_indices(table: Arc<Table>, view_to_parent: Vec<usize>) -> Self {
        RowSet {
            table,
            view_to_parent,
        }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn schema(&self) -> &Schema {
        self.table.schema()
    }

    /// Name of the dataset the rows come from.
    pub fn dataset(&self) -> &str {
        self.table.name()
    }

    pub fn len(&self) -> usize {
        self.view_to_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_to_parent.is_empty()
    }

    /// Parent table indices in view order.
    pub fn parent_indices(&self) -> &[usize] {
        &self.view_to_parent
    }

    pub fn get(&self, index: usize) -> Option<Record<'_>> {
        self.view_to_parent
            .get(index)
            .and_then(|&parent| self.table.record(parent))
    }

    pub fn iter(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.view_to_parent
            .iter()
            .filter_map(move |&parent| self.table.record(parent))
    }

    /// Keep the rows satisfying `keep`, preserving their relative order.
    pub fn retain_where<F>(&self, keep: F) -> RowSet
    where
        F: Fn(&Record<'_>) -> bool,
    {
        let view_to_parent = self
            .iter()
            .filter(|record| keep(record))
            .map(|record| record.index())
            .collect();
        RowSet::from_indices(self.table.clone(), view_to_parent)
    }

    /// The first `n` rows of the view.
    pub fn head(&self, n: usize) -> RowSet {
        let view_to_parent = self.view_to_parent.iter().copied().take(n).collect();
        RowSet::from_indices(self.table.clone(), view_to_parent)
    }

    /// A new view sorted by the given keys (first key is primary).
    ///
    /// The sort is stable: rows with equal keys keep their current relative
    /// order. An empty key list returns the view unchanged.
    pub fn sorted_by(&self, sort_keys: &[SortKey]) -> Result<RowSet> {
        let resolved: Vec<(usize, SortOrder)> = sort_keys
            .iter()
            .map(|key| Ok((self.table.resolve(&key.column)?, key.order)))
            .collect::<Result<_>>()?;

        let table = &self.table;
        let mut view_to_parent = self.view_to_parent.clone();
        view_to_parent.sort_by(|&a, &b| {
            for &(col_idx, order) in &resolved {
                let cmp = Self::compare_values(
                    table.get_value_by_index(a, col_idx),
                    table.get_value_by_index(b, col_idx),
                    order,
                );
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            Ordering::Equal
        });

        Ok(RowSet::from_indices(self.table.clone(), view_to_parent))
    }

    /// Compare two column values according to a sort order
    fn compare_values(
        val_a: Option<&ColumnValue>,
        val_b: Option<&ColumnValue>,
        order: SortOrder,
    ) -> Ordering {
        let base_cmp = match (val_a, val_b) {
            (Some(a), Some(b)) => a.compare(b),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        };

        match order {
            SortOrder::Ascending => base_cmp,
            SortOrder::Descending => base_cmp.reverse(),
        }
    }

    /// Sorted distinct values of a field among the rows of this view.
    pub fn distinct_values(&self, field: &str) -> Result<Vec<ColumnValue>> {
        let col_idx = self.table.resolve(field)?;
        let mut values: Vec<ColumnValue> = Vec::new();
        for record in self.iter() {
            if let Some(value) = record.get_by_index(col_idx) {
                if !values.iter().any(|v| v.matches(value)) {
                    values.push(value.clone());
                }
            }
        }
        values.sort_by(|a, b| a.compare(b));
        Ok(values)
    }
}

impl PartialEq for RowSet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table) && self.view_to_parent == other.view_to_parent
    }
}

impl Serialize for RowSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for record in self.iter() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}
