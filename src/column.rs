/// Annexome Column Implementation
///
/// A Column is an immutable-after-load, random-access container of scalar
/// values indexed by row. Each Column has a type specifying the type of every
/// value stored; category columns additionally carry their finite domain.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    String,
    /// A string drawn from a fixed, finite set of labels.
    Category(&'static [&'static str]),
}

impl ColumnType {
    /// Short type name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "integer",
            ColumnType::Float64 => "float",
            ColumnType::String => "string",
            ColumnType::Category(_) => "category",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }

    /// Returns the finite domain of a category column.
    pub fn domain(&self) -> Option<&'static [&'static str]> {
        match self {
            ColumnType::Category(labels) => Some(labels),
            _ => None,
        }
    }

    /// Returns true if `value` is a legal literal for this type.
    ///
    /// Numeric types accept each other's literals; category types only accept
    /// members of their domain.
    pub fn admits(&self, value: &ColumnValue) -> bool {
        match (self, value) {
            (ColumnType::Int64, ColumnValue::Int64(_)) => true,
            (ColumnType::Int64, ColumnValue::Float64(f)) => f.fract() == 0.0,
            (ColumnType::Float64, ColumnValue::Int64(_) | ColumnValue::Float64(_)) => true,
            (ColumnType::String, ColumnValue::String(_)) => true,
            (ColumnType::Category(labels), ColumnValue::String(s)) => labels.contains(&s.as_str()),
            _ => false,
        }
    }
}

/// Column value enum to support multiple types
///
/// Serializes as a bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Int64(i64),
    Float64(f64),
    String(String),
}

impl ColumnValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Int64(v) => Some(*v as f64),
            ColumnValue::Float64(v) => Some(*v),
            ColumnValue::String(_) => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Int64(_) => "integer",
            ColumnValue::Float64(_) => "float",
            ColumnValue::String(_) => "string",
        }
    }

    /// Equality that treats `Int64(5)` and `Float64(5.0)` as the same value.
    pub fn matches(&self, other: &ColumnValue) -> bool {
        match (self, other) {
            (ColumnValue::String(a), ColumnValue::String(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// Total ordering used by sorting and grouping.
    ///
    /// Numbers compare numerically across Int64/Float64, strings
    /// lexicographically, and numbers sort before strings.
    pub fn compare(&self, other: &ColumnValue) -> Ordering {
        match (self, other) {
            (ColumnValue::Int64(a), ColumnValue::Int64(b)) => a.cmp(b),
            (ColumnValue::String(a), ColumnValue::String(b)) => a.cmp(b),
            (ColumnValue::String(_), _) => Ordering::Greater,
            (_, ColumnValue::String(_)) => Ordering::Less,
            (a, b) => {
                let x = a.as_f64().unwrap_or(f64::NAN);
                let y = b.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Int64(v) => write!(f, "{}", v),
            ColumnValue::Float64(v) => write!(f, "{}", v),
            ColumnValue::String(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(v: i64) -> Self {
        ColumnValue::Int64(v)
    }
}

impl From<f64> for ColumnValue {
    fn from(v: f64) -> Self {
        ColumnValue::Float64(v)
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::String(v.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::String(v)
    }
}

/// Typed storage for one field of a table.
///
/// Values are validated on append against the column type and the optional
/// inclusive numeric bounds.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    bounds: Option<(f64, f64)>,
    values: Vec<ColumnValue>,
}

impl Column {
    pub fn new(name: String, column_type: ColumnType) -> Self {
        Self::with_bounds(name, column_type, None)
    }

    pub fn with_bounds(name: String, column_type: ColumnType, bounds: Option<(f64, f64)>) -> Self {
        Column {
            name,
            column_type,
            bounds,
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validate and convert value to the column's type, checking bounds on the
    /// converted value. Nothing is stored.
    pub fn validate_value(&self, value: ColumnValue) -> Result<ColumnValue, String> {
        if !self.column_type.admits(&value) {
            return Err(match self.column_type {
                ColumnType::Category(labels) => format!(
                    "Column '{}' does not accept '{}' (expected one of {:?})",
                    self.name, value, labels
                ),
                ty => format!(
                    "Type mismatch in column '{}': expected {}, got {} '{}'",
                    self.name,
                    ty.name(),
                    value.type_name(),
                    value
                ),
            });
        }

        let value = match (self.column_type, value) {
            (ColumnType::Float64, ColumnValue::Int64(v)) => ColumnValue::Float64(v as f64),
            (ColumnType::Int64, ColumnValue::Float64(v)) => ColumnValue::Int64(v as i64),
            (_, v) => v,
        };

        if let (Some((low, high)), Some(n)) = (self.bounds, value.as_f64()) {
            if n < low || n > high {
                return Err(format!(
                    "Value {} in column '{}' is outside [{}, {}]",
                    n, self.name, low, high
                ));
            }
        }

        Ok(value)
    }

    pub fn append(&mut self, value: ColumnValue) -> Result<(), String> {
        let value = self.validate_value(value)?;
        self.values.push(value);
        Ok(())
    }

    /// Push a value already returned by [`Column::validate_value`].
    pub(crate) fn push_validated(&mut self, value: ColumnValue) {
        self.values.push(value);
    }

    pub fn get(&self, index: usize) -> Option<&ColumnValue> {
        self.values.get(index)
    }

    /// Fast numeric access for aggregation; None for strings or out-of-range rows.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(ColumnValue::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: &[&str] = &["Low", "Medium", "High"];

    #[test]
    fn test_column_basic() {
        let mut col = Column::new("Practitioners".to_string(), ColumnType::Int64);
        col.append(ColumnValue::Int64(15000)).unwrap();
        col.append(ColumnValue::Int64(25000)).unwrap();

        assert_eq!(col.len(), 2);
        assert_eq!(col.get(0).unwrap().as_i64(), Some(15000));
        assert_eq!(col.get_f64(1), Some(25000.0));
        assert!(col.get(2).is_none());
    }

    #[test]
    fn test_float_column_widens_integers() {
        let mut col = Column::new("Infrastructure_Score".to_string(), ColumnType::Float64);
        col.append(ColumnValue::Int64(8)).unwrap();
        assert_eq!(col.get(0), Some(&ColumnValue::Float64(8.0)));
    }

    #[test]
    fn test_category_rejects_unknown_label() {
        let mut col = Column::new("Preservation_Status".to_string(), ColumnType::Category(LEVELS));
        col.append("Medium".into()).unwrap();
        let err = col.append("Extreme".into()).unwrap_err();
        assert!(err.contains("Extreme"));
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn test_type_mismatch() {
        let mut col = Column::new("State".to_string(), ColumnType::String);
        assert!(col.append(ColumnValue::Int64(3)).is_err());
    }

    #[test]
    fn test_bounds() {
        let mut col = Column::with_bounds(
            "Tourist_Interest".to_string(),
            ColumnType::Int64,
            Some((0.0, 100.0)),
        );
        col.append(ColumnValue::Int64(100)).unwrap();
        assert!(col.append(ColumnValue::Int64(101)).is_err());

        assert!(col.validate_value(ColumnValue::Float64(100.5)).is_err());
        assert_eq!(
            col.validate_value(ColumnValue::Float64(42.0)).unwrap(),
            ColumnValue::Int64(42)
        );
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn test_value_matching_and_ordering() {
        assert!(ColumnValue::Int64(5).matches(&ColumnValue::Float64(5.0)));
        assert!(!ColumnValue::from("5").matches(&ColumnValue::Int64(5)));
        assert_eq!(
            ColumnValue::Int64(3).compare(&ColumnValue::Float64(2.5)),
            Ordering::Greater
        );
        assert_eq!(
            ColumnValue::Int64(3).compare(&ColumnValue::from("a")),
            Ordering::Less
        );
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<ColumnValue> = serde_json::from_str(r#"[7, 8.5, "Jan"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ColumnValue::Int64(7),
                ColumnValue::Float64(8.5),
                ColumnValue::from("Jan")
            ]
        );
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[7,8.5,"Jan"]"#);
    }
}
