//! Filter engine.
//!
//! [`apply_filters`] keeps the rows that satisfy every predicate, in their
//! original order. [`FilterSelection`] is the immutable value a presentation
//! layer builds from its widget state and hands over on every evaluation.

use crate::column::ColumnValue;
use crate::error::Result;
use crate::predicate::{parse_predicates, BoundPredicate, Choice, CompareOp, Predicate};
use crate::view::RowSet;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Return the rows satisfying all predicates, preserving input order.
///
/// Every predicate is validated against the schema before any row is read.
/// Wildcards are dropped, equality and set tests run before numeric ones.
/// An empty predicate list returns the input unchanged; a result with no rows
/// is a normal outcome, not an error.
///
/// # Examples
///
/// ```
/// use annexome::{apply_filters, get_dataset, CompareOp, Predicate};
///
/// let festivals = get_dataset("festivals").unwrap();
/// let large = apply_filters(
///     &festivals,
///     &[Predicate::compare("Expected_Visitors", CompareOp::Gt, 75000.0)],
/// )
/// .unwrap();
/// assert_eq!(large.len(), 2);
/// ```
pub fn apply_filters(rows: &RowSet, predicates: &[Predicate]) -> Result<RowSet> {
    let table = rows.table();

    let mut plan: Vec<BoundPredicate> = predicates
        .iter()
        .map(|p| p.bind(table))
        .collect::<Result<_>>()?;
    plan.retain(|p| !p.is_always());
    plan.sort_by_key(BoundPredicate::cost);

    if plan.is_empty() {
        return Ok(rows.clone());
    }

    let filtered = rows.retain_where(|record| plan.iter().all(|p| p.matches(record)));
    log::debug!(
        "filtered '{}' from {} to {} rows with {} predicates",
        rows.dataset(),
        rows.len(),
        filtered.len(),
        plan.len()
    );
    Ok(filtered)
}

/// Expected-visitor buckets offered by the festival calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorBand {
    #[default]
    All,
    /// fewer than 25 000 visitors
    Small,
    /// 25 000 to 75 000 visitors inclusive
    Medium,
    /// more than 75 000 visitors
    Large,
}

impl VisitorBand {
    pub const SMALL_BELOW: f64 = 25_000.0;
    pub const LARGE_ABOVE: f64 = 75_000.0;

    /// Predicate on `field` for this band; `None` for `All`.
    pub fn predicate(&self, field: &str) -> Option<Predicate> {
        match self {
            VisitorBand::All => None,
            VisitorBand::Small => Some(Predicate::compare(field, CompareOp::Lt, Self::SMALL_BELOW)),
            VisitorBand::Medium => Some(Predicate::range(field, Self::SMALL_BELOW, Self::LARGE_ABOVE)),
            VisitorBand::Large => Some(Predicate::compare(field, CompareOp::Gt, Self::LARGE_ABOVE)),
        }
    }
}

impl FromStr for VisitorBand {
    type Err = crate::error::Error;

    /// Accepts `all`, `small`, `medium`, `large`, or the dropdown labels
    /// such as `Large (> 75K)`.
    fn from_str(s: &str) -> Result<Self> {
        let word = s.split_whitespace().next().unwrap_or("").to_lowercase();
        match word.as_str() {
            "all" => Ok(VisitorBand::All),
            "small" => Ok(VisitorBand::Small),
            "medium" => Ok(VisitorBand::Medium),
            "large" => Ok(VisitorBand::Large),
            _ => Err(crate::error::Error::Parse(format!(
                "Unknown visitor band: '{}'. Use 'All', 'Small', 'Medium' or 'Large'",
                s
            ))),
        }
    }
}

/// An immutable set of active filter predicates.
///
/// Builder methods consume the selection and return a new one, so a
/// selection handed to the filter engine can never change under it.
///
/// # Examples
///
/// ```
/// use annexome::{get_dataset, FilterSelection};
///
/// let selection = FilterSelection::new()
///     .equals("Region", "South")
///     .equals("Category", "All");
/// let rows = selection.apply(&get_dataset("art_forms").unwrap()).unwrap();
/// assert_eq!(rows.len(), 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSelection {
    predicates: Vec<Predicate>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a textual conjunction; see [`crate::predicate`].
    pub fn parse(input: &str) -> Result<Self> {
        Ok(FilterSelection {
            predicates: parse_predicates(input)?,
        })
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn equals(self, field: &str, choice: impl Into<Choice>) -> Self {
        self.with(Predicate::equals(field, choice))
    }

    pub fn between(self, field: &str, low: f64, high: f64) -> Self {
        self.with(Predicate::range(field, low, high))
    }

    pub fn one_of<V: Into<ColumnValue>>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.with(Predicate::one_of(field, values))
    }

    pub fn compare(self, field: &str, cmp: CompareOp, value: f64) -> Self {
        self.with(Predicate::compare(field, cmp, value))
    }

    pub fn band(self, field: &str, band: VisitorBand) -> Self {
        match band.predicate(field) {
            Some(predicate) => self.with(predicate),
            None => self,
        }
    }

    /// Union of two selections (both sets of predicates apply).
    pub fn and(mut self, other: FilterSelection) -> Self {
        self.predicates.extend(other.predicates);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Number of predicates that actually filter (non-wildcard).
    pub fn active_count(&self) -> usize {
        self.predicates.iter().filter(|p| !p.is_wildcard()).count()
    }

    pub fn apply(&self, rows: &RowSet) -> Result<RowSet> {
        apply_filters(rows, &self.predicates)
    }
}

impl From<Vec<Predicate>> for FilterSelection {
    fn from(predicates: Vec<Predicate>) -> Self {
        FilterSelection { predicates }
    }
}

/// Dropdown contents for a field: the "All" wildcard followed by the sorted
/// distinct values present in `rows`.
pub fn selection_options(rows: &RowSet, field: &str) -> Result<Vec<Choice>> {
    let mut options = vec![Choice::All];
    options.extend(rows.distinct_values(field)?.into_iter().map(Choice::Value));
    Ok(options)
}
