/// Annexome View Builder
///
/// Turns a filtered RowSet into the minimal structure a chart needs. Each
/// chart kind is a pure mapping parameterized by field names. Every field a
/// ViewSpec references is checked against the schema before any row is read,
/// so a bad mapping fails here instead of at the chart boundary.

use crate::column::ColumnValue;
use crate::dataset::fields;
use crate::error::Result;
use crate::filter::apply_filters;
use crate::predicate::{CompareOp, Predicate};
use crate::table::Table;
use crate::view::{RowSet, SortKey, SortOrder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default truncation for top-N bar charts.
pub const DEFAULT_TOP_N: usize = 10;

/// Options for a top-N bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopNOptions {
    pub n: usize,
    /// Field to sort by before truncating; `None` keeps the filtered order.
    pub sort_key: Option<String>,
    pub sort_descending: bool,
}

impl Default for TopNOptions {
    fn default() -> Self {
        TopNOptions {
            n: DEFAULT_TOP_N,
            sort_key: None,
            sort_descending: false,
        }
    }
}

impl TopNOptions {
    pub fn first(n: usize) -> Self {
        TopNOptions {
            n,
            ..Default::default()
        }
    }

    pub fn sorted(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sort_key = Some(field.into());
        self.sort_descending = descending;
        self
    }
}

/// A compound "priority" subset: rows below a numeric threshold whose
/// category is in a given set, sorted ascending by another field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRule {
    pub threshold_field: String,
    /// Exclusive upper bound on `threshold_field`.
    pub below: f64,
    pub set_field: String,
    pub values: Vec<ColumnValue>,
    pub sort_by: String,
}

impl PriorityRule {
    /// Hidden gems in need of attention: hard to reach and at high risk,
    /// least visited first.
    pub fn hidden_gems() -> Self {
        PriorityRule {
            threshold_field: fields::hidden_gems::ACCESSIBILITY_SCORE.to_string(),
            below: 5.0,
            set_field: fields::hidden_gems::PRESERVATION_URGENCY.to_string(),
            values: vec!["Critical".into(), "High".into()],
            sort_by: fields::hidden_gems::ANNUAL_VISITORS.to_string(),
        }
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        vec![
            Predicate::compare(self.threshold_field.as_str(), CompareOp::Lt, self.below),
            Predicate::one_of(self.set_field.as_str(), self.values.iter().cloned()),
        ]
    }
}

/// What to build from a row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewSpec {
    /// First `n` rows as (label, value) bars.
    TopN {
        label: String,
        value: String,
        #[serde(default)]
        options: TopNOptions,
    },
    /// Every row as a (label, value) pair, for line, area and pie charts.
    Series { label: String, value: String },
    /// Row counts per distinct key (and optional sub key).
    GroupedCount {
        key: String,
        #[serde(default)]
        sub_key: Option<String>,
        #[serde(default)]
        sorted_by_key: bool,
    },
    /// One point per row.
    Scatter {
        x: String,
        y: String,
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        hover: Option<String>,
    },
    Priority(PriorityRule),
    /// Count, sum, mean, min and max of a numeric field.
    Summary { field: String },
}

impl ViewSpec {
    pub fn top_n(label: impl Into<String>, value: impl Into<String>, options: TopNOptions) -> Self {
        ViewSpec::TopN {
            label: label.into(),
            value: value.into(),
            options,
        }
    }

    pub fn series(label: impl Into<String>, value: impl Into<String>) -> Self {
        ViewSpec::Series {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn grouped_count(key: impl Into<String>) -> Self {
        ViewSpec::GroupedCount {
            key: key.into(),
            sub_key: None,
            sorted_by_key: false,
        }
    }

    pub fn scatter(x: impl Into<String>, y: impl Into<String>) -> Self {
        ViewSpec::Scatter {
            x: x.into(),
            y: y.into(),
            size: None,
            color: None,
            hover: None,
        }
    }

    pub fn summary(field: impl Into<String>) -> Self {
        ViewSpec::Summary { field: field.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ViewSpec::TopN { .. } => "top_n",
            ViewSpec::Series { .. } => "series",
            ViewSpec::GroupedCount { .. } => "grouped_count",
            ViewSpec::Scatter { .. } => "scatter",
            ViewSpec::Priority(_) => "priority",
            ViewSpec::Summary { .. } => "summary",
        }
    }

    /// Check every referenced field against the table schema.
    ///
    /// Value, axis and size fields must be numeric. Call this when a chart
    /// mapping is configured; [`build_view`] calls it on every build.
    pub fn validate(&self, table: &Table) -> Result<()> {
        match self {
            ViewSpec::TopN { label, value, options } => {
                table.resolve(label)?;
                table.resolve_numeric(value)?;
                if let Some(key) = &options.sort_key {
                    table.resolve(key)?;
                }
            }
            ViewSpec::Series { label, value } => {
                table.resolve(label)?;
                table.resolve_numeric(value)?;
            }
            ViewSpec::GroupedCount { key, sub_key, .. } => {
                table.resolve(key)?;
                if let Some(sub_key) = sub_key {
                    table.resolve(sub_key)?;
                }
            }
            ViewSpec::Scatter { x, y, size, color, hover } => {
                table.resolve_numeric(x)?;
                table.resolve_numeric(y)?;
                if let Some(size) = size {
                    table.resolve_numeric(size)?;
                }
                for field in [color, hover].into_iter().flatten() {
                    table.resolve(field)?;
                }
            }
            ViewSpec::Priority(rule) => {
                for predicate in rule.predicates() {
                    predicate.bind(table)?;
                }
                table.resolve(&rule.sort_by)?;
            }
            ViewSpec::Summary { field } => {
                table.resolve_numeric(field)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPoint {
    pub label: String,
    pub value: ColumnValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    pub key: ColumnValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_key: Option<ColumnValue>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColumnValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,
}

/// Aggregate of one numeric field. Empty input gives a zero count and sum
/// and no mean, min or max.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub field: String,
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Chart-ready output of [`build_view`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ViewResult {
    Bars(Vec<BarPoint>),
    Groups(Vec<GroupCount>),
    Points(Vec<ScatterPoint>),
    Rows(RowSet),
    Summary(Summary),
}

impl ViewResult {
    pub fn len(&self) -> usize {
        match self {
            ViewResult::Bars(bars) => bars.len(),
            ViewResult::Groups(groups) => groups.len(),
            ViewResult::Points(points) => points.len(),
            ViewResult::Rows(rows) => rows.len(),
            ViewResult::Summary(summary) => summary.count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A notice for the presentation layer to render when there is nothing
    /// to chart.
    pub fn notice(&self) -> Option<EmptyResultNotice> {
        if !self.is_empty() {
            return None;
        }
        let what = match self {
            ViewResult::Bars(_) => "bars",
            ViewResult::Groups(_) => "groups",
            ViewResult::Points(_) => "points",
            ViewResult::Rows(_) => "items",
            ViewResult::Summary(_) => "values",
        };
        Some(EmptyResultNotice {
            message: format!("No {} match the current filters", what),
        })
    }
}

/// An empty result. Not an error: callers render it as a "no results" state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyResultNotice {
    pub message: String,
}

impl EmptyResultNotice {
    pub fn for_rows(rows: &RowSet) -> Option<Self> {
        rows.is_empty().then(|| EmptyResultNotice {
            message: format!("No rows in '{}' match the current filters", rows.dataset()),
        })
    }
}

impl fmt::Display for EmptyResultNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Build the chart-ready structure described by `spec`.
///
/// Fails with `UnknownField` (or `TypeMismatch`) when `spec` does not fit
/// the schema, even if `rows` is empty. An empty input yields an empty or
/// zero-valued result.
///
/// # Examples
///
/// ```
/// use annexome::{build_view, get_dataset, ViewResult, ViewSpec};
///
/// let tourism = get_dataset("tourism").unwrap();
/// let months = build_view(&tourism, &ViewSpec::grouped_count("Month")).unwrap();
/// assert_eq!(months.len(), 12);
/// ```
pub fn build_view(rows: &RowSet, spec: &ViewSpec) -> Result<ViewResult> {
    let table = rows.table();
    spec.validate(table)?;

    let result = match spec {
        ViewSpec::TopN { label, value, options } => {
            let ordered = match &options.sort_key {
                Some(key) => {
                    let order = if options.sort_descending {
                        SortOrder::Descending
                    } else {
                        SortOrder::Ascending
                    };
                    rows.sorted_by(&[SortKey::new(key.as_str(), order)])?
                }
                None => rows.clone(),
            };
            ViewResult::Bars(project_bars(&ordered.head(options.n), label, value)?)
        }
        ViewSpec::Series { label, value } => ViewResult::Bars(project_bars(rows, label, value)?),
        ViewSpec::GroupedCount {
            key,
            sub_key,
            sorted_by_key,
        } => ViewResult::Groups(group_counts(rows, key, sub_key.as_deref(), *sorted_by_key)?),
        ViewSpec::Scatter { x, y, size, color, hover } => ViewResult::Points(project_points(
            rows,
            x,
            y,
            size.as_deref(),
            color.as_deref(),
            hover.as_deref(),
        )?),
        ViewSpec::Priority(rule) => {
            let matched = apply_filters(rows, &rule.predicates())?;
            ViewResult::Rows(matched.sorted_by(&[SortKey::ascending(rule.sort_by.as_str())])?)
        }
        ViewSpec::Summary { field } => ViewResult::Summary(summarize(rows, field)?),
    };

    log::debug!(
        "built {} view over '{}': {} rows in, {} out",
        spec.kind(),
        rows.dataset(),
        rows.len(),
        result.len()
    );
    Ok(result)
}

fn project_bars(rows: &RowSet, label: &str, value: &str) -> Result<Vec<BarPoint>> {
    let table = rows.table();
    let label_idx = table.resolve(label)?;
    let value_idx = table.resolve_numeric(value)?;

    Ok(rows
        .iter()
        .filter_map(|record| {
            let label = record.get_by_index(label_idx)?;
            let value = record.get_by_index(value_idx)?;
            Some(BarPoint {
                label: label.to_string(),
                value: value.clone(),
            })
        })
        .collect())
}

fn group_counts(
    rows: &RowSet,
    key: &str,
    sub_key: Option<&str>,
    sorted_by_key: bool,
) -> Result<Vec<GroupCount>> {
    let table = rows.table();
    let key_idx = table.resolve(key)?;
    let sub_idx = sub_key.map(|field| table.resolve(field)).transpose()?;

    // Groups in order of first occurrence.
    let mut groups: Vec<GroupCount> = Vec::new();
    for record in rows.iter() {
        let Some(key) = record.get_by_index(key_idx) else {
            continue;
        };
        let sub = sub_idx.and_then(|idx| record.get_by_index(idx));

        let existing = groups.iter_mut().find(|g| {
            g.key.matches(key)
                && match (&g.sub_key, sub) {
                    (Some(a), Some(b)) => a.matches(b),
                    (None, None) => true,
                    _ => false,
                }
        });
        match existing {
            Some(group) => group.count += 1,
            None => groups.push(GroupCount {
                key: key.clone(),
                sub_key: sub.cloned(),
                count: 1,
            }),
        }
    }

    if sorted_by_key {
        groups.sort_by(|a, b| {
            a.key.compare(&b.key).then_with(|| match (&a.sub_key, &b.sub_key) {
                (Some(x), Some(y)) => x.compare(y),
                _ => std::cmp::Ordering::Equal,
            })
        });
    }
    Ok(groups)
}

fn project_points(
    rows: &RowSet,
    x: &str,
    y: &str,
    size: Option<&str>,
    color: Option<&str>,
    hover: Option<&str>,
) -> Result<Vec<ScatterPoint>> {
    let table = rows.table();
    let x_idx = table.resolve_numeric(x)?;
    let y_idx = table.resolve_numeric(y)?;
    let size_idx = size.map(|f| table.resolve_numeric(f)).transpose()?;
    let color_idx = color.map(|f| table.resolve(f)).transpose()?;
    let hover_idx = hover.map(|f| table.resolve(f)).transpose()?;

    Ok(rows
        .iter()
        .filter_map(|record| {
            Some(ScatterPoint {
                x: record.get_by_index(x_idx)?.as_f64()?,
                y: record.get_by_index(y_idx)?.as_f64()?,
                size: size_idx.and_then(|idx| record.get_by_index(idx)?.as_f64()),
                color: color_idx.and_then(|idx| record.get_by_index(idx).cloned()),
                hover: hover_idx.and_then(|idx| record.get_by_index(idx).map(|v| v.to_string())),
            })
        })
        .collect())
}

fn summarize(rows: &RowSet, field: &str) -> Result<Summary> {
    let idx = rows.table().resolve_numeric(field)?;

    let mut count = 0;
    let mut sum = 0.0;
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;
    for num in rows
        .iter()
        .filter_map(|record| record.get_by_index(idx).and_then(ColumnValue::as_f64))
    {
        count += 1;
        sum += num;
        min = Some(min.map_or(num, |m| m.min(num)));
        max = Some(max.map_or(num, |m| m.max(num)));
    }

    Ok(Summary {
        field: field.to_string(),
        count,
        sum,
        mean: (count > 0).then(|| sum / count as f64),
        min,
        max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetName, Registry};
    use crate::error::Error;

    fn rows(name: DatasetName) -> RowSet {
        Registry::global().unwrap().rows(name)
    }

    fn labels(result: &ViewResult) -> Vec<String> {
        match result {
            ViewResult::Bars(bars) => bars.iter().map(|b| b.label.clone()).collect(),
            ViewResult::Rows(rows) => rows.iter().map(|r| r.values()[0].to_string()).collect(),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_top_n_keeps_filtered_order() {
        let art = rows(DatasetName::ArtForms);
        let spec = ViewSpec::top_n(
            fields::art_forms::ART_FORM,
            fields::art_forms::PRACTITIONERS,
            TopNOptions::first(3),
        );
        let result = build_view(&art, &spec).unwrap();
        assert_eq!(labels(&result), vec!["Bharatanatyam", "Kathak", "Kuchipudi"]);
        if let ViewResult::Bars(bars) = &result {
            assert_eq!(bars[1].value, ColumnValue::Int64(25000));
        }
    }

    #[test]
    fn test_top_n_sorted_descending() {
        let art = rows(DatasetName::ArtForms);
        let spec = ViewSpec::top_n(
            fields::art_forms::ART_FORM,
            fields::art_forms::TOURIST_INTEREST,
            TopNOptions::first(3).sorted(fields::art_forms::TOURIST_INTEREST, true),
        );
        let result = build_view(&art, &spec).unwrap();
        assert_eq!(labels(&result), vec!["Kathakali", "Bharatanatyam", "Kathak"]);
    }

    #[test]
    fn test_default_top_n() {
        let art = rows(DatasetName::ArtForms);
        let spec = ViewSpec::top_n(
            fields::art_forms::ART_FORM,
            fields::art_forms::PRACTITIONERS,
            TopNOptions::default(),
        );
        assert_eq!(build_view(&art, &spec).unwrap().len(), DEFAULT_TOP_N);
    }

    #[test]
    fn test_series_projects_every_row() {
        let tourism = rows(DatasetName::Tourism);
        let spec = ViewSpec::series(fields::tourism::MONTH, fields::tourism::REVENUE_CRORES);
        let result = build_view(&tourism, &spec).unwrap();
        assert_eq!(result.len(), 12);
        assert_eq!(labels(&result)[0], "Jan");
    }

    #[test]
    fn test_grouped_count_first_occurrence_order() {
        let art = rows(DatasetName::ArtForms);
        let result = build_view(&art, &ViewSpec::grouped_count(fields::art_forms::REGION)).unwrap();
        let ViewResult::Groups(groups) = result else {
            panic!("expected groups");
        };
        let summary: Vec<(String, usize)> = groups.iter().map(|g| (g.key.to_string(), g.count)).collect();
        assert_eq!(
            summary,
            vec![
                ("South".to_string(), 5),
                ("North".to_string(), 3),
                ("East".to_string(), 2),
                ("Northeast".to_string(), 3),
                ("West".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_grouped_count_with_sub_key_sorted() {
        let art = rows(DatasetName::ArtForms);
        let spec = ViewSpec::GroupedCount {
            key: fields::art_forms::PRESERVATION_STATUS.to_string(),
            sub_key: Some(fields::art_forms::UNESCO_RECOGNITION.to_string()),
            sorted_by_key: true,
        };
        let ViewResult::Groups(groups) = build_view(&art, &spec).unwrap() else {
            panic!("expected groups");
        };
        let summary: Vec<String> = groups
            .iter()
            .map(|g| format!("{}/{}={}", g.key, g.sub_key.as_ref().unwrap(), g.count))
            .collect();
        // Medium/Yes never occurs and is not reported
        assert_eq!(summary, vec!["High/No=2", "High/Yes=3", "Low/No=2", "Low/Yes=1", "Medium/No=7"]);
    }

    #[test]
    fn test_scatter_points() {
        let gems = rows(DatasetName::HiddenGems);
        let spec = ViewSpec::Scatter {
            x: fields::hidden_gems::ACCESSIBILITY_SCORE.to_string(),
            y: fields::hidden_gems::TOURIST_AWARENESS.to_string(),
            size: Some(fields::hidden_gems::ANNUAL_VISITORS.to_string()),
            color: Some(fields::hidden_gems::PRESERVATION_URGENCY.to_string()),
            hover: Some(fields::hidden_gems::LOCATION.to_string()),
        };
        let ViewResult::Points(points) = build_view(&gems, &spec).unwrap() else {
            panic!("expected points");
        };
        assert_eq!(points.len(), 10);
        assert_eq!(
            points[6],
            ScatterPoint {
                x: 2.8,
                y: 20.0,
                size: Some(3000.0),
                color: Some("Critical".into()),
                hover: Some("Gond (Madhya Pradesh)".to_string()),
            }
        );
    }

    #[test]
    fn test_scatter_rejects_text_axis() {
        let gems = rows(DatasetName::HiddenGems);
        let err = build_view(&gems, &ViewSpec::scatter(fields::hidden_gems::STATE, "Annual_Visitors")).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_priority_rule() {
        let gems = rows(DatasetName::HiddenGems);
        let result = build_view(&gems, &ViewSpec::Priority(PriorityRule::hidden_gems())).unwrap();
        assert_eq!(
            labels(&result),
            vec!["Gond (Madhya Pradesh)", "Mithila (Bihar)", "Madhubani (Bihar)", "Warli (Maharashtra)"]
        );
    }

    #[test]
    fn test_priority_rule_is_configurable() {
        let gems = rows(DatasetName::HiddenGems);
        let rule = PriorityRule {
            below: 6.0,
            values: vec!["Medium".into()],
            ..PriorityRule::hidden_gems()
        };
        let result = build_view(&gems, &ViewSpec::Priority(rule)).unwrap();
        assert_eq!(labels(&result), vec!["Cheriyal (Telangana)", "Pattachitra (Odisha)"]);
    }

    #[test]
    fn test_summary() {
        let festivals = rows(DatasetName::Festivals);
        let result = build_view(&festivals, &ViewSpec::summary(fields::festivals::EXPECTED_VISITORS)).unwrap();
        let ViewResult::Summary(summary) = result else {
            panic!("expected summary");
        };
        assert_eq!(summary.count, 10);
        assert_eq!(summary.sum, 590000.0);
        assert_eq!(summary.mean, Some(59000.0));
        assert_eq!(summary.min, Some(15000.0));
        assert_eq!(summary.max, Some(200000.0));
    }

    #[test]
    fn test_empty_input_gives_empty_result() {
        let empty = rows(DatasetName::Festivals).retain_where(|_| false);
        for spec in [
            ViewSpec::grouped_count(fields::festivals::MONTH),
            ViewSpec::series(fields::festivals::FESTIVAL, fields::festivals::DURATION_DAYS),
            ViewSpec::summary(fields::festivals::DURATION_DAYS),
        ] {
            let result = build_view(&empty, &spec).unwrap();
            assert!(result.is_empty());
            assert!(result.notice().is_some());
        }

        let ViewResult::Summary(summary) = build_view(&empty, &ViewSpec::summary("Duration_Days")).unwrap() else {
            panic!("expected summary");
        };
        assert_eq!(summary.sum, 0.0);
        assert_eq!(summary.mean, None);
    }

    #[test]
    fn test_unknown_field_fails_even_when_empty() {
        let empty = rows(DatasetName::Festivals).retain_where(|_| false);
        let err = build_view(&empty, &ViewSpec::grouped_count("Budget")).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownField {
                dataset: "festivals".to_string(),
                field: "Budget".to_string()
            }
        );
    }

    #[test]
    fn test_view_spec_json() {
        let spec: ViewSpec = serde_json::from_str(r#"{"kind":"top_n","label":"Art_Form","value":"Practitioners"}"#).unwrap();
        assert_eq!(
            spec,
            ViewSpec::top_n("Art_Form", "Practitioners", TopNOptions::default())
        );

        let spec: ViewSpec = serde_json::from_value(serde_json::json!({
            "kind": "priority",
            "threshold_field": "Accessibility_Score",
            "below": 5,
            "set_field": "Preservation_Urgency",
            "values": ["Critical", "High"],
            "sort_by": "Annual_Visitors"
        }))
        .unwrap();
        assert_eq!(spec, ViewSpec::Priority(PriorityRule::hidden_gems()));

        let result = ViewResult::Groups(vec![GroupCount {
            key: "Jan".into(),
            sub_key: None,
            count: 1,
        }]);
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"kind":"groups","data":[{"key":"Jan","count":1}]}"#
        );
    }
}
