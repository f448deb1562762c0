//! Dataset registry.
//!
//! The five dashboard datasets are embedded as a JSON fixture, validated
//! against fixed schemas and loaded once per process. Every caller shares the
//! same immutable tables; filtering never copies or mutates them.

use crate::column::{ColumnType, ColumnValue};
use crate::error::{Error, Result};
use crate::table::{Field, Schema, Table};
use crate::view::RowSet;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const EMBEDDED_FIXTURES: &str = include_str!("../fixtures/datasets.json");

static REGISTRY: OnceCell<Registry> = OnceCell::new();

pub const MONTHS: &[&str] = &[
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
pub const REGIONS: &[&str] = &["North", "South", "East", "West", "Northeast", "Central"];
pub const PRESERVATION_LEVELS: &[&str] = &["Low", "Medium", "High"];
pub const UNESCO_FLAGS: &[&str] = &["Yes", "No"];
pub const URGENCY_LEVELS: &[&str] = &["Low", "Medium", "High", "Critical"];

/// Field names of every dataset.
pub mod fields {
    pub mod art_forms {
        pub const ART_FORM: &str = "Art_Form";
        pub const STATE: &str = "State";
        pub const REGION: &str = "Region";
        pub const CATEGORY: &str = "Category";
        pub const PRACTITIONERS: &str = "Practitioners";
        pub const TOURIST_INTEREST: &str = "Tourist_Interest";
        pub const PRESERVATION_STATUS: &str = "Preservation_Status";
        pub const UNESCO_RECOGNITION: &str = "UNESCO_Recognition";
        pub const AGE_GROUP: &str = "Age_Group";
    }

    pub mod tourism {
        pub const MONTH: &str = "Month";
        pub const CULTURAL_TOURISTS: &str = "Cultural_Tourists";
        pub const ART_FESTIVAL_EVENTS: &str = "Art_Festival_Events";
        pub const REVENUE_CRORES: &str = "Revenue_Crores";
        pub const INTERNATIONAL_VISITORS: &str = "International_Visitors";
        pub const DOMESTIC_VISITORS: &str = "Domestic_Visitors";
    }

    pub mod regional {
        pub const REGION: &str = "Region";
        pub const ART_FORMS_COUNT: &str = "Art_Forms_Count";
        pub const TOURIST_FOOTFALL: &str = "Tourist_Footfall";
        pub const INFRASTRUCTURE_SCORE: &str = "Infrastructure_Score";
        pub const DIGITIZATION_LEVEL: &str = "Digitization_Level";
        pub const INVESTMENT_CRORES: &str = "Investment_Crores";
    }

    pub mod hidden_gems {
        pub const LOCATION: &str = "Location";
        pub const ART_TYPE: &str = "Art_Type";
        pub const STATE: &str = "State";
        pub const ACCESSIBILITY_SCORE: &str = "Accessibility_Score";
        pub const TOURIST_AWARENESS: &str = "Tourist_Awareness";
        pub const PRESERVATION_URGENCY: &str = "Preservation_Urgency";
        pub const ANNUAL_VISITORS: &str = "Annual_Visitors";
    }

    pub mod festivals {
        pub const FESTIVAL: &str = "Festival";
        pub const MONTH: &str = "Month";
        pub const STATE: &str = "State";
        pub const DURATION_DAYS: &str = "Duration_Days";
        pub const EXPECTED_VISITORS: &str = "Expected_Visitors";
    }
}

/// The five fixed datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetName {
    ArtForms,
    Tourism,
    Regional,
    HiddenGems,
    Festivals,
}

impl DatasetName {
    pub const ALL: [DatasetName; 5] = [
        DatasetName::ArtForms,
        DatasetName::Tourism,
        DatasetName::Regional,
        DatasetName::HiddenGems,
        DatasetName::Festivals,
    ];

    /// Canonical name, also the fixture key.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetName::ArtForms => "art_forms",
            DatasetName::Tourism => "tourism",
            DatasetName::Regional => "regional",
            DatasetName::HiddenGems => "hidden_gems",
            DatasetName::Festivals => "festivals",
        }
    }

    pub fn schema(&self) -> Schema {
        use fields::*;

        match self {
            DatasetName::ArtForms => Schema::new(vec![
                Field::new(art_forms::ART_FORM, ColumnType::String),
                Field::new(art_forms::STATE, ColumnType::String),
                Field::new(art_forms::REGION, ColumnType::Category(REGIONS)),
                Field::new(art_forms::CATEGORY, ColumnType::String),
                Field::new(art_forms::PRACTITIONERS, ColumnType::Int64),
                Field::new(art_forms::TOURIST_INTEREST, ColumnType::Int64).with_bounds(0.0, 100.0),
                Field::new(
                    art_forms::PRESERVATION_STATUS,
                    ColumnType::Category(PRESERVATION_LEVELS),
                ),
                Field::new(art_forms::UNESCO_RECOGNITION, ColumnType::Category(UNESCO_FLAGS)),
                Field::new(art_forms::AGE_GROUP, ColumnType::String),
            ]),
            DatasetName::Tourism => Schema::new(vec![
                Field::new(tourism::MONTH, ColumnType::Category(MONTHS)),
                Field::new(tourism::CULTURAL_TOURISTS, ColumnType::Int64),
                Field::new(tourism::ART_FESTIVAL_EVENTS, ColumnType::Int64),
                Field::new(tourism::REVENUE_CRORES, ColumnType::Int64),
                Field::new(tourism::INTERNATIONAL_VISITORS, ColumnType::Int64),
                Field::new(tourism::DOMESTIC_VISITORS, ColumnType::Int64),
            ]),
            DatasetName::Regional => Schema::new(vec![
                Field::new(regional::REGION, ColumnType::Category(REGIONS)),
                Field::new(regional::ART_FORMS_COUNT, ColumnType::Int64),
                Field::new(regional::TOURIST_FOOTFALL, ColumnType::Int64),
                Field::new(regional::INFRASTRUCTURE_SCORE, ColumnType::Float64),
                Field::new(regional::DIGITIZATION_LEVEL, ColumnType::Int64),
                Field::new(regional::INVESTMENT_CRORES, ColumnType::Int64),
            ]),
            DatasetName::HiddenGems => Schema::new(vec![
                Field::new(hidden_gems::LOCATION, ColumnType::String),
                Field::new(hidden_gems::ART_TYPE, ColumnType::String),
                Field::new(hidden_gems::STATE, ColumnType::String),
                Field::new(hidden_gems::ACCESSIBILITY_SCORE, ColumnType::Float64)
                    .with_bounds(0.0, 10.0),
                Field::new(hidden_gems::TOURIST_AWARENESS, ColumnType::Int64)
                    .with_bounds(0.0, 100.0),
                Field::new(
                    hidden_gems::PRESERVATION_URGENCY,
                    ColumnType::Category(URGENCY_LEVELS),
                ),
                Field::new(hidden_gems::ANNUAL_VISITORS, ColumnType::Int64),
            ]),
            DatasetName::Festivals => Schema::new(vec![
                Field::new(festivals::FESTIVAL, ColumnType::String),
                Field::new(festivals::MONTH, ColumnType::Category(MONTHS)),
                Field::new(festivals::STATE, ColumnType::String),
                Field::new(festivals::DURATION_DAYS, ColumnType::Int64),
                Field::new(festivals::EXPECTED_VISITORS, ColumnType::Int64),
            ]),
        }
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetName {
    type Err = Error;

    /// Accepts `art_forms`, `ArtForms`, `art-forms` and similar spellings.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        DatasetName::ALL
            .into_iter()
            .find(|name| name.as_str().replace('_', "") == normalized)
            .ok_or_else(|| Error::UnknownDataset(s.to_string()))
    }
}

/// Which visitor series the tourism trend chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourismMetric {
    #[default]
    All,
    Domestic,
    International,
}

impl TourismMetric {
    /// Tourism field plotted for this selection.
    pub fn field(&self) -> &'static str {
        match self {
            TourismMetric::All => fields::tourism::CULTURAL_TOURISTS,
            TourismMetric::Domestic => fields::tourism::DOMESTIC_VISITORS,
            TourismMetric::International => fields::tourism::INTERNATIONAL_VISITORS,
        }
    }
}

impl FromStr for TourismMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(TourismMetric::All),
            "domestic" => Ok(TourismMetric::Domestic),
            "international" => Ok(TourismMetric::International),
            _ => Err(Error::Parse(format!(
                "Unknown visitor type: '{}'. Use 'All', 'Domestic' or 'International'",
                s
            ))),
        }
    }
}

/// Immutable set of loaded datasets.
#[derive(Debug)]
pub struct Registry {
    tables: Vec<Arc<Table>>,
}

impl Registry {
    /// Load the fixtures compiled into the crate.
    pub fn load_embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_FIXTURES)
    }

    /// Load datasets from a JSON document of the form
    /// `{"<dataset>": {"<column>": [values...], ...}, ...}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut document: HashMap<String, HashMap<String, Vec<ColumnValue>>> =
            serde_json::from_str(json)?;

        let mut unknown: Vec<&String> = document
            .keys()
            .filter(|k| k.parse::<DatasetName>().is_err())
            .collect();
        if let Some(name) = unknown.pop() {
            return Err(Error::UnknownDataset(name.clone()));
        }

        let mut tables = Vec::with_capacity(DatasetName::ALL.len());
        for name in DatasetName::ALL {
            let columns = document
                .remove(name.as_str())
                .ok_or_else(|| Error::fixture(name.as_str(), "dataset missing from fixtures"))?;
            let table = Table::from_columns(name.as_str(), name.schema(), columns)?;
            log::debug!("loaded dataset '{}' with {} rows", name, table.len());
            tables.push(Arc::new(table));
        }

        Ok(Registry { tables })
    }

    /// The process-wide registry, loaded from the embedded fixtures on first use.
    pub fn global() -> Result<&'static Registry> {
        REGISTRY.get_or_try_init(|| {
            let registry = Registry::load_embedded()?;
            log::info!(
                "dataset registry ready: {} datasets, {} rows",
                registry.tables.len(),
                registry.tables.iter().map(|t| t.len()).sum::<usize>()
            );
            Ok(registry)
        })
    }

    pub fn names(&self) -> [DatasetName; 5] {
        DatasetName::ALL
    }

    pub fn table(&self, name: DatasetName) -> &Arc<Table> {
        // tables are stored in DatasetName::ALL order
        &self.tables[name as usize]
    }

    /// All rows of a dataset, in fixture order.
    pub fn rows(&self, name: DatasetName) -> RowSet {
        RowSet::all(self.table(name).clone())
    }
}

/// All rows of a dataset from the process-wide registry.
pub fn dataset(name: DatasetName) -> Result<RowSet> {
    Ok(Registry::global()?.rows(name))
}

/// Look a dataset up by name.
///
/// # Examples
///
/// ```
/// let rows = annexome::get_dataset("festivals").unwrap();
/// assert_eq!(rows.len(), 10);
/// assert!(annexome::get_dataset("monuments").is_err());
/// ```
pub fn get_dataset(name: &str) -> Result<RowSet> {
    let name: DatasetName = name.parse()?;
    dataset(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_fixtures_load() {
        let registry = Registry::load_embedded().unwrap();
        let sizes: Vec<usize> = DatasetName::ALL
            .iter()
            .map(|&n| registry.table(n).len())
            .collect();
        assert_eq!(sizes, vec![15, 12, 6, 10, 10]);
    }

    #[test]
    fn test_table_order_matches_names() {
        let registry = Registry::load_embedded().unwrap();
        for name in registry.names() {
            assert_eq!(registry.table(name).name(), name.as_str());
        }
    }

    #[test]
    fn test_dataset_name_parsing() {
        assert_eq!("art_forms".parse::<DatasetName>().unwrap(), DatasetName::ArtForms);
        assert_eq!("HiddenGems".parse::<DatasetName>().unwrap(), DatasetName::HiddenGems);
        assert_eq!("hidden-gems".parse::<DatasetName>().unwrap(), DatasetName::HiddenGems);
        assert_eq!(
            "monuments".parse::<DatasetName>().unwrap_err(),
            Error::UnknownDataset("monuments".to_string())
        );
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = Registry::global().unwrap();
        let b = Registry::global().unwrap();
        assert!(std::ptr::eq(a, b));
        let rows_a = dataset(DatasetName::Tourism).unwrap();
        let rows_b = get_dataset("tourism").unwrap();
        assert!(Arc::ptr_eq(rows_a.table(), rows_b.table()));
    }

    #[test]
    fn test_fixture_validation() {
        let err = Registry::from_json(r#"{"monuments": {}}"#).unwrap_err();
        assert_eq!(err, Error::UnknownDataset("monuments".to_string()));

        let err = Registry::from_json("{}").unwrap_err();
        assert!(matches!(err, Error::Fixture { .. }));

        let bad_month = EMBEDDED_FIXTURES.replacen("\"Jan\", \"Feb\", \"Mar\"", "\"Janvier\", \"Feb\", \"Mar\"", 1);
        assert!(Registry::from_json(&bad_month).is_err());
    }

    #[test]
    fn test_category_domains() {
        let registry = Registry::load_embedded().unwrap();
        let schema = registry.table(DatasetName::HiddenGems).schema();
        assert_eq!(
            schema
                .get_column_type(fields::hidden_gems::PRESERVATION_URGENCY)
                .and_then(|t| t.domain()),
            Some(URGENCY_LEVELS)
        );
    }

    #[test]
    fn test_tourism_metric() {
        assert_eq!("Domestic".parse::<TourismMetric>().unwrap().field(), "Domestic_Visitors");
        assert_eq!(TourismMetric::default().field(), "Cultural_Tourists");
        assert!("Martian".parse::<TourismMetric>().is_err());
    }
}
