/// Annexome - Cultural Heritage Dashboard Core
///
/// The filter-and-aggregate layer behind the Annexome dashboard: five fixed,
/// immutable datasets about Indian art forms and cultural tourism, a filter
/// engine over them, and a view builder that turns filtered rows into
/// chart-ready structures.
///
/// Data flows one way: `get_dataset` -> `apply_filters` -> `build_view`.

pub mod error;
pub mod column;
pub mod table;
pub mod view;
pub mod dataset;
pub mod predicate;
pub mod filter;
pub mod chart;

pub use error::{Error, Result};
pub use column::{Column, ColumnType, ColumnValue};
pub use table::{Field, Record, Schema, Table};
pub use view::{RowSet, SortKey, SortOrder};
pub use dataset::{dataset, get_dataset, fields, DatasetName, Registry, TourismMetric};
pub use predicate::{parse_predicates, BoundPredicate, Choice, CompareOp, Predicate};
pub use filter::{apply_filters, selection_options, FilterSelection, VisitorBand};
pub use chart::{
    build_view, BarPoint, EmptyResultNotice, GroupCount, PriorityRule, ScatterPoint, Summary,
    TopNOptions, ViewResult, ViewSpec, DEFAULT_TOP_N,
};

// HTTP server modules - only when server feature is enabled
#[cfg(feature = "server")]
pub mod messages;
#[cfg(feature = "server")]
pub mod server;
