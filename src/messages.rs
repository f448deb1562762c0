/// JSON message types for the HTTP surface
use serde::{Deserialize, Serialize};

use crate::chart::{EmptyResultNotice, ViewResult, ViewSpec};
use crate::dataset::DatasetName;
use crate::error::Result;
use crate::filter::FilterSelection;
use crate::predicate::Predicate;
use crate::view::RowSet;

/// Body of `POST /datasets/{name}/query`.
///
/// `filters` and `where` are combined by conjunction; both may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    /// Structured predicates, e.g. `{"op": "equals", "field": "Region", "value": "South"}`
    pub filters: Vec<Predicate>,

    /// Textual predicates, e.g. `Expected_Visitors > 75000`
    #[serde(rename = "where")]
    pub where_clause: Option<String>,

    /// Chart to build from the matched rows
    pub view: Option<ViewSpec>,
}

impl QueryRequest {
    /// The request's complete filter selection.
    pub fn selection(&self) -> Result<FilterSelection> {
        let selection = FilterSelection::from(self.filters.clone());
        match self.where_clause.as_deref() {
            Some(text) => Ok(selection.and(FilterSelection::parse(text)?)),
            None => Ok(selection),
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Names of the available datasets
    DatasetList { datasets: Vec<DatasetName> },

    /// A whole dataset
    TableData {
        table_name: String,
        columns: Vec<String>,
        rows: RowSet,
    },

    /// Filtered rows and an optional chart
    QueryResult {
        table_name: String,
        matched: usize,
        rows: RowSet,
        #[serde(skip_serializing_if = "Option::is_none")]
        view: Option<ViewResult>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<EmptyResultNotice>,
    },

    /// Error occurred
    Error { message: String },
}

impl ServerMessage {
    pub fn table_data(rows: RowSet) -> Self {
        ServerMessage::TableData {
            table_name: rows.dataset().to_string(),
            columns: rows
                .schema()
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::get_dataset;

    #[test]
    fn test_query_request_defaults() {
        let request: QueryRequest = serde_json::from_str("{}").unwrap();
        assert!(request.filters.is_empty());
        assert!(request.where_clause.is_none());
        assert!(request.view.is_none());
        assert!(request.selection().unwrap().is_empty());
    }

    #[test]
    fn test_query_request_combines_filters_and_where() {
        let request: QueryRequest = serde_json::from_value(serde_json::json!({
            "filters": [{"op": "equals", "field": "Month", "value": "Nov"}],
            "where": "Duration_Days >= 5",
            "view": {"kind": "summary", "field": "Expected_Visitors"}
        }))
        .unwrap();

        let selection = request.selection().unwrap();
        assert_eq!(selection.predicates().len(), 2);

        let rows = selection.apply(&get_dataset("festivals").unwrap()).unwrap();
        // Manipur Sangai (10 days) and Assam Tea (5 days); Hampi runs 3
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_bad_where_clause() {
        let request = QueryRequest {
            where_clause: Some("Month ==".to_string()),
            ..Default::default()
        };
        assert!(request.selection().is_err());
    }

    #[test]
    fn test_server_message_shape() {
        let rows = get_dataset("regional").unwrap().head(1);
        let json = serde_json::to_value(ServerMessage::table_data(rows)).unwrap();
        assert_eq!(json["type"], "TableData");
        assert_eq!(json["table_name"], "regional");
        assert_eq!(json["columns"][0], "Region");
        assert_eq!(json["rows"][0]["Region"], "North");
        assert_eq!(json["rows"][0]["Infrastructure_Score"], 7.8);

        let json = serde_json::to_value(ServerMessage::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "Error", "message": "boom"}));
    }
}
