//! Citizen pollution reports that need the plant's attention.
//!
//! Reports are written by a separate citizen app into the shared
//! `requests` collection; this service only reads, filters and orders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::danger::DangerLevel;

// ---

/// One stored report. Every field is optional in storage; `id` is the
/// report's key in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutionRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub pollution_type: Option<String>,
    #[serde(default)]
    pub danger_level: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl PollutionRequest {
    /// Declared danger percentage; a missing level counts as 0.
    pub fn danger(&self) -> f64 {
        self.danger_level.unwrap_or(0.0)
    }

    pub fn level(&self) -> DangerLevel {
        DangerLevel::from_report_level(self.danger())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Water,
    Air,
    Waste,
}

impl TypeFilter {
    fn matches(&self, pollution_type: Option<&str>) -> bool {
        // ---
        let wanted = match self {
            TypeFilter::All => return true,
            TypeFilter::Water => "water",
            TypeFilter::Air => "air",
            TypeFilter::Waste => "waste",
        };
        pollution_type.is_some_and(|t| t.eq_ignore_ascii_case(wanted))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Timestamp,
    /// Highest declared danger first, newest first among equals.
    Danger,
}

/// Decode the stored collection, newest first. Undated reports go last;
/// entries that are not report objects are skipped.
pub fn from_stored(stored: Value) -> Vec<PollutionRequest> {
    // ---
    let entries: Vec<(String, Value)> = match stored {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };

    let mut requests: Vec<PollutionRequest> = entries
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .filter_map(|(key, v)| match serde_json::from_value::<PollutionRequest>(v) {
            Ok(mut request) => {
                if request.id.is_empty() {
                    request.id = key;
                }
                Some(request)
            }
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Skipping malformed request");
                None
            }
        })
        .collect();

    requests.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    requests
}

/// Keep the reports matching `filter`, then apply `sort`.
pub fn select(
    requests: Vec<PollutionRequest>,
    filter: TypeFilter,
    sort: SortOrder,
) -> Vec<PollutionRequest> {
    // ---
    let mut selected: Vec<PollutionRequest> = requests
        .into_iter()
        .filter(|r| filter.matches(r.pollution_type.as_deref()))
        .collect();

    if sort == SortOrder::Danger {
        selected.sort_by(|a, b| b.danger().total_cmp(&a.danger()));
    }
    selected
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn stored() -> Value {
        json!({
            "a1": { "pollution_type": "Water", "danger_level": 45, "timestamp": "2025-05-01T08:00:00Z" },
            "b2": { "pollution_type": "air", "danger_level": 80, "timestamp": "2025-05-03T08:00:00Z" },
            "c3": { "pollution_type": "water", "timestamp": "2025-05-04T08:00:00Z" },
            "d4": { "pollution_type": "waste", "danger_level": 80, "timestamp": "2025-05-02T08:00:00Z" },
            "e5": { "pollution_type": "noise" },
            "f6": "not a report"
        })
    }

    fn ids(requests: &[PollutionRequest]) -> Vec<&str> {
        requests.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_decoded_newest_first() {
        // ---
        let requests = from_stored(stored());
        assert_eq!(ids(&requests), vec!["c3", "b2", "d4", "a1", "e5"]);
        assert_eq!(requests[1].danger_level, Some(80.0));
        assert_eq!(requests[0].danger(), 0.0);
    }

    #[test]
    fn test_filter_by_type_ignores_case() {
        // ---
        let water = select(from_stored(stored()), TypeFilter::Water, SortOrder::Timestamp);
        assert_eq!(ids(&water), vec!["c3", "a1"]);

        let all = select(from_stored(stored()), TypeFilter::All, SortOrder::Timestamp);
        assert_eq!(all.len(), 5);

        let none = select(from_stored(json!({})), TypeFilter::Air, SortOrder::Danger);
        assert!(none.is_empty());
    }

    #[test]
    fn test_sort_by_danger_keeps_recency_among_ties() {
        // ---
        let sorted = select(from_stored(stored()), TypeFilter::All, SortOrder::Danger);
        assert_eq!(ids(&sorted), vec!["b2", "d4", "a1", "c3", "e5"]);
    }

    #[test]
    fn test_levels_band_at_40_and_70() {
        // ---
        let requests = from_stored(stored());
        let level = |id: &str| requests.iter().find(|r| r.id == id).unwrap().level();
        assert_eq!(level("b2"), DangerLevel::Danger);
        assert_eq!(level("a1"), DangerLevel::Warning);
        assert_eq!(level("c3"), DangerLevel::Safe);
    }

    #[test]
    fn test_query_values_deserialize() {
        // ---
        let filter: TypeFilter = serde_json::from_value(json!("waste")).unwrap();
        assert_eq!(filter, TypeFilter::Waste);
        let sort: SortOrder = serde_json::from_value(json!("danger")).unwrap();
        assert_eq!(sort, SortOrder::Danger);
        assert!(serde_json::from_value::<TypeFilter>(json!("noise")).is_err());
    }
}
