//! Upstream TSDB status document.
//!
//! Decoding is lenient about shape: unknown fields are ignored and missing
//! ones fall back to empty defaults. Type mismatches still fail.

use serde::Deserialize;

use cardinality_metrics::Collection;

/// Response of `GET /api/v1/status/tsdb`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CardinalityStatus {
    /// Expected to be `"success"`.
    pub status: String,
    pub data: TsdbData,
}

/// The four statistic lists, each ordered as the upstream returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TsdbData {
    pub series_count_by_metric_name: Vec<LabelValuePair>,
    pub label_value_count_by_label_name: Vec<LabelValuePair>,
    pub memory_in_bytes_by_label_name: Vec<LabelValuePair>,
    pub series_count_by_label_value_pair: Vec<LabelValuePair>,
}

/// A single dimension value and its reported count or byte size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LabelValuePair {
    pub name: String,
    pub value: u64,
}

impl CardinalityStatus {
    /// Whether the upstream reported `"success"`.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Parse a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

impl TsdbData {
    /// The pairs backing a gauge collection.
    pub fn pairs(&self, collection: Collection) -> &[LabelValuePair] {
        match collection {
            Collection::SeriesCountByMetricName => &self.series_count_by_metric_name,
            Collection::LabelValueCountByLabelName => &self.label_value_count_by_label_name,
            Collection::MemoryInBytesByLabelName => &self.memory_in_bytes_by_label_name,
            Collection::SeriesCountByLabelValuePair => &self.series_count_by_label_value_pair,
        }
    }

    /// Total number of pairs across all four lists.
    pub fn total_pairs(&self) -> usize {
        Collection::ALL.iter().map(|c| self.pairs(*c).len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMETHEUS_BODY: &str = r#"{
        "status": "success",
        "data": {
            "headStats": {"numSeries": 508, "chunkCount": 937},
            "seriesCountByMetricName": [
                {"name": "net_conntrack_dialer_conn_failed_total", "value": 20},
                {"name": "prometheus_http_request_duration_seconds_bucket", "value": 20}
            ],
            "labelValueCountByLabelName": [{"name": "__name__", "value": 211}],
            "memoryInBytesByLabelName": [{"name": "__name__", "value": 8266}],
            "seriesCountByLabelValuePair": [{"name": "job=prometheus", "value": 425}]
        }
    }"#;

    #[test]
    fn decodes_full_document() {
        let status = CardinalityStatus::from_slice(PROMETHEUS_BODY.as_bytes()).unwrap();
        assert!(status.is_success());
        assert_eq!(status.data.series_count_by_metric_name.len(), 2);
        assert_eq!(
            status.data.label_value_count_by_label_name[0],
            LabelValuePair { name: "__name__".to_string(), value: 211 }
        );
        assert_eq!(status.data.memory_in_bytes_by_label_name[0].value, 8266);
        assert_eq!(status.data.series_count_by_label_value_pair[0].name, "job=prometheus");
        assert_eq!(status.data.total_pairs(), 5);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let status = CardinalityStatus::from_slice(br#"{"status":"success"}"#).unwrap();
        assert_eq!(status.data, TsdbData::default());

        let status = CardinalityStatus::from_slice(br#"{"data":{"seriesCountByMetricName":[]}}"#).unwrap();
        assert_eq!(status.status, "");
        assert!(!status.is_success());
    }

    #[test]
    fn pairs_map_to_collections() {
        let status = CardinalityStatus::from_slice(PROMETHEUS_BODY.as_bytes()).unwrap();
        assert_eq!(status.data.pairs(Collection::SeriesCountByMetricName).len(), 2);
        assert_eq!(status.data.pairs(Collection::LabelValueCountByLabelName)[0].value, 211);
        assert_eq!(status.data.pairs(Collection::MemoryInBytesByLabelName)[0].value, 8266);
        assert_eq!(status.data.pairs(Collection::SeriesCountByLabelValuePair)[0].value, 425);
    }

    #[test]
    fn value_type_mismatch_fails() {
        let body = br#"{"status":"success","data":{"seriesCountByMetricName":[{"name":"up","value":"42"}]}}"#;
        assert!(CardinalityStatus::from_slice(body).is_err());
    }

    #[test]
    fn negative_value_fails() {
        let body = br#"{"status":"success","data":{"seriesCountByMetricName":[{"name":"up","value":-1}]}}"#;
        assert!(CardinalityStatus::from_slice(body).is_err());
    }

    #[test]
    fn full_u64_range_is_accepted() {
        let body = format!(
            r#"{{"status":"success","data":{{"memoryInBytesByLabelName":[{{"name":"x","value":{}}}]}}}}"#,
            u64::MAX
        );
        let status = CardinalityStatus::from_slice(body.as_bytes()).unwrap();
        assert_eq!(status.data.memory_in_bytes_by_label_name[0].value, u64::MAX);
    }

    #[test]
    fn non_json_fails() {
        assert!(CardinalityStatus::from_slice(b"<html>not json</html>").is_err());
    }
}
