//! The four gauge collections exposed by the exporter.

use std::fmt;

/// Namespace prefix shared by every exported family.
pub const NAMESPACE: &str = "cardinality_exporter";

/// One statistic category of the upstream status document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Timeseries count per metric name.
    SeriesCountByMetricName,
    /// Distinct value count per label name.
    LabelValueCountByLabelName,
    /// Estimated memory bytes per label name.
    MemoryInBytesByLabelName,
    /// Series count per label/value pair.
    SeriesCountByLabelValuePair,
}

impl Collection {
    /// All collections, in registration order.
    pub const ALL: [Collection; 4] = [
        Collection::SeriesCountByMetricName,
        Collection::LabelValueCountByLabelName,
        Collection::MemoryInBytesByLabelName,
        Collection::SeriesCountByLabelValuePair,
    ];

    /// Family name without the namespace prefix.
    pub fn name(self) -> &'static str {
        match self {
            Collection::SeriesCountByMetricName => "series_count_by_metric_name",
            Collection::LabelValueCountByLabelName => "label_value_count_by_label_name",
            Collection::MemoryInBytesByLabelName => "memory_by_label_bytes",
            Collection::SeriesCountByLabelValuePair => "series_count_by_label_value_pair",
        }
    }

    /// Fully qualified family name as it appears on the scrape endpoint.
    pub fn family_name(self) -> String {
        format!("{NAMESPACE}_{}", self.name())
    }

    pub fn help(self) -> &'static str {
        match self {
            Collection::SeriesCountByMetricName => "Timeseries count by metric name.",
            Collection::LabelValueCountByLabelName => "Label values count by label.",
            Collection::MemoryInBytesByLabelName => "Amount of memory used per label.",
            Collection::SeriesCountByLabelValuePair => "Count of unique label/value pairs.",
        }
    }

    /// Label key carrying the dimension value.
    pub fn label(self) -> &'static str {
        match self {
            Collection::SeriesCountByMetricName => "metric",
            _ => "label",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
