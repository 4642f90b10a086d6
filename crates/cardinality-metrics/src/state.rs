//! Metric state - the shared gauge collections.
//!
//! Each collection is a `GaugeVec` with a single label. Gauge values are
//! atomic f64 cells, so concurrent scrapes never observe a torn value.
//! There is no cross-key transaction: a scrape that interleaves with a
//! probe may see keys from two different cycles.

use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::collection::{Collection, NAMESPACE};

/// Result type alias for metric state operations.
pub type MetricsResult<T> = Result<T, prometheus::Error>;

/// Process-wide gauge state, shared by the prober and the scrape handler.
///
/// Cloning is cheap: all clones point at the same registry and gauges.
#[derive(Clone)]
pub struct MetricState {
    registry: Registry,
    /// Indexed by `Collection::index()`.
    gauges: [GaugeVec; 4],
}

impl MetricState {
    /// Create the four empty collections and register them, together with
    /// the build info gauge, on a fresh registry.
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();

        let gauges = [
            new_gauge_vec(Collection::SeriesCountByMetricName)?,
            new_gauge_vec(Collection::LabelValueCountByLabelName)?,
            new_gauge_vec(Collection::MemoryInBytesByLabelName)?,
            new_gauge_vec(Collection::SeriesCountByLabelValuePair)?,
        ];
        for gauge in &gauges {
            registry.register(Box::new(gauge.clone()))?;
        }

        let build_info = GaugeVec::new(
            Opts::new("build_info", "Build information of the cardinality exporter.")
                .namespace(NAMESPACE),
            &["version"],
        )?;
        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1.0);
        registry.register(Box::new(build_info))?;

        debug!(collections = gauges.len(), "metric state registered");
        Ok(Self { registry, gauges })
    }

    /// Overwrite the value of `key` in `collection`, creating it if absent.
    pub fn set(&self, collection: Collection, key: &str, value: f64) {
        self.gauges[collection.index()]
            .with_label_values(&[key])
            .set(value);
    }

    /// Current value of `key` in `collection`, without creating it.
    pub fn value(&self, collection: Collection, key: &str) -> Option<f64> {
        self.gauges[collection.index()]
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == collection.label() && pair.get_value() == key)
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Number of keys currently exposed by `collection`.
    pub fn len(&self, collection: Collection) -> usize {
        self.gauges[collection.index()]
            .collect()
            .iter()
            .map(|family| family.get_metric().len())
            .sum()
    }

    /// Whether no collection holds any key yet.
    pub fn is_empty(&self) -> bool {
        Collection::ALL.iter().all(|c| self.len(*c) == 0)
    }

    /// Render every registered family in the text exposition format.
    pub fn encode(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Content type matching `encode()` output.
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

fn new_gauge_vec(collection: Collection) -> MetricsResult<GaugeVec> {
    GaugeVec::new(
        Opts::new(collection.name(), collection.help()).namespace(NAMESPACE),
        &[collection.label()],
    )
}
