//! cardinality-metrics - gauge state for the cardinality exporter.
//!
//! Holds the four labeled gauge collections that mirror the upstream
//! TSDB status document, plus a build info gauge, on a registry owned by
//! the state itself. The prober writes into it; the scrape endpoint renders
//! it in the Prometheus text exposition format.
//!
//! # Architecture
//!
//! ```text
//! MetricState (Clone, shared by handle)
//!   ├── set(collection, key, value) ← called by the prober
//!   ├── value() / len()             ← inspection
//!   └── encode() → text/plain for the scrape endpoint
//! ```
//!
//! # Semantics
//!
//! Each `set` overwrites or creates a single key. Keys are never evicted:
//! a key missing from a later probe keeps its last value.

pub mod collection;
pub mod state;

pub use collection::{Collection, NAMESPACE};
pub use state::{MetricState, MetricsResult};
