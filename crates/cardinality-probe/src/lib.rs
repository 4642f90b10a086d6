//! cardinality-probe - fetches the upstream TSDB status and folds it into
//! the exporter's gauges.
//!
//! # Architecture
//!
//! ```text
//! scheduler::run(ticker)
//!   ├── Ticker::tick()              ← IntervalTicker in production
//!   └── run_once()
//!       ├── Prober::fetch()         → CardinalityStatus
//!       │   GET {base}/api/v1/status/tsdb over http or https,
//!       │   redirects followed, bounded by timeout
//!       └── apply(&MetricState)     → four set() loops
//! ```
//!
//! A failed cycle leaves the gauges untouched: the per-collection loops
//! only run after the body has been fully read and decoded. Failures are
//! logged by the scheduler and never escape the cycle.

pub mod error;
pub mod prober;
pub mod scheduler;
pub mod status;

pub use error::{ProbeError, ProbeResult};
pub use prober::{MAX_REDIRECTS, ProbeReport, Prober, STATUS_PATH};
pub use scheduler::{ChannelTicker, IntervalTicker, Ticker};
pub use status::{CardinalityStatus, LabelValuePair, TsdbData};
