//! Probe scheduler - repeats the probe cycle on every tick.
//!
//! The loop alternates between waiting on its [`Ticker`] (idle) and running
//! one cycle (probing). Cycles never overlap: a slow cycle just delays the
//! next effective tick, and ticks missed meanwhile are dropped. There is no
//! shutdown hook; the production loop lives as long as the process.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use cardinality_metrics::MetricState;

use crate::error::ProbeResult;
use crate::prober::{ProbeReport, Prober};

/// Source of scheduling ticks.
pub trait Ticker: Send {
    /// Wait for the next tick. `false` means no more ticks will come.
    fn tick(&mut self) -> impl Future<Output = bool> + Send;
}

/// Wall-clock ticker with a fixed period.
///
/// The first tick fires one period after creation, since the startup
/// probe has already run by then. Missed ticks are skipped, not replayed.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Panics if `period` is zero.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticker driven by hand through a channel. Ends when every sender is dropped.
pub struct ChannelTicker {
    rx: mpsc::Receiver<()>,
}

impl ChannelTicker {
    /// Create a ticker and the sender that drives it.
    pub fn new(buffer: usize) -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

impl Ticker for ChannelTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

/// Run a single probe cycle, logging any failure.
///
/// The error is returned for callers that care, but handling it is
/// optional: the next cycle starts from scratch either way.
pub async fn run_once(prober: &Prober, state: &MetricState) -> ProbeResult<ProbeReport> {
    let result = prober.probe(state).await;
    if let Err(e) = &result {
        warn!(
            url = %prober.url(),
            kind = e.kind(),
            error = %e,
            "failed to probe TSDB status"
        );
    }
    result
}

/// Probe on every tick until the ticker is exhausted.
pub async fn run<T: Ticker>(prober: &Prober, state: &MetricState, mut ticker: T) {
    info!(url = %prober.url(), "probe scheduler started");

    while ticker.tick().await {
        debug!(url = %prober.url(), "probe tick");
        let _ = run_once(prober, state).await;
    }

    debug!(url = %prober.url(), "probe scheduler stopped");
}

/// Run the scheduler loop on its own task.
pub fn spawn<T>(prober: Prober, state: MetricState, ticker: T) -> JoinHandle<()>
where
    T: Ticker + 'static,
{
    tokio::spawn(async move {
        run(&prober, &state, ticker).await;
    })
}
