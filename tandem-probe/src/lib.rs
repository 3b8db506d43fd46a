//! # Tandem Probe
//!
//! Runs the iteration engine and the cache end to end against the tokio event
//! loop and reports what happened: element counts, event-loop turns and how
//! often the cached function really ran.

use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use serde::Serialize;
use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use tandem_cache::AsyncCache;
use tandem_core::{
    EngineConfig, EventLoop, NonblockingOptions, Text, nonblocking_map_with, parallel_map,
    serial_map,
};

pub const PROBE_ELEMENTS: u64 = 100_000;

/// Default filter when `RUST_LOG` is unset: probe stages at info, engine and
/// cache internals at warn.
pub const DEFAULT_LOG_FILTER: &str = "tandem_probe=info,tandem_core=warn,tandem_cache=warn";

/// Stderr subscriber for the probe. Set `RUST_LOG=tandem_core=trace` to see
/// every budget-driven yield, or `tandem_cache=trace` for hits and misses.
/// Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .try_init();
}

/// Routes panics in the probe stages into the log before unwinding.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = match info.payload().downcast_ref::<&str>() {
            Some(text) => (*text).to_string(),
            None => info
                .payload()
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_else(|| "unknown panic".to_string()),
        };
        match info.location() {
            Some(at) => tracing::error!(file = at.file(), line = at.line(), %message, "probe panicked"),
            None => tracing::error!(%message, "probe panicked"),
        }
    }));
}

// ════════════════════════════════════════════════════════════════════
// Turn counting
// ════════════════════════════════════════════════════════════════════

/// Wraps an event loop and counts how many times control was handed back.
#[derive(Debug)]
pub struct CountingLoop<L> {
    inner: L,
    defers: Cell<usize>,
}

impl<L: EventLoop> CountingLoop<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            defers: Cell::new(0),
        }
    }

    /// Turns used so far: the first one plus one per deferral.
    pub fn turns(&self) -> usize {
        self.defers.get() + 1
    }
}

#[async_trait(?Send)]
impl<L: EventLoop> EventLoop for CountingLoop<L> {
    fn now(&self) -> Instant {
        self.inner.now()
    }

    async fn defer(&self) {
        self.defers.set(self.defers.get() + 1);
        self.inner.defer().await;
    }
}

// ════════════════════════════════════════════════════════════════════
// Report
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub time_budget_ms: u64,
    pub elements: u64,
    pub turns: usize,
    pub elapsed_ms: u64,
    pub serial_result: Vec<u64>,
    pub parallel_result: String,
    pub cache_lookups: usize,
    pub cache_invocations: usize,
}

/// Runs every probe stage with `config` and checks the results on the way.
pub async fn run(config: &EngineConfig) -> Result<ProbeReport> {
    let started = Instant::now();

    // Non-blocking map across as many turns as the budget demands.
    let input: Vec<u64> = (0..PROBE_ELEMENTS).collect();
    let event_loop = CountingLoop::new(config.event_loop());
    let options = NonblockingOptions::new()
        .time_budget(config.time_budget())
        .event_loop(&event_loop);
    let doubled = nonblocking_map_with(&input, options, |_, value, _, _| value * 2).await;
    ensure!(
        doubled.iter().enumerate().all(|(i, v)| *v == i as u64 * 2),
        "nonblocking map lost ordering"
    );
    tracing::info!(elements = doubled.len(), turns = event_loop.turns(), "nonblocking stage done");

    // Serial and parallel maps with real suspension points.
    let serial_result = serial_map(&vec![1u64, 2, 3], |value, _, _| async move {
        tokio::time::sleep(Duration::ZERO).await;
        value * 2
    })
    .await;

    let parallel_result = parallel_map(&Text::new("tandem"), |c, key, _| async move {
        tokio::time::sleep(Duration::from_millis(6 - key as u64)).await;
        c.to_ascii_uppercase()
    })
    .await;
    tracing::info!(?serial_result, %parallel_result, "async stages done");

    // Cached lookups: repeated keys should not reach the wrapped function.
    let invocations = AtomicUsize::new(0);
    let lookup = AsyncCache::new(|(zoom, tile): (u8, u32)| {
        invocations.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            (u64::from(zoom) << 32) | u64::from(tile)
        }
    });
    let requests = [(3u8, 7u32), (3, 8), (3, 7), (4, 7), (3, 8)];
    for request in requests {
        lookup
            .call(request)
            .await
            .with_context(|| format!("cached lookup for {:?}", request))?;
    }
    let cache_invocations = invocations.load(Ordering::SeqCst);
    tracing::info!(lookups = requests.len(), cache_invocations, "cache stage done");

    Ok(ProbeReport {
        time_budget_ms: config.time_budget().as_millis() as u64,
        elements: doubled.len() as u64,
        turns: event_loop.turns(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        serial_result,
        parallel_result,
        cache_lookups: requests.len(),
        cache_invocations,
    })
}
