use std::time::Duration;

use tandem_core::{EngineConfig, EventLoop, NonblockingOptions, TokioLoop, nonblocking_for_each_with};
use tandem_probe::{
    CountingLoop, DEFAULT_LOG_FILTER, PROBE_ELEMENTS, ProbeReport, init_tracing, run,
};

// ============================================================================
// CountingLoop Tests
// ============================================================================

#[tokio::test]
async fn test_counting_loop_starts_at_one_turn() {
    let event_loop = CountingLoop::new(TokioLoop::new(Duration::ZERO));
    assert_eq!(event_loop.turns(), 1);
    event_loop.defer().await;
    event_loop.defer().await;
    assert_eq!(event_loop.turns(), 3);
}

#[tokio::test]
async fn test_counting_loop_no_yield_under_large_budget() {
    let event_loop = CountingLoop::new(TokioLoop::new(Duration::ZERO));
    let input: Vec<u32> = (0..1_000).collect();
    let options = NonblockingOptions::new()
        .time_budget(Duration::from_secs(60))
        .event_loop(&event_loop);
    nonblocking_for_each_with(&input, options, |_, _, _, _| ()).await;
    assert_eq!(event_loop.turns(), 1);
}

// ============================================================================
// Probe Run Tests
// ============================================================================

#[tokio::test]
async fn test_probe_run_with_tiny_budget() {
    init_tracing();
    let config = EngineConfig {
        time_budget_ms: 1,
        yield_delay_ms: 0,
    };
    let report = run(&config).await.unwrap();

    assert_eq!(report.time_budget_ms, 1);
    assert_eq!(report.elements, PROBE_ELEMENTS);
    assert!(report.turns > 1, "a 1ms budget should span several turns");
    assert_eq!(report.serial_result, vec![2, 4, 6]);
    assert_eq!(report.parallel_result, "TANDEM");
    assert_eq!(report.cache_lookups, 5);
    assert_eq!(report.cache_invocations, 3);
}

#[tokio::test]
async fn test_probe_report_serializes() {
    let report: ProbeReport = run(&EngineConfig::default()).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["elements"], PROBE_ELEMENTS);
    assert_eq!(json["time_budget_ms"], 1000);
    assert_eq!(json["cache_invocations"], 3);
}

#[test]
fn test_init_tracing_twice_is_harmless() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_default_log_filter_names_workspace_targets() {
    let filter: tracing_subscriber::EnvFilter = DEFAULT_LOG_FILTER.parse().unwrap();
    let rendered = filter.to_string();
    for target in ["tandem_probe", "tandem_core", "tandem_cache"] {
        assert!(rendered.contains(target), "{target} missing from {rendered}");
    }
}
