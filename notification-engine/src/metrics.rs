use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, TextEncoder};

static PUSHES_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::with_opts(Opts::new(
        "notification_engine_pushes_sent_total",
        "Device pushes acknowledged by the provider",
    ))
    .expect("failed to create notification_engine_pushes_sent_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_engine_pushes_sent_total");
    counter
});

static PUSHES_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::with_opts(Opts::new(
        "notification_engine_pushes_failed_total",
        "Device pushes the provider rejected or that never went out",
    ))
    .expect("failed to create notification_engine_pushes_failed_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_engine_pushes_failed_total");
    counter
});

static TOKENS_CLEANED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::with_opts(Opts::new(
        "notification_engine_tokens_cleaned_total",
        "Device tokens cleared after a permanent provider error",
    ))
    .expect("failed to create notification_engine_tokens_cleaned_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_engine_tokens_cleaned_total");
    counter
});

static DISPATCH_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "notification_engine_dispatch_duration_seconds",
            "Wall-clock latency of a full batch dispatch",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .expect("failed to create notification_engine_dispatch_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register notification_engine_dispatch_duration_seconds");
    histogram
});

pub fn observe_dispatch(sent: usize, failed: usize, cleaned: usize, elapsed: Duration) {
    PUSHES_SENT_TOTAL.inc_by(sent as u64);
    PUSHES_FAILED_TOTAL.inc_by(failed as u64);
    TOKENS_CLEANED_TOTAL.inc_by(cleaned as u64);
    DISPATCH_DURATION_SECONDS.observe(elapsed.as_secs_f64());
}

/// Text-encodes the default registry for an embedding app's /metrics route.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# metrics encode error: {err}\n");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
