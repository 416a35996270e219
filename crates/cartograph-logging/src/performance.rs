// ABOUTME: Timing helpers built on tracing spans
// ABOUTME: PerfTimer records elapsed time on drop and warns about slow operations

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{Level, Span, field, span, warn};

/// Records the elapsed time of an operation when dropped
pub struct PerfTimer {
    span: Span,
    start: Instant,
    operation: String,
    warn_threshold: Option<Duration>,
}

impl PerfTimer {
    pub fn new(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        let span =
            span!(Level::DEBUG, "perf_timer", operation = %operation, elapsed_ms = field::Empty);

        Self {
            span,
            start: Instant::now(),
            operation,
            warn_threshold: None,
        }
    }

    /// Log a warning when the operation takes longer than `threshold`
    pub fn with_warn_threshold(mut self, threshold: Duration) -> Self {
        self.warn_threshold = Some(threshold);
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop timing now and return the measured duration
    pub fn finish(self) -> Duration {
        self.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        #[allow(clippy::cast_precision_loss)]
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.span.record("elapsed_ms", elapsed_ms);

        if let Some(threshold) = self.warn_threshold
            && elapsed > threshold
        {
            let threshold_ms = u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX);
            warn!(
                operation = %self.operation,
                elapsed_ms,
                threshold_ms,
                "Slow operation detected"
            );
        }
    }
}

/// Time a block with a [`PerfTimer`]
#[macro_export]
macro_rules! timed {
    ($name:expr, $code:block) => {{
        let _timer = $crate::performance::PerfTimer::new($name);
        $code
    }};
    ($name:expr, warn_threshold: $threshold:expr, $code:block) => {{
        let _timer = $crate::performance::PerfTimer::new($name).with_warn_threshold($threshold);
        $code
    }};
}

/// Aggregated timing for one operation name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationStats {
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

impl OperationStats {
    pub fn average(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        self.total / u32::try_from(self.count).unwrap_or(u32::MAX)
    }
}

/// Per-operation timing aggregator
#[derive(Debug, Default)]
pub struct PerfStats {
    operations: HashMap<String, OperationStats>,
}

impl PerfStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_operation(&mut self, operation: &str, duration: Duration) {
        let stats = self
            .operations
            .entry(operation.to_string())
            .or_insert(OperationStats {
                count: 0,
                total: Duration::ZERO,
                max: Duration::ZERO,
            });
        stats.count += 1;
        stats.total += duration;
        stats.max = stats.max.max(duration);
    }

    pub fn get_stats(&self, operation: &str) -> Option<OperationStats> {
        self.operations.get(operation).copied()
    }

    pub fn total_count(&self) -> u64 {
        self.operations.values().map(|s| s.count).sum()
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tracing_mock::{expect, subscriber};

    #[test]
    fn test_perf_timer_measures_time() {
        let timer = PerfTimer::new("sleepy");
        thread::sleep(Duration::from_millis(10));
        assert!(timer.finish() >= Duration::from_millis(10));
    }

    #[test]
    fn test_perf_stats_aggregation() {
        let mut stats = PerfStats::new();
        stats.record_operation("deliver", Duration::from_millis(100));
        stats.record_operation("deliver", Duration::from_millis(300));
        stats.record_operation("refresh", Duration::from_millis(5));

        let deliver = stats.get_stats("deliver").unwrap();
        assert_eq!(deliver.count, 2);
        assert_eq!(deliver.total, Duration::from_millis(400));
        assert_eq!(deliver.max, Duration::from_millis(300));
        assert_eq!(deliver.average(), Duration::from_millis(200));
        assert_eq!(stats.total_count(), 3);

        stats.clear();
        assert!(stats.get_stats("deliver").is_none());
    }

    #[test]
    fn test_timed_macro_returns_block_value() {
        let value = timed!("answer", { 40 + 2 });
        assert_eq!(value, 42);
    }

    #[test]
    fn test_slow_operation_warning() {
        let (subscriber, handle) = subscriber::mock()
            .new_span(expect::span().named("perf_timer"))
            .event(expect::event().with_fields(expect::msg("Slow operation detected")))
            .drop_span(expect::span().named("perf_timer"))
            .only()
            .run_with_handle();

        tracing::subscriber::with_default(subscriber, || {
            let timer = PerfTimer::new("slow_task").with_warn_threshold(Duration::from_millis(1));
            thread::sleep(Duration::from_millis(10));
            drop(timer);
        });

        handle.assert_finished();
    }

    #[test]
    fn test_fast_operation_does_not_warn() {
        let (subscriber, handle) = subscriber::mock()
            .new_span(expect::span().named("perf_timer"))
            .drop_span(expect::span().named("perf_timer"))
            .only()
            .run_with_handle();

        tracing::subscriber::with_default(subscriber, || {
            let _timer = PerfTimer::new("fast_task").with_warn_threshold(Duration::from_secs(60));
        });

        handle.assert_finished();
    }
}
