//! Metrics collection and aggregation.
//!
//! The collector keeps a bounded ring of recent requests, a bounded log
//! ring, four one-minute-windowed time series, and lifetime counters,
//! all behind a single lock. Recording is O(1); readers get owned
//! snapshots.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::cache::PRICE_PER_TOKEN_USD;

const MAX_REQUESTS: usize = 1000;
const MAX_LOGS: usize = 100;
const MAX_HISTORY: usize = 60;
const RECENT_REQUESTS: usize = 50;
const WINDOW_SECS: i64 = 60;
const MAX_PROMPT_LEN: usize = 100;

/// A single time-series point.
#[derive(Debug, Clone, Serialize)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Metrics for a single proxied request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetric {
    pub timestamp: DateTime<Utc>,
    pub cache_hit: bool,
    pub similarity: f64,
    pub latency_ms: u64,
    pub tokens_saved: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub prompt: String,
}

/// Log severity for the live-log pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Hit,
    Miss,
    Info,
    Error,
}

/// A log entry in the bounded log ring.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// A histogram bucket with its count.
#[derive(Debug, Clone, Serialize)]
pub struct BucketCount {
    pub bucket: &'static str,
    pub count: u64,
}

/// The full performance report served at /reports/data.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub uptime: String,
    pub total_requests: u64,
    pub total_hits: u64,
    pub total_misses: u64,
    /// Percent in [0, 100].
    pub hit_rate: f64,
    pub avg_latency_ms: f64,
    pub total_savings_usd: f64,
    pub requests_per_min: f64,

    pub hit_rate_history: Vec<DataPoint>,
    pub latency_history: Vec<DataPoint>,
    pub savings_history: Vec<DataPoint>,
    pub throughput_history: Vec<DataPoint>,

    pub recent_requests: Vec<RequestMetric>,

    pub latency_distribution: Vec<BucketCount>,
    pub similarity_distribution: Vec<BucketCount>,
}

/// Fixed-capacity ring buffer with an explicit write index, so recording
/// stays O(1) at burst rates.
struct Ring<T> {
    buf: Vec<T>,
    cap: usize,
    /// Next write position once the buffer is full.
    next: usize,
}

impl<T: Clone> Ring<T> {
    fn new(cap: usize) -> Self {
        Self { buf: Vec::with_capacity(cap), cap, next: 0 }
    }

    fn push(&mut self, item: T) {
        if self.buf.len() < self.cap {
            self.buf.push(item);
        } else {
            self.buf[self.next] = item;
        }
        self.next = (self.next + 1) % self.cap;
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn clear(&mut self) {
        self.buf.clear();
        self.next = 0;
    }

    /// Items newest-first.
    fn iter_newest_first(&self) -> impl Iterator<Item = &T> {
        let len = self.buf.len();
        let newest = if len == 0 {
            0
        } else if len < self.cap {
            len - 1
        } else {
            (self.next + self.cap - 1) % self.cap
        };
        (0..len).map(move |i| &self.buf[(newest + len - i) % len])
    }

    /// Items oldest-first.
    fn to_vec_oldest_first(&self) -> Vec<T> {
        let mut out: Vec<T> = self.iter_newest_first().cloned().collect();
        out.reverse();
        out
    }
}

struct Inner {
    requests: Ring<RequestMetric>,
    logs: Ring<LogEntry>,

    hit_rate_history: Vec<DataPoint>,
    latency_history: Vec<DataPoint>,
    savings_history: Vec<DataPoint>,
    throughput_history: Vec<DataPoint>,

    window_start: DateTime<Utc>,
    window_hits: u64,
    window_misses: u64,
    window_latency_ms: u64,
    window_savings: f64,

    total_requests: u64,
    total_hits: u64,
    total_misses: u64,
    total_latency_ms: u64,
    total_savings: f64,

    // Lifetime bucket counters, so the distributions stay exact after
    // the request ring wraps.
    latency_buckets: [u64; 5],
    similarity_buckets: [u64; 5],
}

/// Collects and aggregates performance metrics over time.
pub struct Collector {
    inner: RwLock<Inner>,
    start_time: DateTime<Utc>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            inner: RwLock::new(Inner {
                requests: Ring::new(MAX_REQUESTS),
                logs: Ring::new(MAX_LOGS),
                hit_rate_history: Vec::with_capacity(MAX_HISTORY),
                latency_history: Vec::with_capacity(MAX_HISTORY),
                savings_history: Vec::with_capacity(MAX_HISTORY),
                throughput_history: Vec::with_capacity(MAX_HISTORY),
                window_start: now,
                window_hits: 0,
                window_misses: 0,
                window_latency_ms: 0,
                window_savings: 0.0,
                total_requests: 0,
                total_hits: 0,
                total_misses: 0,
                total_latency_ms: 0,
                total_savings: 0.0,
                latency_buckets: [0; 5],
                similarity_buckets: [0; 5],
            }),
            start_time: now,
        }
    }

    /// Record metrics for a single request.
    pub fn record_request(
        &self,
        cache_hit: bool,
        similarity: f64,
        latency_ms: u64,
        tokens_saved: u32,
        prompt: &str,
    ) {
        let now = Utc::now();
        let mut inner = self.inner.write();

        if (now - inner.window_start).num_seconds() >= WINDOW_SECS {
            inner.rotate_window(now);
        }

        inner.requests.push(RequestMetric {
            timestamp: now,
            cache_hit,
            similarity,
            latency_ms,
            tokens_saved,
            prompt: truncate(prompt, MAX_PROMPT_LEN),
        });

        if cache_hit {
            inner.window_hits += 1;
            inner.total_hits += 1;
            inner.similarity_buckets[similarity_bucket(similarity)] += 1;
        } else {
            inner.window_misses += 1;
            inner.total_misses += 1;
        }
        inner.window_latency_ms += latency_ms;
        inner.total_latency_ms += latency_ms;
        inner.total_requests += 1;
        inner.latency_buckets[latency_bucket(latency_ms)] += 1;

        if cache_hit && tokens_saved > 0 {
            let savings = f64::from(tokens_saved) * PRICE_PER_TOKEN_USD;
            inner.window_savings += savings;
            inner.total_savings += savings;
        }
    }

    /// Add an entry to the bounded log ring.
    pub fn add_log(&self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry { timestamp: Utc::now(), level, message: message.into() };
        self.inner.write().logs.push(entry);
    }

    /// Recent log entries, oldest first. Returns a copy.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.inner.read().logs.to_vec_oldest_first()
    }

    /// Clear the log ring.
    pub fn clear_logs(&self) {
        self.inner.write().logs.clear();
    }

    /// Snapshot the current performance report.
    pub fn report(&self) -> Report {
        let inner = self.inner.read();
        let now = Utc::now();
        let uptime = now - self.start_time;

        let (hit_rate, avg_latency) = if inner.total_requests > 0 {
            (
                inner.total_hits as f64 / inner.total_requests as f64 * 100.0,
                inner.total_latency_ms as f64 / inner.total_requests as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let uptime_mins = uptime.num_milliseconds() as f64 / 60_000.0;
        let requests_per_min = if uptime_mins > 0.0 {
            inner.total_requests as f64 / uptime_mins
        } else {
            0.0
        };

        let recent_requests = inner
            .requests
            .iter_newest_first()
            .take(RECENT_REQUESTS)
            .cloned()
            .collect();

        Report {
            uptime: format_uptime(uptime),
            total_requests: inner.total_requests,
            total_hits: inner.total_hits,
            total_misses: inner.total_misses,
            hit_rate,
            avg_latency_ms: avg_latency,
            total_savings_usd: inner.total_savings,
            requests_per_min,
            hit_rate_history: inner.hit_rate_history.clone(),
            latency_history: inner.latency_history.clone(),
            savings_history: inner.savings_history.clone(),
            throughput_history: inner.throughput_history.clone(),
            recent_requests,
            latency_distribution: LATENCY_BUCKETS
                .iter()
                .zip(inner.latency_buckets.iter())
                .map(|(bucket, count)| BucketCount { bucket, count: *count })
                .collect(),
            similarity_distribution: SIMILARITY_BUCKETS
                .iter()
                .zip(inner.similarity_buckets.iter())
                .map(|(bucket, count)| BucketCount { bucket, count: *count })
                .collect(),
        }
    }
}

impl Inner {
    /// Close the current window, appending one point to each history if
    /// the window saw any requests, and start a new window.
    fn rotate_window(&mut self, now: DateTime<Utc>) {
        let total = self.window_hits + self.window_misses;
        if total > 0 {
            let hit_rate = self.window_hits as f64 / total as f64;
            let avg_latency = self.window_latency_ms as f64 / total as f64;
            let window_start = self.window_start;

            append_with_limit(
                &mut self.hit_rate_history,
                DataPoint { timestamp: window_start, value: hit_rate * 100.0 },
            );
            append_with_limit(
                &mut self.latency_history,
                DataPoint { timestamp: window_start, value: avg_latency },
            );
            append_with_limit(
                &mut self.savings_history,
                DataPoint { timestamp: window_start, value: self.window_savings },
            );
            append_with_limit(
                &mut self.throughput_history,
                DataPoint { timestamp: window_start, value: total as f64 },
            );
        }

        self.window_start = now;
        self.window_hits = 0;
        self.window_misses = 0;
        self.window_latency_ms = 0;
        self.window_savings = 0.0;
    }
}

const LATENCY_BUCKETS: [&str; 5] = ["0-10ms", "10-50ms", "50-100ms", "100-500ms", "500ms+"];
const SIMILARITY_BUCKETS: [&str; 5] = ["0.99-1.0", "0.97-0.99", "0.95-0.97", "0.90-0.95", "<0.90"];

fn latency_bucket(latency_ms: u64) -> usize {
    match latency_ms {
        0..=9 => 0,
        10..=49 => 1,
        50..=99 => 2,
        100..=499 => 3,
        _ => 4,
    }
}

fn similarity_bucket(similarity: f64) -> usize {
    if similarity >= 0.99 {
        0
    } else if similarity >= 0.97 {
        1
    } else if similarity >= 0.95 {
        2
    } else if similarity >= 0.90 {
        3
    } else {
        4
    }
}

fn append_with_limit(history: &mut Vec<DataPoint>, point: DataPoint) {
    if history.len() >= MAX_HISTORY {
        history.remove(0);
    }
    history.push(point);
}

/// Truncate to at most `max` characters, ellipsis included, never
/// splitting a character.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}

/// Format an uptime as `XdYhZm` / `XhYm` / `Xm`.
fn format_uptime(d: chrono::Duration) -> String {
    let days = d.num_hours() / 24;
    let hours = d.num_hours() % 24;
    let mins = d.num_minutes() % 60;

    if days > 0 {
        format!("{days}d {hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_record_request_totals() {
        let collector = Collector::new();

        collector.record_request(true, 0.98, 5, 500, "hello");
        let report = collector.report();
        assert_eq!(report.total_requests, 1);
        assert_eq!(report.total_hits, 1);
        assert_eq!(report.total_misses, 0);

        collector.record_request(false, 0.0, 100, 0, "hello");
        let report = collector.report();
        assert_eq!(report.total_requests, 2);
        assert_eq!(report.total_misses, 1);
    }

    #[test]
    fn test_report_derived_values() {
        let collector = Collector::new();

        collector.record_request(true, 0.99, 5, 500, "a");
        collector.record_request(true, 0.97, 10, 600, "b");
        collector.record_request(false, 0.0, 150, 0, "c");
        collector.record_request(false, 0.0, 200, 0, "d");

        let report = collector.report();
        assert_eq!(report.total_requests, 4);
        assert_eq!(report.total_hits, 2);
        assert_eq!(report.total_misses, 2);
        assert!((report.hit_rate - 50.0).abs() < f64::EPSILON);
        // (5 + 10 + 150 + 200) / 4 = 91.25
        assert!((report.avg_latency_ms - 91.25).abs() < f64::EPSILON);
        let expected_savings = 1100.0 * PRICE_PER_TOKEN_USD;
        assert!((report.total_savings_usd - expected_savings).abs() < 1e-12);
    }

    #[test]
    fn test_savings_only_for_hits_with_tokens() {
        let collector = Collector::new();

        collector.record_request(false, 0.0, 10, 500, "miss with tokens");
        collector.record_request(true, 0.99, 10, 0, "hit without tokens");

        let report = collector.report();
        assert_eq!(report.total_savings_usd, 0.0);
    }

    #[test]
    fn test_latency_distribution() {
        let collector = Collector::new();

        collector.record_request(false, 0.0, 5, 0, "");
        collector.record_request(false, 0.0, 25, 0, "");
        collector.record_request(false, 0.0, 75, 0, "");
        collector.record_request(false, 0.0, 200, 0, "");
        collector.record_request(false, 0.0, 1000, 0, "");

        let report = collector.report();
        for bucket in &report.latency_distribution {
            assert_eq!(bucket.count, 1, "bucket {}", bucket.bucket);
        }

        let total: u64 = report.latency_distribution.iter().map(|b| b.count).sum();
        assert_eq!(total, report.total_requests);
    }

    #[test]
    fn test_similarity_distribution_hits_only() {
        let collector = Collector::new();

        collector.record_request(true, 1.0, 5, 100, "");
        collector.record_request(true, 0.98, 5, 100, "");
        collector.record_request(true, 0.96, 5, 100, "");
        collector.record_request(true, 0.92, 5, 100, "");
        collector.record_request(true, 0.85, 5, 100, "");
        collector.record_request(false, 0.0, 100, 0, "");

        let report = collector.report();
        for bucket in &report.similarity_distribution {
            assert_eq!(bucket.count, 1, "bucket {}", bucket.bucket);
        }

        let total: u64 = report.similarity_distribution.iter().map(|b| b.count).sum();
        assert_eq!(total, report.total_hits);
    }

    #[test]
    fn test_recent_requests_capped_and_newest_first() {
        let collector = Collector::new();

        for i in 0..60 {
            collector.record_request(i % 2 == 0, 0.95, i, 100, &format!("prompt {i}"));
        }

        let report = collector.report();
        assert_eq!(report.recent_requests.len(), 50);
        assert_eq!(report.recent_requests[0].latency_ms, 59);
        assert_eq!(report.recent_requests[49].latency_ms, 10);
    }

    #[test]
    fn test_request_ring_wraps() {
        let collector = Collector::new();

        for i in 0..(MAX_REQUESTS as u64 + 200) {
            collector.record_request(false, 0.0, i, 0, "");
        }

        let inner = collector.inner.read();
        assert_eq!(inner.requests.len(), MAX_REQUESTS);
        // The retained items are the last MAX_REQUESTS inserted.
        let newest: Vec<u64> = inner
            .requests
            .iter_newest_first()
            .take(3)
            .map(|m| m.latency_ms)
            .collect();
        assert_eq!(newest, vec![1199, 1198, 1197]);
        let oldest = inner.requests.to_vec_oldest_first();
        assert_eq!(oldest[0].latency_ms, 200);
    }

    #[test]
    fn test_prompt_truncation() {
        let collector = Collector::new();
        let long_prompt = "x".repeat(150);
        collector.record_request(false, 0.0, 1, 0, &long_prompt);

        let report = collector.report();
        let stored = &report.recent_requests[0].prompt;
        assert_eq!(stored.chars().count(), 100);
        assert!(stored.ends_with("..."));
    }

    #[test]
    fn test_logs_ring() {
        let collector = Collector::new();

        for i in 0..(MAX_LOGS + 10) {
            collector.add_log(LogLevel::Info, format!("message {i}"));
        }

        let logs = collector.logs();
        assert_eq!(logs.len(), MAX_LOGS);
        assert_eq!(logs[0].message, "message 10");
        assert_eq!(logs[MAX_LOGS - 1].message, format!("message {}", MAX_LOGS + 9));

        collector.clear_logs();
        assert!(collector.logs().is_empty());
    }

    #[test]
    fn test_log_level_serialization() {
        assert_eq!(serde_json::to_string(&LogLevel::Hit).unwrap(), "\"hit\"");
        assert_eq!(serde_json::to_string(&LogLevel::Miss).unwrap(), "\"miss\"");
        assert_eq!(serde_json::to_string(&LogLevel::Info).unwrap(), "\"info\"");
        assert_eq!(serde_json::to_string(&LogLevel::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn test_window_rotation_emits_points() {
        let collector = Collector::new();

        collector.record_request(true, 0.99, 10, 100, "");
        collector.record_request(false, 0.0, 30, 0, "");

        // Force the window boundary into the past, then record to
        // trigger rotation.
        {
            let mut inner = collector.inner.write();
            inner.window_start = Utc::now() - Duration::seconds(WINDOW_SECS + 1);
        }
        collector.record_request(false, 0.0, 50, 0, "");

        let report = collector.report();
        assert_eq!(report.hit_rate_history.len(), 1);
        assert!((report.hit_rate_history[0].value - 50.0).abs() < f64::EPSILON);
        assert_eq!(report.latency_history.len(), 1);
        assert!((report.latency_history[0].value - 20.0).abs() < f64::EPSILON);
        assert_eq!(report.throughput_history.len(), 1);
        assert!((report.throughput_history[0].value - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_window_emits_no_point() {
        let collector = Collector::new();

        {
            let mut inner = collector.inner.write();
            inner.window_start = Utc::now() - Duration::seconds(WINDOW_SECS + 1);
        }
        // First record after a quiet window rotates it; the quiet window
        // contributes nothing.
        collector.record_request(false, 0.0, 10, 0, "");

        let report = collector.report();
        assert!(report.hit_rate_history.is_empty());
        assert!(report.throughput_history.is_empty());
    }

    #[test]
    fn test_history_capped() {
        let mut history = Vec::new();
        for i in 0..(MAX_HISTORY + 5) {
            append_with_limit(
                &mut history,
                DataPoint { timestamp: Utc::now(), value: i as f64 },
            );
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].value, 5.0);
        assert_eq!(history[MAX_HISTORY - 1].value, (MAX_HISTORY + 4) as f64);
    }

    #[test]
    fn test_format_uptime() {
        let cases = [
            (Duration::minutes(30), "30m"),
            (Duration::minutes(90), "1h 30m"),
            (Duration::hours(25), "1d 1h 0m"),
            (Duration::hours(50), "2d 2h 0m"),
        ];
        for (duration, expected) in cases {
            assert_eq!(format_uptime(duration), expected);
        }
    }

    #[test]
    fn test_truncate_char_boundary() {
        let s = "é".repeat(150);
        let out = truncate(&s, 100);
        assert_eq!(out.chars().count(), 100);
        assert!(out.ends_with("..."));
    }
}
