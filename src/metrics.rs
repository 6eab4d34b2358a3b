//! Prometheus-compatible metrics
//!
//! Counters and gauges for the running game, readable as Prometheus text or JSON.
//! With the `metrics_server` feature a tiny HTTP endpoint serves them.
//! Default endpoint: http://localhost:9090/metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::game::constants::physics::TICK_DURATION_MS;

const TICK_HISTORY_LEN: usize = 1000;

/// Metrics registry for the game session
#[derive(Debug)]
pub struct Metrics {
    // Matches
    pub matches_started: AtomicU64,
    pub matches_ended: AtomicU64,
    pub current_score: AtomicU64,
    pub best_score: AtomicU64,

    // Obstacle
    pub obstacles_spawned: AtomicU64,
    pub obstacles_dodged: AtomicU64,

    // Input
    pub inputs_applied: AtomicU64,
    pub inputs_ignored: AtomicU64,

    // Tick timing (microseconds)
    pub tick_time_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,
    pub tick_time_p99_us: AtomicU64,
    pub tick_time_max_us: AtomicU64,
    pub budget_usage_percent: AtomicU64,

    /// Session ticks (driver wakeups), not engine update ticks
    pub tick_count: AtomicU64,

    start_time: Instant,

    tick_history: RwLock<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            matches_started: AtomicU64::new(0),
            matches_ended: AtomicU64::new(0),
            current_score: AtomicU64::new(0),
            best_score: AtomicU64::new(0),
            obstacles_spawned: AtomicU64::new(0),
            obstacles_dodged: AtomicU64::new(0),
            inputs_applied: AtomicU64::new(0),
            inputs_ignored: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            tick_time_p99_us: AtomicU64::new(0),
            tick_time_max_us: AtomicU64::new(0),
            budget_usage_percent: AtomicU64::new(0),
            tick_count: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(TICK_HISTORY_LEN)),
        }
    }

    /// Record how long one session tick took and refresh the percentiles
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        self.budget_usage_percent
            .store(us * 100 / (TICK_DURATION_MS * 1000), Ordering::Relaxed);

        let mut history = self.tick_history.write();
        history.push_back(us);
        while history.len() > TICK_HISTORY_LEN {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();

            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            let p99_idx = (sorted.len() as f32 * 0.99) as usize;

            self.tick_time_p95_us.store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.tick_time_p99_us.store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.tick_time_max_us.store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    /// Store the live score and raise the best score if beaten
    pub fn record_score(&self, score: u32) {
        self.current_score.store(score as u64, Ordering::Relaxed);
        self.best_score.fetch_max(score as u64, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Prometheus text exposition format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("ghost_dodge_matches_started_total", "Matches started", "counter",
            self.matches_started.load(Ordering::Relaxed));
        metric!("ghost_dodge_matches_ended_total", "Matches ended", "counter",
            self.matches_ended.load(Ordering::Relaxed));
        metric!("ghost_dodge_score", "Score of the current or last match", "gauge",
            self.current_score.load(Ordering::Relaxed));
        metric!("ghost_dodge_best_score", "Best score since startup", "gauge",
            self.best_score.load(Ordering::Relaxed));

        metric!("ghost_dodge_obstacles_spawned_total", "Obstacles spawned", "counter",
            self.obstacles_spawned.load(Ordering::Relaxed));
        metric!("ghost_dodge_obstacles_dodged_total", "Obstacles that retired without a collision", "counter",
            self.obstacles_dodged.load(Ordering::Relaxed));

        metric!("ghost_dodge_inputs_applied_total", "Input commands that changed state", "counter",
            self.inputs_applied.load(Ordering::Relaxed));
        metric!("ghost_dodge_inputs_ignored_total", "Input commands ignored in the current phase", "counter",
            self.inputs_ignored.load(Ordering::Relaxed));

        metric!("ghost_dodge_tick_time_microseconds", "Current tick time in microseconds", "gauge",
            self.tick_time_us.load(Ordering::Relaxed));
        metric!("ghost_dodge_tick_time_p95_microseconds", "95th percentile tick time", "gauge",
            self.tick_time_p95_us.load(Ordering::Relaxed));
        metric!("ghost_dodge_tick_time_p99_microseconds", "99th percentile tick time", "gauge",
            self.tick_time_p99_us.load(Ordering::Relaxed));
        metric!("ghost_dodge_tick_time_max_microseconds", "Maximum tick time", "gauge",
            self.tick_time_max_us.load(Ordering::Relaxed));
        metric!("ghost_dodge_budget_usage_percent", "Tick budget usage percentage", "gauge",
            self.budget_usage_percent.load(Ordering::Relaxed));
        metric!("ghost_dodge_tick_count", "Total ticks processed", "counter",
            self.tick_count.load(Ordering::Relaxed));
        metric!("ghost_dodge_uptime_seconds", "Process uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }

    /// JSON view of the same values
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "matches": {
                "started": self.matches_started.load(Ordering::Relaxed),
                "ended": self.matches_ended.load(Ordering::Relaxed),
                "score": self.current_score.load(Ordering::Relaxed),
                "best_score": self.best_score.load(Ordering::Relaxed),
            },
            "obstacles": {
                "spawned": self.obstacles_spawned.load(Ordering::Relaxed),
                "dodged": self.obstacles_dodged.load(Ordering::Relaxed),
            },
            "input": {
                "applied": self.inputs_applied.load(Ordering::Relaxed),
                "ignored": self.inputs_ignored.load(Ordering::Relaxed),
            },
            "performance": {
                "tick_time_us": self.tick_time_us.load(Ordering::Relaxed),
                "tick_time_p95_us": self.tick_time_p95_us.load(Ordering::Relaxed),
                "tick_time_p99_us": self.tick_time_p99_us.load(Ordering::Relaxed),
                "tick_time_max_us": self.tick_time_max_us.load(Ordering::Relaxed),
                "budget_percent": self.budget_usage_percent.load(Ordering::Relaxed),
                "tick_count": self.tick_count.load(Ordering::Relaxed),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
        .to_string()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics_server")]
pub use server::start_metrics_server;

#[cfg(feature = "metrics_server")]
mod server {
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tracing::{debug, info};

    use super::Metrics;

    fn http_response(content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            content_type,
            body.len(),
            body
        )
    }

    /// Build the response for one raw HTTP request
    pub(super) fn route(metrics: &Metrics, request: &str) -> String {
        if request.starts_with("GET /metrics/json") || request.starts_with("GET /json") {
            http_response("application/json", &metrics.to_json())
        } else if request.starts_with("GET /metrics") {
            http_response("text/plain; version=0.0.4", &metrics.to_prometheus())
        } else if request.starts_with("GET /health") || request.starts_with("GET / ") {
            http_response("text/plain", "OK")
        } else {
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
        }
    }

    /// Serve metrics until the listener fails
    pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> anyhow::Result<()> {
        let addr = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&addr).await?;

        info!("Metrics server listening on http://{}/metrics", addr);

        loop {
            let (mut socket, peer) = listener.accept().await?;
            let metrics = metrics.clone();

            tokio::spawn(async move {
                let mut buffer = [0u8; 1024];

                match socket.read(&mut buffer).await {
                    Ok(n) if n > 0 => {
                        let request = String::from_utf8_lossy(&buffer[..n]);
                        let response = route(&metrics, &request);
                        if let Err(e) = socket.write_all(response.as_bytes()).await {
                            debug!("Failed to write metrics response to {}: {}", peer, e);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Failed to read from metrics socket {}: {}", peer, e);
                    }
                }
            });
        }
    }
}
