use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_LATENCY_HISTORY: usize = 512;

#[derive(Debug, Clone, Default)]
struct CallMetrics {
    total_calls: u64,
    failed_calls: u64,
    timeouts: u64,
    latencies: VecDeque<u64>, // microseconds
}

/// Latency and outcome bookkeeping for backend calls. Cloning shares the same counters.
#[derive(Clone)]
pub struct GatewayMetrics {
    state: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    calls: CallMetrics,
    max_history: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Succeeded,
    Failed,
    TimedOut,
}

impl GatewayMetrics {
    pub fn new(max_history: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MetricsState {
                calls: CallMetrics::default(),
                max_history: max_history.max(1),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        // Counters stay usable even if a recording thread panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_call(&self, latency_us: u64, outcome: CallOutcome) {
        let mut state = self.lock();
        state.calls.total_calls += 1;
        match outcome {
            CallOutcome::Succeeded => {}
            CallOutcome::Failed => state.calls.failed_calls += 1,
            CallOutcome::TimedOut => {
                state.calls.failed_calls += 1;
                state.calls.timeouts += 1;
            }
        }
        state.calls.latencies.push_back(latency_us);
        if state.calls.latencies.len() > state.max_history {
            state.calls.latencies.pop_front();
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        let c = &state.calls;

        let mut sorted_latencies: Vec<u64> = c.latencies.iter().copied().collect();
        sorted_latencies.sort_unstable();

        let failure_rate = if c.total_calls > 0 {
            c.failed_calls as f32 / c.total_calls as f32
        } else {
            0.0
        };

        MetricsSnapshot {
            total_calls: c.total_calls,
            failed_calls: c.failed_calls,
            timeouts: c.timeouts,
            failure_rate,
            p50: percentile(&sorted_latencies, 50.0),
            p95: percentile(&sorted_latencies, 95.0),
            p99: percentile(&sorted_latencies, 99.0),
            history_count: c.latencies.len(),
        }
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY_HISTORY)
    }
}

fn percentile(sorted: &[u64], p: f32) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((p / 100.0) * (sorted.len() as f32)).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub total_calls: u64,
    pub failed_calls: u64,
    pub timeouts: u64,
    pub failure_rate: f32,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub history_count: usize,
}
