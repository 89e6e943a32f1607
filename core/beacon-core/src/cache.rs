//! Status cache, emission history, and engine statistics.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a composed status stays valid for an unchanged prompt.
pub const CACHE_TTL: Duration = Duration::from_secs(60);

const MAX_HISTORY: usize = 10;
const RECENT_WINDOW: usize = 3;

/// Single-entry cache keyed by the fused prompt string, plus a bounded ring
/// of recently emitted statuses used to steer the storyteller away from
/// repeating itself. The history is a variety bias, not a correctness
/// constraint.
pub struct StatusCache {
    last_key: String,
    last_status: String,
    last_set: Option<Instant>,
    ttl: Duration,
    history: VecDeque<String>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            last_key: String::new(),
            last_status: String::new(),
            last_set: None,
            ttl,
            history: VecDeque::with_capacity(MAX_HISTORY),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let set_at = self.last_set?;
        if key == self.last_key && !self.last_status.is_empty() && set_at.elapsed() < self.ttl {
            Some(self.last_status.clone())
        } else {
            None
        }
    }

    pub fn set(&mut self, key: &str, status: &str) {
        self.last_key = key.to_string();
        self.last_status = status.to_string();
        self.last_set = Some(Instant::now());
        self.history.push_back(status.to_string());
        if self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }

    /// The last few emitted statuses, oldest first.
    pub fn recent(&self) -> Vec<String> {
        let skip = self.history.len().saturating_sub(RECENT_WINDOW);
        self.history.iter().skip(skip).cloned().collect()
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Composer statistics. Process-wide counters, reset only on restart; owned
/// by the composer rather than living at module scope.
pub struct EngineStats {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub cache_hits: u64,
    started: Instant,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            total_calls: 0,
            successful_calls: 0,
            failed_calls: 0,
            cache_hits: 0,
            started: Instant::now(),
        }
    }

    pub fn uptime(&self) -> String {
        let elapsed = self.started.elapsed().as_secs();
        let hours = elapsed / 3600;
        let minutes = (elapsed % 3600) / 60;
        let seconds = elapsed % 60;
        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else {
            format!("{}m {}s", minutes, seconds)
        }
    }

    pub fn success_rate(&self) -> String {
        if self.total_calls == 0 {
            return "N/A".to_string();
        }
        let rate = (self.successful_calls as f64 / self.total_calls as f64) * 100.0;
        format!("{:.0}%", rate)
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}
