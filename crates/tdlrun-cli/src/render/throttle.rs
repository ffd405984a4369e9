//! Per-key rate limiting for progress output.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Rate-limiter keyed by file identifier.
///
/// `tdl` redraws every active file several times a second; plain output
/// only needs an occasional line per file.
pub struct KeyedThrottle {
    last_emit: HashMap<String, Instant>,
    min_interval: Duration,
}

impl KeyedThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: HashMap::new(),
            min_interval,
        }
    }

    /// Check whether `key` may emit now, recording the emission if so.
    pub fn should_emit(&mut self, key: &str) -> bool {
        let now = Instant::now();
        match self.last_emit.get_mut(key) {
            Some(last) if now.duration_since(*last) < self.min_interval => false,
            Some(last) => {
                *last = now;
                true
            }
            None => {
                self.last_emit.insert(key.to_string(), now);
                true
            }
        }
    }

    /// Drop state for a key that will not emit again.
    pub fn forget(&mut self, key: &str) {
        self.last_emit.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_emit_per_key() {
        let mut throttle = KeyedThrottle::new(Duration::from_secs(60));
        assert!(throttle.should_emit("a"));
        assert!(throttle.should_emit("b"));
        assert!(!throttle.should_emit("a"));
    }

    #[test]
    fn test_respects_interval() {
        let mut throttle = KeyedThrottle::new(Duration::from_millis(50));
        assert!(throttle.should_emit("a"));
        assert!(!throttle.should_emit("a"));

        std::thread::sleep(Duration::from_millis(60));
        assert!(throttle.should_emit("a"));
    }

    #[test]
    fn test_forget() {
        let mut throttle = KeyedThrottle::new(Duration::from_secs(60));
        throttle.should_emit("a");
        throttle.forget("a");
        assert!(throttle.should_emit("a"));
    }
}
