use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Expired entries are swept once the map grows past this many identifiers.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_per_window: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_per_window: 5,
            window: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
struct WindowState {
    reset_at: Instant,
    count: u32,
}

/// Fixed-window submission counter keyed by hashed client identifier.
///
/// State lives in this process only: it resets on restart and is not shared
/// between instances.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<String, WindowState>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config: RateLimitConfig {
                max_per_window: config.max_per_window.max(1),
                ..config
            },
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn admit(&self, identifier: &str) -> bool {
        self.admit_at(identifier, Instant::now())
    }

    pub fn admit_at(&self, identifier: &str, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut windows = self.lock();
        if windows.len() >= PRUNE_THRESHOLD {
            windows.retain(|_, w| now <= w.reset_at);
        }

        match windows.get_mut(identifier) {
            Some(window) if now <= window.reset_at => {
                if window.count >= self.config.max_per_window {
                    false
                } else {
                    window.count += 1;
                    true
                }
            }
            _ => {
                windows.insert(
                    identifier.to_string(),
                    WindowState {
                        reset_at: now + self.config.window,
                        count: 1,
                    },
                );
                true
            }
        }
    }

    pub fn tracked_identifiers(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, WindowState>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
