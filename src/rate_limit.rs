use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Fixed window applied to the public subscribe endpoint.
const WINDOW: Duration = Duration::from_secs(15 * 60);
const MAX_REQUESTS: u32 = 20;

/// Upper bound on tracked client addresses. The LRU eviction keeps memory
/// flat no matter how many distinct addresses hit the endpoint.
const MAX_TRACKED_CLIENTS: usize = 10_000;

struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Per-client fixed-window counter over a bounded LRU map.
///
/// A client evicted by the LRU starts a fresh window on its next request,
/// which only ever errs in the caller's favour.
pub struct SubscribeRateLimiter {
    windows: Mutex<LruCache<String, WindowEntry>>,
    window: Duration,
    max_requests: u32,
}

impl SubscribeRateLimiter {
    pub fn new() -> Self {
        Self::with_policy(MAX_REQUESTS, WINDOW)
    }

    pub fn with_policy(max_requests: u32, window: Duration) -> Self {
        let capacity = NonZeroUsize::new(MAX_TRACKED_CLIENTS).unwrap_or(NonZeroUsize::MIN);
        Self {
            windows: Mutex::new(LruCache::new(capacity)),
            window,
            max_requests,
        }
    }

    /// Count one request from `client`. Returns false once the client has
    /// exhausted its budget for the current window.
    pub fn try_acquire(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match windows.get_mut(client) {
            Some(entry) => {
                if now > entry.reset_at {
                    // Window elapsed, reset lazily on touch
                    entry.count = 0;
                    entry.reset_at = now + self.window;
                }
                entry.count += 1;
                entry.count <= self.max_requests
            }
            None => {
                windows.put(
                    client.to_string(),
                    WindowEntry {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                self.max_requests >= 1
            }
        }
    }
}

impl Default for SubscribeRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
