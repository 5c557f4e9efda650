use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Token bucket shared by every outbound call.
///
/// Starts full; one token is added per `interval` up to `capacity`.
pub struct TokenBucket {
    capacity: u32,
    interval: Duration,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(interval: Duration, capacity: u32) -> Self {
        Self {
            capacity: capacity.max(1),
            interval: interval.max(Duration::from_nanos(1)),
            state: Mutex::new(BucketState {
                tokens: capacity.max(1),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Waits until a token is available and takes it.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.try_take() {
                None => return,
                Some(wait) => wait,
            };
            sleep(wait).await;
        }
    }

    /// Takes a token, or returns how long until the next one.
    fn try_take(&self) -> Option<Duration> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        let earned = (elapsed.as_nanos() / self.interval.as_nanos()) as u64;
        if earned > 0 {
            let refilled = (state.tokens as u64 + earned).min(self.capacity as u64);
            state.tokens = refilled as u32;
            state.last_refill = if state.tokens == self.capacity {
                now
            } else {
                state.last_refill + self.interval * earned as u32
            };
        }
        if state.tokens > 0 {
            state.tokens -= 1;
            None
        } else {
            Some(self.interval.saturating_sub(now.duration_since(state.last_refill)))
        }
    }
}
