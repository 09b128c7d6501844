use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shared minimum-interval gate for outbound requests.
///
/// One pacer is shared by every worker in a batch, so the request rate
/// stays bounded no matter how many fetches run concurrently — unlike the
/// per-worker sleep it replaces, which multiplies with the worker count.
pub struct Pacer {
    min_interval: Duration,
    next_slot: Mutex<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Wait for the next request slot, then claim it.
    pub async fn wait(&self) {
        let mut next = self.next_slot.lock().await;
        let now = Instant::now();
        if *next > now {
            tokio::time::sleep_until(*next).await;
        }
        *next = (*next).max(now) + self.min_interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn spaces_out_consecutive_claims() {
        let pacer = Pacer::new(Duration::from_secs(2));

        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;

        // First claim is immediate; the next two each wait a full interval.
        assert!(start.elapsed() >= Duration::from_secs(4));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
