use std::time::Duration;
use tracing::debug;

/// Default pause between per-item requests.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Fixed pause awaited after every detail page fetch and every download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        debug!("Throttling for {:?}", self.delay);
        tokio::time::sleep(self.delay).await;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::fixed(DEFAULT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_each_wait_lasts_the_delay() {
        let throttle = Throttle::default();
        let start = Instant::now();
        for _ in 0..4 {
            throttle.wait().await;
        }
        assert!(start.elapsed() >= DEFAULT_DELAY * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_none_does_not_wait() {
        let start = Instant::now();
        Throttle::none().wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
