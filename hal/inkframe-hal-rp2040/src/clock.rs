//! Clock backed by the embassy time driver

use embassy_time::Instant;
use inkframe_hal::Clock;

/// Milliseconds since boot from `embassy_time`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
