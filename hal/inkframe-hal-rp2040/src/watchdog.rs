//! Shared hardware watchdog
//!
//! The RP2040 has one watchdog, but both the render path (from inside
//! decode loops and BUSY waits) and the firmware tasks need to reset it.
//! The peripheral is parked in a static and [`RpWatchdog`] is a zero-sized
//! handle that feeds it under a critical section.

use core::cell::RefCell;

use embassy_rp::watchdog::Watchdog;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Duration;

/// Longest timeout the RP2040 watchdog counter supports
pub const MAX_TIMEOUT_MS: u32 = 8_300;

static WATCHDOG: Mutex<CriticalSectionRawMutex, RefCell<Option<Watchdog>>> =
    Mutex::new(RefCell::new(None));

/// Handle to the armed hardware watchdog
///
/// Resets before [`RpWatchdog::arm`] are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpWatchdog;

impl RpWatchdog {
    /// Start the watchdog and park it for shared use
    ///
    /// The timeout is clamped to [`MAX_TIMEOUT_MS`]. The watchdog is paused
    /// while a debugger halts the core.
    pub fn arm(mut watchdog: Watchdog, timeout_ms: u32) -> Self {
        let timeout_ms = timeout_ms.min(MAX_TIMEOUT_MS);
        watchdog.pause_on_debug(true);
        watchdog.start(Duration::from_millis(timeout_ms as u64));
        WATCHDOG.lock(|cell| cell.replace(Some(watchdog)));
        #[cfg(feature = "defmt")]
        defmt::info!("watchdog armed, {} ms", timeout_ms);
        Self
    }
}

impl inkframe_hal::Watchdog for RpWatchdog {
    fn reset(&mut self) {
        WATCHDOG.lock(|cell| {
            if let Some(watchdog) = cell.borrow_mut().as_mut() {
                watchdog.feed();
            }
        });
    }
}
