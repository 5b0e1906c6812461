//! Watchdog abstractions
//!
//! The pipeline only needs to reset the watchdog. Arming it, choosing the
//! timeout and registering tasks belong to the board setup code.

use embedded_hal::delay::DelayNs;

/// Hardware watchdog handle
///
/// `reset` must never block: it is called from inside decode loops.
pub trait Watchdog {
    /// Reset the watchdog deadline
    fn reset(&mut self);
}

impl<W: Watchdog + ?Sized> Watchdog for &mut W {
    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Watchdog that does nothing
///
/// For hosts without a watchdog and for code paths that run before the
/// hardware watchdog is armed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWatchdog;

impl Watchdog for NoWatchdog {
    fn reset(&mut self) {}
}

/// Delay provider that resets a watchdog around every delay
///
/// Drivers that poll a BUSY line with short delays can be handed this
/// instead of a plain delay, so a multi-second panel refresh never starves
/// the watchdog.
pub struct FeedingDelay<D, W> {
    delay: D,
    watchdog: W,
}

impl<D: DelayNs, W: Watchdog> FeedingDelay<D, W> {
    /// Wrap a delay provider
    pub fn new(delay: D, watchdog: W) -> Self {
        Self { delay, watchdog }
    }

    /// Consume the wrapper and return its parts
    pub fn into_inner(self) -> (D, W) {
        (self.delay, self.watchdog)
    }
}

impl<D: DelayNs, W: Watchdog> DelayNs for FeedingDelay<D, W> {
    fn delay_ns(&mut self, ns: u32) {
        self.watchdog.reset();
        self.delay.delay_ns(ns);
        self.watchdog.reset();
    }
}
