//! Render task
//!
//! Owns the frame and drives it from a fixed ticker:
//! - Turns `CONTENT_CHANGED` into scheduler requests
//! - Advances the scheduler, which resets the watchdog every tick
//! - Puts the panel to sleep after each render

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_rp::peripherals::SPI1;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::{Delay, Duration, Ticker};
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};

use inkframe_core::{Frame, RenderDriver};
use inkframe_epd::Uc8159;
use inkframe_hal::FeedingDelay;
use inkframe_hal_rp2040::{EmbassyClock, FlashImageStorage, RpWatchdog};

use crate::channels::CONTENT_CHANGED;

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 100;

/// Panel SPI device (chip select owned by the device)
pub type PanelSpi = ExclusiveDevice<Spi<'static, SPI1, Blocking>, Output<'static>, NoDelay>;

/// Panel driver, feeding the watchdog while it waits on BUSY
pub type Panel = Uc8159<PanelSpi, Output<'static>, Output<'static>, Input<'static>, FeedingDelay<Delay, RpWatchdog>>;

/// Frame context with the board's concrete parts
pub type AppFrame = Frame<'static, FlashImageStorage<'static>, Panel, RpWatchdog, EmbassyClock>;

/// Render task - ticks the frame and runs scheduled renders
///
/// Renders block the executor for the length of the decode and refresh;
/// the watchdog is reset from inside that work.
#[embassy_executor::task]
pub async fn render_task(mut frame: AppFrame) {
    info!("Render task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        ticker.next().await;

        if CONTENT_CHANGED.try_take().is_some() {
            frame.trigger_render();
        }

        match frame.poll() {
            Some(Ok(report)) => {
                info!(
                    "Rendered {} rows in {} ms (truncated: {})",
                    report.rows,
                    report.elapsed_ms,
                    report.truncated
                );
                sleep_panel(&mut frame);
            }
            Some(Err(_)) => {
                // Frame already logged the cause
                sleep_panel(&mut frame);
            }
            None => {}
        }
    }
}

fn sleep_panel(frame: &mut AppFrame) {
    if let Err(e) = frame.driver_mut().sleep() {
        warn!("Panel sleep failed: {:?}", e);
    }
}
