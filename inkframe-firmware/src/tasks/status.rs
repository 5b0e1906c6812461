//! Status LED task
//!
//! Blinks the on-board LED so liveness is visible while the frame is idle.
//! The blink pauses while a render holds the executor.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

/// Status LED task - toggles the LED every `interval_ms`
#[embassy_executor::task]
pub async fn status_led_task(mut led: Output<'static>, interval_ms: u32) {
    info!("Status LED task started ({} ms)", interval_ms);

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms as u64));

    loop {
        led.toggle();
        ticker.next().await;
    }
}
