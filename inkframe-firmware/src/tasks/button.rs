//! Redraw button task
//!
//! A press (active low, debounced) requests a redraw of the stored image.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use crate::channels::CONTENT_CHANGED;

/// Time the button must stay pressed to count
const DEBOUNCE_MS: u64 = 50;

/// Redraw button task - signals `CONTENT_CHANGED` on each press
#[embassy_executor::task]
pub async fn redraw_button_task(mut button: Input<'static>) {
    info!("Redraw button task started");

    loop {
        button.wait_for_falling_edge().await;
        Timer::after_millis(DEBOUNCE_MS).await;

        if button.is_low() {
            info!("Redraw requested");
            CONTENT_CHANGED.signal(());
            button.wait_for_high().await;
        }
    }
}
