//! Inkframe - Tri-color E-Paper Picture Frame Firmware
//!
//! Main firmware binary for an RP2040 driving a 7.5" black/white/red
//! panel. Shows the image stored in the flash image partition, redrawing
//! it whenever the content changes or the redraw button is pressed.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::spi::{self, Spi};
use embassy_rp::watchdog::Watchdog;
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use inkframe_core::{Frame, RowBuffers};
use inkframe_epd::{PanelConfig, Uc8159};
use inkframe_hal::FeedingDelay;
use inkframe_hal_rp2040::{EmbassyClock, FlashImageStorage, RpWatchdog};

use crate::config::load_config;

mod channels;
mod config;
mod tasks;

/// Panel SPI clock
const SPI_FREQUENCY_HZ: u32 = 4_000_000;

// Decode buffers (must live forever for the frame)
static ROW_BUFFERS: StaticCell<RowBuffers> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Inkframe firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Load configuration from flash (or use embedded defaults)
    let mut storage = FlashImageStorage::new(p.FLASH);
    let config = load_config(&mut storage);

    // Arm the watchdog before touching the panel; from here on every
    // blocking stretch must reset it
    let watchdog = RpWatchdog::arm(Watchdog::new(p.WATCHDOG), config.watchdog.timeout_ms);

    // Setup SPI1 for the panel
    // Pin assignments are board-specific (Pico-ePaper: CLK=GPIO10, MOSI=GPIO11,
    // CS=GPIO9, DC=GPIO8, RST=GPIO12, BUSY=GPIO13)
    let spi_config = {
        let mut cfg = spi::Config::default();
        cfg.frequency = SPI_FREQUENCY_HZ;
        cfg
    };
    let spi_bus = Spi::new_blocking_txonly(p.SPI1, p.PIN_10, p.PIN_11, spi_config);
    let cs = Output::new(p.PIN_9, Level::High);
    let spi_dev = match ExclusiveDevice::new_no_delay(spi_bus, cs) {
        Ok(dev) => dev,
        Err(e) => match e {},
    };

    let dc = Output::new(p.PIN_8, Level::Low);
    let rst = Output::new(p.PIN_12, Level::High);
    let busy = Input::new(p.PIN_13, Pull::None);

    let panel = Uc8159::new(
        spi_dev,
        dc,
        rst,
        busy,
        FeedingDelay::new(Delay, watchdog),
        PanelConfig {
            width: config.display.width,
            height: config.display.height,
            ..PanelConfig::default()
        },
    );

    info!("Panel SPI initialized");

    // Status LED (Pico on-board LED: GPIO25) and redraw button (GPIO15)
    let led = Output::new(p.PIN_25, Level::Low);
    let button = Input::new(p.PIN_15, Pull::Up);
    let led_interval_ms = config.status.led_interval_ms;

    // Build the frame and request the first render so the stored image
    // appears after power-on
    let buffers = ROW_BUFFERS.init(RowBuffers::new());
    let mut frame = Frame::new(storage, panel, watchdog, EmbassyClock, buffers, config);
    frame.trigger_render();

    // Spawn tasks
    spawner.spawn(tasks::render_task(frame)).unwrap();
    spawner.spawn(tasks::status_led_task(led, led_interval_ms)).unwrap();
    spawner.spawn(tasks::redraw_button_task(button)).unwrap();

    info!("All tasks spawned, firmware running");
}
