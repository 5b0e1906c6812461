//! UC8159 e-paper controller driver
//!
//! Rows are written through the controller's partial window so nothing
//! larger than one SPI chunk is ever buffered on the MCU. The whole frame
//! is cleared to white when a render selects it, then every row lands in
//! controller RAM, then a single refresh pushes RAM to the glass.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use inkframe_core::plane::RowPlanes;
use inkframe_core::{DriverError, RenderDriver};

use crate::pixel::{self, WHITE_PAIR};

/// Native panel width
pub const WIDTH: u16 = 640;
/// Native panel height
pub const HEIGHT: u16 = 384;

/// Bytes per SPI data write
const CHUNK: usize = 32;

/// Interval between BUSY polls
const POLL_MS: u32 = 10;

/// Reset pulse and settle time
const RESET_MS: u32 = 10;

/// UC8159 commands
#[allow(dead_code)]
mod cmd {
    pub const PANEL_SETTING: u8 = 0x00;
    pub const POWER_SETTING: u8 = 0x01;
    pub const POWER_OFF: u8 = 0x02;
    pub const POWER_ON: u8 = 0x04;
    pub const BOOSTER_SOFT_START: u8 = 0x06;
    pub const DEEP_SLEEP: u8 = 0x07;
    pub const DATA_START: u8 = 0x10;
    pub const DISPLAY_REFRESH: u8 = 0x12;
    pub const PLL_CONTROL: u8 = 0x30;
    pub const TEMPERATURE_CALIBRATION: u8 = 0x41;
    pub const VCOM_DATA_INTERVAL: u8 = 0x50;
    pub const TCON_SETTING: u8 = 0x60;
    pub const RESOLUTION: u8 = 0x61;
    pub const VCM_DC_SETTING: u8 = 0x82;
    pub const PARTIAL_WINDOW: u8 = 0x90;
    pub const PARTIAL_IN: u8 = 0x91;
    pub const PARTIAL_OUT: u8 = 0x92;
    pub const FLASH_MODE: u8 = 0xE5;

    /// Check code that must follow DEEP_SLEEP
    pub const DEEP_SLEEP_CHECK: u8 = 0xA5;
}

/// Register setup sent after every reset, before the resolution
const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (cmd::POWER_SETTING, &[0x37, 0x00]),
    (cmd::PANEL_SETTING, &[0xCF, 0x08]),
    (cmd::BOOSTER_SOFT_START, &[0xC7, 0xCC, 0x28]),
    (cmd::PLL_CONTROL, &[0x3C]),
    (cmd::TEMPERATURE_CALIBRATION, &[0x00]),
    (cmd::VCOM_DATA_INTERVAL, &[0x77]),
    (cmd::TCON_SETTING, &[0x22]),
];

/// Register setup sent after the resolution
const INIT_TAIL: &[(u8, &[u8])] = &[
    (cmd::VCM_DC_SETTING, &[0x1E]),
    (cmd::FLASH_MODE, &[0x03]),
];

/// Panel geometry and timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    /// Width in pixels, a multiple of 8
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Longest wait for BUSY to release
    pub busy_timeout_ms: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            busy_timeout_ms: 20_000,
        }
    }
}

/// Controller power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// After construction or deep sleep; needs a hardware reset
    Asleep,
    /// Registers configured, charge pump off
    Initialized,
    /// Charge pump on, ready to take data and refresh
    PoweredOn,
}

/// UC8159 panel driver
///
/// # Type parameters
/// * `SPI` - SPI device, owns chip select
/// * `DC` - Data/command select output
/// * `RST` - Reset output, active low
/// * `BUSY` - Busy input, low while busy
/// * `D` - Delay used for reset timing and BUSY polling
pub struct Uc8159<SPI, DC, RST, BUSY, D> {
    spi: SPI,
    dc: DC,
    rst: RST,
    busy: BUSY,
    delay: D,
    config: PanelConfig,
    state: PowerState,
}

impl<SPI, DC, RST, BUSY, D> Uc8159<SPI, DC, RST, BUSY, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    /// Create a driver; the panel is not touched until first use
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY, delay: D, config: PanelConfig) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            delay,
            config,
            state: PowerState::Asleep,
        }
    }

    /// Current power state
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Reset the controller and load its registers
    pub fn init(&mut self) -> Result<(), DriverError> {
        self.reset()?;
        for &(c, data) in INIT_SEQUENCE {
            self.command_with_data(c, data)?;
        }
        let (w, h) = (self.config.width, self.config.height);
        self.command_with_data(
            cmd::RESOLUTION,
            &[(w >> 8) as u8, w as u8, (h >> 8) as u8, h as u8],
        )?;
        for &(c, data) in INIT_TAIL {
            self.command_with_data(c, data)?;
        }
        self.state = PowerState::Initialized;
        debug!("epd: initialized {}x{}", w, h);
        Ok(())
    }

    /// Turn the charge pump on, initializing first if needed
    pub fn power_on(&mut self) -> Result<(), DriverError> {
        match self.state {
            PowerState::PoweredOn => return Ok(()),
            PowerState::Asleep => self.init()?,
            PowerState::Initialized => {}
        }
        self.command(cmd::POWER_ON)?;
        self.wait_idle()?;
        self.state = PowerState::PoweredOn;
        Ok(())
    }

    /// Turn the charge pump off
    pub fn power_off(&mut self) -> Result<(), DriverError> {
        if self.state == PowerState::PoweredOn {
            self.command(cmd::POWER_OFF)?;
            self.wait_idle()?;
            self.state = PowerState::Initialized;
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), DriverError> {
        self.rst.set_low().map_err(|_| DriverError::Communication)?;
        self.delay.delay_ms(RESET_MS);
        self.rst.set_high().map_err(|_| DriverError::Communication)?;
        self.delay.delay_ms(RESET_MS);
        Ok(())
    }

    fn command(&mut self, c: u8) -> Result<(), DriverError> {
        self.dc.set_low().map_err(|_| DriverError::Communication)?;
        self.spi.write(&[c]).map_err(|_| DriverError::Communication)
    }

    fn data(&mut self, data: &[u8]) -> Result<(), DriverError> {
        self.dc.set_high().map_err(|_| DriverError::Communication)?;
        self.spi.write(data).map_err(|_| DriverError::Communication)
    }

    fn command_with_data(&mut self, c: u8, data: &[u8]) -> Result<(), DriverError> {
        self.command(c)?;
        self.data(data)
    }

    /// Poll BUSY until it goes high or the timeout passes
    fn wait_idle(&mut self) -> Result<(), DriverError> {
        let mut waited = 0u32;
        while self.busy.is_low().map_err(|_| DriverError::Communication)? {
            if waited >= self.config.busy_timeout_ms {
                warn!("epd: busy for {} ms, giving up", waited);
                return Err(DriverError::Busy);
            }
            self.delay.delay_ms(POLL_MS);
            waited = waited.saturating_add(POLL_MS);
        }
        if waited > 0 {
            trace!("epd: busy released after {} ms", waited);
        }
        Ok(())
    }

    /// Set the partial window to columns `x0..=x1`, rows `y0..=y1`
    ///
    /// `x0` must be byte aligned and `x1` must end a byte.
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DriverError> {
        self.command_with_data(
            cmd::PARTIAL_WINDOW,
            &[
                (x0 >> 8) as u8,
                x0 as u8,
                (x1 >> 8) as u8,
                x1 as u8,
                (y0 >> 8) as u8,
                y0 as u8,
                (y1 >> 8) as u8,
                y1 as u8,
                0x01,
            ],
        )
    }

    /// Stream `count` bytes produced by `byte_at` in chunks
    fn stream(&mut self, count: usize, mut byte_at: impl FnMut(usize) -> u8) -> Result<(), DriverError> {
        let mut chunk = [0u8; CHUNK];
        let mut sent = 0;
        while sent < count {
            let n = (count - sent).min(CHUNK);
            for (i, b) in chunk[..n].iter_mut().enumerate() {
                *b = byte_at(sent + i);
            }
            self.data(&chunk[..n])?;
            sent += n;
        }
        Ok(())
    }
}

impl<SPI, DC, RST, BUSY, D> RenderDriver for Uc8159<SPI, DC, RST, BUSY, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    fn width(&self) -> u16 {
        self.config.width
    }

    fn height(&self) -> u16 {
        self.config.height
    }

    fn select_full_frame(&mut self) -> Result<(), DriverError> {
        self.power_on()?;
        let (w, h) = (self.config.width, self.config.height);
        if w == 0 || h == 0 {
            return Err(DriverError::InvalidCoordinates);
        }

        self.command(cmd::PARTIAL_IN)?;
        self.set_window(0, 0, w - 1, h - 1)?;
        self.command(cmd::DATA_START)?;
        self.stream(w as usize * h as usize / 2, |_| WHITE_PAIR)?;
        self.command(cmd::PARTIAL_OUT)?;
        debug!("epd: frame cleared");
        Ok(())
    }

    fn write_row(&mut self, planes: RowPlanes<'_>, x: u16, y: u16) -> Result<(), DriverError> {
        if self.state != PowerState::PoweredOn {
            return Err(DriverError::NotInitialized);
        }
        if x >= self.config.width || y >= self.config.height {
            return Err(DriverError::InvalidCoordinates);
        }
        if planes.width == 0 {
            return Ok(());
        }

        // Widen to whole bytes; columns outside the row are written white
        let last = (x as u32 + planes.width as u32 - 1).min(self.config.width as u32 - 1) as u16;
        let x0 = x & !7;
        let x1 = (last | 7).min(self.config.width - 1);
        let columns = (x1 - x0 + 1) as usize;

        self.command(cmd::PARTIAL_IN)?;
        self.set_window(x0, y, x1, y)?;
        self.command(cmd::DATA_START)?;
        self.stream(columns.div_ceil(2), |i| {
            let left = x0 + 2 * i as u16;
            pixel::pair(ink_at(&planes, x, left), ink_at(&planes, x, left + 1))
        })?;
        self.command(cmd::PARTIAL_OUT)
    }

    fn refresh(&mut self) -> Result<(), DriverError> {
        if self.state != PowerState::PoweredOn {
            return Err(DriverError::NotInitialized);
        }
        self.command(cmd::DISPLAY_REFRESH)?;
        self.wait_idle()
    }

    fn sleep(&mut self) -> Result<(), DriverError> {
        if self.state == PowerState::Asleep {
            return Ok(());
        }
        self.power_off()?;
        self.command_with_data(cmd::DEEP_SLEEP, &[cmd::DEEP_SLEEP_CHECK])?;
        self.state = PowerState::Asleep;
        debug!("epd: deep sleep");
        Ok(())
    }
}

/// Ink for panel column `col` of a row whose left edge is at `x`
fn ink_at(planes: &RowPlanes<'_>, x: u16, col: u16) -> u8 {
    if col < x {
        pixel::WHITE
    } else {
        pixel::ink(planes, col - x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::spi::Operation;
    use inkframe_hal::{FeedingDelay, Watchdog};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Everything the fakes saw, in order
    #[derive(Default)]
    struct Bus {
        dc_high: bool,
        /// Each command with the data bytes that followed it
        frames: Vec<(u8, Vec<u8>)>,
        resets: usize,
        /// BUSY reads low this many more times
        busy_polls: u32,
        stuck_busy: bool,
        delay_ns: u64,
    }

    type Shared = Rc<RefCell<Bus>>;

    struct FakeSpi(Shared);
    struct FakeDc(Shared);
    struct FakeRst(Shared);
    struct FakeBusy(Shared);
    struct FakeDelay(Shared);

    impl embedded_hal::spi::ErrorType for FakeSpi {
        type Error = Infallible;
    }

    impl SpiDevice for FakeSpi {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
            let mut bus = self.0.borrow_mut();
            for op in operations.iter() {
                if let Operation::Write(bytes) = op {
                    if bus.dc_high {
                        let frame = bus.frames.last_mut().expect("data before any command");
                        frame.1.extend_from_slice(bytes);
                    } else {
                        for &b in bytes.iter() {
                            bus.frames.push((b, Vec::new()));
                        }
                    }
                }
            }
            Ok(())
        }
    }

    impl embedded_hal::digital::ErrorType for FakeDc {
        type Error = Infallible;
    }

    impl OutputPin for FakeDc {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().dc_high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().dc_high = true;
            Ok(())
        }
    }

    impl embedded_hal::digital::ErrorType for FakeRst {
        type Error = Infallible;
    }

    impl OutputPin for FakeRst {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().resets += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    impl embedded_hal::digital::ErrorType for FakeBusy {
        type Error = Infallible;
    }

    impl InputPin for FakeBusy {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let mut bus = self.0.borrow_mut();
            if bus.stuck_busy {
                return Ok(false);
            }
            if bus.busy_polls > 0 {
                bus.busy_polls -= 1;
                return Ok(false);
            }
            Ok(true)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|high| !high)
        }
    }

    impl DelayNs for FakeDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().delay_ns += ns as u64;
        }
    }

    type TestPanel = Uc8159<FakeSpi, FakeDc, FakeRst, FakeBusy, FakeDelay>;

    fn panel(config: PanelConfig) -> (TestPanel, Shared) {
        let bus = Shared::default();
        let epd = Uc8159::new(
            FakeSpi(bus.clone()),
            FakeDc(bus.clone()),
            FakeRst(bus.clone()),
            FakeBusy(bus.clone()),
            FakeDelay(bus.clone()),
            config,
        );
        (epd, bus)
    }

    fn commands(bus: &Shared) -> Vec<u8> {
        bus.borrow().frames.iter().map(|f| f.0).collect()
    }

    fn data_of(bus: &Shared, c: u8) -> Vec<Vec<u8>> {
        bus.borrow()
            .frames
            .iter()
            .filter(|f| f.0 == c)
            .map(|f| f.1.clone())
            .collect()
    }

    fn small() -> PanelConfig {
        PanelConfig {
            width: 16,
            height: 8,
            busy_timeout_ms: 100,
        }
    }

    #[test]
    fn test_select_full_frame_initializes_and_clears() {
        let (mut epd, bus) = panel(PanelConfig::default());
        epd.select_full_frame().unwrap();

        assert_eq!(epd.state(), PowerState::PoweredOn);
        assert_eq!(bus.borrow().resets, 1);
        assert_eq!(
            commands(&bus),
            vec![0x01, 0x00, 0x06, 0x30, 0x41, 0x50, 0x60, 0x61, 0x82, 0xE5, 0x04, 0x91, 0x90, 0x10, 0x92]
        );
        assert_eq!(data_of(&bus, cmd::RESOLUTION), vec![vec![0x02, 0x80, 0x01, 0x80]]);
        assert_eq!(
            data_of(&bus, cmd::PARTIAL_WINDOW),
            vec![vec![0x00, 0x00, 0x02, 0x7F, 0x00, 0x00, 0x01, 0x7F, 0x01]]
        );

        let clear = &data_of(&bus, cmd::DATA_START)[0];
        assert_eq!(clear.len(), 640 * 384 / 2);
        assert!(clear.iter().all(|&b| b == 0x33));
    }

    #[test]
    fn test_second_select_skips_init() {
        let (mut epd, bus) = panel(small());
        epd.select_full_frame().unwrap();
        bus.borrow_mut().frames.clear();

        epd.select_full_frame().unwrap();
        assert_eq!(commands(&bus), vec![0x91, 0x90, 0x10, 0x92]);
        assert_eq!(bus.borrow().resets, 1);
    }

    #[test]
    fn test_write_row_before_select() {
        let (mut epd, _bus) = panel(small());
        let planes = RowPlanes {
            mono: &[0xFF],
            color: &[0xFF],
            width: 8,
        };
        assert_eq!(epd.write_row(planes, 0, 0), Err(DriverError::NotInitialized));
        assert_eq!(epd.refresh(), Err(DriverError::NotInitialized));
    }

    #[test]
    fn test_write_row_encodes_pixel_pairs() {
        let (mut epd, bus) = panel(small());
        epd.select_full_frame().unwrap();
        bus.borrow_mut().frames.clear();

        // white, black, accent, white starting at column 2
        let planes = RowPlanes {
            mono: &[0b1011_1111],
            color: &[0b1101_1111],
            width: 4,
        };
        epd.write_row(planes, 2, 5).unwrap();

        assert_eq!(commands(&bus), vec![0x91, 0x90, 0x10, 0x92]);
        assert_eq!(
            data_of(&bus, cmd::PARTIAL_WINDOW),
            vec![vec![0, 0, 0, 7, 0, 5, 0, 5, 0x01]]
        );
        assert_eq!(data_of(&bus, cmd::DATA_START), vec![vec![0x33, 0x30, 0x43, 0x33]]);
    }

    #[test]
    fn test_write_row_clips_at_right_edge() {
        let (mut epd, bus) = panel(small());
        epd.select_full_frame().unwrap();
        bus.borrow_mut().frames.clear();

        let planes = RowPlanes {
            mono: &[0x00, 0x00],
            color: &[0xFF, 0xFF],
            width: 16,
        };
        epd.write_row(planes, 8, 7).unwrap();

        assert_eq!(
            data_of(&bus, cmd::PARTIAL_WINDOW),
            vec![vec![0, 8, 0, 15, 0, 7, 0, 7, 0x01]]
        );
        assert_eq!(data_of(&bus, cmd::DATA_START), vec![vec![0x00; 4]]);
    }

    #[test]
    fn test_write_row_out_of_bounds() {
        let (mut epd, _bus) = panel(small());
        epd.select_full_frame().unwrap();
        let planes = RowPlanes {
            mono: &[0xFF],
            color: &[0xFF],
            width: 8,
        };
        assert_eq!(epd.write_row(planes, 16, 0), Err(DriverError::InvalidCoordinates));
        assert_eq!(epd.write_row(planes, 0, 8), Err(DriverError::InvalidCoordinates));
    }

    #[test]
    fn test_refresh_waits_for_busy() {
        let (mut epd, bus) = panel(small());
        epd.select_full_frame().unwrap();
        bus.borrow_mut().busy_polls = 3;
        let before = bus.borrow().delay_ns;

        epd.refresh().unwrap();
        assert_eq!(commands(&bus).last(), Some(&cmd::DISPLAY_REFRESH));
        assert_eq!(bus.borrow().delay_ns - before, 3 * POLL_MS as u64 * 1_000_000);
    }

    #[test]
    fn test_refresh_times_out() {
        let (mut epd, bus) = panel(small());
        epd.select_full_frame().unwrap();
        bus.borrow_mut().stuck_busy = true;

        assert_eq!(epd.refresh(), Err(DriverError::Busy));
    }

    #[test]
    fn test_sleep_and_wake() {
        let (mut epd, bus) = panel(small());
        epd.select_full_frame().unwrap();
        bus.borrow_mut().frames.clear();

        epd.sleep().unwrap();
        assert_eq!(epd.state(), PowerState::Asleep);
        assert_eq!(commands(&bus), vec![0x02, 0x07]);
        assert_eq!(data_of(&bus, cmd::DEEP_SLEEP), vec![vec![0xA5]]);

        // Asleep again is a no-op
        epd.sleep().unwrap();
        assert_eq!(commands(&bus).len(), 2);

        // Waking needs a fresh reset
        epd.select_full_frame().unwrap();
        assert_eq!(bus.borrow().resets, 2);
    }

    struct CountingWatchdog(Rc<RefCell<u32>>);

    impl Watchdog for CountingWatchdog {
        fn reset(&mut self) {
            *self.0.borrow_mut() += 1;
        }
    }

    #[test]
    fn test_busy_wait_feeds_watchdog() {
        let bus = Shared::default();
        let kicks = Rc::new(RefCell::new(0u32));
        let delay = FeedingDelay::new(FakeDelay(bus.clone()), CountingWatchdog(kicks.clone()));
        let mut epd = Uc8159::new(
            FakeSpi(bus.clone()),
            FakeDc(bus.clone()),
            FakeRst(bus.clone()),
            FakeBusy(bus.clone()),
            delay,
            small(),
        );
        epd.select_full_frame().unwrap();
        let before = *kicks.borrow();

        bus.borrow_mut().busy_polls = 5;
        epd.refresh().unwrap();
        assert!(*kicks.borrow() >= before + 5);
    }
}
