//! Frame context
//!
//! Owns everything a render needs (storage, panel, watchdog, clock, row
//! buffers and the refresh scheduler) and exposes the three entry points
//! the host loop uses: [`Frame::trigger_render`], [`Frame::tick`] and
//! [`Frame::render_now`].

use inkframe_hal::{Clock, Storage, Watchdog};

use crate::config::{FrameConfig, ImageConfig};
use crate::decode::{BmpDecoder, ImageFormat, RawDecoder, Surface};
use crate::plane::{plane_bytes, BitPlaneWriter};
use crate::render::{render, RenderError, RenderReport};
use crate::scheduler::RefreshScheduler;
use crate::traits::RenderDriver;

/// Widest row the compiled buffers hold
pub const MAX_ROW_WIDTH: u16 = 640;

/// Bytes per plane for [`MAX_ROW_WIDTH`]
pub const ROW_PLANE_BYTES: usize = plane_bytes(MAX_ROW_WIDTH);

/// Read-ahead buffer size
///
/// Independent of the row width: rows are streamed through it.
pub const SCRATCH_BYTES: usize = 2400;

/// Working memory for one decode
///
/// Reused for every row and every render. Large enough to live in a
/// `static` rather than on a task stack.
pub struct RowBuffers {
    mono: [u8; ROW_PLANE_BYTES],
    color: [u8; ROW_PLANE_BYTES],
    scratch: [u8; SCRATCH_BYTES],
}

impl Default for RowBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl RowBuffers {
    /// Zeroed buffers
    pub const fn new() -> Self {
        Self {
            mono: [0; ROW_PLANE_BYTES],
            color: [0; ROW_PLANE_BYTES],
            scratch: [0; SCRATCH_BYTES],
        }
    }

    /// Borrow the plane writer and the read scratch at the same time
    pub fn split(&mut self) -> (BitPlaneWriter<'_>, &mut [u8]) {
        (
            BitPlaneWriter::new(&mut self.mono, &mut self.color),
            &mut self.scratch,
        )
    }
}

/// Image pipeline context
///
/// Single-threaded: at most one decode runs at a time, and the scheduler
/// only advances when the owner calls [`Frame::tick`] or [`Frame::poll`].
pub struct Frame<'b, S, D, W, C> {
    storage: S,
    driver: D,
    watchdog: W,
    clock: C,
    buffers: &'b mut RowBuffers,
    config: FrameConfig,
    scheduler: RefreshScheduler,
}

impl<'b, S, D, W, C> Frame<'b, S, D, W, C>
where
    S: Storage,
    D: RenderDriver,
    W: Watchdog,
    C: Clock,
{
    /// Assemble a frame from its collaborators
    pub fn new(
        storage: S,
        driver: D,
        watchdog: W,
        clock: C,
        buffers: &'b mut RowBuffers,
        config: FrameConfig,
    ) -> Self {
        let scheduler = RefreshScheduler::new(config.refresh.debounce_ms, config.refresh.policy);
        Self {
            storage,
            driver,
            watchdog,
            clock,
            buffers,
            config,
            scheduler,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Refresh scheduler
    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    /// Panel driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Panel driver, mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Watchdog handle
    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    /// Area decodes may draw into
    ///
    /// The driver's extent wins over the configured one; the row limit is
    /// capped by the compiled buffers.
    pub fn surface(&self) -> Surface {
        let configured = self.config.surface();
        Surface {
            width: self.driver.width().min(configured.width),
            height: self.driver.height().min(configured.height),
            max_row_width: configured.max_row_width.min(MAX_ROW_WIDTH),
        }
    }

    /// Note that the image changed; the render follows after the debounce
    ///
    /// Safe to call any number of times.
    pub fn trigger_render(&mut self) {
        self.scheduler.content_changed();
    }

    /// Advance the scheduler to `now_ms`, rendering if it fires
    ///
    /// # Returns
    /// `None` if nothing ran, otherwise the outcome of the render. Failures
    /// are logged here; the scheduler is idle again either way.
    pub fn tick(&mut self, now_ms: u64) -> Option<Result<RenderReport, RenderError>> {
        self.watchdog.reset();
        if !self.scheduler.tick(now_ms) {
            return None;
        }

        info!("frame: scheduled render");
        let result = self.render_configured();
        if let Err(e) = &result {
            warn!("frame: render failed: {:?}", e);
        }
        Some(result)
    }

    /// [`Frame::tick`] with the frame's own clock
    pub fn poll(&mut self) -> Option<Result<RenderReport, RenderError>> {
        let now = self.clock.now_ms();
        self.tick(now)
    }

    /// Render the configured image immediately
    pub fn render_configured(&mut self) -> Result<RenderReport, RenderError> {
        let ImageConfig {
            path,
            format,
            width,
            height,
            x,
            y,
            color,
        } = self.config.image.clone();
        match format {
            ImageFormat::Raw565 => self.draw_raw(&path, width, height, x, y, color),
            ImageFormat::Bmp => self.draw_bitmap(&path, x, y, color),
        }
    }

    /// Decode and render the configured raw image synchronously
    ///
    /// Bypasses the scheduler; for manual redraws.
    pub fn render_now(&mut self, width: u16, height: u16) -> Result<RenderReport, RenderError> {
        let image = self.config.image.clone();
        self.draw_raw(&image.path, width, height, image.x, image.y, image.color)
    }

    /// Decode and render a raw RGB565 file
    pub fn draw_raw(
        &mut self,
        path: &str,
        width: u16,
        height: u16,
        x: u16,
        y: u16,
        with_color: bool,
    ) -> Result<RenderReport, RenderError> {
        let surface = self.surface();
        surface.check_origin(x, y)?;
        info!("frame: raw {} ({}x{})", path, width, height);

        let file = self.storage.open(path)?;
        let (mut planes, scratch) = self.buffers.split();
        let mut decoder = RawDecoder::open(file, scratch, width, height, x, y, with_color, surface)?;
        render(
            &mut decoder,
            &mut planes,
            &mut self.driver,
            &mut self.watchdog,
            &self.clock,
        )
    }

    /// Decode and render a BMP with its top-left corner at `(x, y)`
    ///
    /// The image is clipped to the panel. 1-bit images are always drawn
    /// without the accent color.
    pub fn draw_bitmap(
        &mut self,
        path: &str,
        x: u16,
        y: u16,
        with_color: bool,
    ) -> Result<RenderReport, RenderError> {
        let surface = self.surface();
        surface.check_origin(x, y)?;
        info!("frame: bmp {} at ({}, {})", path, x, y);

        let file = self.storage.open(path)?;
        let (mut planes, scratch) = self.buffers.split();
        let mut decoder = BmpDecoder::open(file, scratch, x, y, with_color, surface)?;
        render(
            &mut decoder,
            &mut planes,
            &mut self.driver,
            &mut self.watchdog,
            &self.clock,
        )
    }
}
