//! Render loop
//!
//! Drives a [`RowDecoder`] to completion, handing each finished row to the
//! panel. The watchdog is reset before the first row, after every row and
//! after the refresh, so no single stretch of work exceeds one row decode
//! or one refresh.

use inkframe_hal::{Clock, StorageError, Watchdog};

use crate::decode::{FormatError, RowDecoder, RowStep};
use crate::plane::{BitPlaneWriter, RowTooWide};
use crate::traits::{DriverError, RenderDriver};

/// Rows between progress log lines
pub const PROGRESS_INTERVAL: u16 = 32;

/// Reasons a render did not run to completion
///
/// None of these are fatal to the device; the panel keeps whatever it
/// showed before (or the rows already written, for driver errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderError {
    /// File missing or unreadable
    Storage(StorageError),
    /// Header rejected
    Format(FormatError),
    /// Raw file is not exactly `width * height * 2` bytes
    SizeMismatch { expected: u64, actual: u32 },
    /// Image origin at or beyond the panel extent
    OutOfBounds { x: u16, y: u16 },
    /// Clipped row wider than the plane buffers
    RowTooWide { width: u16, max: u16 },
    /// Panel driver failed
    Driver(DriverError),
}

impl From<StorageError> for RenderError {
    fn from(e: StorageError) -> Self {
        RenderError::Storage(e)
    }
}

impl From<FormatError> for RenderError {
    fn from(e: FormatError) -> Self {
        RenderError::Format(e)
    }
}

impl From<DriverError> for RenderError {
    fn from(e: DriverError) -> Self {
        RenderError::Driver(e)
    }
}

impl From<RowTooWide> for RenderError {
    fn from(e: RowTooWide) -> Self {
        RenderError::RowTooWide {
            width: e.width,
            max: e.capacity,
        }
    }
}

/// Summary of a finished render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RenderReport {
    /// Rows written to the panel
    pub rows: u16,
    /// The file ended before the last row
    pub truncated: bool,
    /// Time from the first row to the end of the refresh
    pub elapsed_ms: u64,
}

/// Stream every row of `decoder` to `driver`, then refresh once
///
/// The full frame is selected and cleared first. A truncated file still
/// gets its refresh; the rows written so far are the final image.
///
/// # Arguments
/// * `decoder` - Opened decoder
/// * `planes` - Row plane buffers, at least as wide as the decode
/// * `driver` - Panel
/// * `watchdog` - Reset at least once per row
/// * `clock` - Used for the elapsed time in the report
pub fn render<R, D, W, C>(
    decoder: &mut R,
    planes: &mut BitPlaneWriter<'_>,
    driver: &mut D,
    watchdog: &mut W,
    clock: &C,
) -> Result<RenderReport, RenderError>
where
    R: RowDecoder,
    D: RenderDriver,
    W: Watchdog,
    C: Clock,
{
    let start = clock.now_ms();
    let placement = decoder.placement();
    debug!(
        "render: {}x{} at ({}, {})",
        placement.width,
        placement.height,
        placement.x,
        placement.y
    );

    watchdog.reset();
    driver.select_full_frame()?;

    let mut rows: u16 = 0;
    let mut truncated = false;
    loop {
        match decoder.next_row(planes)? {
            RowStep::Row { y } => {
                driver.write_row(planes.end_row(), placement.x, y)?;
                watchdog.reset();
                if rows % PROGRESS_INTERVAL == 0 {
                    debug!("render: row {}/{}", rows, placement.height);
                }
                rows += 1;
            }
            RowStep::Truncated => {
                truncated = true;
                break;
            }
            RowStep::Done => break,
        }
    }

    driver.refresh()?;
    watchdog.reset();

    let elapsed_ms = clock.now_ms().saturating_sub(start);
    if truncated {
        warn!("render: truncated after {} of {} rows", rows, placement.height);
    }
    info!("render: {} rows in {} ms", rows, elapsed_ms);
    Ok(RenderReport {
        rows,
        truncated,
        elapsed_ms,
    })
}
