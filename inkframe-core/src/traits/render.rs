//! Render driver trait for two-plane e-paper panels

use crate::plane::RowPlanes;

/// Errors that can occur while talking to the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Bus or pin error
    Communication,
    /// Panel stayed busy past its timeout
    Busy,
    /// Row lies outside the panel
    InvalidCoordinates,
    /// Used before `init`
    NotInitialized,
}

/// Trait for a panel that accepts rows of mono and color planes
///
/// Rows are buffered in the controller until [`RenderDriver::refresh`]
/// pushes them to the glass. Refresh is slow (seconds) and is called at
/// most once per decode.
pub trait RenderDriver {
    /// Panel width in pixels
    fn width(&self) -> u16;

    /// Panel height in pixels
    fn height(&self) -> u16;

    /// Target the whole panel and clear it to white
    fn select_full_frame(&mut self) -> Result<(), DriverError>;

    /// Write one row of planes with its left edge at `(x, y)`
    ///
    /// Plane bit 0 marks black in `planes.mono` and accent in
    /// `planes.color`, MSB first.
    fn write_row(&mut self, planes: RowPlanes<'_>, x: u16, y: u16) -> Result<(), DriverError>;

    /// Push the buffered frame to the glass
    fn refresh(&mut self) -> Result<(), DriverError>;

    /// Put the panel into its lowest power state
    fn sleep(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}
