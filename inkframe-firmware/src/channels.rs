//! Inter-task communication
//!
//! Defines the static signals shared between Embassy tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// The stored image changed, or a redraw was requested
///
/// Raised by the redraw button and by whatever writes new images into
/// flash. The render task turns it into a scheduler request.
pub static CONTENT_CHANGED: Signal<CriticalSectionRawMutex, ()> = Signal::new();
