//! Hardware abstraction traits
//!
//! These traits define the interface between the pipeline and the panel
//! driver. Storage, watchdog and clock traits live in `inkframe-hal`.

pub mod render;

pub use render::{DriverError, RenderDriver};
