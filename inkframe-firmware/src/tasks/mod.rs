//! Embassy async tasks
//!
//! Each task runs independently and communicates via signals.

pub mod button;
pub mod render;
pub mod status;

pub use button::redraw_button_task;
pub use render::{render_task, AppFrame, Panel, TICK_INTERVAL_MS};
pub use status::status_led_task;
