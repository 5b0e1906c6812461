//! Test doubles shared by the unit tests

use inkframe_hal::Watchdog;

use crate::plane::RowPlanes;
use crate::traits::{DriverError, RenderDriver};

/// One row as the driver saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRow {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub mono: Vec<u8>,
    pub color: Vec<u8>,
}

/// Driver that records every call
#[derive(Debug, Default)]
pub struct RecordingDriver {
    pub width: u16,
    pub height: u16,
    pub rows: Vec<RecordedRow>,
    pub selects: usize,
    pub refreshes: usize,
    pub fail_writes_after: Option<usize>,
}

impl RecordingDriver {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn row_at(&self, y: u16) -> Option<&RecordedRow> {
        self.rows.iter().find(|r| r.y == y)
    }
}

impl RenderDriver for RecordingDriver {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn select_full_frame(&mut self) -> Result<(), DriverError> {
        self.selects += 1;
        Ok(())
    }

    fn write_row(&mut self, planes: RowPlanes<'_>, x: u16, y: u16) -> Result<(), DriverError> {
        if self.fail_writes_after == Some(self.rows.len()) {
            return Err(DriverError::Communication);
        }
        self.rows.push(RecordedRow {
            x,
            y,
            width: planes.width,
            mono: planes.mono.to_vec(),
            color: planes.color.to_vec(),
        });
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), DriverError> {
        self.refreshes += 1;
        Ok(())
    }
}

/// Watchdog that counts resets
#[derive(Debug, Default)]
pub struct CountingWatchdog {
    pub resets: usize,
}

impl Watchdog for CountingWatchdog {
    fn reset(&mut self) {
        self.resets += 1;
    }
}

/// Build a BMP file from unpadded pixel rows, stored in file order
pub fn bmp_file(
    width: u32,
    height: i32,
    depth: u16,
    format: u32,
    palette: &[[u8; 4]],
    rows: &[Vec<u8>],
) -> Vec<u8> {
    let row_size = if depth < 8 {
        ((width * depth as u32 + 8 - depth as u32) / 8 + 3) & !3
    } else {
        (width * depth as u32 / 8 + 3) & !3
    };
    let offset = 54 + 4 * palette.len() as u32;
    let file_size = offset + row_size * rows.len() as u32;

    let mut out = Vec::new();
    out.extend_from_slice(&0x4D42u16.to_le_bytes());
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&depth.to_le_bytes());
    out.extend_from_slice(&format.to_le_bytes());
    out.resize(54, 0);
    for quad in palette {
        out.extend_from_slice(quad);
    }
    for row in rows {
        let start = out.len();
        out.extend_from_slice(row);
        out.resize(start + row_size as usize, 0);
    }
    out
}

/// Build a raw RGB565 file from row-major samples
pub fn raw_file(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
