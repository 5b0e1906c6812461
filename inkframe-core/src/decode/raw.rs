//! Raw RGB565 decoder
//!
//! The file is `width * height` little-endian RGB565 samples, row-major,
//! with no header and no padding. Its size must match exactly.

use inkframe_hal::ImageFile;

use super::{ChunkReader, Placement, RowDecoder, RowStep, Surface};
use crate::classify::{Classifier, Rgb, Whiteness};
use crate::plane::BitPlaneWriter;
use crate::render::RenderError;

/// Streaming raw RGB565 decoder
pub struct RawDecoder<'b, F> {
    reader: ChunkReader<'b, F>,
    classifier: Classifier,
    placement: Placement,
    /// Samples per stored row
    stride: u16,
    row: u16,
}

impl<'b, F: ImageFile> RawDecoder<'b, F> {
    /// Check the file size and prepare to stream rows
    ///
    /// Whiteness is judged on the channel sum; `with_color` only decides
    /// whether saturated pixels go to the accent plane.
    ///
    /// # Returns
    /// `RenderError::SizeMismatch` if the file is not exactly
    /// `width * height * 2` bytes; nothing is drawn in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        file: F,
        scratch: &'b mut [u8],
        width: u16,
        height: u16,
        x: u16,
        y: u16,
        with_color: bool,
        surface: Surface,
    ) -> Result<Self, RenderError> {
        surface.check_origin(x, y)?;

        // Two u16 extents times two bytes can exceed u32
        let expected = u64::from(width) * u64::from(height) * 2;
        let actual = file.len();
        debug!("raw: {}x{} file {} expected {}", width, height, actual, expected);
        if u64::from(actual) != expected {
            return Err(RenderError::SizeMismatch { expected, actual });
        }

        let placement = surface.clip(x, y, width as u32, height as u32)?;
        let mut reader = ChunkReader::new(file, scratch);
        reader.begin(0, actual)?;

        Ok(Self {
            reader,
            classifier: Classifier::with_rule(Whiteness::Luminance, with_color),
            placement,
            stride: width,
            row: 0,
        })
    }
}

impl<F: ImageFile> RowDecoder for RawDecoder<'_, F> {
    fn placement(&self) -> Placement {
        self.placement
    }

    fn next_row(&mut self, planes: &mut BitPlaneWriter<'_>) -> Result<RowStep, RenderError> {
        let Placement {
            y, width, height, ..
        } = self.placement;
        if self.row >= height {
            return Ok(RowStep::Done);
        }

        planes.begin_row(width)?;
        // Columns past the panel edge are read and dropped to stay aligned
        for col in 0..self.stride {
            let Some(sample) = self.reader.next_u16_le()? else {
                warn!("raw: short read in row {}", self.row);
                return Ok(RowStep::Truncated);
            };
            if col < width {
                planes.set_class(col, self.classifier.class_of(Rgb::from_rgb565(sample)));
            }
        }

        let out_y = y + self.row;
        self.row += 1;
        Ok(RowStep::Row { y: out_y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::raw_file;
    use inkframe_hal::mem::{MemFile, MemStorage};
    use inkframe_hal::Storage;

    const PANEL: Surface = Surface {
        width: 16,
        height: 8,
        max_row_width: 16,
    };

    const WHITE: u16 = 0xFFFF;
    const RED: u16 = 0xF800;
    const BLACK: u16 = 0x0000;
    const GREEN: u16 = 0x07E0;

    fn rows_of<F: ImageFile>(decoder: &mut RawDecoder<'_, F>) -> (Vec<(u16, Vec<u8>, Vec<u8>)>, bool) {
        let mut mono = [0u8; 2];
        let mut color = [0u8; 2];
        let mut planes = BitPlaneWriter::new(&mut mono, &mut color);
        let mut rows = Vec::new();
        loop {
            match decoder.next_row(&mut planes).unwrap() {
                RowStep::Row { y } => {
                    let row = planes.end_row();
                    rows.push((y, row.mono.to_vec(), row.color.to_vec()));
                }
                RowStep::Truncated => return (rows, true),
                RowStep::Done => return (rows, false),
            }
        }
    }

    #[test]
    fn test_two_by_two() {
        let data = raw_file(&[WHITE, RED, BLACK, GREEN]);
        let mut scratch = [0u8; 3];
        let mut decoder =
            RawDecoder::open(MemFile::new(&data), &mut scratch, 2, 2, 0, 0, true, PANEL).unwrap();
        let (rows, truncated) = rows_of(&mut decoder);

        assert!(!truncated);
        assert_eq!(rows.len(), 2);
        // Row 0: white, red -> mono 1 1, color 1 0
        assert_eq!(rows[0], (0, vec![0b1111_1111], vec![0b1011_1111]));
        // Row 1: black, green -> mono 0 0, color 1 1
        assert_eq!(rows[1], (1, vec![0b0011_1111], vec![0b1111_1111]));
    }

    #[test]
    fn test_size_mismatch() {
        let data = raw_file(&[WHITE; 3]);
        let mut scratch = [0u8; 4];
        let err = RawDecoder::open(MemFile::new(&data), &mut scratch, 2, 2, 0, 0, true, PANEL)
            .err()
            .unwrap();
        assert_eq!(
            err,
            RenderError::SizeMismatch {
                expected: 8,
                actual: 6
            }
        );
    }

    #[test]
    fn test_size_mismatch_at_max_extent() {
        let data = [0u8; 4];
        let mut scratch = [0u8; 4];
        let err = RawDecoder::open(
            MemFile::new(&data),
            &mut scratch,
            u16::MAX,
            u16::MAX,
            0,
            0,
            true,
            PANEL,
        )
        .err()
        .unwrap();
        assert_eq!(
            err,
            RenderError::SizeMismatch {
                expected: 65_535 * 65_535 * 2,
                actual: 4
            }
        );
    }

    #[test]
    fn test_short_read_stops_after_full_rows() {
        // Reported size is right, but only one and a half rows are readable
        let data = raw_file(&[BLACK; 6]);
        let mut storage = MemStorage::new();
        storage.insert_with_len("image.bin", &data, 16).unwrap();

        let mut scratch = [0u8; 4];
        let file = storage.open("image.bin").unwrap();
        let mut decoder = RawDecoder::open(file, &mut scratch, 4, 2, 0, 0, true, PANEL).unwrap();
        let (rows, truncated) = rows_of(&mut decoder);

        assert!(truncated);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, vec![0b0000_1111]);
    }

    #[test]
    fn test_clips_to_panel() {
        // 20 wide on a 16 wide panel, placed at x = 12: four columns visible
        let mut samples = [WHITE; 40];
        samples[3] = BLACK;
        samples[20 + 4] = BLACK;
        let data = raw_file(&samples);
        let mut scratch = [0u8; 7];
        let mut decoder =
            RawDecoder::open(MemFile::new(&data), &mut scratch, 20, 2, 12, 6, false, PANEL).unwrap();

        assert_eq!(
            decoder.placement(),
            Placement {
                x: 12,
                y: 6,
                width: 4,
                height: 2
            }
        );
        let (rows, _) = rows_of(&mut decoder);
        assert_eq!(rows[0], (6, vec![0b1110_1111], vec![0b1111_1111]));
        // Column 4 is past the visible edge
        assert_eq!(rows[1], (7, vec![0b1111_1111], vec![0b1111_1111]));
    }

    #[test]
    fn test_accent_disabled() {
        let data = raw_file(&[RED]);
        let mut scratch = [0u8; 2];
        let mut decoder =
            RawDecoder::open(MemFile::new(&data), &mut scratch, 1, 1, 0, 0, false, PANEL).unwrap();
        let (rows, _) = rows_of(&mut decoder);
        assert_eq!(rows[0], (0, vec![0b0111_1111], vec![0xFF]));
    }

    #[test]
    fn test_origin_out_of_bounds() {
        let data = raw_file(&[WHITE]);
        let mut scratch = [0u8; 2];
        let err = RawDecoder::open(MemFile::new(&data), &mut scratch, 1, 1, 0, 8, true, PANEL)
            .err()
            .unwrap();
        assert_eq!(err, RenderError::OutOfBounds { x: 0, y: 8 });
    }
}
