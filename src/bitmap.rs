//! Packed monochrome label artwork and its on-disk bitmap container.
//!
//! The container is a minimal 1-bit BMP: 14-byte file header, 40-byte info
//! header, a two-entry color table, then pixel rows stored bottom-up with
//! each row zero-padded to a 4-byte boundary. The layout is a hard format
//! contract shared with standard viewers and the printer's raster ingestion,
//! so encoding and header validation are implemented byte for byte here;
//! pixel decoding of arbitrary-depth files goes through the `image` crate.

use crate::error::{Error, FormatError};
use crate::{LABEL_HEIGHT, LABEL_WIDTH};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A pixel whose mean channel intensity falls below this prints as ink.
const INK_THRESHOLD: u32 = 128;

/// Pixel data starts right after the two headers and the 2-entry palette.
const PIXEL_DATA_OFFSET: u32 = 14 + 40 + 8;

/// 203 dpi expressed in pixels per meter (203 * 39.37).
const PIXELS_PER_METER: i32 = 7992;

/// 1-bit packed raster, row-major, MSB = leftmost pixel, 1 = ink.
///
/// Row stride is `ceil(width / 8)` bytes and unused trailing bits in the
/// last byte of a row stay zero. This is the canonical in-memory artifact
/// handed from the codec to the protocol encoder; it is built per print
/// call and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MonoBitmap {
    /// All-white bitmap of the given geometry.
    pub fn new(width: u32, height: u32) -> MonoBitmap {
        let stride = (width as usize + 7) / 8;
        MonoBitmap {
            width,
            height,
            data: vec![0x00; stride * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per packed row.
    pub fn stride(&self) -> usize {
        (self.width as usize + 7) / 8
    }

    /// Packed rows, top to bottom. `data().len() == stride() * height()`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        let byte = self.data[y as usize * self.stride() + x as usize / 8];
        (byte & (0x80 >> (x % 8))) != 0
    }

    pub fn set(&mut self, x: u32, y: u32, ink: bool) {
        let stride = self.stride();
        let byte = &mut self.data[y as usize * stride + x as usize / 8];
        let mask = 0x80 >> (x % 8);
        if ink {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// Threshold 3-channel data into a packed buffer.
    ///
    /// `rgb` is row-major RGB triplets. Gray is the integer mean of the
    /// three channels; a pixel is ink iff gray < 128.
    pub fn threshold_rgb(width: u32, height: u32, rgb: &[u8]) -> MonoBitmap {
        debug_assert_eq!(rgb.len(), (width * height) as usize * 3);

        let mut bitmap = MonoBitmap::new(width, height);
        let stride = bitmap.stride();
        for y in 0..height {
            for x in 0..width {
                let i = ((y * width + x) * 3) as usize;
                let gray = (rgb[i] as u32 + rgb[i + 1] as u32 + rgb[i + 2] as u32) / 3;
                if gray < INK_THRESHOLD {
                    bitmap.data[y as usize * stride + x as usize / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        bitmap
    }

    /// Threshold a decoded raster of any supported depth.
    pub fn from_image(image: &image::DynamicImage) -> MonoBitmap {
        let rgb = image.to_rgb8();
        let (width, height) = (rgb.width(), rgb.height());
        MonoBitmap::threshold_rgb(width, height, rgb.as_raw())
    }

    /// Serialize into the bitmap container.
    ///
    /// Rows are written bottom-up and padded to 4-byte boundaries; the
    /// declared data length and file size account for that padding.
    pub fn to_bmp(&self) -> Vec<u8> {
        let stride = self.stride();
        let padding = (4 - stride % 4) % 4;
        let data_len = ((stride + padding) * self.height as usize) as u32;
        let file_size = PIXEL_DATA_OFFSET + data_len;

        let mut out = Vec::with_capacity(file_size as usize);

        // File header
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&file_size.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved
        out.extend_from_slice(&PIXEL_DATA_OFFSET.to_le_bytes());

        // Info header
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&(self.width as i32).to_le_bytes());
        out.extend_from_slice(&(self.height as i32).to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // planes
        out.extend_from_slice(&1u16.to_le_bytes()); // bits per pixel
        out.extend_from_slice(&0u32.to_le_bytes()); // no compression
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
        out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes()); // colors used
        out.extend_from_slice(&0u32.to_le_bytes()); // important colors

        // Color table: index 0 = white, index 1 = black
        out.extend_from_slice(&0x00FF_FFFFu32.to_le_bytes());
        out.extend_from_slice(&0x0000_0000u32.to_le_bytes());

        for y in (0..self.height as usize).rev() {
            out.extend_from_slice(&self.data[y * stride..(y + 1) * stride]);
            out.extend_from_slice(&[0u8; 3][..padding]);
        }
        out
    }
}

/// Header fields read during validation.
#[derive(Debug, Clone, Copy)]
pub struct BmpHeader {
    pub width: i32,
    pub height: i32,
    pub bits_per_pixel: u16,
}

impl BmpHeader {
    /// Parse the first 54 bytes of a container without touching pixel data.
    pub fn parse(header: &[u8]) -> Result<BmpHeader, FormatError> {
        if header.len() < 54 {
            return Err(FormatError::Truncated(header.len()));
        }
        if header[0] != b'B' || header[1] != b'M' {
            return Err(FormatError::BadMagic(header[0], header[1]));
        }
        Ok(BmpHeader {
            width: i32::from_le_bytes([header[18], header[19], header[20], header[21]]),
            height: i32::from_le_bytes([header[22], header[23], header[24], header[25]]),
            bits_per_pixel: u16::from_le_bytes([header[28], header[29]]),
        })
    }

    /// Geometry and bit-depth gate for label artwork.
    pub fn check_label(&self) -> Result<(), FormatError> {
        if self.width != LABEL_WIDTH as i32 || self.height != LABEL_HEIGHT as i32 {
            return Err(FormatError::BadGeometry {
                width: self.width,
                height: self.height,
            });
        }
        match self.bits_per_pixel {
            1 | 24 | 32 => Ok(()),
            bpp => Err(FormatError::BadBitDepth(bpp)),
        }
    }
}

/// Validate a label file by reading only its header.
///
/// Fails with [`FormatError::NotFound`] for a missing file, `BadMagic` for
/// non-bitmap content, `BadGeometry` when the declared size is not the
/// fixed label geometry and `BadBitDepth` for depths other than 1, 24
/// or 32. Never reads pixel data.
pub fn validate_label<P: AsRef<Path>>(path: P) -> Result<(), Error> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FormatError::NotFound(path.to_path_buf()).into());
    }

    let mut header = Vec::with_capacity(54);
    File::open(path)?.take(54).read_to_end(&mut header)?;

    let header = BmpHeader::parse(&header)?;
    header.check_label()?;
    Ok(())
}

/// Load label artwork at native depth and pack it for the bit-image path.
pub fn load_packed<P: AsRef<Path>>(path: P) -> Result<MonoBitmap, Error> {
    let image = image::open(path)?;
    Ok(MonoBitmap::from_image(&image))
}
