//! ESC/POS command construction for the bit-image print path.
//!
//! Commands are byte sequences prefixed with ESC (0x1B). Image data moves in
//! row bands of at most 24 pixel rows per `ESC *` transfer, the most the
//! target hardware accepts per bit-image command; larger bands produce
//! malformed output. Multi-byte counts are little-endian.

use crate::bitmap::MonoBitmap;
use crate::DPI;
use log::debug;

/// ESC (Escape) command prefix byte.
pub const ESC: u8 = 0x1B;

/// LF: print the buffered band and advance one line.
pub const LF: u8 = 0x0A;

/// DLE: prefix of real-time status commands.
pub const DLE: u8 = 0x10;

/// Maximum pixel rows per bit-image transfer.
pub const BAND_ROWS: usize = 24;

/// DLE EOT 1: request real-time printer status.
pub const STATUS_PROBE: [u8; 3] = [DLE, 0x04, 0x01];

/// One print operation as an ordered list of protocol frames.
///
/// Built fresh per print call and consumed once by a transport write; no
/// printer state is retained across jobs.
#[derive(Debug, Default)]
pub struct Job {
    frames: Vec<Vec<u8>>,
}

impl Job {
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total payload size over all frames.
    pub fn byte_len(&self) -> usize {
        self.frames.iter().map(|f| f.len()).sum()
    }

    fn push(&mut self, frame: Vec<u8>) {
        self.frames.push(frame);
    }
}

/// ESC @ : reset the printer to power-on defaults.
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// ESC 3 n : set line spacing to n dots.
#[inline]
pub fn line_spacing(n: u8) -> Vec<u8> {
    vec![ESC, b'3', n]
}

/// ESC 2 : restore the default line spacing.
#[inline]
pub fn default_line_spacing() -> Vec<u8> {
    vec![ESC, b'2']
}

/// ESC a 1 : center alignment.
#[inline]
pub fn align_center() -> Vec<u8> {
    vec![ESC, b'a', 0x01]
}

/// ESC d n : feed n lines.
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

/// ESC J n : feed n dots forward.
#[inline]
pub fn feed_dots(n: u8) -> Vec<u8> {
    vec![ESC, b'J', n]
}

/// Convert a feed distance in millimeters to printer dots, saturating at
/// the one-byte range of ESC J.
pub fn mm_to_dots(mm: f32) -> u8 {
    let dots = (mm * DPI as f32 / 25.4).round();
    dots.max(0.0).min(255.0) as u8
}

/// Encode a packed label into a complete print job.
///
/// Frame sequence: initialize, zero line spacing, center alignment, then per
/// copy one `ESC * 0x21 nL nH` transfer plus a line feed for every band of
/// up to 24 rows, then restore spacing and feed 3 lines. No cut command is
/// issued; the media is pre-perforated.
pub fn encode(bitmap: &MonoBitmap, copies: u16) -> Job {
    let stride = bitmap.stride();
    let mut job = Job::default();

    job.push(init());
    job.push(line_spacing(0x00));
    job.push(align_center());

    for _ in 0..copies {
        for band in bitmap.data().chunks(stride * BAND_ROWS) {
            let mut frame = Vec::with_capacity(5 + band.len());
            frame.extend_from_slice(&[
                ESC,
                b'*',
                0x21,
                (stride & 0xFF) as u8,
                ((stride >> 8) & 0xFF) as u8,
            ]);
            frame.extend_from_slice(band);
            job.push(frame);
            job.push(vec![LF]);
        }
    }

    job.push(default_line_spacing());
    job.push(feed_lines(0x03));

    debug!(
        "encoded {}x{} label, {} copies: {} frames, {} bytes",
        bitmap.width(),
        bitmap.height(),
        copies,
        job.frame_count(),
        job.byte_len()
    );
    job
}

/// Paper feed job for the serial path.
pub fn feed(mm: f32) -> Job {
    let mut job = Job::default();
    job.push(feed_dots(mm_to_dots(mm)));
    job
}
