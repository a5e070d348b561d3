//! Error types for label printing operations.
//!
//! This module defines all possible errors that can occur while validating
//! label artwork, talking to a transport, or resolving a printer queue.

use crate::port::PortKind;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for printing operations.
///
/// Validation failures are detected before any transport is touched and
/// short-circuit the print operation; transport failures may leave the
/// printer mid-job and are reported with the index of the frame that failed.
#[derive(Error, Debug)]
pub enum Error {
    /// Label artwork failed container validation.
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serial transport error.
    ///
    /// Wraps underlying serialport errors for open failures, missing
    /// devices, or permission problems.
    #[error(transparent)]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// A transport write exceeded its timeout.
    #[error("write timed out on {0}")]
    WriteTimeout(String),

    /// A multi-frame streaming write failed mid-job.
    ///
    /// The frame index is advisory: nothing is retried or rolled back, the
    /// printer may be left mid-job, and the caller decides whether to
    /// re-attempt the whole operation.
    #[error("transport write failed at frame {frame}: {source}")]
    FrameWrite {
        frame: usize,
        #[source]
        source: Box<Error>,
    },

    /// No installed queue claims the raw port.
    #[error("no installed printer queue uses port {0}")]
    PortNotResolved(String),

    #[error("print spooler rejected the job: {0}")]
    SpoolFailed(String),

    #[error("spooled printing is not available on this platform")]
    SpoolUnavailable,

    /// Dispatch-level wrapper carrying the offending port and its detected
    /// kind for diagnostics.
    #[error("failed to print to {port} ({kind}): {source}")]
    Port {
        port: String,
        kind: PortKind,
        #[source]
        source: Box<Error>,
    },
}

/// Validation errors for the label bitmap container.
///
/// These are raised from the 54-byte header gate; pixel data is never read
/// during validation. Each variant carries the offending value so the
/// message can tell the user what the file actually contained.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("label file not found: {0}")]
    NotFound(PathBuf),

    #[error("file is shorter than a bitmap header ({0} bytes)")]
    Truncated(usize),

    #[error("not a bitmap file (leading bytes {0:#04X} {1:#04X})")]
    BadMagic(u8, u8),

    #[error("invalid dimensions: {width}x{height}, expected 609x406 pixels (3\"x2\" at 203 dpi)")]
    BadGeometry { width: i32, height: i32 },

    #[error("unsupported bit depth: {0}, use 1-bit monochrome or 24-bit RGB")]
    BadBitDepth(u16),
}
