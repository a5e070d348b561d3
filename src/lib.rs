//! Star TSP Label Printer Driver
//!
//! This crate drives Star TSP-class direct-thermal printers that produce
//! fixed 3"x2" monochrome labels at 203 dpi. It validates and encodes the
//! 1-bit label bitmap container, translates packed artwork into the
//! printer's bit-image protocol in 24-row bands, and dispatches jobs to the
//! right transport for the configured port: serial devices are driven
//! directly, raw USB/LPT ports and plain queue names go through the OS
//! spooler.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tsp_label::{Printer, PrinterSettings};
//!
//! let settings = PrinterSettings {
//!     port: "COM3".to_string(),
//!     ..PrinterSettings::default()
//! };
//! let printer = Printer::new(settings);
//! printer.print(Path::new("labels/7day_return_warning.bmp"), 2)?;
//! # Ok::<(), tsp_label::Error>(())
//! ```

mod bitmap;
mod error;
pub mod labels;
mod port;
mod printer;
pub mod protocol;
pub mod registry;
mod settings;
mod transport;

pub use crate::{
    bitmap::{load_packed, validate_label, BmpHeader, MonoBitmap},
    error::{Error, FormatError},
    labels::LabelTemplate,
    port::PortKind,
    printer::Printer,
    protocol::Job,
    registry::PrinterInfo,
    settings::{AppConfig, PrinterSettings, ProductAssociation},
    transport::{MockTransport, SerialTransport, Transport},
};

/// Label artwork width in pixels (3" at 203 dpi).
///
/// This is the geometry the validator enforces and the serial path streams
/// untouched.
pub const LABEL_WIDTH: u32 = 609;

/// Label artwork height in pixels (2" at 203 dpi).
pub const LABEL_HEIGHT: u32 = 406;

/// Full media raster width in pixels: the physical 80 mm label at 203 dpi.
///
/// Only the spooled path uses the media raster; the driver owns margins
/// there, so the page it rasterizes is the whole label rather than the
/// validated artwork geometry.
pub const MEDIA_WIDTH: u32 = 636;

/// Full media raster height in pixels (53 mm at 203 dpi).
pub const MEDIA_HEIGHT: u32 = 424;

/// Print head resolution in dots per inch.
pub const DPI: u32 = 203;
