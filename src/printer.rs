use chrono::Utc;
use image::imageops::FilterType;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    bitmap,
    error::Error,
    port::PortKind,
    protocol, registry,
    settings::PrinterSettings,
    transport::{self, SerialTransport, Transport},
    MEDIA_HEIGHT, MEDIA_WIDTH,
};

/// Dispatches print, feed and connection-test operations to the transport
/// matching the configured port.
///
/// The port is classified once at construction and cached; applying changed
/// settings means building a new `Printer`. All operations are synchronous
/// and blocking, and a transport handle never outlives the call that
/// acquired it. One operation per physical port at a time; callers drive
/// concurrency externally.
pub struct Printer {
    settings: PrinterSettings,
    kind: PortKind,
}

impl Printer {
    pub fn new(settings: PrinterSettings) -> Printer {
        let kind = PortKind::classify(&settings.port);
        debug!("port {:?} classified as {}", settings.port, kind);
        Printer { settings, kind }
    }

    pub fn port(&self) -> &str {
        &self.settings.port
    }

    pub fn kind(&self) -> PortKind {
        self.kind
    }

    /// Print `copies` of a label file.
    ///
    /// The artwork is validated before any transport is touched, so an
    /// invalid file never causes a partial write. Serial ports stream the
    /// bit-image protocol directly; raw ports resolve to the owning queue
    /// and print spooled, like plain queue names.
    pub fn print(&self, label: &Path, copies: u16) -> Result<(), Error> {
        self.dispatch(label, copies).map_err(|e| self.wrap(e))
    }

    fn dispatch(&self, label: &Path, copies: u16) -> Result<(), Error> {
        bitmap::validate_label(label)?;

        match self.kind {
            PortKind::Serial => self.print_serial(label, copies),
            PortKind::RawQueue | PortKind::SpooledQueue => self.print_spooled(label, copies),
        }
    }

    fn print_serial(&self, label: &Path, copies: u16) -> Result<(), Error> {
        let packed = bitmap::load_packed(label)?;
        let job = protocol::encode(&packed, copies);
        info!(
            "printing {} ({} copies) via {}",
            label.display(),
            copies,
            self.settings.port
        );
        let mut serial = SerialTransport::open(&self.settings.port)?;
        serial.send(&job)
    }

    fn print_spooled(&self, label: &Path, copies: u16) -> Result<(), Error> {
        let queue = self.resolve_queue()?;
        let page = self.rasterize_for_spool(label)?;
        info!(
            "printing {} ({} copies) via queue {}",
            label.display(),
            copies,
            queue
        );
        let result = transport::submit_spool_job(&queue, &page, copies);
        let _ = fs::remove_file(&page);
        result
    }

    fn resolve_queue(&self) -> Result<String, Error> {
        match self.kind {
            PortKind::RawQueue => registry::resolve_queue_name(&self.settings.port)
                .ok_or_else(|| Error::PortNotResolved(self.settings.port.clone())),
            _ => Ok(self.settings.port.clone()),
        }
    }

    /// Resize artwork onto the full media raster for driver rasterization.
    ///
    /// The spooled path hands the driver the whole physical label, so the
    /// page is the 80x53 mm media at 203 dpi rather than the validated
    /// artwork geometry.
    fn rasterize_for_spool(&self, label: &Path) -> Result<PathBuf, Error> {
        let artwork = image::open(label)?;
        let page = artwork.resize_exact(MEDIA_WIDTH, MEDIA_HEIGHT, FilterType::Triangle);
        let path = temp_page_path("spool");
        page.save(&path)?;
        Ok(path)
    }

    /// Probe whether the configured port is reachable.
    ///
    /// Serial ports answer a DLE EOT status probe, where a read timeout
    /// still counts as reachable; queue kinds only check that a matching
    /// queue is installed.
    pub fn test_connection(&self) -> bool {
        match self.kind {
            PortKind::Serial => SerialTransport::open(&self.settings.port)
                .and_then(|mut serial| serial.probe())
                .is_ok(),
            PortKind::RawQueue => registry::resolve_queue_name(&self.settings.port).is_some(),
            PortKind::SpooledQueue => registry::queue_exists(&self.settings.port),
        }
    }

    /// Advance the paper by `mm` without printing.
    pub fn feed(&self, mm: f32) -> Result<(), Error> {
        self.feed_inner(mm).map_err(|e| self.wrap(e))
    }

    fn feed_inner(&self, mm: f32) -> Result<(), Error> {
        match self.kind {
            PortKind::Serial => {
                let job = protocol::feed(mm);
                let mut serial = SerialTransport::open(&self.settings.port)?;
                serial.send(&job)
            }
            PortKind::RawQueue | PortKind::SpooledQueue => {
                // No feed command reaches a driver-owned printer; push a
                // blank page of the feed height through the queue instead.
                let queue = self.resolve_queue()?;
                let page = blank_feed_page(mm)?;
                let media = format!("Custom.25x{}mm", mm.max(1.0).round() as u32);
                let result = transport::submit_with_media(&queue, &page, 1, &media);
                let _ = fs::remove_file(&page);
                result
            }
        }
    }

    /// One-line connection summary for status displays.
    pub fn status_line(&self) -> String {
        let state = if self.test_connection() {
            "Connected"
        } else {
            "Not connected"
        };
        format!("Printer ({}) on {}: {}", self.kind, self.settings.port, state)
    }

    fn wrap(&self, source: Error) -> Error {
        Error::Port {
            port: self.settings.port.clone(),
            kind: self.kind,
            source: Box::new(source),
        }
    }
}

fn temp_page_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "tsp-label-{}-{}-{}.png",
        tag,
        std::process::id(),
        Utc::now().timestamp_millis()
    ))
}

/// White page whose height covers the requested feed distance.
fn blank_feed_page(mm: f32) -> Result<PathBuf, Error> {
    let dots = ((mm as f64) / 25.4 * crate::DPI as f64).round().max(1.0) as u32;
    let page = image::RgbImage::from_pixel(MEDIA_WIDTH, dots, image::Rgb([255, 255, 255]));
    let path = temp_page_path("feed");
    page.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use pretty_assertions::assert_eq;

    fn printer_on(port: &str) -> Printer {
        Printer::new(PrinterSettings {
            port: port.to_string(),
            ..PrinterSettings::default()
        })
    }

    #[test]
    fn port_kind_is_cached_from_settings() {
        assert_eq!(printer_on("COM3").kind(), PortKind::Serial);
        assert_eq!(printer_on("usb001").kind(), PortKind::RawQueue);
        assert_eq!(printer_on("Star TSP100").kind(), PortKind::SpooledQueue);
    }

    #[test]
    fn invalid_artwork_short_circuits_before_any_transport() {
        // A serial printer on a port that does not exist: if validation ran
        // after the transport opened, this would fail with a serial error.
        let printer = printer_on("COM99");
        let missing = std::env::temp_dir().join("tsp-label-no-artwork.bmp");

        match printer.print(&missing, 1) {
            Err(Error::Port { port, kind, source }) => {
                assert_eq!(port, "COM99");
                assert_eq!(kind, PortKind::Serial);
                match *source {
                    Error::Format(FormatError::NotFound(_)) => {}
                    other => panic!("expected NotFound, got {:?}", other),
                }
            }
            other => panic!("expected wrapped format error, got {:?}", other),
        }
    }

    #[test]
    fn status_line_names_port_and_kind() {
        let printer = printer_on("COM99");
        let line = printer.status_line();
        assert!(line.starts_with("Printer (serial port) on COM99:"), "{}", line);
    }

    #[test]
    fn blank_feed_page_geometry() {
        let path = blank_feed_page(25.4).unwrap();
        let page = image::open(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let rgb = page.to_rgb8();
        assert_eq!((rgb.width(), rgb.height()), (MEDIA_WIDTH, 203));
        assert!(rgb.pixels().all(|p| p.0 == [255, 255, 255]));
    }
}
