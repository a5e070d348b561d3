//! Byte transports that carry protocol jobs to the hardware.
//!
//! Every transport is scoped to a single operation: acquired, used and
//! released before the call returns, on success and failure paths alike.
//! Serial handles close on drop; spooled jobs hand the page file to the OS
//! and return. There is no internal locking, so concurrent jobs against one
//! physical port must be serialized by the caller.

use crate::error::Error;
use crate::protocol::{Job, STATUS_PROBE};
use log::{debug, trace};
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Fixed line rate for TSP-class serial links.
pub const BAUD_RATE: u32 = 9600;

/// Serial write timeout.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Status probe read timeout; expiry still counts as reachable.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Page size handed to the spooler: the label's physical dimensions.
#[cfg(unix)]
const LABEL_MEDIA: &str = "Custom.80x53mm";

/// A sink the dispatcher streams protocol frames into.
pub trait Transport {
    /// Write every frame of a job, in order. A mid-job failure reports the
    /// index of the frame that did not complete.
    fn send(&mut self, job: &Job) -> Result<(), Error>;
}

/// Serial connection at 9600 baud, 8 data bits, no parity, 1 stop bit.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Open a serial device at the fixed line parameters.
    pub fn open(name: &str) -> Result<SerialTransport, Error> {
        let port = serialport::new(name, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(WRITE_TIMEOUT)
            .open()?;
        debug!("opened {} at {} 8N1", name, BAUD_RATE);
        Ok(SerialTransport {
            port,
            name: name.to_string(),
        })
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), Error> {
        match self.port.write_all(frame) {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {
                Err(Error::WriteTimeout(self.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// DLE EOT status probe.
    ///
    /// A timely response and a read timeout both mean the device is
    /// reachable; only an open or write failure marks it unreachable.
    pub fn probe(&mut self) -> Result<(), Error> {
        self.write_frame(&STATUS_PROBE)?;

        self.port.set_timeout(PROBE_TIMEOUT)?;
        let mut response = [0u8; 1];
        match self.port.read(&mut response) {
            Ok(n) => {
                trace!("status probe on {} answered {} byte(s)", self.name, n);
                Ok(())
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {
                trace!("status probe on {} timed out; treating as reachable", self.name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, job: &Job) -> Result<(), Error> {
        for (index, frame) in job.frames().iter().enumerate() {
            self.write_frame(frame).map_err(|source| Error::FrameWrite {
                frame: index,
                source: Box::new(source),
            })?;
        }
        self.port.flush()?;
        debug!(
            "streamed {} frames ({} bytes) to {}",
            job.frame_count(),
            job.byte_len(),
            self.name
        );
        Ok(())
    }
}

/// Transport that records frames instead of writing to hardware.
///
/// `fail_at` makes `send` fail before writing the given frame index, for
/// exercising mid-job abort reporting.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub written: Vec<Vec<u8>>,
    pub fail_at: Option<usize>,
}

impl MockTransport {
    pub fn new() -> MockTransport {
        MockTransport::default()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, job: &Job) -> Result<(), Error> {
        for (index, frame) in job.frames().iter().enumerate() {
            if self.fail_at == Some(index) {
                return Err(Error::FrameWrite {
                    frame: index,
                    source: Box::new(Error::WriteTimeout("mock".to_string())),
                });
            }
            self.written.push(frame.clone());
        }
        Ok(())
    }
}

/// Submit a rasterized page to an installed queue.
///
/// The spooler owns scheduling from here; the wait for the job to leave the
/// queue is bounded by the OS, not by us, and no explicit timeout applies.
#[cfg(unix)]
pub fn submit_spool_job(queue: &str, page: &Path, copies: u16) -> Result<(), Error> {
    submit_with_media(queue, page, copies, LABEL_MEDIA)
}

#[cfg(unix)]
pub(crate) fn submit_with_media(
    queue: &str,
    page: &Path,
    copies: u16,
    media: &str,
) -> Result<(), Error> {
    use std::process::Command;

    let output = Command::new("lp")
        .arg("-d")
        .arg(queue)
        .arg("-n")
        .arg(copies.to_string())
        .arg("-o")
        .arg(format!("media={}", media))
        .arg("-o")
        .arg("fit-to-page")
        .arg(page)
        .output()
        .map_err(|e| Error::SpoolFailed(format!("failed to run lp: {}", e)))?;

    if output.status.success() {
        debug!("queued {} on {} ({} copies)", page.display(), queue, copies);
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::SpoolFailed(stderr.trim().to_string()))
    }
}

#[cfg(not(unix))]
pub fn submit_spool_job(_queue: &str, _page: &Path, _copies: u16) -> Result<(), Error> {
    Err(Error::SpoolUnavailable)
}

#[cfg(not(unix))]
pub(crate) fn submit_with_media(
    _queue: &str,
    _page: &Path,
    _copies: u16,
    _media: &str,
) -> Result<(), Error> {
    Err(Error::SpoolUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::MonoBitmap;
    use crate::protocol;
    use pretty_assertions::assert_eq;

    #[test]
    fn mock_records_frames_in_order() {
        let bitmap = MonoBitmap::new(16, 4);
        let job = protocol::encode(&bitmap, 1);

        let mut transport = MockTransport::new();
        transport.send(&job).unwrap();

        assert_eq!(transport.written.len(), job.frame_count());
        assert_eq!(transport.written[0], vec![0x1B, 0x40]);
        assert_eq!(transport.written.last().unwrap(), &vec![0x1B, 0x64, 0x03]);
    }

    #[test]
    fn mid_job_failure_reports_the_frame_index() {
        let bitmap = MonoBitmap::new(16, 4);
        let job = protocol::encode(&bitmap, 1);

        let mut transport = MockTransport {
            fail_at: Some(3),
            ..MockTransport::default()
        };
        match transport.send(&job) {
            Err(Error::FrameWrite { frame, .. }) => assert_eq!(frame, 3),
            other => panic!("expected FrameWrite, got {:?}", other),
        }
        // frames before the failure were written, nothing after
        assert_eq!(transport.written.len(), 3);
    }
}
