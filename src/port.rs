use std::fmt;

/// Transport class of a printer port identifier.
///
/// The identifier itself stays an opaque string; only the prefix decides how
/// a job reaches the hardware. Classification is total: any string that is
/// neither a serial nor a raw port is taken to be an installed queue name,
/// so free-form queue names are always accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// COM1, COM2, ... : direct serial access at fixed line parameters.
    Serial,
    /// USB001, LPT1, ... : a raw port claimed by an installed driver.
    ///
    /// Raw device access does not work for ports owned by a printer queue,
    /// so this kind resolves to the owning queue and prints spooled.
    RawQueue,
    /// Anything else: the name of an installed print queue.
    SpooledQueue,
}

impl PortKind {
    /// Classify a port identifier by case-insensitive prefix.
    pub fn classify(port: &str) -> PortKind {
        let upper = port.to_ascii_uppercase();
        if upper.starts_with("COM") {
            PortKind::Serial
        } else if upper.starts_with("USB") || upper.starts_with("LPT") {
            PortKind::RawQueue
        } else {
            PortKind::SpooledQueue
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PortKind::Serial => "serial port",
            PortKind::RawQueue => "raw port",
            PortKind::SpooledQueue => "printer queue",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serial_ports() {
        assert_eq!(PortKind::classify("COM3"), PortKind::Serial);
        assert_eq!(PortKind::classify("com1"), PortKind::Serial);
        assert_eq!(PortKind::classify("Com12"), PortKind::Serial);
    }

    #[test]
    fn raw_ports() {
        assert_eq!(PortKind::classify("USB001"), PortKind::RawQueue);
        assert_eq!(PortKind::classify("usb001"), PortKind::RawQueue);
        assert_eq!(PortKind::classify("LPT1"), PortKind::RawQueue);
        assert_eq!(PortKind::classify("lpt2"), PortKind::RawQueue);
    }

    #[test]
    fn everything_else_is_a_queue_name() {
        assert_eq!(PortKind::classify("Star TSP100"), PortKind::SpooledQueue);
        assert_eq!(PortKind::classify(""), PortKind::SpooledQueue);
        assert_eq!(PortKind::classify("Front Desk Labels"), PortKind::SpooledQueue);
        // A serial device path is not a COM name; it falls through too.
        assert_eq!(PortKind::classify("/dev/ttyUSB0"), PortKind::SpooledQueue);
    }
}
