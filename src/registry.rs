//! Installed printer discovery.
//!
//! Resolves raw port identifiers to the queue that claims them and lists
//! what the host exposes: installed queues and serial devices. Queue names
//! are looked up, never created; queue lifecycle belongs to the OS.

use log::debug;

/// An installed queue or probeable port, as reported by the host.
#[derive(Debug, Clone)]
pub struct PrinterInfo {
    pub name: String,
    pub port_name: String,
    pub status: String,
}

impl PrinterInfo {
    /// TSP-class devices sort first in discovery output.
    pub fn is_star_tsp(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        name.contains("star") && name.contains("tsp")
    }
}

/// Device URI scheme the spooler reports for a raw port class.
fn uri_scheme(port: &str) -> Option<&'static str> {
    let upper = port.to_ascii_uppercase();
    if upper.starts_with("USB") {
        Some("usb")
    } else if upper.starts_with("LPT") {
        Some("parallel")
    } else {
        None
    }
}

/// One `lpstat -v` line: `device for <queue>: <uri>`.
fn parse_device_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("device for ")?;
    let colon = rest.find(':')?;
    let queue = rest[..colon].trim();
    let uri = rest[colon + 1..].trim();
    if queue.is_empty() {
        None
    } else {
        Some((queue, uri))
    }
}

fn queue_matches_port(uri: &str, port: &str) -> bool {
    match uri_scheme(port) {
        Some(scheme) => uri.to_ascii_lowercase().starts_with(scheme),
        None => uri.to_ascii_lowercase().contains(&port.to_ascii_lowercase()),
    }
}

#[cfg(unix)]
fn lpstat(args: &[&str]) -> Option<String> {
    use std::process::Command;

    let output = Command::new("lpstat").args(args).output().ok()?;
    if !output.status.success() {
        debug!("lpstat {:?} exited with {}", args, output.status);
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Queue-to-device mapping from the spooler.
#[cfg(unix)]
fn installed_devices() -> Vec<(String, String)> {
    match lpstat(&["-v"]) {
        Some(stdout) => stdout
            .lines()
            .filter_map(parse_device_line)
            .map(|(queue, uri)| (queue.to_string(), uri.to_string()))
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(not(unix))]
fn installed_devices() -> Vec<(String, String)> {
    Vec::new()
}

/// Find the installed queue claiming a raw port, if any.
pub fn resolve_queue_name(port: &str) -> Option<String> {
    for (queue, uri) in installed_devices() {
        if queue_matches_port(&uri, port) {
            debug!("port {} resolved to queue {} ({})", port, queue, uri);
            return Some(queue);
        }
    }
    debug!("no installed queue matches port {}", port);
    None
}

/// Names of every installed queue.
pub fn list_installed_queues() -> Vec<String> {
    installed_devices().into_iter().map(|(queue, _)| queue).collect()
}

/// Whether a queue with this exact name is installed.
pub fn queue_exists(name: &str) -> bool {
    list_installed_queues()
        .iter()
        .any(|queue| queue.eq_ignore_ascii_case(name))
}

/// Names of the serial devices present on the host.
pub fn list_serial_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            debug!("serial port enumeration failed: {}", e);
            Vec::new()
        }
    }
}

/// Everything the host knows about: installed queues first, then serial
/// devices not already claimed by a queue. TSP-class printers lead.
pub fn detect_available_printers() -> Vec<PrinterInfo> {
    let mut printers: Vec<PrinterInfo> = installed_devices()
        .into_iter()
        .map(|(queue, uri)| PrinterInfo {
            name: queue,
            port_name: uri,
            status: "Installed".to_string(),
        })
        .collect();

    for port in list_serial_ports() {
        let claimed = printers
            .iter()
            .any(|p| p.port_name.eq_ignore_ascii_case(&port));
        if !claimed {
            printers.push(PrinterInfo {
                name: format!("Serial Port ({})", port),
                port_name: port,
                status: "Available".to_string(),
            });
        }
    }

    printers.sort_by(|a, b| {
        b.is_star_tsp()
            .cmp(&a.is_star_tsp())
            .then_with(|| a.name.cmp(&b.name))
    });
    printers
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn device_line_parsing() {
        assert_eq!(
            parse_device_line("device for Star_TSP100: usb://Star/TSP100?serial=1234"),
            Some(("Star_TSP100", "usb://Star/TSP100?serial=1234"))
        );
        assert_eq!(
            parse_device_line("device for office: parallel:/dev/lp0"),
            Some(("office", "parallel:/dev/lp0"))
        );
        assert_eq!(parse_device_line("no device line"), None);
    }

    #[test]
    fn raw_ports_match_their_uri_scheme() {
        assert!(queue_matches_port("usb://Star/TSP100?serial=1234", "USB001"));
        assert!(queue_matches_port("usb://Star/TSP100?serial=1234", "usb002"));
        assert!(queue_matches_port("parallel:/dev/lp0", "LPT1"));
        assert!(!queue_matches_port("parallel:/dev/lp0", "USB001"));
        assert!(!queue_matches_port("socket://10.0.0.5:9100", "USB001"));
    }

    #[test]
    fn queue_names_match_by_substring() {
        assert!(queue_matches_port("ipp://host/printers/FrontDesk", "frontdesk"));
        assert!(!queue_matches_port("ipp://host/printers/FrontDesk", "backoffice"));
    }

    #[test]
    fn tsp_detection_is_case_insensitive() {
        let info = PrinterInfo {
            name: "STAR tsp100 Cutter".to_string(),
            port_name: "usb://Star/TSP100".to_string(),
            status: "Installed".to_string(),
        };
        assert!(info.is_star_tsp());

        let other = PrinterInfo {
            name: "Generic Laser".to_string(),
            port_name: "ipp://host/printer".to_string(),
            status: "Installed".to_string(),
        };
        assert!(!other.is_star_tsp());
    }
}
