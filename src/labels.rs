//! Label artwork discovery.
//!
//! Labels live as `.bmp` files in a flat directory; the file name doubles
//! as the identity and the display name is derived from it.

use crate::bitmap::MonoBitmap;
use crate::error::Error;
use crate::{LABEL_HEIGHT, LABEL_WIDTH};
use std::fs;
use std::path::{Path, PathBuf};

/// A discovered label file.
#[derive(Debug, Clone)]
pub struct LabelTemplate {
    pub file_name: String,
    pub display_name: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// List every `.bmp` in a directory as a label, sorted by file name.
///
/// A missing or unreadable directory yields an empty list; whether each
/// file actually passes validation is checked at print time.
pub fn discover(dir: &Path) -> Vec<LabelTemplate> {
    let mut labels = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return labels,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_bmp = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("bmp"));
        if !is_bmp {
            continue;
        }
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        labels.push(LabelTemplate {
            display_name: display_name(&file_name),
            file_name,
            path,
            width: LABEL_WIDTH,
            height: LABEL_HEIGHT,
        });
    }

    labels.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    labels
}

/// Look a label up by file name, case-insensitively.
pub fn find_by_file_name(dir: &Path, file_name: &str) -> Option<LabelTemplate> {
    discover(dir)
        .into_iter()
        .find(|label| label.file_name.eq_ignore_ascii_case(file_name))
}

/// Derive a human-readable name from a label file name.
///
/// `7day_return_warning.bmp` becomes `7day Return Warning`.
pub fn display_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    };
    stem.split(|c| c == '_' || c == '-' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Write a deterministic calibration label: full border, center crosshair
/// and a vertical rule every inch. Valid 609x406 1-bit container, useful
/// for checking alignment and feed without real artwork.
pub fn write_sample_label<P: AsRef<Path>>(path: P) -> Result<(), Error> {
    let mut bitmap = MonoBitmap::new(LABEL_WIDTH, LABEL_HEIGHT);

    for x in 0..LABEL_WIDTH {
        for y in [0, 1, LABEL_HEIGHT - 2, LABEL_HEIGHT - 1].iter() {
            bitmap.set(x, *y, true);
        }
    }
    for y in 0..LABEL_HEIGHT {
        for x in [0, 1, LABEL_WIDTH - 2, LABEL_WIDTH - 1].iter() {
            bitmap.set(*x, y, true);
        }
        // one rule per inch of width
        let mut x = 203;
        while x < LABEL_WIDTH {
            bitmap.set(x, y, true);
            x += 203;
        }
    }
    // crosshair at the label center
    let (cx, cy) = (LABEL_WIDTH / 2, LABEL_HEIGHT / 2);
    for d in 0..40 {
        bitmap.set(cx - 20 + d, cy, true);
        bitmap.set(cx, cy - 20 + d, true);
    }

    fs::write(path, bitmap.to_bmp())?;
    Ok(())
}
