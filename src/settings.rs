//! Persisted application configuration.
//!
//! Stored as JSON next to the application: printer connection settings,
//! product-to-label associations and the recently used product list.
//! Settings are consumed as input when a [`crate::Printer`] is built;
//! changing them means building a new printer, not mutating a live one.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Recently used products kept, newest first.
const RECENT_PRODUCTS_CAP: usize = 10;

/// Printer connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterSettings {
    /// Port identifier: a serial name, raw port or installed queue name.
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default = "default_label_width_in")]
    pub label_width_in: f64,
    #[serde(default = "default_label_height_in")]
    pub label_height_in: f64,
}

fn default_port() -> String {
    "USB001".to_string()
}
fn default_dpi() -> u32 {
    203
}
fn default_label_width_in() -> f64 {
    3.0
}
fn default_label_height_in() -> f64 {
    2.0
}

impl Default for PrinterSettings {
    fn default() -> PrinterSettings {
        PrinterSettings {
            port: default_port(),
            dpi: default_dpi(),
            label_width_in: default_label_width_in(),
            label_height_in: default_label_height_in(),
        }
    }
}

/// A product associated with a label file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAssociation {
    pub sku: String,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub product_name: String,
    pub label_file_name: String,
    #[serde(default = "default_count")]
    pub default_count: u16,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

fn default_count() -> u16 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub printer: PrinterSettings,
    #[serde(default)]
    pub associations: Vec<ProductAssociation>,
    #[serde(default)]
    pub recent_products: Vec<String>,
}

impl AppConfig {
    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AppConfig, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn association_for_sku(&self, sku: &str) -> Option<&ProductAssociation> {
        self.associations
            .iter()
            .find(|a| a.sku.eq_ignore_ascii_case(sku))
    }

    /// Insert or replace the association for a SKU.
    pub fn upsert_association(&mut self, association: ProductAssociation) {
        match self
            .associations
            .iter_mut()
            .find(|a| a.sku.eq_ignore_ascii_case(&association.sku))
        {
            Some(existing) => *existing = association,
            None => self.associations.push(association),
        }
    }

    /// Record that a product was just used: stamps its association and moves
    /// it to the front of the recent list, which stays capped.
    pub fn touch_product(&mut self, sku: &str) {
        if let Some(association) = self
            .associations
            .iter_mut()
            .find(|a| a.sku.eq_ignore_ascii_case(sku))
        {
            association.last_used = Some(Utc::now());
        }

        self.recent_products
            .retain(|recent| !recent.eq_ignore_ascii_case(sku));
        self.recent_products.insert(0, sku.to_string());
        self.recent_products.truncate(RECENT_PRODUCTS_CAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tsp-label-cfg-{}-{}", std::process::id(), name))
    }

    fn association(sku: &str, label: &str) -> ProductAssociation {
        ProductAssociation {
            sku: sku.to_string(),
            barcode: String::new(),
            product_name: String::new(),
            label_file_name: label.to_string(),
            default_count: 1,
            last_used: None,
        }
    }

    #[test]
    fn defaults() {
        let settings = PrinterSettings::default();
        assert_eq!(settings.port, "USB001");
        assert_eq!(settings.dpi, 203);
        assert_eq!(settings.label_width_in, 3.0);
        assert_eq!(settings.label_height_in, 2.0);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = AppConfig::load(temp_path("not-created.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn save_load_round_trip() {
        let mut config = AppConfig::default();
        config.printer.port = "COM3".to_string();
        config.upsert_association(association("SKU-1", "7day_return_warning.bmp"));

        let path = temp_path("roundtrip.json");
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let path = temp_path("partial.json");
        std::fs::write(&path, r#"{ "printer": { "port": "COM7" } }"#).unwrap();
        let config = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.printer.port, "COM7");
        assert_eq!(config.printer.dpi, 203);
        assert!(config.associations.is_empty());
    }

    #[test]
    fn upsert_replaces_existing_sku() {
        let mut config = AppConfig::default();
        config.upsert_association(association("SKU-1", "a.bmp"));
        config.upsert_association(association("sku-1", "b.bmp"));

        assert_eq!(config.associations.len(), 1);
        assert_eq!(config.associations[0].label_file_name, "b.bmp");
    }

    #[test]
    fn touch_orders_and_caps_recents() {
        let mut config = AppConfig::default();
        config.upsert_association(association("SKU-1", "a.bmp"));

        for i in 0..12 {
            config.touch_product(&format!("SKU-{}", i));
        }
        config.touch_product("SKU-1");

        assert_eq!(config.recent_products.len(), RECENT_PRODUCTS_CAP);
        assert_eq!(config.recent_products[0], "SKU-1");
        assert!(config.association_for_sku("SKU-1").unwrap().last_used.is_some());
        // no duplicate entry for the re-touched product
        let count = config
            .recent_products
            .iter()
            .filter(|p| p.as_str() == "SKU-1")
            .count();
        assert_eq!(count, 1);
    }
}
