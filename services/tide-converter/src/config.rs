//! Product configuration loading.
//!
//! A product file names the dataset, its current variables and how its
//! forecast files are laid out, e.g. `config/products/nws_currents.yaml`.

use std::path::Path;

use anyhow::{Context, Result};
use netcdf_parser::ProductLayout;
use serde::Deserialize;
use tide_common::{BoundingBox, TimeStep};
use tracing::debug;

/// Root of a product YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductConfig {
    pub product: ProductInfo,
    #[serde(default)]
    pub variables: VariableConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub crop: Option<CropConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInfo {
    pub dataset_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableConfig {
    #[serde(default = "default_eastward")]
    pub eastward: String,
    #[serde(default = "default_northward")]
    pub northward: String,
}

impl Default for VariableConfig {
    fn default() -> Self {
        Self {
            eastward: default_eastward(),
            northward: default_northward(),
        }
    }
}

fn default_eastward() -> String {
    "uo".to_string()
}

fn default_northward() -> String {
    "vo".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_forecast_marker")]
    pub forecast_marker: String,
    /// Native cadence such as `15m`
    #[serde(default)]
    pub interval: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            forecast_marker: default_forecast_marker(),
            interval: None,
        }
    }
}

fn default_forecast_marker() -> String {
    "FC".to_string()
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CropConfig {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl ProductConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read product config: {}", path.display()))?;

        let config: ProductConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse product config: {}", path.display()))?;

        debug!(dataset = %config.product.dataset_id, path = %path.display(), "Loaded product config");
        Ok(config)
    }

    /// File layout for the dataset source.
    pub fn layout(&self) -> ProductLayout {
        ProductLayout {
            eastward_variable: self.variables.eastward.clone(),
            northward_variable: self.variables.northward.clone(),
            forecast_marker: self.source.forecast_marker.clone(),
        }
    }

    /// Native cadence of the product, if the file declares one.
    pub fn source_interval(&self) -> Result<Option<TimeStep>> {
        self.source
            .interval
            .as_deref()
            .map(|interval| {
                interval
                    .parse::<TimeStep>()
                    .with_context(|| format!("Invalid source interval '{}'", interval))
            })
            .transpose()
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.crop
            .map(|c| BoundingBox::new(c.min_lon, c.min_lat, c.max_lon, c.max_lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_product_config() {
        let yaml = r#"
product:
  dataset_id: cmems_mod_ibi_phy_anfc_0.027deg-2D_PT15M-i
  name: "IBI surface currents"

variables:
  eastward: uoc
  northward: voc

source:
  forecast_marker: FC
  interval: 1h

crop:
  min_lon: -10.0
  min_lat: 35.0
  max_lon: -5.0
  max_lat: 44.0
"#;

        let config: ProductConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.product.dataset_id, "cmems_mod_ibi_phy_anfc_0.027deg-2D_PT15M-i");

        let layout = config.layout();
        assert_eq!(layout.eastward_variable, "uoc");
        assert_eq!(layout.northward_variable, "voc");
        assert_eq!(config.source_interval().unwrap().unwrap().minutes(), 60);

        let bbox = config.bbox().unwrap();
        assert_eq!(bbox.min_x, -10.0);
        assert_eq!(bbox.max_y, 44.0);
    }

    #[test]
    fn test_defaults() {
        let yaml = "product:\n  dataset_id: some-dataset\n";
        let config: ProductConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.layout(), ProductLayout::default());
        assert!(config.source_interval().unwrap().is_none());
        assert!(config.bbox().is_none());
    }

    #[test]
    fn test_invalid_interval() {
        let yaml = "product:\n  dataset_id: x\nsource:\n  interval: fortnightly\n";
        let config: ProductConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.source_interval().is_err());
    }

    #[test]
    fn test_bundled_product_file() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../config/products/nws_currents.yaml");
        let config = ProductConfig::load(&path).unwrap();
        assert_eq!(
            config.product.dataset_id,
            "cmems_mod_nws_phy_anfc_0.027deg-2D_PT15M-i"
        );
        assert_eq!(config.source_interval().unwrap().unwrap().minutes(), 15);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solent.yaml");
        std::fs::write(
            &path,
            "product:\n  dataset_id: solent-currents\n  description: Solent approaches\n",
        )
        .unwrap();

        let config = ProductConfig::load(&path).unwrap();
        assert_eq!(config.product.dataset_id, "solent-currents");
        assert_eq!(config.product.description, "Solent approaches");

        std::fs::write(&path, "product: [not, a, map]\n").unwrap();
        let err = ProductConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse product config"));

        assert!(ProductConfig::load(&dir.path().join("missing.yaml")).is_err());
    }
}
