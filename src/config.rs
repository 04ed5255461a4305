// academy-export/src/config.rs

use std::path::{Path, PathBuf};

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub service: ServiceConfig,
    pub branding: BrandingConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub log_level: String,
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandingConfig {
    pub organization: String,
    pub page_label: String,
    pub footer_note: String,
    pub producer: String,
}

/// Static assets. Every entry is optional; a missing asset degrades the
/// output instead of failing it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetConfig {
    pub primary_font: Option<PathBuf>,
    pub secondary_font: Option<PathBuf>,
    pub banner_image: Option<PathBuf>,
}

/// Page geometry in PDF points.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub row_height: f64,
    pub header_height: f64,
    pub body_font_size: f64,
    pub header_font_size: f64,
    pub footer_font_size: f64,
    pub cell_padding: f64,
}

const SERVICE_NAME: &str = "academy-export";
const LOG_LEVEL: &str = "info";
const ORGANIZATION: &str = "Học viện Ngoại ngữ";
const PAGE_LABEL: &str = "Trang";
const FOOTER_NOTE: &str = "Tài liệu được tạo tự động từ hệ thống quản lý học viên";

impl ExportConfig {
    /// Defaults, then `export.{toml,json,yaml}` if present, then
    /// `EXPORT__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("export").required(false))
            .add_source(Environment::with_prefix("EXPORT").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Same layering as [`ExportConfig::load`] with an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("EXPORT").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let layout = LayoutConfig::default();
        ConfigLoader::builder()
            .set_default("service.name", SERVICE_NAME)?
            .set_default("service.log_level", LOG_LEVEL)?
            .set_default("service.json_logs", true)?
            .set_default("branding.organization", ORGANIZATION)?
            .set_default("branding.page_label", PAGE_LABEL)?
            .set_default("branding.footer_note", FOOTER_NOTE)?
            .set_default("branding.producer", SERVICE_NAME)?
            .set_default("layout.margin_top", layout.margin_top)?
            .set_default("layout.margin_bottom", layout.margin_bottom)?
            .set_default("layout.margin_left", layout.margin_left)?
            .set_default("layout.margin_right", layout.margin_right)?
            .set_default("layout.row_height", layout.row_height)?
            .set_default("layout.header_height", layout.header_height)?
            .set_default("layout.body_font_size", layout.body_font_size)?
            .set_default("layout.header_font_size", layout.header_font_size)?
            .set_default("layout.footer_font_size", layout.footer_font_size)?
            .set_default("layout.cell_padding", layout.cell_padding)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: SERVICE_NAME.to_string(),
                log_level: LOG_LEVEL.to_string(),
                json_logs: true,
            },
            branding: BrandingConfig {
                organization: ORGANIZATION.to_string(),
                page_label: PAGE_LABEL.to_string(),
                footer_note: FOOTER_NOTE.to_string(),
                producer: SERVICE_NAME.to_string(),
            },
            assets: AssetConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_top: 40.0,
            // leaves room for the footer line and the closing banner
            margin_bottom: 80.0,
            margin_left: 30.0,
            margin_right: 30.0,
            row_height: 20.0,
            header_height: 24.0,
            body_font_size: 9.0,
            header_font_size: 9.5,
            footer_font_size: 8.0,
            cell_padding: 4.0,
        }
    }
}

impl LayoutConfig {
    pub fn printable_width(&self, page_width: f64) -> f64 {
        page_width - self.margin_left - self.margin_right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[branding]
organization = "Trung tâm Anh ngữ Sao Mai"

[assets]
banner_image = "/srv/static/banner.png"

[layout]
row_height = 18.0
"#
        )
        .unwrap();

        let config = ExportConfig::load_from(file.path()).unwrap();
        assert_eq!(config.branding.organization, "Trung tâm Anh ngữ Sao Mai");
        assert_eq!(config.branding.page_label, PAGE_LABEL);
        assert_eq!(
            config.assets.banner_image.as_deref(),
            Some(Path::new("/srv/static/banner.png"))
        );
        assert!(config.assets.primary_font.is_none());
        assert_eq!(config.layout.row_height, 18.0);
        assert_eq!(config.layout.margin_bottom, 80.0);
    }

    #[test]
    fn printable_width_subtracts_side_margins() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.printable_width(600.0), 540.0);
    }
}
