//! Converter configuration.
//!
//! Every field is optional in TOML and falls back to the defaults embedded in
//! [`DEFAULT_CONFIG`]. A loaded configuration is immutable and handed by
//! reference to each component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConvertError, Result};
use crate::xml_helpers::argb_to_rgb;

/// Default configuration, documented in full.
pub const DEFAULT_CONFIG: &str = r#"
max_upload_mb = 200
accepted_extensions = [".xlsx", ".xls"]
max_sheets = 50
security_mode = "lenient"
verify_templates = true

[template]
header_fill = "B8E6B8"
column_header_fill = "FFFF00"
column_width = 20.0

[keepalive]
interval_secs = 600
timeout_secs = 30
max_attempts = 3
retry_delay_secs = 5
"#;

/// How much the validation gate trusts the upload's own claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Size and signature must agree with what the upload declares.
    Strict,
    /// The container is sniffed from its signature, falling back to the extension.
    #[default]
    Lenient,
}

/// An RGB colour normalised to uppercase `RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse `RRGGBB`, `#RRGGBB` or `AARRGGBB` (alpha discarded).
    pub fn parse(raw: &str) -> Result<Self> {
        argb_to_rgb(raw)
            .map(Self)
            .ok_or_else(|| ConvertError::Config(format!("invalid colour {raw:?}")))
    }

    /// The colour as `RRGGBB`.
    #[must_use]
    pub fn rgb(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = ConvertError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Look of the generated template header block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateStyle {
    /// Fill of the "Article name" / "Article number" band (rows 1-2).
    pub header_fill: HexColor,
    /// Fill of the 17 column headers (row 3).
    pub column_header_fill: HexColor,
    /// Width of columns A-Q in Excel character units.
    pub column_width: f64,
}

impl Default for TemplateStyle {
    fn default() -> Self {
        Self {
            header_fill: HexColor("B8E6B8".to_string()),
            column_header_fill: HexColor("FFFF00".to_string()),
            column_width: 20.0,
        }
    }
}

/// Keep-alive prober settings. Without a `url` the prober has nothing to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeepAliveSettings {
    pub url: Option<String>,
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        Self {
            url: None,
            interval_secs: 600,
            timeout_secs: 30,
            max_attempts: 3,
            retry_delay_secs: 5,
        }
    }
}

impl KeepAliveSettings {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Top-level converter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Largest accepted upload, in MiB.
    pub max_upload_mb: u64,
    /// Lowercase extensions with leading dot.
    pub accepted_extensions: Vec<String>,
    pub max_sheets: usize,
    pub security_mode: SecurityMode,
    /// Read every generated template back and reject it on any defect.
    pub verify_templates: bool,
    pub template: TemplateStyle,
    pub keepalive: KeepAliveSettings,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 200,
            accepted_extensions: vec![".xlsx".to_string(), ".xls".to_string()],
            max_sheets: 50,
            security_mode: SecurityMode::Lenient,
            verify_templates: true,
            template: TemplateStyle::default(),
            keepalive: KeepAliveSettings::default(),
        }
    }
}

impl ConverterConfig {
    /// Decode and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Upload size limit in bytes.
    #[must_use]
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_mb == 0 {
            return Err(invalid("max_upload_mb must be greater than zero"));
        }
        if self.max_sheets == 0 {
            return Err(invalid("max_sheets must be greater than zero"));
        }
        if self.accepted_extensions.is_empty() {
            return Err(invalid("accepted_extensions must not be empty"));
        }
        for ext in &self.accepted_extensions {
            let well_formed = ext.len() > 1
                && ext.starts_with('.')
                && ext.chars().skip(1).all(|c| c.is_ascii_alphanumeric());
            if !well_formed {
                return Err(invalid(format!(
                    "accepted extension {ext:?} must look like \".xlsx\""
                )));
            }
        }
        if self.template.header_fill == self.template.column_header_fill {
            return Err(invalid(
                "template.header_fill and template.column_header_fill must differ",
            ));
        }
        let width = self.template.column_width;
        if !(width > 0.0 && width <= 255.0) {
            return Err(invalid(format!(
                "template.column_width {width} must be in (0, 255]"
            )));
        }
        if self.keepalive.max_attempts == 0 {
            return Err(invalid("keepalive.max_attempts must be at least 1"));
        }
        if self.keepalive.timeout_secs == 0 {
            return Err(invalid("keepalive.timeout_secs must be greater than zero"));
        }
        Ok(())
    }

    /// Whether `ext` (any case, with leading dot) is accepted.
    #[must_use]
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.accepted_extensions
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(ext))
    }
}

fn invalid(message: impl Into<String>) -> ConvertError {
    ConvertError::Config(message.into())
}
