//! Configuration for a PDF-to-PNG conversion.
//!
//! Every knob lives in [`ConversionConfig`], built through
//! [`ConversionConfigBuilder`]. The defaults reproduce the plain behaviour:
//! page one at 2× scale with full anti-aliasing, engine fetched on demand.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upscaling factor applied to the page's point size. Default: 2.0.
pub const DEFAULT_SCALE: f32 = 2.0;

/// Configuration for a conversion.
///
/// # Example
/// ```rust
/// use pdf2img::{ConversionConfig, Smoothing};
///
/// let config = ConversionConfig::builder()
///     .scale(3.0)
///     .smoothing(Smoothing::Off)
///     .build()
///     .unwrap();
/// assert_eq!(config.scale, 3.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Multiplier from PDF points to output pixels. Range: 0.25–8.0. Default: 2.0.
    ///
    /// A US-Letter page (612 × 792 pt) renders at 1224 × 1584 px by default.
    pub scale: f32,

    /// Anti-aliasing applied while rasterising. Default: [`Smoothing::High`].
    pub smoothing: Smoothing,

    /// Longest-edge cap in pixels, applied after `scale`. Default: 16 000.
    ///
    /// Keeps a poster-sized page from allocating gigabytes of bitmap.
    pub max_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the PDFium shared library.
    ///
    /// When `None` the library is looked up through `PDFIUM_LIB_PATH` and the
    /// cache directory.
    pub engine_library: Option<PathBuf>,

    /// Allow downloading PDFium when it is not installed. Default: true.
    pub download_engine: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            smoothing: Smoothing::default(),
            max_pixels: 16_000,
            password: None,
            engine_library: None,
            download_engine: true,
            download_timeout_secs: 120,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check the constraints [`ConversionConfigBuilder::build`] enforces.
    ///
    /// Fields are public and the struct deserialises directly, so converters
    /// re-check before rendering.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !(0.25..=8.0).contains(&self.scale) {
            return Err(ConvertError::InvalidConfig(format!(
                "scale must be between 0.25 and 8, got {}",
                self.scale
            )));
        }
        if self.max_pixels < 16 {
            return Err(ConvertError::InvalidConfig(format!(
                "max_pixels must be ≥ 16, got {}",
                self.max_pixels
            )));
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = if scale.is_finite() {
            scale.clamp(0.25, 8.0)
        } else {
            scale
        };
        self
    }

    pub fn smoothing(mut self, smoothing: Smoothing) -> Self {
        self.config.smoothing = smoothing;
        self
    }

    pub fn max_pixels(mut self, px: u32) -> Self {
        self.config.max_pixels = px;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn engine_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.engine_library = Some(path.into());
        self
    }

    pub fn download_engine(mut self, allow: bool) -> Self {
        self.config.download_engine = allow;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// How much anti-aliasing the engine applies.
///
/// `High` turns on text, image and path smoothing and uses print-quality
/// rendering; `Standard` smooths text and paths only; `Off` renders hard
/// pixel edges, which is occasionally wanted for pixel-exact comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoothing {
    Off,
    Standard,
    #[default]
    High,
}

impl Smoothing {
    pub fn text(self) -> bool {
        self != Smoothing::Off
    }

    pub fn paths(self) -> bool {
        self != Smoothing::Off
    }

    pub fn images(self) -> bool {
        self == Smoothing::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_render_at_double_scale_with_high_smoothing() {
        let c = ConversionConfig::default();
        assert_eq!(c.scale, 2.0);
        assert_eq!(c.smoothing, Smoothing::High);
        assert!(c.download_engine);
        assert!(c.engine_library.is_none());
    }

    #[test]
    fn builder_clamps_scale() {
        let c = ConversionConfig::builder().scale(100.0).build().unwrap();
        assert_eq!(c.scale, 8.0);
        let c = ConversionConfig::builder().scale(0.0).build().unwrap();
        assert_eq!(c.scale, 0.25);
    }

    #[test]
    fn builder_rejects_nan_scale() {
        let err = ConversionConfig::builder().scale(f32::NAN).build().unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_tiny_pixel_cap() {
        let err = ConversionConfig::builder().max_pixels(4).build().unwrap_err();
        assert!(err.to_string().contains("max_pixels"));
    }

    #[test]
    fn deserialised_config_is_validated() {
        let json = r#"{"scale":0.0,"smoothing":"high","max_pixels":16000,"password":null,
            "engine_library":null,"download_engine":true,"download_timeout_secs":120}"#;
        let c: ConversionConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(c.validate(), Err(ConvertError::InvalidConfig(_))));

        let c = ConversionConfig {
            scale: f32::NAN,
            ..Default::default()
        };
        assert!(c.validate().unwrap_err().to_string().contains("scale"));
        assert!(ConversionConfig::default().validate().is_ok());
    }

    #[test]
    fn smoothing_flags() {
        assert!(Smoothing::High.images() && Smoothing::High.text());
        assert!(!Smoothing::Standard.images() && Smoothing::Standard.paths());
        assert!(!Smoothing::Off.text() && !Smoothing::Off.paths());
    }

    #[test]
    fn config_round_trips_through_json() {
        let c = ConversionConfig::builder()
            .password("secret")
            .engine_library("/opt/pdfium/libpdfium.so")
            .build()
            .unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"smoothing\":\"high\""));
        let back: ConversionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
