//! animthumb
//!
//! Renders fixed-size thumbnail previews from canvas animation assets (a
//! script that registers a composition with the animation runtime) or from
//! static raster images, returning the result as a data URL.
//!
//! # Features
//!
//! - **CDP Backend** (default): script assets are rendered inside headless
//!   Chrome via the DevTools protocol
//! - **Static images**: `.png`/`.jpg`/`.jpeg` inputs are resized in-process
//! - **Best-effort contract**: [`ThumbnailService::generate`] never fails; an
//!   empty string means no thumbnail. Use
//!   [`ThumbnailService::try_generate`] for the structured error.
//!
//! # Example
//!
//! ```no_run
//! use animthumb::{ThumbnailOptions, write_data_url};
//!
//! # async fn run() {
//! let opts = ThumbnailOptions { width: 320, height: 180, ..Default::default() };
//! let data_url = animthumb::generate("banner.js", Some(opts)).await;
//! if !data_url.is_empty() {
//!     write_data_url(&data_url, "banner.jpg");
//! }
//! # }
//! ```

use serde::Deserialize;

pub mod error;
pub use error::{Error, Result};

pub mod data_url;
pub use data_url::{try_write_data_url, write_data_url, EncodedImage};

pub mod resize;
pub use resize::ImageResizer;

pub mod service;
pub use service::{Renderer, ThumbnailService};

#[cfg(feature = "cdp")]
pub mod cdp;

#[cfg(feature = "cdp")]
pub use cdp::{BrowserRenderer, RendererConfig};

/// Output encoding for a thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    /// MIME type used in the data URL and passed to `canvas.toDataURL`
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Per-call thumbnail options
///
/// The defaults produce a small 16:9 JPEG preview taken an eighth of the way
/// into the animation. Options can also be read from camelCase JSON with any
/// subset of fields present:
///
/// ```
/// let opts = animthumb::ThumbnailOptions::from_json(r#"{"width": 64, "imageFormat": "png"}"#).unwrap();
/// assert_eq!(opts.width, 64);
/// assert_eq!(opts.height, 113);
/// assert_eq!(opts.image_format, animthumb::ImageFormat::Png);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThumbnailOptions {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Scale applied to the animation stage (script assets only)
    pub scale: f64,
    /// Fraction of the clip's timeline to seek to before capturing, in [0, 1]
    pub stop_point: f64,
    /// Output encoding
    pub image_format: ImageFormat,
    /// Encoder quality in [0, 1]; ignored for PNG
    pub image_quality: f64,
    /// Deadline for the whole browser render in milliseconds
    pub render_timeout_ms: u64,
    /// Launch a visible browser with devtools open
    pub debug_mode: bool,
    /// JavaScript evaluated after the runtime and before the asset
    pub preload_script: Option<String>,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            width: 200,
            height: 113,
            scale: 0.104,
            stop_point: 0.125,
            image_format: ImageFormat::Jpeg,
            image_quality: 0.6,
            render_timeout_ms: 5000,
            debug_mode: false,
            preload_script: None,
        }
    }
}

impl ThumbnailOptions {
    /// Parse options from JSON, filling absent fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let opts: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("Malformed options: {}", e)))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject values outside the ranges the renderers accept.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidInput(format!(
                "Thumbnail size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::InvalidInput(format!("scale must be positive, got {}", self.scale)));
        }
        if !(0.0..=1.0).contains(&self.stop_point) {
            return Err(Error::InvalidInput(format!("stopPoint must be in [0, 1], got {}", self.stop_point)));
        }
        if !(0.0..=1.0).contains(&self.image_quality) {
            return Err(Error::InvalidInput(format!(
                "imageQuality must be in [0, 1], got {}",
                self.image_quality
            )));
        }
        if self.render_timeout_ms == 0 {
            return Err(Error::InvalidInput("renderTimeoutMs must be positive".into()));
        }
        Ok(())
    }
}

/// What kind of asset a path refers to, judged by its suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `.js` animation asset, rendered in the browser
    Script,
    /// `.png`, `.jpg` or `.jpeg` raster image, resized in-process
    Image,
    Unsupported,
}

impl AssetKind {
    /// Classify by suffix. Matching is case-sensitive: `LOGO.PNG` is unsupported.
    pub fn classify(path: &str) -> Self {
        if path.ends_with(".js") {
            AssetKind::Script
        } else if [".png", ".jpg", ".jpeg"].iter().any(|ext| path.ends_with(ext)) {
            AssetKind::Image
        } else {
            AssetKind::Unsupported
        }
    }
}

/// Generate a thumbnail with the default Chrome renderer.
///
/// Returns an empty string when no thumbnail could be produced; the cause is
/// logged.
#[cfg(feature = "cdp")]
pub async fn generate(asset_path: &str, options: Option<ThumbnailOptions>) -> String {
    ThumbnailService::new(BrowserRenderer::new(RendererConfig::default()))
        .generate(asset_path, options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ThumbnailOptions::default();
        assert_eq!(opts.width, 200);
        assert_eq!(opts.height, 113);
        assert_eq!(opts.image_format, ImageFormat::Jpeg);
        assert_eq!(opts.render_timeout_ms, 5000);
        assert!(opts.preload_script.is_none());
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_options_from_json() {
        let opts = ThumbnailOptions::from_json(
            r#"{"stopPoint": 0.5, "imageQuality": 0.9, "debugMode": true, "preloadScript": "window.x = 1;"}"#,
        )
        .unwrap();
        assert_eq!(opts.stop_point, 0.5);
        assert_eq!(opts.image_quality, 0.9);
        assert!(opts.debug_mode);
        assert_eq!(opts.preload_script.as_deref(), Some("window.x = 1;"));
        assert_eq!(opts.width, 200);
    }

    #[test]
    fn test_options_reject_out_of_range() {
        assert!(matches!(
            ThumbnailOptions::from_json(r#"{"stopPoint": 1.5}"#),
            Err(Error::InvalidInput(_))
        ));
        let opts = ThumbnailOptions { width: 0, ..Default::default() };
        assert!(matches!(opts.validate(), Err(Error::InvalidInput(_))));
        assert!(ThumbnailOptions::from_json("{not json").is_err());
    }

    #[test]
    fn test_classify() {
        assert_eq!(AssetKind::classify("anim/banner.js"), AssetKind::Script);
        assert_eq!(AssetKind::classify("logo.png"), AssetKind::Image);
        assert_eq!(AssetKind::classify("photo.jpg"), AssetKind::Image);
        assert_eq!(AssetKind::classify("photo.jpeg"), AssetKind::Image);
        assert_eq!(AssetKind::classify("LOGO.PNG"), AssetKind::Unsupported);
        assert_eq!(AssetKind::classify("loop.gif"), AssetKind::Unsupported);
        assert_eq!(AssetKind::classify("json"), AssetKind::Unsupported);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
    }
}
