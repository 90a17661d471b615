//! Thumbnail service: classify an asset, dispatch, and apply the
//! best-effort contract.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error};
use tokio::sync::oneshot;

use crate::{AssetKind, EncodedImage, Error, ImageResizer, Result, ThumbnailOptions};

/// Backend that turns a script asset into an encoded image.
///
/// Implementations are blocking; the service runs them on a dedicated worker
/// thread and enforces `render_timeout_ms` around the whole call.
pub trait Renderer: Send + Sync {
    /// Render `script_path` into an encoded image.
    ///
    /// Blocks the calling thread until the image is ready or the render
    /// fails. Implementations must release whatever they acquired (browser
    /// processes, temp files) before returning on every path.
    ///
    /// ```
    /// use animthumb::{EncodedImage, Renderer, Result, ThumbnailOptions};
    /// use std::path::Path;
    ///
    /// struct Placeholder;
    ///
    /// impl Renderer for Placeholder {
    ///     fn render(&self, _script_path: &Path, opts: &ThumbnailOptions) -> Result<EncodedImage> {
    ///         Ok(EncodedImage::from_bytes(opts.image_format, &[0xFF, 0xD8]))
    ///     }
    /// }
    ///
    /// let img = Placeholder.render(Path::new("intro.js"), &ThumbnailOptions::default()).unwrap();
    /// assert!(img.as_str().starts_with("data:image/jpeg;base64,"));
    /// ```
    fn render(&self, script_path: &Path, opts: &ThumbnailOptions) -> Result<EncodedImage>;
}

/// Entry point for thumbnail generation
#[derive(Clone)]
pub struct ThumbnailService {
    renderer: Arc<dyn Renderer>,
    resizer: ImageResizer,
}

impl ThumbnailService {
    pub fn new(renderer: impl Renderer + 'static) -> Self {
        Self {
            renderer: Arc::new(renderer),
            resizer: ImageResizer::new(),
        }
    }

    /// Generate a thumbnail data URL, or an empty string on any failure.
    ///
    /// The failure cause is logged; callers that need it should use
    /// [`ThumbnailService::try_generate`].
    pub async fn generate(&self, asset_path: &str, options: Option<ThumbnailOptions>) -> String {
        match self.try_generate(asset_path, options).await {
            Ok(img) => img.into_string(),
            Err(e) => {
                error!("Thumbnail generation failed for {:?}: {}", asset_path, e);
                String::new()
            }
        }
    }

    /// Generate a thumbnail, surfacing the failure cause.
    pub async fn try_generate(&self, asset_path: &str, options: Option<ThumbnailOptions>) -> Result<EncodedImage> {
        let path = normalize(asset_path)?;
        let opts = options.unwrap_or_default();
        opts.validate()?;

        match AssetKind::classify(asset_path) {
            AssetKind::Script => self.render_with_deadline(path, opts).await,
            AssetKind::Image => self.resizer.resize(&path, &opts),
            AssetKind::Unsupported => Err(Error::UnsupportedAsset(format!(
                "{} (expected .js, .png, .jpg or .jpeg)",
                asset_path
            ))),
        }
    }

    async fn render_with_deadline(&self, path: PathBuf, opts: ThumbnailOptions) -> Result<EncodedImage> {
        let timeout_ms = opts.render_timeout_ms;
        let renderer = Arc::clone(&self.renderer);
        let (tx, rx) = oneshot::channel();

        // The worker owns the render; if we stop waiting it still runs to
        // completion and releases the browser itself.
        thread::Builder::new()
            .name("animthumb-render".into())
            .spawn(move || {
                let res = renderer.render(&path, &opts);
                if tx.send(res).is_err() {
                    debug!("Render of {} finished after the caller gave up", path.display());
                }
            })?;

        match tokio::time::timeout(Duration::from_millis(timeout_ms), rx).await {
            Ok(reply) => reply.map_err(|e| Error::Render(format!("Render worker canceled: {}", e)))?,
            Err(_) => Err(Error::Timeout(timeout_ms)),
        }
    }
}

/// Reject empty paths and resolve relative ones against the working directory.
fn normalize(asset_path: &str) -> Result<PathBuf> {
    if asset_path.trim().is_empty() {
        return Err(Error::InvalidInput("Asset path is empty".into()));
    }
    let path = Path::new(asset_path);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
