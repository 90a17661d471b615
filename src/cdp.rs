//! Chrome DevTools Protocol renderer for script assets
//!
//! Every call launches its own headless Chrome, loads the animation runtime
//! and the asset into a blank tab, and asks the in-page harness
//! (`capture.js`) to draw one frame onto an off-document canvas.

use crate::{EncodedImage, Error, Renderer, Result, ThumbnailOptions};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Runtime;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn, Level};
use serde_json::{json, Value};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const CAPTURE_HARNESS: &str = include_str!("capture.js");

const CONSOLE_BINDING: &str = "__animthumb_console";

/// Log target for console output forwarded from the page
pub const PAGE_LOG_TARGET: &str = "animthumb::page";

/// Renderer configuration
///
/// The runtime path is fixed per renderer rather than per call: it points at
/// the animation runtime bundled alongside the crate unless overridden.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Animation runtime evaluated before every asset
    pub runtime_path: PathBuf,
    /// Chrome executable; `None` lets `headless_chrome` locate one
    pub chrome_path: Option<PathBuf>,
    /// Launch Chrome with its sandbox (disable only inside containers)
    pub sandbox: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            runtime_path: Path::new(env!("CARGO_MANIFEST_DIR")).join("assets").join("createjs.min.js"),
            chrome_path: None,
            sandbox: true,
        }
    }
}

/// Headless Chrome renderer (uses the `headless_chrome` crate)
#[derive(Debug, Clone, Default)]
pub struct BrowserRenderer {
    config: RendererConfig,
}

impl BrowserRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }
}

impl Renderer for BrowserRenderer {
    fn render(&self, script_path: &Path, opts: &ThumbnailOptions) -> Result<EncodedImage> {
        let runtime = std::fs::read_to_string(&self.config.runtime_path).map_err(|e| {
            Error::Render(format!(
                "Failed to read animation runtime {}: {}",
                self.config.runtime_path.display(),
                e
            ))
        })?;
        let asset = std::fs::read_to_string(script_path)
            .map_err(|e| Error::Render(format!("Failed to read asset {}: {}", script_path.display(), e)))?;
        let clip = clip_name(script_path)?;

        // Dropping the session closes the tab and kills Chrome on every path out.
        let session = Session::launch(&self.config, opts)?;
        session.route_console();

        session.eval("animation runtime", &runtime)?;
        if let Some(preload) = &opts.preload_script {
            session.eval("preload script", preload)?;
        }
        session.eval("asset", &asset)?;
        session.eval("capture harness", CAPTURE_HARNESS)?;

        let ids = session.composition_ids()?;
        let composition = pick_composition(&ids)?;

        let prepare = json!({
            "compositionId": composition,
            "clipName": clip,
            "width": opts.width,
            "height": opts.height,
            "scale": opts.scale,
            "mimeType": opts.image_format.mime_type(),
            "imageQuality": opts.image_quality,
        });
        let total_frames = session
            .eval("prepare", &format!("window.__animthumb.prepare({})", prepare))?
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Error::Render(format!("Could not instantiate clip '{}' from '{}'", clip, composition)))?;

        let total_frames = frame_count(&clip, total_frames)?;
        let frame = stop_frame(total_frames, opts.stop_point);
        debug!("Clip '{}' has {} frames, capturing frame {}", clip, total_frames, frame);

        let data_url = session
            .eval("capture", &format!("window.__animthumb.capture({})", frame))?
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| Error::Render(format!("Capture of '{}' returned null", clip)))?;

        EncodedImage::from_data_url(data_url)
    }
}

/// A launched browser and its single tab
struct Session {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl Session {
    fn launch(config: &RendererConfig, opts: &ThumbnailOptions) -> Result<Self> {
        let timeout = Duration::from_millis(opts.render_timeout_ms);

        let mut builder = LaunchOptions::default_builder();
        builder
            .headless(!opts.debug_mode)
            .sandbox(config.sandbox)
            .window_size(Some((opts.width, opts.height)))
            .idle_browser_timeout(timeout)
            .path(config.chrome_path.clone());
        if opts.debug_mode {
            builder.args(vec![OsStr::new("--auto-open-devtools-for-tabs")]);
        }
        let launch_options = builder
            .build()
            .map_err(|e| Error::Render(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)?;
        let tab = browser.new_tab()?;
        tab.set_default_timeout(timeout);

        Ok(Self { _browser: browser, tab })
    }

    /// Forward the page's console calls into the host log.
    fn route_console(&self) {
        let bound = self
            .tab
            .expose_function(CONSOLE_BINDING, Arc::new(|payload: Value| {
                // payload may arrive as a JSON string
                let msg = match payload {
                    Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
                    other => other,
                };
                let level = match msg.get("level").and_then(Value::as_str) {
                    Some("error") => Level::Error,
                    Some("warn") => Level::Warn,
                    Some("debug") => Level::Debug,
                    _ => Level::Info,
                };
                let text = match msg.get("args") {
                    Some(Value::Array(args)) => args
                        .iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect::<Vec<_>>()
                        .join(" "),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                log::log!(target: PAGE_LOG_TARGET, level, "{}", text);
            }));
        if let Err(e) = bound {
            warn!("Failed to expose console binding: {}", e);
            return;
        }

        let wrapper = r#"(function(){
            const bind = window.__animthumb_console;
            if (!bind) return;
            ['log','info','warn','error','debug'].forEach(function(k){
                const orig = console[k];
                console[k] = function(...args){
                    try{ bind(JSON.stringify({ level:k, args: args.map(a=>String(a)) })); }catch(e){}
                    try{ orig.apply(console, args); }catch(e){}
                };
            });
        })();"#;
        if let Err(e) = self.tab.evaluate(wrapper, false) {
            warn!("Failed to install console wrapper: {}", e);
        }
    }

    /// Evaluate `source` in the page; anything thrown aborts the render.
    ///
    /// Protocol failures surface as `CdpError`; exceptions raised by the page
    /// itself as `Render`.
    fn eval(&self, label: &str, source: &str) -> Result<Option<Value>> {
        let reply = self.tab.call_method(Runtime::Evaluate {
            expression: source.to_string(),
            return_by_value: Some(false),
            silent: Some(false),
            await_promise: Some(false),
            object_group: None,
            include_command_line_api: None,
            context_id: None,
            generate_preview: None,
            user_gesture: None,
            throw_on_side_effect: None,
            timeout: None,
            disable_breaks: None,
            repl_mode: None,
            allow_unsafe_eval_blocked_by_csp: None,
            unique_context_id: None,
            serialization_options: None,
        })?;

        if let Some(details) = reply.exception_details {
            let thrown = details
                .exception
                .and_then(|ex| ex.description.or_else(|| ex.value.map(|v| v.to_string())))
                .unwrap_or(details.text);
            return Err(Error::Render(format!("Evaluating {} threw: {}", label, thrown)));
        }

        Ok(reply.result.value.filter(|v| !v.is_null()))
    }

    /// Ordered ids of the compositions the asset registered.
    fn composition_ids(&self) -> Result<Vec<String>> {
        let raw = self
            .eval("composition registry", "window.__animthumb.listCompositionIds()")?
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| Error::Render("Composition registry returned nothing".into()))?;
        serde_json::from_str(&raw).map_err(|e| Error::Render(format!("Malformed composition list: {}", e)))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!("Closing render tab failed: {}", e);
        }
    }
}

/// Clip symbol name for an asset: its file name without directory or extension.
pub fn clip_name(script_path: &Path) -> Result<String> {
    script_path
        .file_stem()
        .and_then(OsStr::to_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("Cannot derive a clip name from {}", script_path.display())))
}

/// Narrow the page-reported frame count, rejecting values that do not fit.
fn frame_count(clip: &str, total_frames: u64) -> Result<u32> {
    u32::try_from(total_frames)
        .map_err(|_| Error::Render(format!("Clip '{}' reports {} frames", clip, total_frames)))
}

/// Frame captured for a clip: `floor(total_frames * stop_point)`.
pub fn stop_frame(total_frames: u32, stop_point: f64) -> u32 {
    (f64::from(total_frames) * stop_point).floor() as u32
}

/// Pick the composition to render. Assets registering several compositions
/// are not supported; the first one listed wins.
pub fn pick_composition(ids: &[String]) -> Result<&str> {
    match ids {
        [] => Err(Error::Render("Asset registered no composition".into())),
        [only] => Ok(only.as_str()),
        [first, ..] => {
            warn!("Asset registered {} compositions, rendering only '{}'", ids.len(), first);
            Ok(first.as_str())
        }
    }
}
