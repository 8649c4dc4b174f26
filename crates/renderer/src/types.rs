use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use backdrop::{AnchorSpec, MotionSettings};
use reqwest::Url;

/// Texture the satellite shader samples when nothing else is configured.
pub const DEFAULT_TEXTURE_URL: &str =
    "https://storage.googleapis.com/us-static-assets/us-sat-texture.jpg";

/// Where the background texture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// Fetched over HTTP(S) on the loader thread.
    Remote(Url),
    /// Read from the local filesystem.
    File(PathBuf),
}

impl TextureSource {
    /// Accepts `http(s)://` URLs, `file://` URLs, or plain paths.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            anyhow::bail!("texture source must not be empty");
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed)
                .with_context(|| format!("invalid texture url '{trimmed}'"))?;
            return Ok(Self::Remote(url));
        }
        if trimmed.starts_with("file://") {
            let url = Url::parse(trimmed)
                .with_context(|| format!("invalid texture url '{trimmed}'"))?;
            let path = url
                .to_file_path()
                .map_err(|_| anyhow::anyhow!("file url '{trimmed}' has no local path"))?;
            return Ok(Self::File(path));
        }
        Ok(Self::File(PathBuf::from(trimmed)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// File name used for the cached copy of a remote texture.
    pub fn cache_file_name(&self) -> Option<String> {
        let Self::Remote(url) = self else {
            return None;
        };
        let name: String = format!("{}{}", url.host_str().unwrap_or("remote"), url.path())
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        Some(name)
    }
}

impl Default for TextureSource {
    fn default() -> Self {
        Self::Remote(Url::parse(DEFAULT_TEXTURE_URL).expect("default texture url is valid"))
    }
}

impl fmt::Display for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureSource::Remote(url) => write!(f, "{url}"),
            TextureSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Optional on-disk overrides for the bundled shader programs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: Option<PathBuf>,
    pub fragment: Option<PathBuf>,
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Gamma-encoded swapchain, matching how browsers composite WebGL canvases.
    #[default]
    Auto,
    /// Treat shader outputs/textures as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and use sRGB swapchains/textures for conversion.
    Linear,
}

/// Adapter power preference forwarded to wgpu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    /// Prefer the integrated GPU; a background effect rarely needs more.
    #[default]
    Low,
    High,
}

/// Summary of the selected adapter, logged at startup.
#[derive(Debug, Clone)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    pub(crate) fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors the CLI/config file and tells the renderer which
/// texture to load, which shaders to compile, where the anchor region sits,
/// and how the window should be presented.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in logical pixels (ignored when fullscreen).
    pub window_size: (u32, u32),
    /// Open a borderless fullscreen window on the current monitor.
    pub fullscreen: bool,
    pub title: String,
    pub texture: TextureSource,
    /// Directory holding the last successfully fetched remote texture, used
    /// when the network is unavailable.
    pub texture_cache: Option<PathBuf>,
    pub shaders: ShaderSources,
    /// Region whose bounding box becomes the shader's exclusion zone.
    pub anchor: AnchorSpec,
    pub motion: MotionSettings,
    /// Start `u_time` at a random offset instead of zero.
    pub randomize_start_time: bool,
    /// Stop advancing frames while the window is occluded.
    pub pause_when_hidden: bool,
    /// Request a transparent window and premultiplied surface alpha.
    pub transparent: bool,
    pub power: GpuPowerPreference,
    pub color_space: ColorSpaceMode,
}

impl Default for RendererConfig {
    /// A 1280x720 window with the bundled shaders and the default texture.
    fn default() -> Self {
        Self {
            window_size: (1280, 720),
            fullscreen: false,
            title: "spores".to_string(),
            texture: TextureSource::default(),
            texture_cache: None,
            shaders: ShaderSources::default(),
            anchor: AnchorSpec::default(),
            motion: MotionSettings::default(),
            randomize_start_time: true,
            pause_when_hidden: true,
            transparent: false,
            power: GpuPowerPreference::default(),
            color_space: ColorSpaceMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_texture_sources() {
        assert!(TextureSource::parse("https://example.com/a.jpg")
            .unwrap()
            .is_remote());
        assert_eq!(
            TextureSource::parse("textures/sat.png").unwrap(),
            TextureSource::File(PathBuf::from("textures/sat.png"))
        );
        assert_eq!(
            TextureSource::parse("file:///tmp/sat.png").unwrap(),
            TextureSource::File(PathBuf::from("/tmp/sat.png"))
        );
        assert!(TextureSource::parse("   ").is_err());
    }

    #[test]
    fn cache_names_are_flat_and_stable() {
        let source = TextureSource::default();
        assert_eq!(
            source.cache_file_name().as_deref(),
            Some("storage.googleapis.com_us-static-assets_us-sat-texture.jpg")
        );
        assert_eq!(
            TextureSource::File(PathBuf::from("a.png")).cache_file_name(),
            None
        );
    }

    #[test]
    fn default_texture_is_the_remote_satellite_image() {
        assert_eq!(TextureSource::default().to_string(), DEFAULT_TEXTURE_URL);
    }
}
