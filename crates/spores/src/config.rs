use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backdrop::{AnchorSpec, InitializationError, MotionSettings, DEFAULT_EASE_POWER};
use renderer::{
    ColorSpaceMode, GpuPowerPreference, RendererConfig, ShaderSources, TextureSource,
    DEFAULT_TEXTURE_URL,
};
use serde::{Deserialize, Serialize};

use crate::cli::RunArgs;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error(transparent)]
    Anchor(#[from] InitializationError),
    #[error("failed to render config as TOML")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    #[default]
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpaceSetting {
    #[default]
    Auto,
    Gamma,
    Linear,
}

/// `[anchor]` table. Either `x`/`y` (logical pixels) or `center_x`/`center_y`
/// (viewport fractions) must be present, together with `width` and `height`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnchorTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl AnchorTable {
    pub fn to_spec(&self) -> Result<AnchorSpec, ConfigError> {
        let (Some(width), Some(height)) = (self.width, self.height) else {
            return Err(InitializationError::MissingAnchor.into());
        };
        let spec = match (self.center_x, self.center_y, self.x, self.y) {
            (Some(center_x), Some(center_y), None, None) => AnchorSpec::Relative {
                center_x,
                center_y,
                width,
                height,
            },
            (None, None, Some(x), Some(y)) => AnchorSpec::Pixels {
                x,
                y,
                width,
                height,
            },
            (None, None, None, None) => return Err(InitializationError::MissingAnchor.into()),
            _ => {
                return Err(ConfigError::Invalid {
                    key: "anchor",
                    reason: "use either x/y or center_x/center_y, not a mix".to_string(),
                })
            }
        };
        Ok(spec.validate()?)
    }

    pub fn from_spec(spec: AnchorSpec) -> Self {
        match spec {
            AnchorSpec::Pixels {
                x,
                y,
                width,
                height,
            } => Self {
                x: Some(x),
                y: Some(y),
                width: Some(width),
                height: Some(height),
                ..Self::default()
            },
            AnchorSpec::Relative {
                center_x,
                center_y,
                width,
                height,
            } => Self {
                center_x: Some(center_x),
                center_y: Some(center_y),
                width: Some(width),
                height: Some(height),
                ..Self::default()
            },
        }
    }
}

/// Contents of `spores.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub texture: String,
    /// Keep a copy of a fetched remote texture and fall back to it when a
    /// later fetch fails.
    pub cache_texture: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex_shader: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_shader: Option<PathBuf>,
    pub time_step: f64,
    pub entry_duration_ms: u64,
    pub ease_power: i32,
    pub randomize_start_time: bool,
    pub pause_when_hidden: bool,
    pub transparent: bool,
    pub fullscreen: bool,
    pub window_size: [u32; 2],
    pub power: PowerSetting,
    pub color_space: ColorSpaceSetting,
    pub anchor: AnchorTable,
}

impl Default for FileConfig {
    fn default() -> Self {
        let motion = MotionSettings::default();
        Self {
            texture: DEFAULT_TEXTURE_URL.to_string(),
            cache_texture: false,
            vertex_shader: None,
            fragment_shader: None,
            time_step: motion.time_step,
            entry_duration_ms: motion.entry_duration.as_millis() as u64,
            ease_power: DEFAULT_EASE_POWER,
            randomize_start_time: true,
            pause_when_hidden: true,
            transparent: false,
            fullscreen: true,
            window_size: [1280, 720],
            power: PowerSetting::default(),
            color_space: ColorSpaceSetting::default(),
            anchor: AnchorTable::from_spec(AnchorSpec::default()),
        }
    }
}

impl FileConfig {
    /// Reads `path`, or returns defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Command-line flags win over file values.
    pub fn apply_overrides(&mut self, args: &RunArgs) {
        if let Some(texture) = &args.texture {
            self.texture = texture.clone();
        }
        if let Some(fragment) = &args.fragment {
            self.fragment_shader = Some(fragment.clone());
        }
        if let Some(vertex) = &args.vertex {
            self.vertex_shader = Some(vertex.clone());
        }
        if let Some(size) = args.size {
            self.window_size = size;
        }
        if args.windowed {
            self.fullscreen = false;
        }
        if let Some(anchor) = args.anchor {
            self.anchor = AnchorTable::from_spec(anchor);
        }
        if let Some(power) = args.power {
            self.power = match power {
                GpuPowerPreference::Low => PowerSetting::Low,
                GpuPowerPreference::High => PowerSetting::High,
            };
        }
        if let Some(color_space) = args.color_space {
            self.color_space = match color_space {
                ColorSpaceMode::Auto => ColorSpaceSetting::Auto,
                ColorSpaceMode::Gamma => ColorSpaceSetting::Gamma,
                ColorSpaceMode::Linear => ColorSpaceSetting::Linear,
            };
        }
        if args.transparent {
            self.transparent = true;
        }
        if args.no_random_start {
            self.randomize_start_time = false;
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates values and builds the renderer configuration.
    pub fn to_renderer_config(&self) -> Result<RendererConfig, ConfigError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::Invalid {
                key: "time_step",
                reason: format!("must be a positive number, got {}", self.time_step),
            });
        }
        if self.ease_power < 1 {
            return Err(ConfigError::Invalid {
                key: "ease_power",
                reason: format!("must be at least 1, got {}", self.ease_power),
            });
        }
        let [width, height] = self.window_size;
        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid {
                key: "window_size",
                reason: "width and height must be greater than zero".to_string(),
            });
        }
        let texture = TextureSource::parse(&self.texture).map_err(|err| ConfigError::Invalid {
            key: "texture",
            reason: err.to_string(),
        })?;

        Ok(RendererConfig {
            window_size: (width, height),
            fullscreen: self.fullscreen,
            texture,
            shaders: ShaderSources {
                vertex: self.vertex_shader.clone(),
                fragment: self.fragment_shader.clone(),
            },
            anchor: self.anchor.to_spec()?,
            motion: MotionSettings {
                time_step: self.time_step,
                entry_duration: Duration::from_millis(self.entry_duration_ms),
                ease_power: self.ease_power,
            },
            randomize_start_time: self.randomize_start_time,
            pause_when_hidden: self.pause_when_hidden,
            transparent: self.transparent,
            power: match self.power {
                PowerSetting::Low => GpuPowerPreference::Low,
                PowerSetting::High => GpuPowerPreference::High,
            },
            color_space: match self.color_space {
                ColorSpaceSetting::Auto => ColorSpaceMode::Auto,
                ColorSpaceSetting::Gamma => ColorSpaceMode::Gamma,
                ColorSpaceSetting::Linear => ColorSpaceMode::Linear,
            },
            ..RendererConfig::default()
        })
    }
}
