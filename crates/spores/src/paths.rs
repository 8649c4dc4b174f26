use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "SPORES_CONFIG_DIR";
pub const ENV_CACHE_DIR: &str = "SPORES_CACHE_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Spores";
const APPLICATION: &str = "spores";

pub const CONFIG_FILE_NAME: &str = "spores.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    cache_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let config_override = env_override(ENV_CONFIG_DIR);
        let cache_override = env_override(ENV_CACHE_DIR);
        if let (Some(config_dir), Some(cache_dir)) = (&config_override, &cache_override) {
            return Ok(Self {
                config_dir: config_dir.clone(),
                cache_dir: cache_dir.clone(),
            });
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: config_override.unwrap_or_else(|| project_dirs.config_dir().to_path_buf()),
            cache_dir: cache_override.unwrap_or_else(|| project_dirs.cache_dir().to_path_buf()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Where the last fetched remote texture is kept for offline starts.
    pub fn texture_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("textures")
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
