use std::path::PathBuf;

use anyhow::{Context, Result};
use backdrop::ResourceLoadError;
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::config::FileConfig;
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// File config with command-line overrides applied.
pub fn effective_config(paths: &AppPaths, args: &RunArgs) -> Result<(PathBuf, FileConfig)> {
    let config_path = args.config.clone().unwrap_or_else(|| paths.config_file());
    let mut config = FileConfig::load_or_default(&config_path)?;
    config.apply_overrides(args);
    Ok((config_path, config))
}

pub fn renderer_config(paths: &AppPaths, config: &FileConfig) -> Result<RendererConfig> {
    let mut renderer = config
        .to_renderer_config()
        .context("invalid spores configuration")?;
    if config.cache_texture {
        renderer.texture_cache = Some(paths.texture_cache_dir());
    }
    Ok(renderer)
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let (config_path, config) = effective_config(&paths, &args)?;
    tracing::debug!(
        config = %config_path.display(),
        exists = config_path.exists(),
        cache = %paths.cache_dir().display(),
        "resolved spores paths"
    );
    let renderer_config = renderer_config(&paths, &config)?;
    tracing::info!(
        texture = %renderer_config.texture,
        fullscreen = renderer_config.fullscreen,
        anchor = ?renderer_config.anchor,
        "starting spores background"
    );

    match Renderer::new(renderer_config).run() {
        Ok(()) => Ok(()),
        Err(err) => {
            if let Some(load) = err.downcast_ref::<ResourceLoadError>() {
                tracing::error!(
                    url = %load.source_url,
                    cause = %load.cause,
                    "background texture could not be loaded; the surface stayed hidden"
                );
            }
            Err(err)
        }
    }
}
