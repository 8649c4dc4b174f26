//! Window and GPU host for the spores background.
//!
//! The `backdrop` crate decides what the uniforms hold; this crate puts them
//! on screen:
//!
//! ```text
//!   spores CLI
//!        │ RendererConfig
//!        ▼
//!   Renderer::run ──▶ winit event loop ──▶ BackgroundController
//!        │                 ▲                    │ DrawTarget::draw
//!        ▼                 │ TextureReady       ▼
//!   TextureLoader ─────────┘               GpuState ──▶ wgpu surface
//! ```
//!
//! The bundled shaders are written in WebGL-style GLSL and wrapped at runtime
//! (see `compile`) so naga can compile them with explicit bindings.

mod compile;
mod gpu;
pub mod texture;
mod types;
mod window;

use anyhow::Result;

pub use texture::{DecodedTexture, TextureLoader};
pub use types::{
    AdapterProfile, ColorSpaceMode, GpuPowerPreference, RendererConfig, ShaderSources,
    TextureSource, DEFAULT_TEXTURE_URL,
};

/// Entry point used by the CLI.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Blocks on the event loop until the window closes or the texture fails.
    ///
    /// Must be called from the main thread.
    pub fn run(self) -> Result<()> {
        window::run_window(self.config)
    }
}
