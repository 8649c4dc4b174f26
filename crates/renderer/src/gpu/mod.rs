//! GPU side of the background.
//!
//! - `context` owns the wgpu instance, device, and surface and reconfigures
//!   the swapchain on resize.
//! - `pipeline` compiles the wrapped GLSL stages into one render pipeline.
//! - `mesh` builds the viewport-sized plane seen through an orthographic
//!   camera.
//! - `image` uploads the decoded background texture.
//! - `uniforms` mirrors the shader's uniform block.
//! - `state` glues everything together and implements `DrawTarget`.

mod context;
mod image;
mod mesh;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
