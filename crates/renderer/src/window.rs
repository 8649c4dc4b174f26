use std::sync::Arc;

use anyhow::{anyhow, Result};
use backdrop::{
    AnchorSpec, BackgroundController, ResourceLoadError, SystemFrameSource, UniformSet, Viewport,
};
use tracing::{debug, error, info, warn};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopWindowTarget};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::texture::{TextureLoader, TextureResult};
use crate::types::RendererConfig;

type Controller = BackgroundController<AnchorSpec, SystemFrameSource>;

#[derive(Debug, Clone, Copy)]
enum WindowCommand {
    /// The loader thread has queued its result.
    TextureReady,
}

/// GPU resources plus the window they render into.
///
/// Field order matters: the surface inside `gpu` must drop before the window.
struct WindowState {
    gpu: GpuState,
    window: Arc<Window>,
}

impl WindowState {
    fn viewport(&self) -> Viewport {
        let size = self.window.inner_size();
        Viewport::new(size.width, size.height, self.window.scale_factor())
    }

    fn reveal(&self) {
        self.window.set_visible(true);
        self.window.request_redraw();
    }

    fn apply_texture(&mut self, controller: &mut Controller, result: TextureResult, source: &str) {
        let texture = match result {
            Ok(texture) => texture,
            Err(err) => {
                controller.texture_failed(err);
                return;
            }
        };
        if let Err(err) = self.gpu.set_texture(&texture) {
            controller.texture_failed(ResourceLoadError::new(source, err));
            return;
        }
        let viewport = self.viewport();
        if controller.texture_loaded(viewport, &mut self.gpu) {
            self.reveal();
        }
    }

    fn redraw(&mut self, controller: &mut Controller, elwt: &EventLoopWindowTarget<WindowCommand>) {
        match controller.frame(&mut self.gpu) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; exiting");
                controller.stop();
                elwt.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
            }
            Err(other) => {
                warn!("surface error: {other:?}; retrying next frame");
            }
        }
    }
}

/// Opens the window, waits for the texture, then animates until closed.
///
/// The window stays hidden while the texture loads. A load failure ends the
/// event loop and is returned as a [`ResourceLoadError`].
pub(crate) fn run_window(config: RendererConfig) -> Result<()> {
    let anchor = config.anchor.validate()?;

    let event_loop = EventLoopBuilder::<WindowCommand>::with_user_event()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let proxy = event_loop.create_proxy();

    let (width, height) = config.window_size;
    let mut builder = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(LogicalSize::new(width.max(1), height.max(1)))
        .with_visible(false)
        .with_transparent(config.transparent);
    if config.fullscreen {
        builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = Arc::new(
        builder
            .build(&event_loop)
            .map_err(|err| anyhow!("failed to create window: {err}"))?,
    );

    let gpu = GpuState::new(
        window.as_ref(),
        window.inner_size(),
        window.scale_factor(),
        &config,
    )?;
    let profile = gpu.adapter_profile();
    info!(
        adapter = %profile.name,
        backend = ?profile.backend,
        "renderer initialised"
    );
    if profile.is_software() {
        warn!(
            adapter = %profile.name,
            "software rasterizer detected; the background may animate slowly"
        );
    }

    let mut state = WindowState { gpu, window };
    let viewport = state.viewport();
    let mut uniforms = UniformSet::new(viewport.size());
    if config.randomize_start_time {
        uniforms = uniforms.with_random_start(&mut rand::thread_rng());
        debug!(time = uniforms.time(), "randomized start time");
    }
    let mut controller =
        BackgroundController::new(anchor, config.motion, SystemFrameSource::new(), viewport)
            .with_uniforms(uniforms);

    let texture_source = config.texture.to_string();
    info!(source = %texture_source, "loading background texture");
    let cache_dir = config.texture_cache.clone();
    let mut loader = TextureLoader::spawn(config.texture.clone(), cache_dir, move || {
        let _ = proxy.send_event(WindowCommand::TextureReady);
    })?;

    let pause_when_hidden = config.pause_when_hidden;
    let run_result = event_loop.run(|event, elwt| match event {
        Event::UserEvent(WindowCommand::TextureReady) => {
            if let Some(result) = loader.try_take() {
                state.apply_texture(&mut controller, result, &texture_source);
                if controller.failure().is_some() {
                    elwt.exit();
                }
            }
        }
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                controller.stop();
                elwt.exit();
            }
            WindowEvent::Resized(size) => {
                let viewport = Viewport::new(size.width, size.height, state.window.scale_factor());
                if let Some(geometry) = controller.handle_resize(viewport, &mut state.gpu) {
                    debug!(?geometry, "viewport resized");
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.gpu.set_pixel_ratio(scale_factor);
                let geometry = controller.handle_scale_factor(scale_factor, &mut state.gpu);
                if let Some(geometry) = geometry {
                    debug!(?geometry, scale_factor, "scale factor changed");
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                controller.handle_pointer_move(position.x, position.y);
            }
            WindowEvent::Occluded(hidden) if pause_when_hidden => {
                if hidden {
                    controller.pause();
                } else {
                    controller.resume();
                    state.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                state.redraw(&mut controller, elwt);
            }
            _ => {}
        },
        Event::AboutToWait => {
            if controller.is_running() {
                state.window.request_redraw();
            }
            elwt.set_control_flow(ControlFlow::Wait);
        }
        _ => {}
    });

    if let Some(failure) = controller.take_failure() {
        return Err(failure.into());
    }
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
