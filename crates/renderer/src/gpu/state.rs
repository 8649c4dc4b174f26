use std::time::{Duration, Instant};

use anyhow::Result;
use backdrop::{DrawTarget, UniformSet, Viewport};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::compile::{pixel_ratio_literal, LoadedShaders};
use crate::texture::DecodedTexture;
use crate::types::{AdapterProfile, RendererConfig};

use super::context::GpuContext;
use super::image::ImageBinding;
use super::mesh::{plane_vertices, Vertex, PLANE_INDICES};
use super::pipeline::{build_pipeline, PipelineLayouts};
use super::uniforms::SporeUniforms;

const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Everything needed to draw the background plane into the window surface.
pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    shaders: LoadedShaders,
    pipeline: wgpu::RenderPipeline,
    pixel_ratio: String,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    image: ImageBinding,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    stats: FrameStats,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        scale_factor: f64,
        config: &RendererConfig,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let shaders = LoadedShaders::load(&config.shaders)?;
        let context = GpuContext::new(
            target,
            initial_size,
            config.color_space,
            config.power,
            config.transparent,
        )?;
        let layouts = PipelineLayouts::new(&context.device);
        let pipeline = build_pipeline(
            &context.device,
            &layouts,
            &shaders,
            context.surface_format,
            scale_factor,
        );

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("spores uniform buffer"),
            size: std::mem::size_of::<SporeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("spores uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let image = ImageBinding::placeholder(
            &context.device,
            &context.queue,
            &layouts.texture_layout,
            context.color_space,
        );

        let viewport = Viewport::new(context.size.width, context.size.height, scale_factor);
        let vertex_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("spores plane vertices"),
                contents: bytemuck::cast_slice(&plane_vertices(&viewport)),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let index_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("spores plane indices"),
                contents: bytemuck::cast_slice(&PLANE_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            });

        Ok(Self {
            context,
            layouts,
            shaders,
            pipeline,
            pixel_ratio: pixel_ratio_literal(scale_factor),
            uniform_buffer,
            uniform_bind_group,
            image,
            vertex_buffer,
            index_buffer,
            stats: FrameStats::new(),
        })
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    /// Replaces the placeholder with the decoded background texture.
    pub(crate) fn set_texture(&mut self, image: &DecodedTexture) -> Result<()> {
        let max_dimension = self.context.device.limits().max_texture_dimension_2d;
        if image.width > max_dimension || image.height > max_dimension {
            anyhow::bail!(
                "texture is {}x{} but the GPU supports at most {max_dimension}px per side",
                image.width,
                image.height
            );
        }
        self.image = ImageBinding::upload(
            &self.context.device,
            &self.context.queue,
            &self.layouts.texture_layout,
            self.context.color_space,
            image,
            "background",
        );
        debug!(size = ?self.image.size, "uploaded background texture");
        Ok(())
    }

    /// Rebuilds the pipeline when the rounded device pixel ratio changes.
    pub(crate) fn set_pixel_ratio(&mut self, scale_factor: f64) {
        let literal = pixel_ratio_literal(scale_factor);
        if literal == self.pixel_ratio {
            return;
        }
        debug!(from = %self.pixel_ratio, to = %literal, "pixel ratio changed; rebuilding pipeline");
        self.pipeline = build_pipeline(
            &self.context.device,
            &self.layouts,
            &self.shaders,
            self.context.surface_format,
            scale_factor,
        );
        self.pixel_ratio = literal;
    }

    /// Recovers from a lost or outdated swapchain.
    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    fn render(&mut self, uniforms: &SporeUniforms) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("spores frame encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("spores render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &self.image.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..PLANE_INDICES.len() as u32, 0, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        if let Some(fps) = self.stats.record(Instant::now()) {
            debug!(fps = fps.round(), time = uniforms.u_time, "render stats");
        }
        Ok(())
    }
}

impl DrawTarget for GpuState {
    type Error = wgpu::SurfaceError;

    fn resize(&mut self, viewport: &Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.context
            .resize(PhysicalSize::new(viewport.width, viewport.height));
        let vertices: [Vertex; 4] = plane_vertices(viewport);
        self.context
            .queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
    }

    fn draw(&mut self, uniforms: &UniformSet) -> Result<(), Self::Error> {
        self.render(&SporeUniforms::from(uniforms))
    }
}

/// Rolling frames-per-second figure for periodic debug logging.
struct FrameStats {
    window_start: Instant,
    frames: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
        }
    }

    fn record(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < STATS_INTERVAL {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        if fps < 20.0 {
            warn!(fps = fps.round(), "frame rate is low");
        }
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_stats_report_once_per_interval() {
        let start = Instant::now();
        let mut stats = FrameStats {
            window_start: start,
            frames: 0,
        };
        for i in 1..300 {
            assert!(stats
                .record(start + Duration::from_millis(i * 16))
                .is_none());
        }
        let fps = stats.record(start + STATS_INTERVAL).expect("interval elapsed");
        assert!((fps - 60.0).abs() < 0.5);
        assert_eq!(stats.frames, 0);
    }
}
