use anyhow::{anyhow, Context as AnyhowContext, Result};
use backdrop::InitializationError;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::types::{AdapterProfile, ColorSpaceMode, GpuPowerPreference};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SurfaceColorSpace {
    Gamma,
    Linear,
}

impl SurfaceColorSpace {
    pub(crate) fn from_mode(mode: ColorSpaceMode) -> Self {
        match mode {
            ColorSpaceMode::Auto | ColorSpaceMode::Gamma => Self::Gamma,
            ColorSpaceMode::Linear => Self::Linear,
        }
    }

    /// Format used for sampled textures so they pass through unconverted in
    /// gamma mode and get linearised in linear mode.
    pub(crate) fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            Self::Gamma => wgpu::TextureFormat::Rgba8Unorm,
            Self::Linear => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub surface_format: wgpu::TextureFormat,
    pub color_space: SurfaceColorSpace,
    pub adapter_profile: AdapterProfile,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        color_space: ColorSpaceMode,
        gpu_power: GpuPowerPreference,
        transparent: bool,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

        // The window outlives the surface: both live in `WindowState`, and the
        // GPU state is dropped first.
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .map_err(|err| InitializationError::Surface(err.to_string()))?;

        let power_preference = match gpu_power {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|err| InitializationError::Surface(format!("no suitable GPU adapter: {err}")))?;

        let adapter_profile = AdapterProfile::from_wgpu(&adapter.get_info());
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            is_software = adapter_profile.is_software(),
            "selected GPU adapter"
        );

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        let requested_width = initial_size.width.max(1);
        let requested_height = initial_size.height.max(1);
        if requested_width > max_dimension || requested_height > max_dimension {
            anyhow::bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {requested_width}x{requested_height}"
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        if surface_caps.formats.is_empty() {
            return Err(InitializationError::Surface(
                "surface reports no supported formats".to_string(),
            )
            .into());
        }
        let color_space = SurfaceColorSpace::from_mode(color_space);
        let surface_format = select_surface_format(&surface_caps.formats, color_space);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("spores device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .unwrap_or(wgpu::PresentMode::AutoVsync);

        let alpha_mode = select_alpha_mode(&surface_caps.alpha_modes, transparent);
        tracing::debug!(?present_mode, ?alpha_mode, ?surface_format, "configuring surface");

        let size = PhysicalSize::new(requested_width, requested_height);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            surface_format,
            color_space,
            adapter_profile,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Reapplies the current configuration after the surface was lost.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn select_surface_format(
    formats: &[wgpu::TextureFormat],
    color_space: SurfaceColorSpace,
) -> wgpu::TextureFormat {
    let wants_srgb = color_space == SurfaceColorSpace::Linear;
    formats
        .iter()
        .copied()
        .find(|format| format.is_srgb() == wants_srgb)
        .unwrap_or_else(|| {
            let fallback = formats[0];
            tracing::warn!(
                ?fallback,
                ?color_space,
                "no surface format matches the requested color space; falling back to {:?}",
                fallback
            );
            fallback
        })
}

/// Premultiplied output when the window is transparent, so the compositor
/// sees the fragment shader's alpha; opaque otherwise.
fn select_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    transparent: bool,
) -> wgpu::CompositeAlphaMode {
    let preferred: &[wgpu::CompositeAlphaMode] = if transparent {
        &[
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
    } else {
        &[wgpu::CompositeAlphaMode::Opaque]
    };
    let selected = preferred
        .iter()
        .copied()
        .find(|mode| modes.contains(mode));
    match selected {
        Some(mode) => mode,
        None => {
            let fallback = modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto);
            if transparent {
                tracing::warn!(
                    ?fallback,
                    "compositor does not support transparent surfaces; using {:?}",
                    fallback
                );
            }
            fallback
        }
    }
}
