use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::texture::DecodedTexture;

use super::context::SurfaceColorSpace;

/// The sampled `u_image` texture and its bind group.
pub(crate) struct ImageBinding {
    pub _texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
    pub size: (u32, u32),
}

impl ImageBinding {
    /// 1x1 transparent texel bound until the real texture arrives.
    pub fn placeholder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        color_space: SurfaceColorSpace,
    ) -> Self {
        let texture = DecodedTexture {
            width: 1,
            height: 1,
            rgba: vec![0, 0, 0, 0],
        };
        Self::upload(device, queue, layout, color_space, &texture, "placeholder")
    }

    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        color_space: SurfaceColorSpace,
        image: &DecodedTexture,
        label: &str,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&format!("spores image texture ({label})")),
                size: wgpu::Extent3d {
                    width: image.width.max(1),
                    height: image.height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: color_space.texture_format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &image.rgba,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("spores image sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("spores image bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Self {
            _texture: texture,
            bind_group,
            size: (image.width, image.height),
        }
    }
}
