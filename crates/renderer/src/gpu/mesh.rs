use backdrop::Viewport;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Two triangles over the four plane corners (top-left, top-right,
/// bottom-left, bottom-right).
pub(crate) const PLANE_INDICES: [u16; 6] = [0, 2, 1, 2, 3, 1];

/// Orthographic camera whose frustum spans the viewport in pixels, centred
/// on the origin and looking down -z from `z = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OrthoCamera {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    near: f32,
    far: f32,
    eye_z: f32,
}

impl OrthoCamera {
    const NEAR: f32 = 1.0;
    const FAR: f32 = 1000.0;
    const EYE_Z: f32 = 1.0;

    pub fn for_viewport(viewport: &Viewport) -> Self {
        let [width, height] = viewport.size();
        let half_w = width.max(1.0) / 2.0;
        let half_h = height.max(1.0) / 2.0;
        Self {
            left: -half_w,
            right: half_w,
            top: half_h,
            bottom: -half_h,
            near: Self::NEAR,
            far: Self::FAR,
            eye_z: Self::EYE_Z,
        }
    }

    /// World position to clip space, with depth mapped to wgpu's `0..=1`.
    pub fn project(&self, position: [f32; 3]) -> [f32; 3] {
        let [x, y, z] = position;
        let view_z = z - self.eye_z;
        let clip_x = 2.0 * (x - self.left) / (self.right - self.left) - 1.0;
        let clip_y = 2.0 * (y - self.bottom) / (self.top - self.bottom) - 1.0;
        let depth = (-view_z - self.near) / (self.far - self.near);
        [clip_x, clip_y, depth]
    }
}

/// Unit plane scaled to the viewport, already projected through the camera.
pub(crate) fn plane_vertices(viewport: &Viewport) -> [Vertex; 4] {
    let camera = OrthoCamera::for_viewport(viewport);
    let [width, height] = viewport.size();
    let half_w = width.max(1.0) / 2.0;
    let half_h = height.max(1.0) / 2.0;
    let corners = [
        ([-half_w, half_h, 0.0], [0.0, 1.0]),
        ([half_w, half_h, 0.0], [1.0, 1.0]),
        ([-half_w, -half_h, 0.0], [0.0, 0.0]),
        ([half_w, -half_h, 0.0], [1.0, 0.0]),
    ];
    corners.map(|(position, uv)| Vertex {
        position: camera.project(position),
        uv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_fills_clip_space() {
        let vertices = plane_vertices(&Viewport::new(1920, 1080, 2.0));
        assert_eq!(vertices[0].position[..2], [-1.0, 1.0]);
        assert_eq!(vertices[1].position[..2], [1.0, 1.0]);
        assert_eq!(vertices[2].position[..2], [-1.0, -1.0]);
        assert_eq!(vertices[3].position[..2], [1.0, -1.0]);
        assert_eq!(vertices[2].uv, [0.0, 0.0]);
    }

    #[test]
    fn plane_sits_inside_the_depth_range() {
        let camera = OrthoCamera::for_viewport(&Viewport::new(800, 600, 1.0));
        let [_, _, depth] = camera.project([0.0, 0.0, 0.0]);
        assert!((0.0..=1.0).contains(&depth));
        assert_eq!(depth, 0.0);
    }

    #[test]
    fn empty_viewport_does_not_divide_by_zero() {
        let vertices = plane_vertices(&Viewport::new(0, 0, 1.0));
        assert!(vertices
            .iter()
            .all(|vertex| vertex.position.iter().all(|v| v.is_finite())));
    }

    #[test]
    fn indices_wind_counter_clockwise() {
        let vertices = plane_vertices(&Viewport::new(4, 4, 1.0));
        for tri in PLANE_INDICES.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vertices[i as usize].position);
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(cross > 0.0);
        }
    }
}
