use backdrop::UniformSet;
use bytemuck::{Pod, Zeroable};

/// std140 image of the `SporesParams` block declared by the shader prelude.
///
/// Offsets: time 0, intensity 4, mouse 8, exclusion centre 16, exclusion
/// size 24, resolution 32. The block is padded to 48 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct SporeUniforms {
    pub u_time: f32,
    pub u_itensity: f32,
    pub u_mouse_c: [f32; 2],
    pub u_exclusion_c: [f32; 2],
    pub u_exclusion_s: f32,
    pub _padding0: f32,
    pub u_res: [f32; 2],
    pub _padding1: [f32; 2],
}

impl From<&UniformSet> for SporeUniforms {
    fn from(set: &UniformSet) -> Self {
        Self {
            u_time: set.time() as f32,
            u_itensity: set.intensity(),
            u_mouse_c: set.pointer_center(),
            u_exclusion_c: set.exclusion_center(),
            u_exclusion_s: set.exclusion_size(),
            _padding0: 0.0,
            u_res: set.viewport_size(),
            _padding1: [0.0; 2],
        }
    }
}
