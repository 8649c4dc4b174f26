use std::borrow::Cow;
use std::fs;

use anyhow::{Context, Result};
use wgpu::naga::ShaderStage;

use crate::types::ShaderSources;

/// Bundled vertex program, written against the WebGL-style names the
/// prelude provides (`position`, `uv`, `projectionMatrix`, ...).
pub(crate) const VERTEX_SHADER_GLSL: &str = include_str!("../shaders/spores.vert");

/// Bundled fragment program.
pub(crate) const FRAGMENT_SHADER_GLSL: &str = include_str!("../shaders/spores.frag");

/// Names the controller feeds; a shader that ignores all of them is almost
/// certainly wired to the wrong interface.
pub(crate) const UNIFORM_CONTRACT: [&str; 7] = [
    "u_image",
    "u_time",
    "u_itensity",
    "u_mouse_c",
    "u_exclusion_c",
    "u_exclusion_s",
    "u_res",
];

/// Vertex and fragment sources, before wrapping.
#[derive(Debug, Clone)]
pub(crate) struct LoadedShaders {
    pub vertex: String,
    pub fragment: String,
}

impl LoadedShaders {
    /// Reads any overrides from disk, falling back to the bundled programs.
    pub fn load(sources: &ShaderSources) -> Result<Self> {
        let vertex = match &sources.vertex {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read vertex shader at {}", path.display()))?,
            None => VERTEX_SHADER_GLSL.to_string(),
        };
        let fragment = match &sources.fragment {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read fragment shader at {}", path.display()))?,
            None => FRAGMENT_SHADER_GLSL.to_string(),
        };

        let combined = format!("{vertex}\n{fragment}");
        let missing = missing_contract_names(&combined);
        if missing.len() == UNIFORM_CONTRACT.len() {
            tracing::warn!(
                "shaders reference none of the controller's uniforms; nothing will animate"
            );
        } else if !missing.is_empty() {
            tracing::debug!(?missing, "shaders ignore some controller uniforms");
        }

        Ok(Self { vertex, fragment })
    }
}

/// Contract names that never appear in `source`.
pub(crate) fn missing_contract_names(source: &str) -> Vec<&'static str> {
    UNIFORM_CONTRACT
        .iter()
        .copied()
        .filter(|name| !mentions_identifier(source, name))
        .collect()
}

/// Whether `name` occurs in `source` as a whole identifier, so `u_res` does
/// not match inside `u_resolution`.
pub(crate) fn mentions_identifier(source: &str, name: &str) -> bool {
    let is_ident = |ch: char| ch.is_ascii_alphanumeric() || ch == '_';
    source.match_indices(name).any(|(start, _)| {
        let before = source[..start].chars().next_back();
        let after = source[start + name.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

/// Device pixel ratio formatted the way it is baked into the programs.
pub(crate) fn pixel_ratio_literal(scale_factor: f64) -> String {
    format!("{:.1}", scale_factor.max(0.1))
}

pub(crate) fn compile_vertex_shader(
    device: &wgpu::Device,
    source: &str,
    scale_factor: f64,
) -> wgpu::ShaderModule {
    let wrapped = wrap_shader(source, ShaderStage::Vertex, scale_factor);
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("spores vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    source: &str,
    scale_factor: f64,
) -> wgpu::ShaderModule {
    let wrapped = wrap_shader(source, ShaderStage::Fragment, scale_factor);
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("spores fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Produces a self-contained Vulkan-flavoured GLSL program from a
/// WebGL-style shader.
///
/// Steps performed:
///
/// 1. Strip `#version` and `precision` directives.
/// 2. Strip `uniform` declarations of contract names and any
///    `attribute`/`varying` declarations; the prelude redeclares them with
///    explicit bindings and locations.
/// 3. Rename WebGL 1 builtins (`gl_FragColor`, `texture2D()`) to their
///    GLSL 450 equivalents.
/// 4. Prepend the stage prelude, the shared uniform block, and the `dPR`
///    define.
fn wrap_shader(source: &str, stage: ShaderStage, scale_factor: f64) -> String {
    let mut sanitized = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        let skip = trimmed.starts_with("#version")
            || trimmed.starts_with("precision ")
            || trimmed.starts_with("attribute ")
            || trimmed.starts_with("varying ")
            || (trimmed.starts_with("uniform ")
                && UNIFORM_CONTRACT
                    .iter()
                    .any(|name| mentions_identifier(trimmed, name)));
        if skip {
            continue;
        }
        let line = line
            .replace("gl_FragColor", FRAGMENT_OUTPUT)
            .replace("texture2D(", "texture(");
        sanitized.push_str(&line);
        sanitized.push('\n');
    }

    let stage_prelude = match stage {
        ShaderStage::Fragment => FRAGMENT_PRELUDE,
        _ => VERTEX_PRELUDE,
    };
    let ratio = pixel_ratio_literal(scale_factor);

    format!(
        "#version 450\n#define dPR {ratio}\n{stage_prelude}\n{UNIFORM_PRELUDE}\n#line 1\n{sanitized}"
    )
}

/// Geometry arrives already projected by the orthographic camera on the CPU,
/// so both matrices collapse to identity.
const VERTEX_PRELUDE: &str = r"layout(location = 0) in vec3 position;
layout(location = 1) in vec2 uv;
layout(location = 0) out vec2 vUv;

#define projectionMatrix mat4(1.0)
#define modelViewMatrix mat4(1.0)
";

const FRAGMENT_OUTPUT: &str = "spores_frag_color";

const FRAGMENT_PRELUDE: &str = r"layout(location = 0) in vec2 vUv;
layout(location = 0) out vec4 spores_frag_color;
";

/// The block layout must match `SporeUniforms` in the gpu module.
const UNIFORM_PRELUDE: &str = r"layout(std140, set = 0, binding = 0) uniform SporesParams {
    float _u_time;
    float _u_itensity;
    vec2 _u_mouse_c;
    vec2 _u_exclusion_c;
    float _u_exclusion_s;
    float _padding0;
    vec2 _u_res;
} spores_params;

#define u_time spores_params._u_time
#define u_itensity spores_params._u_itensity
#define u_mouse_c spores_params._u_mouse_c
#define u_exclusion_c spores_params._u_exclusion_c
#define u_exclusion_s spores_params._u_exclusion_s
#define u_res spores_params._u_res

layout(set = 1, binding = 0) uniform texture2D spores_image_texture;
layout(set = 1, binding = 1) uniform sampler spores_image_sampler;

#define u_image sampler2D(spores_image_texture, spores_image_sampler)
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_strips_webgl_declarations() {
        let wrapped = wrap_shader(FRAGMENT_SHADER_GLSL, ShaderStage::Fragment, 2.0);
        assert!(!wrapped.contains("uniform float u_time;"));
        assert!(!wrapped.contains("uniform sampler2D u_image;"));
        assert!(!wrapped.contains("precision highp float;"));
        assert!(!wrapped.contains("varying vec2 vUv;"));
        assert!(wrapped.starts_with("#version 450\n#define dPR 2.0\n"));
        assert!(wrapped.contains("spores_frag_color = vec4("));
        assert!(!wrapped.contains("gl_FragColor"));
        assert!(!wrapped.contains("texture2D("));
        assert!(wrapped.contains("uniform texture2D spores_image_texture;"));
        assert!(wrapped.contains("void main()"));
    }

    #[test]
    fn wrap_keeps_unrelated_uniforms() {
        let source = "uniform float custom_gain;\nvoid main() {}\n";
        let wrapped = wrap_shader(source, ShaderStage::Fragment, 1.0);
        assert!(wrapped.contains("uniform float custom_gain;"));
    }

    #[test]
    fn wrap_keeps_uniforms_that_only_share_a_prefix() {
        let source = "uniform vec2 u_resolution;\nuniform vec2 u_res;\nvoid main() {}\n";
        let wrapped = wrap_shader(source, ShaderStage::Fragment, 1.0);
        assert!(wrapped.contains("uniform vec2 u_resolution;"));
        assert!(!wrapped.contains("uniform vec2 u_res;"));
    }

    #[test]
    fn contract_names_match_whole_identifiers() {
        assert!(mentions_identifier("vec2 p = u_res * 0.5;", "u_res"));
        assert!(mentions_identifier("u_res", "u_res"));
        assert!(!mentions_identifier("vec2 p = u_resolution;", "u_res"));
        assert!(!mentions_identifier("float my_u_time;", "u_time"));

        let missing = missing_contract_names("uniform vec2 u_resolution; float x = u_time;");
        assert!(missing.contains(&"u_res"));
        assert!(!missing.contains(&"u_time"));
    }

    #[test]
    fn vertex_wrap_provides_attributes_and_camera() {
        let wrapped = wrap_shader(VERTEX_SHADER_GLSL, ShaderStage::Vertex, 1.0);
        assert!(wrapped.contains("layout(location = 0) in vec3 position;"));
        assert!(wrapped.contains("#define projectionMatrix mat4(1.0)"));
        assert!(wrapped.contains("gl_Position"));
    }

    #[test]
    fn pixel_ratio_is_baked_with_one_decimal() {
        assert_eq!(pixel_ratio_literal(1.0), "1.0");
        assert_eq!(pixel_ratio_literal(1.24), "1.2");
        assert_eq!(pixel_ratio_literal(1.76), "1.8");
        assert_eq!(pixel_ratio_literal(2.0), "2.0");
    }

    #[test]
    fn bundled_shaders_honour_the_uniform_contract() {
        let combined = format!("{VERTEX_SHADER_GLSL}\n{FRAGMENT_SHADER_GLSL}");
        assert!(missing_contract_names(&combined).is_empty());
        assert_eq!(missing_contract_names("void main() {}").len(), 7);
    }

    #[test]
    fn loads_shader_overrides_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let fragment = dir.path().join("custom.frag");
        std::fs::write(&fragment, "void main() { gl_FragColor = vec4(u_itensity); }").unwrap();
        let loaded = LoadedShaders::load(&ShaderSources {
            vertex: None,
            fragment: Some(fragment),
        })
        .unwrap();
        assert_eq!(loaded.vertex, VERTEX_SHADER_GLSL);
        assert!(loaded.fragment.contains("u_itensity"));

        let missing = LoadedShaders::load(&ShaderSources {
            vertex: Some(dir.path().join("missing.vert")),
            fragment: None,
        });
        assert!(missing.is_err());
    }
}
