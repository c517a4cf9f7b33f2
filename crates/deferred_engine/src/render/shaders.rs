//! Shader sources and the compiled program set
//!
//! GLSL lives in `shaders/` next to the crate manifest and is embedded at
//! build time. The light fragment shaders share `lighting_common.glsl`,
//! which is spliced in right after their `#version` line.

use super::api::{ProgramHandle, RenderBackend};
use super::RenderResult;

const LIGHTING_COMMON: &str = include_str!("../../shaders/lighting_common.glsl");

/// Vertex and fragment source of one program
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource {
    /// Program label used in logs and errors
    pub label: &'static str,
    /// Vertex stage
    pub vertex: &'static str,
    /// Fragment stage
    pub fragment: &'static str,
    /// Whether the fragment stage needs the shared lighting code
    pub uses_lighting: bool,
}

impl ShaderSource {
    /// Fragment source with includes resolved
    pub fn fragment_source(&self) -> String {
        if self.uses_lighting {
            splice_after_version(self.fragment, LIGHTING_COMMON)
        } else {
            self.fragment.to_string()
        }
    }
}

fn splice_after_version(source: &str, include: &str) -> String {
    match source.split_once('\n') {
        Some((version, rest)) if version.trim_start().starts_with("#version") => {
            format!("{}\n{}\n{}", version, include, rest)
        }
        _ => format!("{}\n{}", include, source),
    }
}

/// G-buffer fill
pub const GEOMETRY: ShaderSource = ShaderSource {
    label: "geometry",
    vertex: include_str!("../../shaders/geometry.vert"),
    fragment: include_str!("../../shaders/geometry.frag"),
    uses_lighting: false,
};

/// Stencil marking of light volumes
pub const STENCIL: ShaderSource = ShaderSource {
    label: "stencil",
    vertex: include_str!("../../shaders/light_volume.vert"),
    fragment: include_str!("../../shaders/stencil.frag"),
    uses_lighting: false,
};

/// Point light volume shading
pub const POINT_LIGHT: ShaderSource = ShaderSource {
    label: "point_light",
    vertex: include_str!("../../shaders/light_volume.vert"),
    fragment: include_str!("../../shaders/point_light.frag"),
    uses_lighting: true,
};

/// Spot light volume shading
pub const SPOT_LIGHT: ShaderSource = ShaderSource {
    label: "spot_light",
    vertex: include_str!("../../shaders/light_volume.vert"),
    fragment: include_str!("../../shaders/spot_light.frag"),
    uses_lighting: true,
};

/// Full-screen directional light shading
pub const DIRECTIONAL_LIGHT: ShaderSource = ShaderSource {
    label: "directional_light",
    vertex: include_str!("../../shaders/fullscreen.vert"),
    fragment: include_str!("../../shaders/directional_light.frag"),
    uses_lighting: true,
};

/// Depth-only shadow map fill
pub const SHADOW_DEPTH: ShaderSource = ShaderSource {
    label: "shadow_depth",
    vertex: include_str!("../../shaders/shadow_depth.vert"),
    fragment: include_str!("../../shaders/shadow_depth.frag"),
    uses_lighting: false,
};

/// Every program the deferred renderer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderPrograms {
    /// See [`GEOMETRY`]
    pub geometry: ProgramHandle,
    /// See [`STENCIL`]
    pub stencil: ProgramHandle,
    /// See [`POINT_LIGHT`]
    pub point_light: ProgramHandle,
    /// See [`SPOT_LIGHT`]
    pub spot_light: ProgramHandle,
    /// See [`DIRECTIONAL_LIGHT`]
    pub directional_light: ProgramHandle,
    /// See [`SHADOW_DEPTH`]
    pub shadow_depth: ProgramHandle,
}

impl ShaderPrograms {
    /// Compile every program. The first failure is returned and programs
    /// compiled before it are deleted.
    pub fn compile(backend: &mut dyn RenderBackend) -> RenderResult<Self> {
        let sources = [GEOMETRY, STENCIL, POINT_LIGHT, SPOT_LIGHT, DIRECTIONAL_LIGHT, SHADOW_DEPTH];
        let mut compiled = Vec::with_capacity(sources.len());

        for source in &sources {
            match backend.create_program(source.label, source.vertex, &source.fragment_source()) {
                Ok(program) => {
                    log::debug!("Compiled shader program '{}'", source.label);
                    compiled.push(program);
                }
                Err(e) => {
                    log::error!("Shader program '{}' failed: {}", source.label, e);
                    for program in compiled {
                        backend.delete_program(program);
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self {
            geometry: compiled[0],
            stencil: compiled[1],
            point_light: compiled[2],
            spot_light: compiled[3],
            directional_light: compiled[4],
            shadow_depth: compiled[5],
        })
    }

    /// Delete every program
    pub fn destroy(&self, backend: &mut dyn RenderBackend) {
        for program in [
            self.geometry,
            self.stencil,
            self.point_light,
            self.spot_light,
            self.directional_light,
            self.shadow_depth,
        ] {
            backend.delete_program(program);
        }
    }
}
