//! Proxy geometry for light passes
//!
//! Point lights are drawn as a sphere, spot lights as a cone, directional
//! lights as a full-screen quad. The faceted meshes circumscribe their
//! ideal shapes so every lit pixel is covered.

use std::f32::consts::PI;

use super::api::{MeshBuffers, RenderBackend};
use super::lighting::{Light, LightType};
use super::RenderResult;
use crate::assets::{MeshData, ModelData, Vertex};
use crate::foundation::math::{Mat4, Rotation3, Vec3};

const SPHERE_RINGS: u32 = 8;
const SPHERE_SEGMENTS: u32 = 16;
const CONE_SEGMENTS: u32 = 16;

/// UV sphere enclosing the unit sphere
pub fn sphere(rings: u32, segments: u32) -> ModelData {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let inflate = 1.0 / ((PI / rings as f32).cos() * (PI / segments as f32).cos());

    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    for ring in 0..=rings {
        let theta = PI * ring as f32 / rings as f32;
        for segment in 0..=segments {
            let phi = 2.0 * PI * segment as f32 / segments as f32;
            let n = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
            let p = [n[0] * inflate, n[1] * inflate, n[2] * inflate];
            let uv = [segment as f32 / segments as f32, ring as f32 / rings as f32];
            vertices.push(Vertex::new(p, n, uv));
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            // Counter-clockwise seen from outside
            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }

    ModelData::new(vec![MeshData::new(vertices, indices)])
}

/// Cone with its apex at the origin opening along -Z to a base of radius 1 at z = -1
pub fn cone(segments: u32) -> ModelData {
    let segments = segments.max(3);
    let inflate = 1.0 / (PI / segments as f32).cos();

    let mut vertices = vec![
        Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.5, 0.5]),
        Vertex::new([0.0, 0.0, -1.0], [0.0, 0.0, -1.0], [0.5, 0.5]),
    ];
    for segment in 0..segments {
        let phi = 2.0 * PI * segment as f32 / segments as f32;
        let (x, y) = (phi.cos() * inflate, phi.sin() * inflate);
        let normal = Vec3::new(x, y, 1.0).normalize();
        vertices.push(Vertex::new([x, y, -1.0], normal.into(), [0.5 + 0.5 * phi.cos(), 0.5 + 0.5 * phi.sin()]));
    }

    let mut indices = Vec::with_capacity((segments * 6) as usize);
    for segment in 0..segments {
        let rim = 2 + segment;
        let next = 2 + (segment + 1) % segments;
        indices.extend_from_slice(&[0, rim, next]);
        indices.extend_from_slice(&[1, next, rim]);
    }

    ModelData::new(vec![MeshData::new(vertices, indices)])
}

/// Quad covering clip space at z = 0
pub fn fullscreen_quad() -> ModelData {
    let n = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex::new([-1.0, -1.0, 0.0], n, [0.0, 0.0]),
        Vertex::new([1.0, -1.0, 0.0], n, [1.0, 0.0]),
        Vertex::new([1.0, 1.0, 0.0], n, [1.0, 1.0]),
        Vertex::new([-1.0, 1.0, 0.0], n, [0.0, 1.0]),
    ];
    ModelData::new(vec![MeshData::new(vertices, vec![0, 1, 2, 0, 2, 3])])
}

/// Model matrix placing a light's proxy volume at `position`.
///
/// Directional lights get the identity; their quad is already in clip space.
pub fn volume_transform(light: &Light, position: Vec3) -> Mat4 {
    match light.light_type {
        LightType::Directional => Mat4::identity(),
        LightType::Point => {
            let r = light.volume_radius();
            Mat4::new_translation(&position) * Mat4::new_nonuniform_scaling(&Vec3::new(r, r, r))
        }
        LightType::Spot => {
            let base = light.cone_base_radius();
            let rotation = Rotation3::rotation_between(&-Vec3::z(), &light.direction)
                .unwrap_or_else(|| Rotation3::from_axis_angle(&Vec3::x_axis(), PI));
            Mat4::new_translation(&position)
                * rotation.to_homogeneous()
                * Mat4::new_nonuniform_scaling(&Vec3::new(base, base, light.volume_radius()))
        }
    }
}

/// Uploaded proxy meshes
#[derive(Debug)]
pub struct LightVolumes {
    /// Point light proxy
    pub sphere: MeshBuffers,
    /// Spot light proxy
    pub cone: MeshBuffers,
    /// Directional light proxy
    pub quad: MeshBuffers,
}

impl LightVolumes {
    /// Upload all three proxies; nothing stays on the GPU on failure
    pub fn create(backend: &mut dyn RenderBackend) -> RenderResult<Self> {
        let models = [
            sphere(SPHERE_RINGS, SPHERE_SEGMENTS),
            cone(CONE_SEGMENTS),
            fullscreen_quad(),
        ];

        let mut uploaded = Vec::with_capacity(models.len());
        for model in &models {
            let mesh = &model.meshes[0];
            match backend.create_mesh(&mesh.vertices, &mesh.indices) {
                Ok(buffers) => uploaded.push(buffers),
                Err(e) => {
                    for buffers in &uploaded {
                        backend.delete_mesh(buffers);
                    }
                    return Err(e);
                }
            }
        }

        log::debug!("Light volumes uploaded");
        Ok(Self {
            sphere: uploaded[0],
            cone: uploaded[1],
            quad: uploaded[2],
        })
    }

    /// Proxy mesh for a light type
    pub fn for_light(&self, light_type: LightType) -> &MeshBuffers {
        match light_type {
            LightType::Point => &self.sphere,
            LightType::Spot => &self.cone,
            LightType::Directional => &self.quad,
        }
    }

    /// Release the proxy meshes
    pub fn destroy(&self, backend: &mut dyn RenderBackend) {
        backend.delete_mesh(&self.sphere);
        backend.delete_mesh(&self.cone);
        backend.delete_mesh(&self.quad);
    }
}
