//! Decoded geometry handed to the model store
//!
//! File parsing is left to the caller; these types are what a decoder
//! produces. A few procedural shapes are included for demos and tests.

use bytemuck::{Pod, Zeroable};

use super::AssetError;
use crate::foundation::math::Vec3;

/// Interleaved vertex uploaded as-is to the GPU
///
/// Layout (44 bytes): position, normal, tex_coord, tangent.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Model-space position
    pub position: [f32; 3],
    /// Unit normal
    pub normal: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
    /// Tangent for normal mapping
    pub tangent: [f32; 3],
}

impl Vertex {
    /// Vertex with a zero tangent
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
            tangent: [0.0; 3],
        }
    }

    /// Builder pattern: set the tangent
    pub fn with_tangent(mut self, tangent: [f32; 3]) -> Self {
        self.tangent = tangent;
        self
    }
}

/// One mesh of a model: geometry plus the index of its material slot
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Triangle list indices into `vertices`
    pub indices: Vec<u32>,
    /// Index into the owning node's material list
    pub material_slot: usize,
}

impl MeshData {
    /// Create a mesh using material slot 0
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            material_slot: 0,
        }
    }

    /// Builder pattern: set the material slot
    pub fn with_material_slot(mut self, slot: usize) -> Self {
        self.material_slot = slot;
        self
    }

    /// Check the mesh is a drawable triangle list
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(AssetError::InvalidMesh("mesh has no geometry".to_string()));
        }
        if self.indices.len() % 3 != 0 {
            return Err(AssetError::InvalidMesh(format!(
                "{} indices is not a triangle list",
                self.indices.len()
            )));
        }
        if let Some(bad) = self.indices.iter().find(|i| **i as usize >= self.vertices.len()) {
            return Err(AssetError::InvalidMesh(format!(
                "index {} out of range for {} vertices",
                bad,
                self.vertices.len()
            )));
        }
        Ok(())
    }

    /// Fill tangents from triangle UV gradients
    pub fn compute_tangents(&mut self) {
        let mut accum = vec![Vec3::zeros(); self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (va, vb, vc) = (self.vertices[a], self.vertices[b], self.vertices[c]);

            let e1 = Vec3::from(vb.position) - Vec3::from(va.position);
            let e2 = Vec3::from(vc.position) - Vec3::from(va.position);
            let du1 = vb.tex_coord[0] - va.tex_coord[0];
            let dv1 = vb.tex_coord[1] - va.tex_coord[1];
            let du2 = vc.tex_coord[0] - va.tex_coord[0];
            let dv2 = vc.tex_coord[1] - va.tex_coord[1];

            let det = du1 * dv2 - du2 * dv1;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let tangent = (e1 * dv2 - e2 * dv1) / det;
            for i in [a, b, c] {
                accum[i] += tangent;
            }
        }

        for (vertex, tangent) in self.vertices.iter_mut().zip(accum) {
            if let Some(unit) = tangent.try_normalize(f32::EPSILON) {
                vertex.tangent = unit.into();
            }
        }
    }
}

/// Decoded model: one or more meshes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelData {
    /// Meshes in material-slot order of the source file
    pub meshes: Vec<MeshData>,
}

impl ModelData {
    /// Model from meshes
    pub fn new(meshes: Vec<MeshData>) -> Self {
        Self { meshes }
    }

    /// Unit cube centered on the origin, 24 vertices with per-face normals
    pub fn cube() -> Self {
        // (normal, u axis, v axis)
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (n + u * su + v * sv) * 0.5;
                vertices.push(
                    Vertex::new(p.into(), normal, [(su + 1.0) * 0.5, (sv + 1.0) * 0.5])
                        .with_tangent(u.into()),
                );
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vec![MeshData::new(vertices, indices)])
    }

    /// Square in the XZ plane facing +Y, side length `size`
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        let up = [0.0, 1.0, 0.0];
        let vertices = vec![
            Vertex::new([-h, 0.0, h], up, [0.0, 0.0]).with_tangent([1.0, 0.0, 0.0]),
            Vertex::new([h, 0.0, h], up, [1.0, 0.0]).with_tangent([1.0, 0.0, 0.0]),
            Vertex::new([h, 0.0, -h], up, [1.0, 1.0]).with_tangent([1.0, 0.0, 0.0]),
            Vertex::new([-h, 0.0, -h], up, [0.0, 1.0]).with_tangent([1.0, 0.0, 0.0]),
        ];
        Self::new(vec![MeshData::new(vertices, vec![0, 1, 2, 0, 2, 3])])
    }

    /// All vertex positions across meshes
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.meshes
            .iter()
            .flat_map(|mesh| mesh.vertices.iter().map(|v| Vec3::from(v.position)))
    }
}
