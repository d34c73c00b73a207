//! The 3D mesh data model (spec §3 Mesh).
//!
//! A [`Mesh`] is immutable once built: vertices and triangle connectivity
//! never change after construction, and indices are dense and zero-based.
//! Mesh I/O (OBJ/PLY/VRML) is an external collaborator; this module only
//! owns the in-memory representation the rest of the pipeline consumes.

use crate::math::Vec3;

/// A single triangle: three vertex indices into the owning [`Mesh`], plus
/// (once the mesh has been textured) the 2D texture coordinate at each
/// corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub indices: [u32; 3],
    /// `uv[i]` is the texture coordinate for corner `indices[i]`, in
    /// `[0, 1]` atlas-normalized space. `None` until the atlas stage
    /// assigns it.
    pub uv: Option<[[f32; 2]; 3]>,
}

impl Triangle {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self {
            indices: [a, b, c],
            uv: None,
        }
    }

    #[inline]
    pub fn a(&self) -> u32 {
        self.indices[0]
    }

    #[inline]
    pub fn b(&self) -> u32 {
        self.indices[1]
    }

    #[inline]
    pub fn c(&self) -> u32 {
        self.indices[2]
    }

    /// The edge opposite corner `i` (0, 1 or 2).
    pub fn edge(&self, i: usize) -> (u32, u32) {
        match i {
            0 => (self.indices[1], self.indices[2]),
            1 => (self.indices[2], self.indices[0]),
            2 => (self.indices[0], self.indices[1]),
            _ => panic!("triangle edge index out of range: {i}"),
        }
    }
}

#[derive(Debug)]
pub enum MeshError {
    IndexOutOfRange { triangle: usize, index: u32, vertex_count: usize },
    NoVertices,
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::IndexOutOfRange { triangle, index, vertex_count } => write!(
                f,
                "triangle {triangle} references vertex {index}, but mesh only has {vertex_count} vertices"
            ),
            MeshError::NoVertices => write!(f, "mesh has no vertices"),
        }
    }
}

impl std::error::Error for MeshError {}

/// An immutable triangle mesh with dense, zero-based indices (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    triangles: Vec<Triangle>,
}

impl Mesh {
    /// Builds a mesh, checking the invariant that every triangle index is
    /// in range (spec §3).
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<Triangle>) -> Result<Self, MeshError> {
        if vertices.is_empty() && !triangles.is_empty() {
            return Err(MeshError::NoVertices);
        }
        for (i, tri) in triangles.iter().enumerate() {
            for &idx in &tri.indices {
                if idx as usize >= vertices.len() {
                    return Err(MeshError::IndexOutOfRange {
                        triangle: i,
                        index: idx,
                        vertex_count: vertices.len(),
                    });
                }
            }
        }
        Ok(Self { vertices, triangles })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangles_mut(&mut self) -> &mut [Triangle] {
        &mut self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// World-space positions of a triangle's three corners.
    pub fn triangle_positions(&self, triangle_index: usize) -> [Vec3; 3] {
        let tri = &self.triangles[triangle_index];
        [
            self.vertices[tri.a() as usize],
            self.vertices[tri.b() as usize],
            self.vertices[tri.c() as usize],
        ]
    }

    /// Centroid of a triangle's three corners.
    pub fn triangle_centroid(&self, triangle_index: usize) -> Vec3 {
        let [a, b, c] = self.triangle_positions(triangle_index);
        (a + b + c) / 3.0
    }

    /// Builds the edge-adjacency list: for each triangle, the indices of
    /// the (at most three) other triangles sharing an edge with it.
    /// Built once and reused by rating smoothing (C4) and unwrapping (C7).
    pub fn build_adjacency(&self) -> Vec<Vec<u32>> {
        use std::collections::HashMap;

        let mut edge_owner: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        for (t, tri) in self.triangles.iter().enumerate() {
            for i in 0..3 {
                let (a, b) = tri.edge(i);
                let key = if a < b { (a, b) } else { (b, a) };
                edge_owner.entry(key).or_default().push(t as u32);
            }
        }

        let mut adjacency = vec![Vec::new(); self.triangles.len()];
        for owners in edge_owner.values() {
            if owners.len() < 2 {
                continue;
            }
            for &t in owners {
                for &other in owners {
                    if other != t {
                        adjacency[t as usize].push(other);
                    }
                }
            }
        }
        for neighbours in &mut adjacency {
            neighbours.sort_unstable();
            neighbours.dedup();
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Mesh {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let triangles = vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)];
        Mesh::new(vertices, triangles).unwrap()
    }

    #[test]
    fn rejects_out_of_range_index() {
        let vertices = vec![Vec3::ZERO, Vec3::ONE];
        let triangles = vec![Triangle::new(0, 1, 2)];
        assert!(Mesh::new(vertices, triangles).is_err());
    }

    #[test]
    fn shared_edge_makes_triangles_adjacent() {
        let mesh = unit_quad();
        let adjacency = mesh.build_adjacency();
        assert_eq!(adjacency[0], vec![1]);
        assert_eq!(adjacency[1], vec![0]);
    }

    #[test]
    fn centroid_of_triangle_is_average_of_corners() {
        let mesh = unit_quad();
        let c = mesh.triangle_centroid(0);
        assert_eq!(
            c,
            (Vec3::new(0.0, 0.0, 0.0) + Vec3::new(1.0, 0.0, 0.0) + Vec3::new(1.0, 1.0, 0.0)) / 3.0
        );
    }
}
