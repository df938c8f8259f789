//! Bone model loading and orbit-camera projection for the wireframe viewer.

use std::collections::HashSet;

use gltf::mesh::Mode;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("not a glTF asset: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("asset contains no triangle geometry")]
    NoGeometry,
    #[error("index {index} out of range for a primitive with {count} vertices")]
    IndexOutOfRange { index: u32, count: u32 },
}

/// Triangle mesh flattened to world-space vertices and unique edges
#[derive(Debug, Clone, PartialEq)]
pub struct BoneMesh {
    pub vertices: Vec<[f32; 3]>,
    pub edges: Vec<[u32; 2]>,
    pub triangle_count: usize,
}

type Mat4 = [[f32; 4]; 4];

const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

// Column-major, as glTF stores them.
fn mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for (c, column) in out.iter_mut().enumerate() {
        for (r, value) in column.iter_mut().enumerate() {
            *value = (0..4).map(|k| a[k][r] * b[c][k]).sum();
        }
    }
    out
}

fn transform_point(m: &Mat4, p: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (r, value) in out.iter_mut().enumerate() {
        *value = m[0][r] * p[0] + m[1][r] * p[1] + m[2][r] * p[2] + m[3][r];
    }
    out
}

impl BoneMesh {
    /// Parse a GLB (or self-contained glTF) asset
    pub fn from_gltf_bytes(bytes: &[u8]) -> Result<Self, MeshError> {
        let (document, buffers, _) = gltf::import_slice(bytes)?;
        let mut mesh = BoneMesh {
            vertices: Vec::new(),
            edges: Vec::new(),
            triangle_count: 0,
        };
        let mut seen = HashSet::new();

        let scene = document.default_scene().or_else(|| document.scenes().next());
        let mut stack: Vec<(gltf::Node<'_>, Mat4)> = match scene {
            Some(scene) => scene.nodes().map(|n| (n, IDENTITY)).collect(),
            None => document.nodes().map(|n| (n, IDENTITY)).collect(),
        };

        while let Some((node, parent)) = stack.pop() {
            let world = mul(&parent, &node.transform().matrix());
            if let Some(node_mesh) = node.mesh() {
                for primitive in node_mesh.primitives() {
                    if primitive.mode() != Mode::Triangles {
                        continue;
                    }
                    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
                    let Some(positions) = reader.read_positions() else {
                        continue;
                    };

                    let base = mesh.vertices.len() as u32;
                    mesh.vertices
                        .extend(positions.map(|p| transform_point(&world, p)));
                    let count = mesh.vertices.len() as u32 - base;

                    let indices: Vec<u32> = match reader.read_indices() {
                        Some(indices) => indices.into_u32().collect(),
                        None => (0..count).collect(),
                    };
                    if let Some(&index) = indices.iter().find(|&&i| i >= count) {
                        return Err(MeshError::IndexOutOfRange { index, count });
                    }
                    for tri in indices.chunks_exact(3) {
                        mesh.triangle_count += 1;
                        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                            let edge = [base + a.min(b), base + a.max(b)];
                            if seen.insert(edge) {
                                mesh.edges.push(edge);
                            }
                        }
                    }
                }
            }
            stack.extend(node.children().map(|child| (child, world)));
        }

        if mesh.triangle_count == 0 {
            return Err(MeshError::NoGeometry);
        }
        debug!(
            "Loaded mesh: {} vertices, {} triangles, {} edges",
            mesh.vertices.len(),
            mesh.triangle_count,
            mesh.edges.len()
        );
        Ok(mesh)
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        (min, max)
    }

    /// Center of the bounding box and the radius of its enclosing sphere
    pub fn bounding_sphere(&self) -> ([f64; 3], f64) {
        let (min, max) = self.bounds();
        let center = [
            (min[0] as f64 + max[0] as f64) / 2.0,
            (min[1] as f64 + max[1] as f64) / 2.0,
            (min[2] as f64 + max[2] as f64) / 2.0,
        ];
        let radius = ((max[0] - min[0]) as f64).hypot((max[1] - min[1]) as f64)
            .hypot((max[2] - min[2]) as f64)
            / 2.0;
        (center, radius.max(1e-6))
    }
}

/// Orbit camera around a focus point, perspective projection
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub focus: [f64; 3],
    pub yaw: f64,
    pub pitch: f64,
    pub distance: f64,
    /// Vertical field of view in degrees
    pub fov_deg: f64,
    min_distance: f64,
    max_distance: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus: [0.0; 3],
            yaw: 0.0,
            pitch: 0.0,
            distance: 2.0,
            fov_deg: 70.0,
            min_distance: 0.2,
            max_distance: 20.0,
        }
    }
}

const NEAR: f64 = 0.1;
const MAX_PITCH: f64 = 89.0 * std::f64::consts::PI / 180.0;

impl OrbitCamera {
    /// Frame a mesh so its bounding sphere fills the view
    pub fn framing(mesh: &BoneMesh) -> Self {
        let (center, radius) = mesh.bounding_sphere();
        let mut camera = Self {
            focus: center,
            ..Self::default()
        };
        let half_fov = camera.fov_deg.to_radians() / 2.0;
        camera.distance = radius / half_fov.sin() * 1.1;
        camera.min_distance = radius * 0.2;
        camera.max_distance = camera.distance * 10.0;
        camera
    }

    pub fn orbit(&mut self, d_yaw: f64, d_pitch: f64) {
        self.yaw = (self.yaw + d_yaw).rem_euclid(std::f64::consts::TAU);
        self.pitch = (self.pitch + d_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Multiply the distance by `factor` (< 1 moves closer)
    pub fn zoom(&mut self, factor: f64) {
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    pub fn eye(&self) -> [f64; 3] {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        [
            self.focus[0] + self.distance * cp * sy,
            self.focus[1] + self.distance * sp,
            self.focus[2] + self.distance * cp * cy,
        ]
    }

    /// Project a world point to normalized screen space: y in -1..1 and x in
    /// -aspect..aspect. `None` when the point is behind the near plane.
    pub fn project(&self, p: [f64; 3]) -> Option<(f64, f64)> {
        let eye = self.eye();
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        let forward = [-cp * sy, -sp, -cp * cy];
        let right = [cy, 0.0, -sy];
        let up = [-sp * sy, cp, -sp * cy];

        let d = [p[0] - eye[0], p[1] - eye[1], p[2] - eye[2]];
        let dot = |v: [f64; 3]| d[0] * v[0] + d[1] * v[1] + d[2] * v[2];
        let z = dot(forward);
        if z < NEAR {
            return None;
        }
        let f = 1.0 / (self.fov_deg.to_radians() / 2.0).tan();
        Some((dot(right) * f / z, dot(up) * f / z))
    }
}
