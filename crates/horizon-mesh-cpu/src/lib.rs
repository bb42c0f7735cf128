//! CPU terrain mesher: LOD-simplified height-field grids with a border ring for seam normals.
#![forbid(unsafe_code)]

use horizon_geom::Vec3;
use horizon_noise::HeightField;
use horizon_world::HeightCurve;

/// Typed reference into one of the two vertex buffers of a mesh under construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexRef {
    /// Renderable vertex.
    Interior(u32),
    /// Outer-ring vertex, used for normals only.
    Border(u32),
}

impl VertexRef {
    #[inline]
    pub fn is_border(self) -> bool {
        matches!(self, VertexRef::Border(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Normals {
    /// One smooth normal per vertex.
    Baked(Vec<Vec3>),
    /// Flat-shaded mesh: the consumer derives per-face normals when uploading.
    RecomputeOnUpload,
}

/// Renderable output. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    pub normals: Normals,
}

impl MeshBuffers {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_flat_shaded(&self) -> bool {
        matches!(self.normals, Normals::RecomputeOnUpload)
    }

    /// Per-vertex normals: the baked set, or face normals accumulated from the
    /// triangle list (which for unshared flat-shaded vertices is the face normal).
    pub fn recalculate_normals(&self) -> Vec<Vec3> {
        if let Normals::Baked(n) = &self.normals {
            return n.clone();
        }
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let n = face_normal(self.positions[a], self.positions[b], self.positions[c]);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        acc.into_iter().map(Vec3::normalized).collect()
    }
}

#[inline]
fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

/// Sample stride for a LOD: 1 at LOD 0, otherwise `lod * 2`.
#[inline]
pub fn simplification_step(lod: u32) -> usize {
    if lod == 0 { 1 } else { lod as usize * 2 }
}

/// Largest step not above `simplification_step(lod)` that lands exactly on the
/// last bordered sample and still leaves at least one quad.
pub fn effective_step(bordered_size: usize, lod: u32) -> usize {
    let span = bordered_size.saturating_sub(1);
    let mut k = simplification_step(lod);
    while k > 1 && (span % k != 0 || span < 3 * k) {
        k -= 1;
    }
    k
}

/// Renderable vertices per side for a bordered side `s` at step `k`.
#[inline]
pub fn vertices_per_line(bordered_size: usize, step: usize) -> usize {
    let span = bordered_size.saturating_sub(1);
    if step == 0 || span < 2 * step {
        0
    } else {
        span / step - 1
    }
}

/// Grid mesh under construction. Border vertices and the triangles touching
/// them live in their own buffers and never reach `MeshBuffers`.
pub struct TerrainMeshBuilder {
    step: usize,
    vertices_per_line: usize,
    positions: Vec<Vec3>,
    uvs: Vec<[f32; 2]>,
    border_positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    border_triangles: Vec<[VertexRef; 3]>,
}

impl TerrainMeshBuilder {
    pub fn new(heights: &HeightField, height_multiplier: f32, curve: &HeightCurve, lod: u32) -> Self {
        let s = heights.width().min(heights.height());
        let k = effective_step(s, lod);
        if k != simplification_step(lod) {
            log::debug!(
                target: "mesh",
                "lod {} step {} does not tile side {}; using step {}",
                lod,
                simplification_step(lod),
                s,
                k
            );
        }
        let per_line = vertices_per_line(s, k);

        let mesh_size = {
            let m = s as f32 - 2.0 * k as f32;
            if m > 0.0 { m } else { 1.0 }
        };
        let unsimplified = s as f32 - 2.0;
        let top_left_x = -(unsimplified - 1.0) / 2.0;
        let top_left_z = (unsimplified - 1.0) / 2.0;

        let mut b = Self {
            step: k,
            vertices_per_line: per_line,
            positions: Vec::with_capacity(per_line * per_line),
            uvs: Vec::with_capacity(per_line * per_line),
            border_positions: Vec::new(),
            triangles: Vec::with_capacity(2 * per_line * per_line),
            border_triangles: Vec::new(),
        };
        if s == 0 {
            return b;
        }

        let grid = (s - 1) / k + 1;
        let mut refs: Vec<VertexRef> = Vec::with_capacity(grid * grid);
        for y in (0..s).step_by(k) {
            for x in (0..s).step_by(k) {
                let u = (x as f32 - k as f32) / mesh_size;
                let v = (y as f32 - k as f32) / mesh_size;
                let h = curve.evaluate(heights.get(x, y)) * height_multiplier;
                let p = Vec3::new(top_left_x + u * unsimplified, h, top_left_z - v * unsimplified);
                let border = x == 0 || y == 0 || x == s - 1 || y == s - 1;
                if border {
                    refs.push(VertexRef::Border(b.border_positions.len() as u32));
                    b.border_positions.push(p);
                } else {
                    refs.push(VertexRef::Interior(b.positions.len() as u32));
                    b.positions.push(p);
                    b.uvs.push([u, v]);
                }
            }
        }

        for gy in 0..grid.saturating_sub(1) {
            for gx in 0..grid - 1 {
                let a = refs[gy * grid + gx];
                let bb = refs[gy * grid + gx + 1];
                let c = refs[(gy + 1) * grid + gx];
                let d = refs[(gy + 1) * grid + gx + 1];
                b.add_triangle([a, d, c]);
                b.add_triangle([d, a, bb]);
            }
        }
        b
    }

    fn add_triangle(&mut self, tri: [VertexRef; 3]) {
        if let [VertexRef::Interior(a), VertexRef::Interior(b), VertexRef::Interior(c)] = tri {
            self.triangles.push([a, b, c]);
        } else {
            self.border_triangles.push(tri);
        }
    }

    #[inline]
    fn position(&self, r: VertexRef) -> Vec3 {
        match r {
            VertexRef::Interior(i) => self.positions[i as usize],
            VertexRef::Border(i) => self.border_positions[i as usize],
        }
    }

    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }

    #[inline]
    pub fn vertices_per_line(&self) -> usize {
        self.vertices_per_line
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn border_vertex_count(&self) -> usize {
        self.border_positions.len()
    }

    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn border_triangles(&self) -> &[[VertexRef; 3]] {
        &self.border_triangles
    }

    /// Smooth normals: unnormalized face normals of every triangle, border ones
    /// included, summed into their interior corners and then normalized.
    pub fn smooth_normals(&self) -> Vec<Vec3> {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for &[a, b, c] in &self.triangles {
            let n = face_normal(
                self.positions[a as usize],
                self.positions[b as usize],
                self.positions[c as usize],
            );
            acc[a as usize] += n;
            acc[b as usize] += n;
            acc[c as usize] += n;
        }
        for tri in &self.border_triangles {
            let n = face_normal(
                self.position(tri[0]),
                self.position(tri[1]),
                self.position(tri[2]),
            );
            for r in tri {
                if let VertexRef::Interior(i) = *r {
                    acc[i as usize] += n;
                }
            }
        }
        acc.into_iter().map(Vec3::normalized).collect()
    }

    pub fn finish(self, flat_shading: bool) -> MeshBuffers {
        if flat_shading {
            return self.finish_flat();
        }
        let normals = self.smooth_normals();
        MeshBuffers {
            indices: self.triangles.iter().flatten().copied().collect(),
            positions: self.positions,
            uvs: self.uvs,
            normals: Normals::Baked(normals),
        }
    }

    // One vertex per triangle corner; nothing is shared with the smooth buffers.
    fn finish_flat(self) -> MeshBuffers {
        let n = self.triangles.len() * 3;
        let mut positions = Vec::with_capacity(n);
        let mut uvs = Vec::with_capacity(n);
        for &i in self.triangles.iter().flatten() {
            positions.push(self.positions[i as usize]);
            uvs.push(self.uvs[i as usize]);
        }
        MeshBuffers {
            positions,
            uvs,
            indices: (0..n as u32).collect(),
            normals: Normals::RecomputeOnUpload,
        }
    }
}

/// Builds the renderable mesh for a bordered height field at `lod`.
pub fn build_terrain_mesh(
    heights: &HeightField,
    height_multiplier: f32,
    curve: &HeightCurve,
    lod: u32,
    flat_shading: bool,
) -> MeshBuffers {
    TerrainMeshBuilder::new(heights, height_multiplier, curve, lod).finish(flat_shading)
}
