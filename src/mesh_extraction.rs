//! Mesh extraction from a height field at one LOD.
//!
//! Vertices, normals and UVs come out of a per-vertex kernel; the index list
//! out of a per-cell kernel. Both are pure and run on a
//! [`ComputeBackend`](crate::compute::ComputeBackend). Normals are analytic
//! central differences of the height field by default (the seam border keeps
//! edge lookups in range, so seams shade consistently); face-averaged
//! recomputation is available behind the config flag and the two paths agree
//! only within tolerance.

use tracing::debug;

use crate::compute::ComputeBackend;
use crate::config::TerrainConfig;
use crate::error::TerrainError;
use crate::heightfield::HeightField;

/// Normals shorter than this are treated as degenerate and replaced by +Y.
const NORMAL_EPSILON: f32 = 1e-6;

/// Vertex count above which triangle indices widen from u16 to u32.
const WIDE_INDEX_THRESHOLD: usize = 65535;

/// Axis-aligned bounding box recomputed from final vertex positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    fn from_positions(positions: &[[f32; 3]]) -> Self {
        let Some(first) = positions.first() else {
            return Self::default();
        };
        let mut min = *first;
        let mut max = *first;
        for p in positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Self { min, max }
    }
}

/// Triangle index list that widens transparently once the vertex count leaves
/// u16 range.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshIndices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl MeshIndices {
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_wide(&self) -> bool {
        matches!(self, Self::U32(_))
    }

    /// Iterate indices widened to u32 regardless of storage.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let (narrow, wide) = match self {
            Self::U16(v) => (Some(v.iter()), None),
            Self::U32(v) => (None, Some(v.iter())),
        };
        narrow
            .into_iter()
            .flatten()
            .map(|&i| u32::from(i))
            .chain(wide.into_iter().flatten().copied())
    }
}

/// Extracted chunk mesh for one LOD: parallel vertex arrays plus triangles.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: MeshIndices,
    pub aabb: Aabb,
}

impl Mesh {
    /// Mesh with no geometry; the degenerate-LOD result.
    pub fn empty() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: MeshIndices::U16(Vec::new()),
            aabb: Aabb::default(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Recompute the bounding box from current vertex positions.
    pub fn recalculate_bounds(&mut self) {
        self.aabb = Aabb::from_positions(&self.positions);
    }

    /// Replace normals by accumulating each triangle's face normal onto its
    /// three vertices and normalizing the per-vertex sums.
    pub fn recalculate_normals(&mut self) {
        let mut accum = vec![[0.0f32; 3]; self.positions.len()];
        let flat: Vec<u32> = self.indices.iter().collect();
        for tri in flat.chunks_exact(3) {
            let a = self.positions[tri[0] as usize];
            let b = self.positions[tri[1] as usize];
            let c = self.positions[tri[2] as usize];
            let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let face = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            for &i in tri {
                let n = &mut accum[i as usize];
                n[0] += face[0];
                n[1] += face[1];
                n[2] += face[2];
            }
        }
        self.normals = accum.into_iter().map(|n| normalize_or_up(n)).collect();
    }
}

/// Per-mesh normal quality statistics, logged after extraction.
#[derive(Debug)]
pub struct NormalStats {
    pub min_len: f32,
    pub max_len: f32,
    pub degenerate_count: usize,
}

/// A normal is degenerate if its length strays from 1.0 or is NaN.
pub fn normal_stats(normals: &[[f32; 3]]) -> NormalStats {
    let mut min_len = f32::MAX;
    let mut max_len = f32::MIN;
    let mut degenerate_count = 0;

    for n in normals {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        min_len = min_len.min(len);
        max_len = max_len.max(len);
        if !(0.99..=1.01).contains(&len) || len.is_nan() {
            degenerate_count += 1;
        }
    }

    if normals.is_empty() {
        min_len = 0.0;
        max_len = 0.0;
    }

    NormalStats {
        min_len,
        max_len,
        degenerate_count,
    }
}

/// Extract the mesh for one LOD from a finalized height field.
///
/// `step = 2^lod`, `gridN = R / step + 1`. A step larger than the base
/// resolution leaves `gridN < 2`: that returns an empty mesh, not an error.
/// Bounds are always recomputed from final positions; normals are recomputed
/// by face averaging only when `config.recalc_normals` is set.
pub fn extract_mesh<B: ComputeBackend>(
    field: &HeightField,
    lod: u32,
    config: &TerrainConfig,
    backend: &B,
) -> Result<Mesh, TerrainError> {
    // A field with fewer than two inner samples spans no cells.
    if field.inner_resolution() < 2 {
        return Ok(Mesh::empty());
    }
    let resolution = field.inner_resolution() - 1;
    let step = 1u32 << lod;
    let grid_n = resolution / step + 1;
    if grid_n < 2 {
        return Ok(Mesh::empty());
    }

    let n = grid_n as usize;
    let cell = config.chunk_world_size / resolution as f32;
    let uv_scale = 1.0 / (grid_n - 1) as f32;

    // Vertex pass: position from the seam-offset sample, analytic normal from
    // one-texel central differences (always in range thanks to the seam).
    let vertex_data = backend.dispatch(n, n, |i, j| {
        let si = (i as u32 * step) as i64;
        let sj = (j as u32 * step) as i64;
        let h = field.sample(si, sj);

        let left = field.sample(si - 1, sj);
        let right = field.sample(si + 1, sj);
        let down = field.sample(si, sj - 1);
        let up = field.sample(si, sj + 1);
        let normal = normalize_or_up([
            (left - right) / (2.0 * cell),
            1.0,
            (down - up) / (2.0 * cell),
        ]);

        let position = [si as f32 * cell, h, sj as f32 * cell];
        let uv = [i as f32 * uv_scale, j as f32 * uv_scale];
        (position, normal, uv)
    })?;

    let mut positions = Vec::with_capacity(vertex_data.len());
    let mut normals = Vec::with_capacity(vertex_data.len());
    let mut uvs = Vec::with_capacity(vertex_data.len());
    for (position, normal, uv) in vertex_data {
        positions.push(position);
        normals.push(normal);
        uvs.push(uv);
    }

    // Index pass: two triangles per cell, wound front-facing toward +Y.
    // Vertex (i, j) sits at linear index j * gridN + i, matching the
    // row-major vertex pass above.
    let quads = backend.dispatch(n - 1, n - 1, |i, j| {
        let i00 = (j * n + i) as u32;
        let i10 = i00 + 1;
        let i01 = i00 + n as u32;
        let i11 = i01 + 1;
        [i00, i01, i10, i10, i01, i11]
    })?;

    let vertex_count = positions.len();
    let indices = if vertex_count > WIDE_INDEX_THRESHOLD {
        MeshIndices::U32(quads.into_iter().flatten().collect())
    } else {
        MeshIndices::U16(
            quads
                .into_iter()
                .flatten()
                .map(|i| i as u16)
                .collect(),
        )
    };

    let mut mesh = Mesh {
        positions,
        normals,
        uvs,
        indices,
        aabb: Aabb::default(),
    };

    if config.recalc_normals {
        mesh.recalculate_normals();
    }
    mesh.recalculate_bounds();

    let stats = normal_stats(&mesh.normals);
    debug!(
        lod,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        degenerate_normals = stats.degenerate_count,
        "extracted chunk mesh"
    );

    Ok(mesh)
}

fn normalize_or_up(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > NORMAL_EPSILON {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 1.0, 0.0]
    }
}
