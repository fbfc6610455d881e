//! Chunk identity and cached per-chunk state.

use crate::mesh_extraction::Mesh;

/// Integer grid coordinate addressing one terrain chunk. World origin is
/// `coord * chunk_world_size` on the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World-space XZ origin of this chunk.
    pub fn world_origin(&self, chunk_world_size: f32) -> [f32; 2] {
        [
            self.x as f32 * chunk_world_size,
            self.y as f32 * chunk_world_size,
        ]
    }

    /// Squared distance from this chunk's origin to a world-space point.
    pub fn distance_squared_to(&self, point: [f32; 2], chunk_world_size: f32) -> f32 {
        let origin = self.world_origin(chunk_world_size);
        let dx = origin[0] - point[0];
        let dy = origin[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Lifecycle state of a cached chunk. A coordinate with no record at all is
/// Unloaded; Active and Inactive are interchangeable without data loss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Active,
    Inactive,
}

/// One fully generated chunk: every LOD mesh, extracted from a single
/// finalized height field.
#[derive(Debug)]
pub struct ChunkMeshes {
    pub coord: ChunkCoord,
    /// Index k holds the mesh for LOD k (step 2^k).
    pub lods: Vec<Mesh>,
}

/// Opaque renderable identifier minted by the host environment.
pub type RenderHandle = u64;

/// One LOD's cached mesh and the host object displaying it.
#[derive(Debug)]
pub struct LodSlot {
    pub mesh: Mesh,
    pub handle: RenderHandle,
}

/// Cache entry owned by the streaming manager.
#[derive(Debug)]
pub struct ChunkRecord {
    pub coord: ChunkCoord,
    pub state: ChunkState,
    pub lods: Vec<LodSlot>,
    /// Tick on which the record was last deactivated; orders LRU eviction.
    pub deactivated_at: u64,
}
