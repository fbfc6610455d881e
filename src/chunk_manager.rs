//! Chunk streaming: distance-driven load/deactivate with a hysteresis band.
//!
//! The manager owns the coordinate-keyed cache of generated chunks. Each tick
//! it scans the window of coordinates the unload radius can reach, generates
//! whatever newly entered the load radius, reactivates cached chunks without
//! regenerating them, and deactivates whatever left the unload radius. The
//! band between the two radii changes nothing, which keeps a jittering
//! reference position from flickering chunks on and off.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chunk::{ChunkCoord, ChunkMeshes, ChunkRecord, ChunkState, LodSlot, RenderHandle};
use crate::compute::ComputeBackend;
use crate::config::TerrainConfig;
use crate::error::TerrainError;
use crate::mesh_extraction::Mesh;
use crate::mesh_worker::{GenerationPool, GenerationRequest};

/// Host-side renderable boundary. The core hands over mesh data plus a world
/// origin and keeps only the opaque handle; the host owns the drawable and
/// decides which LOD to display.
pub trait RenderHost {
    fn attach(&mut self, coord: ChunkCoord, lod: u32, mesh: &Mesh, origin: [f32; 3])
        -> RenderHandle;
    fn set_visible(&mut self, handle: RenderHandle, visible: bool);
    fn release(&mut self, handle: RenderHandle);
}

/// Streaming manager: cache, lifecycle state machine, and per-tick commit.
pub struct ChunkStreamingManager<B: ComputeBackend> {
    config: Arc<TerrainConfig>,
    backend: B,
    chunks: HashMap<ChunkCoord, ChunkRecord>,
    /// Times each cached coordinate has been generated. Survives
    /// deactivation and config swaps; pruned when the coordinate is evicted
    /// or released without regeneration, so it never outgrows the cache.
    generation_counts: HashMap<ChunkCoord, u32>,
    pool: GenerationPool,
    current_tick: u64,
}

impl<B: ComputeBackend> ChunkStreamingManager<B> {
    /// Validates the config up front; an inconsistent config never reaches
    /// generation.
    pub fn new(config: TerrainConfig, backend: B) -> Result<Self, TerrainError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            backend,
            chunks: HashMap::new(),
            generation_counts: HashMap::new(),
            pool: GenerationPool::default(),
            current_tick: 0,
        })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Replace the configuration. Every cached chunk is released and the
    /// coordinates that were Active are regenerated immediately, so no mesh
    /// built from the old config ever survives the swap.
    pub fn set_config(
        &mut self,
        config: TerrainConfig,
        host: &mut impl RenderHost,
    ) -> Result<(), TerrainError> {
        config.validate()?;

        let active: Vec<ChunkCoord> = self
            .chunks
            .values()
            .filter(|record| record.state == ChunkState::Active)
            .map(|record| record.coord)
            .collect();

        for (_, record) in self.chunks.drain() {
            for slot in &record.lods {
                host.release(slot.handle);
            }
        }
        // Inactive chunks are not regenerated; their history goes with them.
        self.generation_counts
            .retain(|coord, _| active.contains(coord));

        info!(
            regenerating = active.len(),
            "configuration changed, rebuilding cached chunks"
        );
        self.config = Arc::new(config);

        for coord in active {
            let meshes = crate::mesh_worker::generate_chunk(&self.config, coord, &self.backend)?;
            self.commit_chunk(meshes, host);
        }
        Ok(())
    }

    /// One streaming update around `reference` (world-space XZ).
    pub fn tick(&mut self, reference: [f32; 2], host: &mut impl RenderHost) {
        self.current_tick += 1;

        let load = self.config.load_distance;
        let unload = self.config.effective_unload_distance();
        let chunk_size = self.config.chunk_world_size;

        // The scan window must always come from the unload distance: every
        // coordinate that could need a state change lies inside it.
        let min_x = ((reference[0] - unload) / chunk_size).floor() as i32;
        let max_x = ((reference[0] + unload) / chunk_size).ceil() as i32;
        let min_y = ((reference[1] - unload) / chunk_size).floor() as i32;
        let max_y = ((reference[1] + unload) / chunk_size).ceil() as i32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let coord = ChunkCoord::new(x, y);
                let sq_distance = coord.distance_squared_to(reference, chunk_size);
                if sq_distance < load * load {
                    self.load_or_reactivate(coord, host);
                }
                // Between the radii: hysteresis band, leave the state alone.
            }
        }

        // Deactivation scans the whole cache so a reference that teleported
        // leaves no distant chunk stuck Active.
        for record in self.chunks.values_mut() {
            if record.state == ChunkState::Active
                && record.coord.distance_squared_to(reference, chunk_size) > unload * unload
            {
                for slot in &record.lods {
                    host.set_visible(slot.handle, false);
                }
                record.state = ChunkState::Inactive;
                record.deactivated_at = self.current_tick;
                debug!(x = record.coord.x, y = record.coord.y, "chunk deactivated");
            }
        }

        // Single synchronization point: run all requested generations to
        // completion, then commit. Nothing partial ever enters the cache.
        while self.pool.process_requests(&self.backend) > 0 {}
        let receiver = self.pool.result_receiver();
        while let Ok(result) = receiver.try_recv() {
            match result.outcome {
                Ok(meshes) => self.commit_chunk(meshes, host),
                Err(err) => {
                    // Coordinate stays Unloaded; a later tick retries.
                    warn!(
                        x = result.coord.x,
                        y = result.coord.y,
                        error = %err,
                        "chunk generation failed"
                    );
                }
            }
        }

        self.evict_over_budget(host);
    }

    fn load_or_reactivate(&mut self, coord: ChunkCoord, host: &mut impl RenderHost) {
        match self.chunks.get_mut(&coord) {
            Some(record) => {
                if record.state == ChunkState::Inactive {
                    for slot in &record.lods {
                        host.set_visible(slot.handle, true);
                    }
                    record.state = ChunkState::Active;
                    debug!(x = coord.x, y = coord.y, "chunk reactivated from cache");
                }
            }
            None => {
                // A full request channel just defers the chunk to a later
                // tick; generation is never forced mid-tick.
                let _ = self.pool.request_sender().try_send(GenerationRequest {
                    coord,
                    config: Arc::clone(&self.config),
                });
            }
        }
    }

    fn commit_chunk(&mut self, meshes: ChunkMeshes, host: &mut impl RenderHost) {
        let coord = meshes.coord;
        let origin = coord.world_origin(self.config.chunk_world_size);
        let origin3 = [origin[0], 0.0, origin[1]];

        let lods: Vec<LodSlot> = meshes
            .lods
            .into_iter()
            .enumerate()
            .map(|(lod, mesh)| {
                let handle = host.attach(coord, lod as u32, &mesh, origin3);
                LodSlot { mesh, handle }
            })
            .collect();

        *self.generation_counts.entry(coord).or_insert(0) += 1;
        self.chunks.insert(
            coord,
            ChunkRecord {
                coord,
                state: ChunkState::Active,
                lods,
                deactivated_at: 0,
            },
        );
        debug!(x = coord.x, y = coord.y, "chunk generated and activated");
    }

    /// Release oldest-deactivated Inactive records until the Inactive set
    /// fits the configured budget. Evicted coordinates return to Unloaded
    /// and regenerate if they ever re-enter the load radius.
    fn evict_over_budget(&mut self, host: &mut impl RenderHost) {
        let Some(budget) = self.config.inactive_budget else {
            return;
        };

        loop {
            let inactive = self
                .chunks
                .values()
                .filter(|record| record.state == ChunkState::Inactive)
                .count();
            if inactive <= budget {
                break;
            }

            let Some(oldest) = self
                .chunks
                .values()
                .filter(|record| record.state == ChunkState::Inactive)
                .min_by_key(|record| record.deactivated_at)
                .map(|record| record.coord)
            else {
                break;
            };

            if let Some(record) = self.chunks.remove(&oldest) {
                for slot in &record.lods {
                    host.release(slot.handle);
                }
                self.generation_counts.remove(&oldest);
                debug!(x = oldest.x, y = oldest.y, "inactive chunk evicted");
            }
        }
    }

    pub fn chunk_state(&self, coord: ChunkCoord) -> Option<ChunkState> {
        self.chunks.get(&coord).map(|record| record.state)
    }

    /// How many times a cached coordinate has been generated. Reactivation
    /// from cache does not increment this, and an evicted coordinate starts
    /// over from zero.
    pub fn generation_count(&self, coord: ChunkCoord) -> u32 {
        self.generation_counts.get(&coord).copied().unwrap_or(0)
    }

    pub fn cached_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn inactive_chunk_count(&self) -> usize {
        self.chunks
            .values()
            .filter(|record| record.state == ChunkState::Inactive)
            .count()
    }
}
