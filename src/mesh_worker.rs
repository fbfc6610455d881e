//! Parallel chunk generation pool.
//!
//! Requests flow in over a bounded crossbeam channel, a rayon scope fans the
//! batch out across worker threads, and finished chunks come back over the
//! result channel. The manager drains results at a single point per tick, so
//! a half-built chunk is never visible in the cache.

use crossbeam::channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use tracing::debug;

use crate::chunk::{ChunkCoord, ChunkMeshes};
use crate::compute::ComputeBackend;
use crate::config::TerrainConfig;
use crate::error::TerrainError;
use crate::heightmap::synthesize;
use crate::mesh_extraction::extract_mesh;

/// Fraction of detected CPUs to use for generation workers (numerator).
const THREAD_CPU_NUMERATOR: usize = 3;
/// Fraction of detected CPUs to use for generation workers (denominator).
const THREAD_CPU_DENOMINATOR: usize = 4;
/// Minimum number of generation worker threads.
const MIN_WORKER_THREADS: usize = 2;
/// Minimum batch size for processing generation requests.
const MIN_BATCH_SIZE: usize = 16;
/// Default channel capacity for request/result channels.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Request for one chunk: every LOD is generated from one height field.
pub struct GenerationRequest {
    pub coord: ChunkCoord,
    pub config: Arc<TerrainConfig>,
}

/// Outcome of one chunk generation. Failures carry the error so the manager
/// can log and leave the coordinate unloaded for a later retry.
pub struct GenerationResult {
    pub coord: ChunkCoord,
    pub outcome: Result<ChunkMeshes, TerrainError>,
}

/// Worker pool for parallel chunk generation.
pub struct GenerationPool {
    thread_count: usize,
    request_tx: Sender<GenerationRequest>,
    request_rx: Receiver<GenerationRequest>,
    result_tx: Sender<GenerationResult>,
    result_rx: Receiver<GenerationResult>,
}

impl GenerationPool {
    pub fn new(num_threads: usize, channel_capacity: usize) -> Self {
        let detected_cpus = num_cpus::get();
        let threads = if num_threads == 0 {
            ((detected_cpus * THREAD_CPU_NUMERATOR) / THREAD_CPU_DENOMINATOR)
                .max(MIN_WORKER_THREADS)
        } else {
            num_threads
        };

        let (request_tx, request_rx) = bounded(channel_capacity);
        let (result_tx, result_rx) = bounded(channel_capacity);

        Self {
            thread_count: threads,
            request_tx,
            request_rx,
            result_tx,
            result_rx,
        }
    }

    pub fn request_sender(&self) -> Sender<GenerationRequest> {
        self.request_tx.clone()
    }

    pub fn result_receiver(&self) -> Receiver<GenerationResult> {
        self.result_rx.clone()
    }

    /// Run one batch of pending requests to completion on the rayon pool.
    /// Returns the number of requests processed; callers loop until zero to
    /// drain the queue within a tick.
    pub fn process_requests<B: ComputeBackend>(&self, backend: &B) -> usize {
        let batch_size = rayon::current_num_threads().max(MIN_BATCH_SIZE);
        let mut batch = Vec::with_capacity(batch_size);

        while batch.len() < batch_size {
            match self.request_rx.try_recv() {
                Ok(request) => batch.push(request),
                Err(_) => break,
            }
        }

        if batch.is_empty() {
            return 0;
        }

        let processed = batch.len();
        let result_tx = self.result_tx.clone();

        rayon::scope(|scope| {
            for request in batch {
                let tx = result_tx.clone();
                scope.spawn(move |_| {
                    let coord = request.coord;
                    let outcome = generate_chunk(&request.config, coord, backend);
                    // Workers must never block inside the scope. A full
                    // result channel drops the chunk; the coordinate has no
                    // record, so a later tick re-requests it.
                    if tx.try_send(GenerationResult { coord, outcome }).is_err() {
                        debug!(x = coord.x, y = coord.y, "result channel full, chunk dropped");
                    }
                });
            }
        });

        processed
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }
}

impl Default for GenerationPool {
    fn default() -> Self {
        Self::new(0, DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Synthesize one chunk's height field and extract every LOD mesh from it.
/// The field is finalized (read-only) before any extraction runs.
pub fn generate_chunk<B: ComputeBackend>(
    config: &TerrainConfig,
    coord: ChunkCoord,
    backend: &B,
) -> Result<ChunkMeshes, TerrainError> {
    let field = synthesize(config, coord, backend)?;
    let lods = (0..config.lod_count)
        .map(|lod| extract_mesh(&field, lod, config, backend))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ChunkMeshes { coord, lods })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::SerialBackend;
    use crossbeam::channel::TrySendError;

    fn test_config() -> Arc<TerrainConfig> {
        Arc::new(TerrainConfig {
            base_resolution: 8,
            lod_count: 2,
            chunk_world_size: 8.0,
            ..TerrainConfig::default()
        })
    }

    #[test]
    fn pool_creation_picks_a_thread_count() {
        let pool = GenerationPool::new(2, 64);
        assert_eq!(pool.thread_count(), 2);
        assert!(GenerationPool::default().thread_count() >= 1);
    }

    #[test]
    fn generated_chunk_carries_every_lod() {
        let config = test_config();
        let meshes = generate_chunk(&config, ChunkCoord::new(1, -2), &SerialBackend::new())
            .unwrap();
        assert_eq!(meshes.lods.len(), 2);
        // lod 0: 9x9 grid, lod 1: 5x5 grid.
        assert_eq!(meshes.lods[0].vertex_count(), 81);
        assert_eq!(meshes.lods[1].vertex_count(), 25);
    }

    #[test]
    fn requests_round_trip_through_the_pool() {
        let pool = GenerationPool::new(2, 64);
        let config = test_config();

        let coords = [
            ChunkCoord::new(0, 0),
            ChunkCoord::new(1, 0),
            ChunkCoord::new(0, 1),
            ChunkCoord::new(1, 1),
        ];
        for coord in coords {
            pool.request_sender()
                .send(GenerationRequest {
                    coord,
                    config: Arc::clone(&config),
                })
                .unwrap();
        }

        let mut processed = 0;
        loop {
            let n = pool.process_requests(&SerialBackend::new());
            if n == 0 {
                break;
            }
            processed += n;
        }
        assert_eq!(processed, 4);

        let mut received = Vec::new();
        while let Ok(result) = pool.result_receiver().try_recv() {
            assert!(result.outcome.is_ok());
            received.push(result.coord);
        }
        assert_eq!(received.len(), 4);
    }

    #[test]
    fn bounded_request_channel_does_not_block() {
        let pool = GenerationPool::new(1, 8);
        let config = test_config();

        let mut sent = 0;
        for i in 0..100 {
            let request = GenerationRequest {
                coord: ChunkCoord::new(i, 0),
                config: Arc::clone(&config),
            };
            match pool.request_sender().try_send(request) {
                Ok(()) => sent += 1,
                Err(TrySendError::Full(_)) => break,
                Err(TrySendError::Disconnected(_)) => panic!("channel disconnected"),
            }
        }

        assert_eq!(sent, 8, "should stop at channel capacity");
    }

    #[test]
    fn full_result_channel_drops_extra_results() {
        let pool = GenerationPool::new(1, 4);
        let config = test_config();

        // Two waves without draining in between: the second wave finds the
        // result channel full and its chunks are dropped, never blocked on.
        for wave in 0..2 {
            for i in 0..4 {
                pool.request_sender()
                    .send(GenerationRequest {
                        coord: ChunkCoord::new(i, wave),
                        config: Arc::clone(&config),
                    })
                    .unwrap();
            }
            while pool.process_requests(&SerialBackend::new()) > 0 {}
        }

        let mut received = 0;
        while pool.result_receiver().try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 4, "only the first wave fits the result channel");
    }

    #[test]
    fn failed_generation_reports_its_error() {
        let pool = GenerationPool::new(1, 8);
        let mut bad = TerrainConfig {
            base_resolution: 8,
            lod_count: 2,
            chunk_world_size: 8.0,
            ..TerrainConfig::default()
        };
        bad.falloff.radius = -1.0;

        pool.request_sender()
            .send(GenerationRequest {
                coord: ChunkCoord::new(0, 0),
                config: Arc::new(bad),
            })
            .unwrap();
        pool.process_requests(&SerialBackend::new());

        let result = pool.result_receiver().try_recv().unwrap();
        assert!(matches!(
            result.outcome,
            Err(TerrainError::InvalidFalloffRadius(_))
        ));
    }
}
