//! Procedural terrain pipeline: layered-noise heightmap synthesis, LOD mesh
//! extraction, and distance-driven chunk streaming.
//!
//! The pipeline is deterministic end to end. A seed plus a chunk coordinate
//! fully determines the height field, every LOD mesh extracted from it, and
//! therefore what the streaming manager hands to the host. Heavy per-texel
//! and per-vertex work runs through a [`compute::ComputeBackend`], so the
//! same kernels drive the parallel and serial paths.

pub mod chunk;
pub mod chunk_manager;
pub mod compute;
pub mod config;
pub mod error;
pub mod heightfield;
pub mod heightmap;
pub mod material;
pub mod mesh_extraction;
pub mod mesh_worker;
pub mod noise_field;

pub use chunk::{ChunkCoord, ChunkMeshes, ChunkState, RenderHandle};
pub use chunk_manager::{ChunkStreamingManager, RenderHost};
pub use compute::{ComputeBackend, CpuBackend, SerialBackend};
pub use config::{FalloffParams, NoiseParams, TerrainConfig};
pub use error::TerrainError;
pub use heightfield::HeightField;
pub use heightmap::synthesize;
pub use material::{MaterialSettings, MaterialSink, RampStop};
pub use mesh_extraction::{extract_mesh, Mesh, MeshIndices};
pub use mesh_worker::{generate_chunk, GenerationPool, GenerationRequest, GenerationResult};
pub use noise_field::NoiseEvaluator;
