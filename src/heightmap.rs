//! Heightmap synthesis: one per-cell kernel over the bordered chunk domain.
//!
//! Every cell is independent of every other cell. That is a hard invariant,
//! not an optimization: it is what allows the kernel to be dispatched to any
//! [`ComputeBackend`](crate::compute::ComputeBackend) and, later, to an
//! external compute executor.

use crate::chunk::ChunkCoord;
use crate::compute::ComputeBackend;
use crate::config::{FalloffParams, TerrainConfig};
use crate::error::TerrainError;
use crate::heightfield::HeightField;
use crate::noise_field::NoiseEvaluator;

/// Synthesize the bordered height field for one chunk.
///
/// For every cell of the `(N + 2S)^2` domain the kernel computes the world
/// position `chunk_origin + (cell - S) * cell_world_size`, sums base fractal
/// and ridged noise there (ridge only in `display_ridge` mode), and scales the
/// result by the radial falloff multiplier.
///
/// The config must have passed [`TerrainConfig::validate`]; a non-positive
/// falloff radius is still rejected here rather than allowed to produce NaN.
pub fn synthesize<B: ComputeBackend>(
    config: &TerrainConfig,
    coord: ChunkCoord,
    backend: &B,
) -> Result<HeightField, TerrainError> {
    if config.falloff.radius <= 0.0 {
        return Err(TerrainError::InvalidFalloffRadius(config.falloff.radius));
    }

    let resolution = config.grid_resolution();
    let inner = resolution + 1;
    let seam = config.seam_width();
    let side = (inner + 2 * seam) as usize;

    let evaluator = NoiseEvaluator::new(config.seed);
    let origin = coord.world_origin(config.chunk_world_size);
    let cell = config.cell_world_size();

    let values = backend.dispatch(side, side, |x, y| {
        let wx = origin[0] + (x as i64 - seam as i64) as f32 * cell;
        let wz = origin[1] + (y as i64 - seam as i64) as f32 * cell;

        let ridge = evaluator.ridged([wx, wz], &config.ridge_noise, config.ridge_offset);
        let raw = if config.display_ridge {
            ridge
        } else {
            evaluator.fractal([wx, wz], &config.base_noise) + ridge
        };

        raw * falloff_multiplier([wx, wz], &config.falloff)
    })?;

    Ok(HeightField::from_values(values, inner, seam))
}

/// Radial falloff: `clamp01(1 - d/radius)^power` remapped into
/// `[min_height, max_height]`. Exactly at `d == radius` the shaped factor is
/// zero and the multiplier pins to `min_height`; beyond the radius it clamps
/// rather than going negative or NaN.
pub(crate) fn falloff_multiplier(world: [f32; 2], falloff: &FalloffParams) -> f32 {
    let dx = world[0] - falloff.center[0];
    let dz = world[1] - falloff.center[1];
    let distance = (dx * dx + dz * dz).sqrt();

    let shaped = (1.0 - distance / falloff.radius)
        .clamp(0.0, 1.0)
        .powf(falloff.falloff_power);
    falloff.min_height + (falloff.max_height - falloff.min_height) * shaped
}
