//! Terrain configuration: noise layers, falloff shaping, and streaming
//! distances. A config is authored once, validated, and treated as read-only
//! while streaming; changing it on a live manager regenerates every cached
//! chunk.

use crate::error::TerrainError;

/// Parameters for one layered-noise evaluation (base or ridge).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseParams {
    /// Number of octaves summed. Layer `i` has frequency
    /// `base_scale * lacunarity^i` and weight `amplitude * persistence^i`.
    pub octaves: u32,
    pub amplitude: f32,
    pub base_scale: f32,
    pub persistence: f32,
    pub lacunarity: f32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            octaves: 5,
            amplitude: 1.0,
            base_scale: 0.1,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl NoiseParams {
    fn validate(&self, which: &'static str) -> Result<(), TerrainError> {
        if self.octaves == 0 {
            return Err(TerrainError::InvalidNoise {
                which,
                reason: "octave count must be at least 1",
            });
        }
        // Zero amplitude is allowed: it silences a layer without removing it.
        if self.amplitude < 0.0 {
            return Err(TerrainError::InvalidNoise {
                which,
                reason: "amplitude must not be negative",
            });
        }
        if self.base_scale <= 0.0 {
            return Err(TerrainError::InvalidNoise {
                which,
                reason: "base scale must be positive",
            });
        }
        if self.persistence <= 0.0 {
            return Err(TerrainError::InvalidNoise {
                which,
                reason: "persistence must be positive",
            });
        }
        if self.lacunarity <= 0.0 {
            return Err(TerrainError::InvalidNoise {
                which,
                reason: "lacunarity must be positive",
            });
        }
        Ok(())
    }
}

/// Radial falloff shaping raw noise height toward `min_height` at the edge of
/// `radius`, producing bounded landmasses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FalloffParams {
    pub radius: f32,
    pub center: [f32; 2],
    pub min_height: f32,
    pub max_height: f32,
    pub falloff_power: f32,
}

impl Default for FalloffParams {
    fn default() -> Self {
        Self {
            radius: 1000.0,
            center: [0.0, 0.0],
            min_height: -50.0,
            max_height: 100.0,
            falloff_power: 1.5,
        }
    }
}

/// Complete terrain authoring configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainConfig {
    pub seed: i32,
    pub chunk_world_size: f32,
    /// Requested base mesh resolution; snapped to the closest power of two
    /// before use (see [`TerrainConfig::grid_resolution`]).
    pub base_resolution: u32,
    /// Number of discrete LOD meshes per chunk, in `1..=6`.
    pub lod_count: u32,
    pub base_noise: NoiseParams,
    pub ridge_noise: NoiseParams,
    /// Subtracted from each ridged octave's `1 - |noise|` value.
    pub ridge_offset: f32,
    /// Debug mode: emit the ridge layer alone instead of base + ridge.
    pub display_ridge: bool,
    /// Replace analytic heightfield normals with face-averaged ones after
    /// extraction.
    pub recalc_normals: bool,
    pub falloff: FalloffParams,
    pub load_distance: f32,
    /// Clamped up to `load_distance` at use time if configured smaller; the
    /// only silent clamp in the pipeline.
    pub unload_distance: f32,
    /// LRU eviction budget for Inactive cached chunks. `None` keeps every
    /// generated chunk cached for the lifetime of the manager.
    pub inactive_budget: Option<usize>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_world_size: 10.0,
            base_resolution: 256,
            lod_count: 3,
            base_noise: NoiseParams::default(),
            ridge_noise: NoiseParams {
                base_scale: 0.05,
                ..NoiseParams::default()
            },
            ridge_offset: 0.5,
            display_ridge: false,
            recalc_normals: false,
            falloff: FalloffParams::default(),
            load_distance: 150.0,
            unload_distance: 200.0,
            inactive_budget: None,
        }
    }
}

impl TerrainConfig {
    /// Reject internally inconsistent configurations before any generation
    /// runs. Everything here is a hard error; the unload distance is the one
    /// value that is clamped rather than rejected.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.chunk_world_size <= 0.0 {
            return Err(TerrainError::InvalidChunkSize(self.chunk_world_size));
        }
        if self.base_resolution < 2 {
            return Err(TerrainError::InvalidBaseResolution(self.base_resolution));
        }
        if !(1..=6).contains(&self.lod_count) {
            return Err(TerrainError::InvalidLodCount(self.lod_count));
        }
        self.base_noise.validate("base")?;
        self.ridge_noise.validate("ridge")?;
        if self.falloff.radius <= 0.0 {
            return Err(TerrainError::InvalidFalloffRadius(self.falloff.radius));
        }
        if self.falloff.min_height >= self.falloff.max_height {
            return Err(TerrainError::InvalidFalloffHeights {
                min: self.falloff.min_height,
                max: self.falloff.max_height,
            });
        }
        if self.falloff.falloff_power <= 0.0 {
            return Err(TerrainError::InvalidFalloffPower(self.falloff.falloff_power));
        }
        if self.load_distance <= 0.0 {
            return Err(TerrainError::InvalidLoadDistance(self.load_distance));
        }
        Ok(())
    }

    /// Base grid resolution R actually used: `base_resolution` snapped to the
    /// closest power of two. The inner heightfield carries R+1 samples per
    /// axis and LOD `k` meshes have `R / 2^k + 1` vertices per axis.
    pub fn grid_resolution(&self) -> u32 {
        closest_power_of_two(self.base_resolution)
    }

    /// Seam width S = 2^lod_count. Guarantees the coarsest LOD's step still
    /// has a full border of samples for gradient lookups.
    pub fn seam_width(&self) -> u32 {
        1 << self.lod_count
    }

    /// World-space spacing between adjacent base-resolution samples.
    pub fn cell_world_size(&self) -> f32 {
        self.chunk_world_size / self.grid_resolution() as f32
    }

    /// Unload distance after the documented clamp against `load_distance`.
    pub fn effective_unload_distance(&self) -> f32 {
        self.unload_distance.max(self.load_distance)
    }
}

/// Closest power of two to `n` (ties round up), never below 1.
fn closest_power_of_two(n: u32) -> u32 {
    if n <= 1 {
        return 1;
    }
    let below = 1u32 << (31 - n.leading_zeros());
    let above = below << 1;
    if n - below < above - n {
        below
    } else {
        above
    }
}
