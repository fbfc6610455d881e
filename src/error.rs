//! Error types for configuration validation and chunk generation.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TerrainError {
    #[error("falloff radius must be positive (got {0})")]
    InvalidFalloffRadius(f32),

    #[error("falloff heights must satisfy min < max (got {min}..{max})")]
    InvalidFalloffHeights { min: f32, max: f32 },

    #[error("falloff power must be positive (got {0})")]
    InvalidFalloffPower(f32),

    #[error("lod count must be in 1..=6 (got {0})")]
    InvalidLodCount(u32),

    #[error("base mesh resolution must be at least 2 (got {0})")]
    InvalidBaseResolution(u32),

    #[error("chunk world size must be positive (got {0})")]
    InvalidChunkSize(f32),

    #[error("{which} noise: {reason}")]
    InvalidNoise {
        which: &'static str,
        reason: &'static str,
    },

    #[error("load distance must be positive (got {0})")]
    InvalidLoadDistance(f32),

    #[error("compute dispatch failed: {0}")]
    Dispatch(String),
}
