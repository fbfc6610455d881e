//! Layered coherent-noise evaluation for heightmap synthesis.
//!
//! Two variants share one octave loop: the fractal sum used for the base
//! terrain shape, and the ridged sum (`1 - |noise|` per octave) that biases
//! toward sharp crests. Both are pure functions of (point, params, seed):
//! identical inputs always produce identical output, which is what makes
//! regeneration reproducible and chunk seams line up.

use noise::{NoiseFn, Perlin};

use crate::config::NoiseParams;

/// Span of the per-seed domain offset along each axis.
const SEED_DOMAIN_SPAN: f64 = 4096.0;

/// Seeded noise source. Construct once per synthesis call and share across
/// cells; evaluation is `&self` and thread-safe.
pub struct NoiseEvaluator {
    perlin: Perlin,
    offset: [f64; 2],
}

impl NoiseEvaluator {
    pub fn new(seed: i32) -> Self {
        Self {
            perlin: Perlin::new(seed as u32),
            offset: seed_offset(seed),
        }
    }

    /// Fractal (fBm-style) octave sum. Layer `i` samples at frequency
    /// `base_scale * lacunarity^i` with weight `amplitude * persistence^i`.
    pub fn fractal(&self, point: [f32; 2], params: &NoiseParams) -> f32 {
        let x = point[0] as f64 + self.offset[0];
        let y = point[1] as f64 + self.offset[1];

        let mut frequency = params.base_scale as f64;
        let mut weight = params.amplitude as f64;
        let mut sum = 0.0;
        for _ in 0..params.octaves {
            sum += weight * self.perlin.get([x * frequency, y * frequency]);
            frequency *= params.lacunarity as f64;
            weight *= params.persistence as f64;
        }
        sum as f32
    }

    /// Ridged octave sum: each layer's raw sample `n` becomes
    /// `(1 - |n|) - ridge_offset` before weighting, peaking where the raw
    /// noise crosses zero.
    pub fn ridged(&self, point: [f32; 2], params: &NoiseParams, ridge_offset: f32) -> f32 {
        let x = point[0] as f64 + self.offset[0];
        let y = point[1] as f64 + self.offset[1];

        let mut frequency = params.base_scale as f64;
        let mut weight = params.amplitude as f64;
        let mut sum = 0.0;
        for _ in 0..params.octaves {
            let n = self.perlin.get([x * frequency, y * frequency]);
            sum += weight * ((1.0 - n.abs()) - ridge_offset as f64);
            frequency *= params.lacunarity as f64;
            weight *= params.persistence as f64;
        }
        sum as f32
    }
}

/// Deterministic world-space offset derived from the seed, so that two seeds
/// sample disjoint regions of the noise domain even if their permutation
/// tables happened to collide. splitmix64 finalizer.
fn seed_offset(seed: i32) -> [f64; 2] {
    let mut z = (seed as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;

    let unit_x = (z & 0xFFFF_FFFF) as f64 / u32::MAX as f64;
    let unit_y = (z >> 32) as f64 / u32::MAX as f64;
    [
        (unit_x - 0.5) * SEED_DOMAIN_SPAN,
        (unit_y - 0.5) * SEED_DOMAIN_SPAN,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params() -> NoiseParams {
        NoiseParams {
            octaves: 4,
            amplitude: 1.0,
            base_scale: 0.05,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }

    #[test]
    fn evaluation_is_deterministic() {
        let a = NoiseEvaluator::new(42);
        let b = NoiseEvaluator::new(42);
        for point in [[0.0, 0.0], [17.5, -3.25], [-400.0, 912.0]] {
            assert_eq!(a.fractal(point, &params()), b.fractal(point, &params()));
            assert_eq!(
                a.ridged(point, &params(), 0.5),
                b.ridged(point, &params(), 0.5)
            );
        }
    }

    #[test]
    fn different_seeds_give_different_fields() {
        let a = NoiseEvaluator::new(1);
        let b = NoiseEvaluator::new(2);
        let points = [[0.0, 0.0], [10.0, 10.0], [-55.0, 31.0], [3.0, -800.0]];
        let differs = points
            .iter()
            .any(|&p| a.fractal(p, &params()) != b.fractal(p, &params()));
        assert!(differs, "two seeds produced identical fields");
    }

    #[test]
    fn single_octave_weight_is_amplitude() {
        let eval = NoiseEvaluator::new(7);
        let one = NoiseParams {
            octaves: 1,
            amplitude: 3.0,
            ..params()
        };
        let unit = NoiseParams {
            octaves: 1,
            amplitude: 1.0,
            ..params()
        };
        let p = [12.0, -9.0];
        assert_abs_diff_eq!(
            eval.fractal(p, &one),
            3.0 * eval.fractal(p, &unit),
            epsilon = 1e-6
        );
    }

    #[test]
    fn zero_amplitude_silences_the_sum() {
        let eval = NoiseEvaluator::new(3);
        let silent = NoiseParams {
            amplitude: 0.0,
            ..params()
        };
        for point in [[0.0, 0.0], [100.0, -250.0]] {
            assert_eq!(eval.fractal(point, &silent), 0.0);
            assert_eq!(eval.ridged(point, &silent, 0.5), 0.0);
        }
    }

    #[test]
    fn ridged_octave_stays_below_unit_minus_offset() {
        // With one octave of unit amplitude, (1 - |n|) - offset is bounded
        // above by 1 - offset.
        let eval = NoiseEvaluator::new(11);
        let one = NoiseParams {
            octaves: 1,
            ..params()
        };
        for i in 0..64 {
            let p = [i as f32 * 7.3, i as f32 * -2.9];
            assert!(eval.ridged(p, &one, 0.5) <= 0.5 + 1e-6);
        }
    }
}
