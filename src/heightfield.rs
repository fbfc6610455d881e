//! Per-chunk scalar height field with a seam border.
//!
//! The seam is a ring of extra samples around the inner grid so mesh
//! extraction can take central differences at chunk edges without touching a
//! neighboring chunk. Each chunk's field is self-contained and produced fresh
//! per generation.

/// Row-major 2D scalar field of side `inner + 2 * seam`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    values: Vec<f32>,
    /// Inner grid samples per axis (R + 1 for base resolution R).
    inner: u32,
    /// Border samples on each side, 2^lod_count.
    seam: u32,
}

impl HeightField {
    /// Wrap a dispatched buffer. `values` must hold exactly
    /// `(inner + 2 * seam)^2` samples in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if the buffer length does not match the dimensions.
    pub fn from_values(values: Vec<f32>, inner: u32, seam: u32) -> Self {
        let side = (inner + 2 * seam) as usize;
        assert_eq!(
            values.len(),
            side * side,
            "height buffer length does not match field dimensions"
        );
        Self {
            values,
            inner,
            seam,
        }
    }

    /// Samples per axis including the seam border.
    pub fn side(&self) -> u32 {
        self.inner + 2 * self.seam
    }

    /// Inner grid samples per axis.
    pub fn inner_resolution(&self) -> u32 {
        self.inner
    }

    pub fn seam_width(&self) -> u32 {
        self.seam
    }

    /// Raw texel access over the full bordered domain.
    ///
    /// # Panics
    ///
    /// Panics if either coordinate is out of range.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        let side = self.side();
        assert!(x < side && y < side, "height field texel out of range");
        self.values[(y * side + x) as usize]
    }

    /// Seam-offset access: `(0, 0)` is the inner grid's corner, and indices
    /// down to `-seam` (or up to `inner - 1 + seam`) read into the border.
    ///
    /// # Panics
    ///
    /// Panics if the offset index leaves the bordered domain.
    pub fn sample(&self, i: i64, j: i64) -> f32 {
        let x = i + self.seam as i64;
        let y = j + self.seam as i64;
        let side = self.side() as i64;
        assert!(
            (0..side).contains(&x) && (0..side).contains(&y),
            "seam-offset sample out of range"
        );
        self.values[(y * side + x) as usize]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}
