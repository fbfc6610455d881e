//! Height- and slope-driven material parameters.
//!
//! The core never touches a shader; it packs ramp stops and blend bounds
//! into flat parameter arrays and pushes them through the `MaterialSink`
//! boundary, so any host material system can consume them.

use tracing::warn;

/// Hosts typically pack ramp arrays into fixed-size uniform blocks; stops
/// past this count are dropped.
pub const MAX_RAMP_STOPS: usize = 8;

/// One color stop on a height ramp. `height` is the normalized position of
/// the stop, `blend` the softness of the transition into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampStop {
    pub color: [f32; 4],
    pub height: f32,
    pub blend: f32,
}

/// Everything the terrain surface shader needs that the core knows about.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSettings {
    /// World-space bounds the shader normalizes heights against.
    pub min_height: f32,
    pub max_height: f32,
    /// Slope range over which flat colors fade into steep colors.
    pub steep_blend_start: f32,
    pub steep_blend_end: f32,
    pub base_colors: Vec<RampStop>,
    pub steep_colors: Vec<RampStop>,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            min_height: 0.0,
            max_height: 1.0,
            steep_blend_start: 0.6,
            steep_blend_end: 0.9,
            base_colors: vec![
                RampStop {
                    color: [0.23, 0.49, 0.23, 1.0],
                    height: 0.0,
                    blend: 0.1,
                },
                RampStop {
                    color: [0.95, 0.95, 0.95, 1.0],
                    height: 0.8,
                    blend: 0.15,
                },
            ],
            steep_colors: vec![RampStop {
                color: [0.42, 0.36, 0.32, 1.0],
                height: 0.0,
                blend: 0.1,
            }],
        }
    }
}

/// Host-side parameter store. Parameter names are fixed by this module;
/// the sink only has to ferry them into whatever shader representation the
/// host uses.
pub trait MaterialSink {
    fn set_float(&mut self, name: &str, value: f32);
    fn set_color_array(&mut self, name: &str, values: &[[f32; 4]]);
    fn set_float_array(&mut self, name: &str, values: &[f32]);
}

/// Push every material parameter into the sink. Ramps longer than
/// [`MAX_RAMP_STOPS`] are truncated.
pub fn program(settings: &MaterialSettings, sink: &mut impl MaterialSink) {
    program_ramp(sink, "_base", &settings.base_colors);
    program_ramp(sink, "_steep", &settings.steep_colors);

    sink.set_float("_minHeight", settings.min_height);
    sink.set_float("_maxHeight", settings.max_height);
    sink.set_float("_steepBlendStart", settings.steep_blend_start);
    sink.set_float("_steepBlendEnd", settings.steep_blend_end);
}

fn program_ramp(sink: &mut impl MaterialSink, prefix: &str, stops: &[RampStop]) {
    if stops.len() > MAX_RAMP_STOPS {
        warn!(
            ramp = prefix,
            stops = stops.len(),
            max = MAX_RAMP_STOPS,
            "ramp truncated"
        );
    }
    let stops = &stops[..stops.len().min(MAX_RAMP_STOPS)];

    let colors: Vec<[f32; 4]> = stops.iter().map(|s| s.color).collect();
    let heights: Vec<f32> = stops.iter().map(|s| s.height).collect();
    let blends: Vec<f32> = stops.iter().map(|s| s.blend).collect();

    sink.set_float(&format!("{prefix}_N"), stops.len() as f32);
    sink.set_color_array(&format!("{prefix}_colors"), &colors);
    sink.set_float_array(&format!("{prefix}_heights"), &heights);
    sink.set_float_array(&format!("{prefix}_blends"), &blends);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct RecordingSink {
        floats: HashMap<String, f32>,
        colors: HashMap<String, Vec<[f32; 4]>>,
        float_arrays: HashMap<String, Vec<f32>>,
    }

    impl MaterialSink for RecordingSink {
        fn set_float(&mut self, name: &str, value: f32) {
            self.floats.insert(name.to_string(), value);
        }
        fn set_color_array(&mut self, name: &str, values: &[[f32; 4]]) {
            self.colors.insert(name.to_string(), values.to_vec());
        }
        fn set_float_array(&mut self, name: &str, values: &[f32]) {
            self.float_arrays.insert(name.to_string(), values.to_vec());
        }
    }

    #[test]
    fn programs_every_parameter() {
        let settings = MaterialSettings::default();
        let mut sink = RecordingSink::default();

        program(&settings, &mut sink);

        assert_eq!(sink.floats["_base_N"], 2.0);
        assert_eq!(sink.floats["_steep_N"], 1.0);
        assert_eq!(sink.floats["_minHeight"], 0.0);
        assert_eq!(sink.floats["_maxHeight"], 1.0);
        assert_eq!(sink.floats["_steepBlendStart"], 0.6);
        assert_eq!(sink.floats["_steepBlendEnd"], 0.9);
        assert_eq!(sink.colors["_base_colors"].len(), 2);
        assert_eq!(sink.float_arrays["_base_heights"], vec![0.0, 0.8]);
        assert_eq!(sink.float_arrays["_steep_blends"], vec![0.1]);
    }

    #[test]
    fn oversized_ramps_truncate() {
        let stop = RampStop {
            color: [1.0, 0.0, 0.0, 1.0],
            height: 0.5,
            blend: 0.1,
        };
        let settings = MaterialSettings {
            base_colors: vec![stop; MAX_RAMP_STOPS + 3],
            ..MaterialSettings::default()
        };
        let mut sink = RecordingSink::default();

        program(&settings, &mut sink);

        assert_eq!(sink.floats["_base_N"], MAX_RAMP_STOPS as f32);
        assert_eq!(sink.colors["_base_colors"].len(), MAX_RAMP_STOPS);
    }

    #[test]
    fn empty_ramp_is_allowed() {
        let settings = MaterialSettings {
            steep_colors: vec![],
            ..MaterialSettings::default()
        };
        let mut sink = RecordingSink::default();

        program(&settings, &mut sink);

        assert_eq!(sink.floats["_steep_N"], 0.0);
        assert!(sink.colors["_steep_colors"].is_empty());
    }
}
