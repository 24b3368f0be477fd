//! Intensity normalization: maps raw data values to the 8-bit display
//! range through a linear rescale, a bias/contrast remap, and a monotonic
//! warp.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ToastError;

/// Steepness constant shared by the two log-like warps.
const LOG_K: f64 = 1000.0;

/// Fixed exponent of the `power` warp.
const POWER_EXPONENT: f64 = 3.0;

/// The monotonic warp applied after the bias/contrast remap. Every variant
/// maps 0 to 0 and 1 to 1 and is strictly increasing in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scaling {
    Linear,
    Squared,
    Sqrt,
    Power,
    Log,
    Arcsinh,
}

impl Scaling {
    /// Every accepted mode, in parse order
    pub const ALL: [Scaling; 6] = [
        Scaling::Linear,
        Scaling::Squared,
        Scaling::Sqrt,
        Scaling::Power,
        Scaling::Log,
        Scaling::Arcsinh,
    ];

    fn warp(self, t: f64) -> f64 {
        match self {
            Scaling::Linear => t,
            Scaling::Squared => t * t,
            Scaling::Sqrt => t.sqrt(),
            Scaling::Power => t.powf(POWER_EXPONENT),
            Scaling::Log => (1.0 + LOG_K * t).ln() / (1.0 + LOG_K).ln(),
            Scaling::Arcsinh => (LOG_K * t).asinh() / LOG_K.asinh(),
        }
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scaling::Linear => "linear",
            Scaling::Squared => "squared",
            Scaling::Sqrt => "sqrt",
            Scaling::Power => "power",
            Scaling::Log => "log",
            Scaling::Arcsinh => "arcsinh",
        };
        f.write_str(name)
    }
}

impl FromStr for Scaling {
    type Err = ToastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Scaling::Linear),
            "squared" => Ok(Scaling::Squared),
            "sqrt" => Ok(Scaling::Sqrt),
            "power" => Ok(Scaling::Power),
            "log" => Ok(Scaling::Log),
            "arcsinh" => Ok(Scaling::Arcsinh),
            other => Err(ToastError::InvalidScaling(other.to_string())),
        }
    }
}

/// Parameters of the normalization pipeline.
///
/// `vmin` and `vmax` bound the data interval mapped onto the display range;
/// `vmin > vmax` is the legal invert configuration, not an error. `bias` is
/// the fraction of the range mapped to mid-grey and `contrast` the slope of
/// the ramp through it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stretch {
    pub vmin: f64,
    pub vmax: f64,
    pub bias: f64,
    pub contrast: f64,
    pub scaling: Scaling,
}

impl Stretch {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax, ..Self::default() }
    }

    /// Maps one raw data value to its 8-bit display value
    pub fn apply(&self, raw: f64) -> u8 {
        let x = ((raw - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0);
        let remapped = cscale(x, self.bias, self.contrast);
        (self.scaling.warp(remapped) * 255.0) as u8
    }
}

impl Default for Stretch {
    fn default() -> Self {
        Self {
            vmin: 0.0,
            vmax: 1.0,
            bias: 0.5,
            contrast: 1.0,
            scaling: Scaling::Linear,
        }
    }
}

/// Piecewise-linear remap through (bias, 0.5) with slope `contrast`,
/// clamped to [0, 1]. Identity at bias 0.5 / contrast 1; collapses to a
/// constant 0.5 at contrast 0.
fn cscale(x: f64, bias: f64, contrast: f64) -> f64 {
    ((x - bias) * contrast + 0.5).clamp(0.0, 1.0)
}

/// Normalizes a slice of raw values into 8-bit display values. Operates on
/// a fresh buffer; the input is never mutated.
pub fn normalize(raw: &[f64], stretch: &Stretch) -> Vec<u8> {
    raw.iter().map(|&v| stretch.apply(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_cscale_fixed_points() {
        let xs = [0.0, 0.4, 0.5, 0.6, 1.0];

        // bias 0.5, contrast 1 is the identity
        for x in xs {
            assert_close(cscale(x, 0.5, 1.0), x);
        }

        // contrast 2 steepens around the bias point
        let expected = [0.0, 0.3, 0.5, 0.7, 1.0];
        for (x, e) in xs.iter().zip(expected) {
            assert_close(cscale(*x, 0.5, 2.0), e);
        }

        // contrast 0 collapses everything to mid-grey
        for x in xs {
            assert_close(cscale(x, 0.5, 0.0), 0.5);
        }

        let expected = [0.1, 0.5, 0.6, 0.7, 1.0];
        for (x, e) in xs.iter().zip(expected) {
            assert_close(cscale(*x, 0.4, 1.0), e);
        }

        let expected = [0.0, 0.3, 0.4, 0.5, 0.9];
        for (x, e) in xs.iter().zip(expected) {
            assert_close(cscale(*x, 0.6, 1.0), e);
        }
    }

    #[test]
    fn test_normalize_default_endpoints() {
        let out = normalize(&[1.0, 2.0, 3.0], &Stretch::new(1.0, 3.0));
        assert_eq!(out, vec![0, 127, 255]);
    }

    #[test]
    fn test_normalize_invert() {
        // vmin > vmax reverses the ramp
        let out = normalize(&[1.0, 2.0, 3.0], &Stretch::new(3.0, 1.0));
        assert_eq!(out, vec![255, 127, 0]);
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        let out = normalize(&[-10.0, 0.0, 1.0, 50.0], &Stretch::new(0.0, 1.0));
        assert_eq!(out, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_warp_boundaries() {
        for scaling in Scaling::ALL {
            assert_close(scaling.warp(0.0), 0.0);
            assert_close(scaling.warp(1.0), 1.0);
        }
    }

    #[test]
    fn test_endpoints_for_every_scaling() {
        for scaling in Scaling::ALL {
            let stretch = Stretch { scaling, ..Stretch::new(2.0, 7.0) };
            assert_eq!(stretch.apply(2.0), 0);
            assert_eq!(stretch.apply(7.0), 255);
        }
    }

    #[test]
    fn test_monotonic_in_raw_value() {
        for scaling in Scaling::ALL {
            let stretch = Stretch { scaling, ..Stretch::new(0.0, 100.0) };
            let mut last = 0u8;
            for step in 0..=200 {
                let value = stretch.apply(step as f64 * 0.5);
                assert!(value >= last, "{scaling} decreased at step {step}");
                last = value;
            }

            // and non-increasing when inverted
            let stretch = Stretch { scaling, ..Stretch::new(100.0, 0.0) };
            let mut last = 255u8;
            for step in 0..=200 {
                let value = stretch.apply(step as f64 * 0.5);
                assert!(value <= last, "inverted {scaling} increased at step {step}");
                last = value;
            }
        }
    }

    #[test]
    fn test_scaling_parse() {
        for scaling in Scaling::ALL {
            assert_eq!(scaling.to_string().parse::<Scaling>().unwrap(), scaling);
        }

        let err = "cubic".parse::<Scaling>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("cubic"));
        for name in ["linear", "squared", "sqrt", "power", "log", "arcsinh"] {
            assert!(message.contains(name), "error must name '{name}'");
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let input = [5.0, 1.0, 3.0];
        let _ = normalize(&input, &Stretch::new(1.0, 5.0));
        assert_eq!(input, [5.0, 1.0, 3.0]);
    }
}
