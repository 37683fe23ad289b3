#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::colorimetry::Transfer;
use crate::curve::{CurveRange, StaticToneMapper};
use crate::utils::ST2084_Y_MAX;

/// Quantization of knee point coordinates in dynamic metadata
pub const KNEE_POINT_MAX: u16 = 4095;
/// Quantization of Bezier anchors in dynamic metadata
pub const ANCHOR_MAX: u16 = 1023;

/// Order of the curves produced by the estimators
pub const ORDER: usize = 10;
const NUM_P: usize = ORDER - 1;
const P1_MIN: f32 = 1.0 / ORDER as f32;

/// Lowest target peak the guided estimator adapts to
const GUIDED_MIN_NITS: f32 = 200.0;
/// Knee point of the curve used when no compression is needed
const KNEE_AT_BYPASS: f64 = 0.3;

// Knee point bounds, keyed on the compression ratio
const SY1: Ramp = Ramp::new(0.0, 0.3, 0.22, 1.0);
const SY2: Ramp = Ramp::new(0.0, 0.2, 0.25, 0.95);
// Knee point mixing, keyed on scene contrast
const KP_G: Ramp = Ramp::new(1.0, 0.05, 0.05, 0.5);

const P1_LIMIT: Ramp = Ramp::new(0.92, 0.98, 0.01, 0.1);

const P2_TO_P9_T1: f32 = 0.05;
const P2_TO_P9_T2: f32 = 0.55;
const P2_TO_P9_MAX1: [f32; ORDER - 2] = [
    0.5582, 0.6745, 0.7703, 0.8231, 0.8729, 0.9130, 0.9599, 0.9844,
];
const P2_TO_P9_MAX2: [f32; ORDER - 2] = [
    0.4839, 0.6325, 0.7253, 0.7722, 0.8201, 0.8837, 0.9208, 0.9580,
];

const PS_G_T1: f32 = 0.125;
const PS_G_T2: f32 = 0.95;

// Mid tone preservation for high compression
const LOW_SY_T1: f32 = 0.005;
const LOW_SY_T2: f32 = 0.04;
const LOW_K_T1: f32 = 0.12;
const LOW_K_T2: f32 = 0.4;
const RED_P1: Ramp = Ramp::new(1.0, 0.65, 0.1, 0.75);
const RED_P2: Ramp = Ramp::new(1.0, 0.8, 0.1, 0.75);

#[derive(Debug, Clone, Copy)]
struct Ramp {
    v1: f32,
    v2: f32,
    t1: f32,
    t2: f32,
}

impl Ramp {
    const fn new(v1: f32, v2: f32, t1: f32, t2: f32) -> Self {
        Self { v1, v2, t1, t2 }
    }

    fn at(&self, t: f32) -> f32 {
        ramp_weight(self.v1, self.v2, self.t1, self.t2, t)
    }
}

/// Clamped linear interpolation from `v1` at `t1` to `v2` at `t2`.
pub fn ramp_weight(v1: f32, v2: f32, t1: f32, t2: f32, t: f32) -> f32 {
    if t1 == t2 {
        if t < t1 {
            v1
        } else {
            v2
        }
    } else if t <= t1 {
        v1
    } else if t >= t2 {
        v2
    } else {
        v1 + (v2 - v1) / (t2 - t1) * (t - t1)
    }
}

/// Bezier tone mapping curve as carried in HDR10+ metadata.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ToneMapping {
    /// Knee point, scaled by 4095
    pub knee_point_x: u16,
    pub knee_point_y: u16,
    /// Bezier anchors, scaled by 1023
    pub anchors: Vec<u16>,
}

/// Scene statistics of dynamic HDR10+ metadata, luminances in 0.1 nit units.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct DynamicMetadata {
    /// Peak luminance of the display the curve was graded for
    #[cfg_attr(feature = "serde", serde(default))]
    pub display_maximum_luminance: u32,
    pub maxscl: [u32; 3],
    pub percentages: Vec<u8>,
    pub percentiles: Vec<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tone_mapping: Option<ToneMapping>,
}

impl DynamicMetadata {
    /// Rejects metadata whose distribution or anchors run into zeroed slots.
    pub fn validate(&self) -> Result<(), String> {
        if self.percentages.len() != self.percentiles.len() {
            return Err(format!(
                "{} percentages for {} percentiles",
                self.percentages.len(),
                self.percentiles.len()
            ));
        }

        if let Some(i) = self.percentages.iter().skip(1).position(|&p| p == 0) {
            return Err(format!("percentage {} is zero", i + 1));
        }

        if let Some(tm) = &self.tone_mapping {
            if tm.anchors.is_empty() {
                return Err(String::from("tone mapping without anchors"));
            }

            if let Some(i) = tm.anchors.iter().skip(1).position(|&p| p == 0) {
                return Err(format!("anchor {} is zero", i + 1));
            }
        }

        Ok(())
    }
}

/// Luminance distribution of a scene, in nits.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LuminanceStats {
    pub maxscl: [f32; 3],
    pub percentages: Vec<u8>,
    pub percentiles: Vec<f32>,
}

impl From<&DynamicMetadata> for LuminanceStats {
    fn from(meta: &DynamicMetadata) -> Self {
        Self {
            maxscl: meta.maxscl.map(|v| v as f32 / 10.0),
            percentages: meta.percentages.clone(),
            percentiles: meta.percentiles.iter().map(|&v| v as f32 / 10.0).collect(),
        }
    }
}

impl LuminanceStats {
    /// Brightest sub-pixel, capped to the PQ range and to the 99th
    /// percentile when that is the last sample.
    pub fn source_max_luminance(&self) -> f32 {
        let max = self
            .maxscl
            .iter()
            .fold(0.0_f32, |acc, &v| acc.max(v))
            .min(ST2084_Y_MAX as f32);

        match (self.percentages.last(), self.percentiles.last()) {
            (Some(99), Some(&lum)) => lum.min(max),
            _ => max,
        }
    }

    /// 50th and 99.95th percentile luminances, interpolated between the
    /// surrounding samples when not given exactly.
    pub fn percentile_50_99(&self) -> (f32, f32) {
        let mut psll50 = -1.0_f32;
        let mut psll99 = -1.0_f32;

        let (mut per50_1, mut per50_2, mut psll50_1, mut psll50_2) = (-1.0, -1.0, -1.0, -1.0);
        let (mut per99_1, mut per99_2, mut psll99_1, mut psll99_2) = (-1.0, -1.0, -1.0, -1.0);

        let mut prev_percent = 0_u8;
        let mut prev_psll = 0.0_f32;

        for (&percent, &psll) in self.percentages.iter().zip(self.percentiles.iter()) {
            if percent == 50 {
                psll50 = psll;
            } else if psll50 == -1.0 && percent > 50 && prev_percent < 50 {
                per50_1 = prev_percent as f32;
                per50_2 = percent as f32;
                psll50_1 = prev_psll;
                psll50_2 = psll;
            }

            if percent == 99 {
                psll99 = psll;
            } else if psll99 == -1.0 && percent > 99 && prev_percent < 99 {
                per99_1 = prev_percent as f32;
                per99_2 = percent as f32;
                psll99_1 = prev_psll;
                psll99_2 = psll;
            }

            prev_percent = percent;
            prev_psll = psll;
        }

        if psll50 == -1.0 {
            let delta = (per50_2 - per50_1).max(1.0);
            psll50 = psll50_1 + (psll50_2 - psll50_1) * (50.0 - per50_1) / delta;
        }

        if psll99 == -1.0 {
            let delta = (per99_2 - per99_1).max(1.0);
            psll99 = psll99_1 + (psll99_2 - psll99_1) * (99.95 - per99_1) / delta;
        }

        (psll50, psll99)
    }
}

/// Knee point and Bezier coefficients, normalized to [0, 1].
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CurveParameters {
    pub knee_x: f32,
    pub knee_y: f32,
    pub coefficients: Vec<f32>,
}

impl CurveParameters {
    pub fn new(knee_x: f64, knee_y: f64, coefficients: &[f64]) -> Self {
        Self {
            knee_x: knee_x as f32,
            knee_y: knee_y as f32,
            coefficients: coefficients.iter().map(|&p| p as f32).collect(),
        }
    }

    pub fn from_tone_mapping(tm: &ToneMapping) -> Self {
        Self {
            knee_x: tm.knee_point_x as f32 / KNEE_POINT_MAX as f32,
            knee_y: tm.knee_point_y as f32 / KNEE_POINT_MAX as f32,
            coefficients: tm
                .anchors
                .iter()
                .map(|&p| p as f32 / ANCHOR_MAX as f32)
                .collect(),
        }
    }

    /// Curve order, one more than the number of coefficients
    pub fn order(&self) -> usize {
        self.coefficients.len() + 1
    }

    pub fn quantize(&self) -> ToneMapping {
        let scale = |v: f32, max: u16| (v.clamp(0.0, 1.0) * max as f32).round() as u16;

        ToneMapping {
            knee_point_x: scale(self.knee_x, KNEE_POINT_MAX),
            knee_point_y: scale(self.knee_y, KNEE_POINT_MAX),
            anchors: self
                .coefficients
                .iter()
                .map(|&p| scale(p, ANCHOR_MAX))
                .collect(),
        }
    }
}

/// First shape coefficient, bounded so the curve connects smoothly to the
/// knee point slope. Also returns the high compression gain.
fn calc_p1(sx: f64, sy: f64, target: f32, source: f32) -> (f32, f32) {
    let ax = (sx as f32).min(0.9999);
    let ay = (sy as f32).min(0.9999);
    let sy = sy as f32;

    let k = target / target.max(source);
    let p1_limit = ramp_weight(P1_LIMIT.v2, P1_LIMIT.v1, P1_LIMIT.t1, P1_LIMIT.t2, sy);
    let p1 = (((1.0 - ax) / (ORDER as f32 * (1.0 - ay))) / k)
        .min(p1_limit)
        .max(0.0);

    let low_sy_g = ramp_weight(1.0, 0.0, LOW_SY_T1, LOW_SY_T2, sy);
    let high_k_g = ramp_weight(1.0, 0.0, LOW_K_T1, LOW_K_T2, k);
    let high_tm_g = low_sy_g * high_k_g;

    let red_p1 = RED_P1.at(high_tm_g);
    let p1 = (p1 * red_p1).max(P1_MIN).min(p1_limit);

    (p1, high_tm_g)
}

fn linear_coefficients(order: usize) -> Vec<f64> {
    let num_p = order.saturating_sub(1).max(1);
    (0..num_p).map(|i| (i + 1) as f64 / order as f64).collect()
}

/// Tone curve estimated from scene statistics alone.
pub fn basis_curve(stats: &LuminanceStats, target: f32, source: f32) -> CurveParameters {
    let src = target.max(source);

    let (psll50, psll99) = stats.percentile_50_99();
    let contrast = psll50 / psll99.max(0.0001);
    let k = target / src;

    let sy1 = SY1.at(k);
    let sy2 = SY2.at(k);
    let kp_g = KP_G.at(contrast);

    let sy = (kp_g * sy1 + (1.0 - kp_g) * sy2) as f64;
    let sx = sy * k as f64;

    let (p1, high_tm_g) = calc_p1(sx, sy, target, source);

    let shapes: Vec<f32> = (0..NUM_P - 1)
        .map(|i| {
            let g = ramp_weight(
                P2_TO_P9_MAX2[i],
                P2_TO_P9_MAX1[i],
                P2_TO_P9_T1,
                P2_TO_P9_T2,
                contrast,
            );
            g * P2_TO_P9_MAX1[i] + (1.0 - g) * P2_TO_P9_MAX2[i]
        })
        .collect();

    let ps_g = ramp_weight(1.0, 0.0, PS_G_T1, PS_G_T2, k) as f64;

    let mut coefficients = vec![p1 as f64; NUM_P];
    for (i, p) in coefficients.iter_mut().enumerate().skip(1) {
        let c = (i + 1) as f64;
        let linear = c / ORDER as f64;

        *p = (ps_g * shapes[i - 1] as f64 + (1.0 - ps_g) * linear)
            .min(c * p1 as f64)
            .max(linear);
    }

    let red_p2 = RED_P2.at(high_tm_g) as f64;
    coefficients[1] = (coefficients[1] * red_p2)
        .min(2.0 * p1 as f64)
        .max(2.0 / ORDER as f64);

    CurveParameters::new(sx, sy, &coefficients)
}

fn blend(a: f64, b: f64, g: f32) -> f64 {
    g as f64 * a + (1.0 - g) as f64 * b
}

/// Tone curve adapted from a reference curve graded for another display peak.
pub fn guided_curve(
    stats: &LuminanceStats,
    reference: &CurveParameters,
    source: f32,
    reference_luminance: u32,
    target: u32,
) -> CurveParameters {
    let order = reference.order();
    let linear = linear_coefficients(order);

    let t0 = reference_luminance;
    let t1 = target;

    let src0 = source.max(t0 as f32);
    let src = source.max(t1 as f32);
    let kmin = GUIDED_MIN_NITS / src;
    let k0 = t0 as f32 / src0;
    let k1 = t1 as f32 / src;

    if (t1 as f32) < GUIDED_MIN_NITS {
        return CurveParameters::new(0.0, 0.0, &linear);
    } else if t0 == t1 {
        return reference.clone();
    } else if t1 as f32 >= source {
        return CurveParameters::new(KNEE_AT_BYPASS, KNEE_AT_BYPASS, &linear);
    }

    let reference_at = |i: usize| reference.coefficients.get(i).copied().unwrap_or(0.0) as f64;

    let (sy, mut coefficients) = if t1 < t0 {
        let g = ((k1 - kmin) / (k0 - kmin)).clamp(0.0, 1.0);
        let min_curve = basis_curve(stats, GUIDED_MIN_NITS, source);
        let min_at = |i: usize| min_curve.coefficients.get(i).copied().unwrap_or(0.0) as f64;

        let sy = blend(reference.knee_y as f64, min_curve.knee_y as f64, g).clamp(0.0, 1.0);
        let coefficients: Vec<f64> = (0..linear.len())
            .map(|i| blend(reference_at(i), min_at(i), g))
            .collect();

        (sy, coefficients)
    } else {
        let g = ((k1 - k0) / (1.0 - k0)).clamp(0.0, 1.0);

        let sy = blend(KNEE_AT_BYPASS, reference.knee_y as f64, g).clamp(0.0, 1.0);
        let coefficients: Vec<f64> = linear
            .iter()
            .enumerate()
            .map(|(i, &lin)| blend(lin, reference_at(i), g))
            .collect();

        (sy, coefficients)
    };

    let sx = sy * k1 as f64;

    let (p1, _) = calc_p1(sx, sy, t1 as f32, source);
    coefficients[0] = p1 as f64;

    for (i, p) in coefficients.iter_mut().enumerate().skip(1) {
        *p = p.min((i + 1) as f64 * p1 as f64);
    }

    CurveParameters::new(sx, sy, &coefficients)
}

/// Curve estimation entry points used by the layer builder.
///
/// The default methods carry the production estimators, implementors
/// usually only wrap them.
pub trait ToneCurveEstimator: Send + Sync {
    fn basis_curve(&self, stats: &LuminanceStats, target: f32, source: f32) -> CurveParameters {
        basis_curve(stats, target, source)
    }

    fn guided_curve(
        &self,
        stats: &LuminanceStats,
        reference: &CurveParameters,
        source: f32,
        reference_luminance: u32,
        target: u32,
    ) -> CurveParameters {
        guided_curve(stats, reference, source, reference_luminance, target)
    }

    /// Static tone mapper for HDR10 or HLG sources
    fn static_curve(
        &self,
        transfer: Transfer,
        source: f64,
        target: f64,
        range: CurveRange,
    ) -> StaticToneMapper {
        StaticToneMapper::new(transfer, source, target, range)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEstimator;

impl ToneCurveEstimator for DefaultEstimator {}

/// Retargets dynamic metadata to a display peak, returning the quantized
/// curve the display should apply.
pub fn meta_to_meta(
    estimator: &dyn ToneCurveEstimator,
    meta: &DynamicMetadata,
    target: u32,
) -> ToneMapping {
    let stats = LuminanceStats::from(meta);
    let source = stats.source_max_luminance();

    let curve = if let Some(tm) = &meta.tone_mapping {
        let reference = CurveParameters::from_tone_mapping(tm);

        estimator.guided_curve(
            &stats,
            &reference,
            source,
            meta.display_maximum_luminance,
            target,
        )
    } else {
        estimator.basis_curve(&stats, target as f32, source)
    };

    curve.quantize()
}
