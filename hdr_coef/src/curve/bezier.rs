use super::{CurveEvaluator, CurveRange};
use crate::ootf::{ToneMapping, ANCHOR_MAX, KNEE_POINT_MAX};

/// Largest Bezier order carried by dynamic metadata
pub const MAX_ORDER: usize = 15;

/// Tone curve gain of a knee point followed by a Bernstein polynomial,
/// the curve shape carried by HDR10+ metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    knee_x: f32,
    knee_y: f32,
    anchors: Vec<f32>,
    range: CurveRange,
}

impl BezierCurve {
    pub fn new(curve: &ToneMapping, range: CurveRange) -> Self {
        let anchors = curve
            .anchors
            .iter()
            .take(MAX_ORDER - 1)
            .map(|&p| p as f32 / ANCHOR_MAX as f32)
            .collect();

        Self {
            knee_x: curve.knee_point_x as f32 / KNEE_POINT_MAX as f32,
            knee_y: curve.knee_point_y as f32 / KNEE_POINT_MAX as f32,
            anchors,
            range,
        }
    }

    /// Normalized curve output for a normalized input
    pub fn evaluate(&self, t: f64) -> f32 {
        let sx = self.knee_x;
        let sy = self.knee_y;

        if t < sx as f64 {
            let k = if sx > 0.0 { sy / sx } else { 0.0 };
            return (t * k as f64).clamp(0.0, 1.0) as f32;
        }

        let x = ((t - sx as f64) / (1.0 - sx) as f64) as f32;
        let dx = 1.0 - x;

        let order = self.anchors.len() + 1;
        let num_p = self.anchors.len();

        let ebzy = if num_p == 0 {
            x
        } else {
            let pow_x: Vec<f32> = (1..=num_p as i32).map(|i| x.powi(i)).collect();
            let pow_dx: Vec<f32> = (1..=num_p as i32).map(|i| dx.powi(i)).collect();

            let sum: f32 = self
                .anchors
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    bernstein_weight(order, i) * pow_x[i] * pow_dx[num_p - i - 1] * p
                })
                .sum();

            sum + pow_x[num_p - 1] * x
        };

        sy + (1.0 - sy) * ebzy
    }
}

/// Binomial weight of anchor `i` for a curve of `order`.
/// Orders below 4 carry no anchor terms.
fn bernstein_weight(order: usize, i: usize) -> f32 {
    if order < 4 {
        return 0.0;
    }

    let k = i + 1;
    (0..k).fold(1.0_f64, |acc, j| acc * (order - j) as f64 / (j + 1) as f64) as f32
}

impl CurveEvaluator for BezierCurve {
    fn range(&self) -> CurveRange {
        self.range
    }

    fn get_y(&self, x: i64) -> i64 {
        let px = x.max(self.range.min_x).max(1);
        let out = self.evaluate(px as f64 / self.range.input as f64);

        (out as f64 * self.range.input as f64 * self.range.output as f64 / px as f64) as i64
    }
}
