use super::{CurveEvaluator, CurveRange};
use crate::colorimetry::Transfer;
use crate::utils::{hlg_to_linear, pq_to_nits};

/// Linearizing curve for PQ or HLG signals, normalized so that
/// `max_in` nits reaches the top of the output range.
#[derive(Debug, Clone, PartialEq)]
pub struct EotfCurve {
    pub transfer: Transfer,
    pub max_in: f64,
    range: CurveRange,
}

impl EotfCurve {
    pub fn new(transfer: Transfer, max_in: f64, range: CurveRange) -> Self {
        Self {
            transfer,
            max_in,
            range,
        }
    }

    pub fn evaluate(&self, signal: f64) -> f64 {
        if self.transfer == Transfer::Hlg {
            hlg_to_linear(signal)
        } else {
            (pq_to_nits(signal) / self.max_in).min(1.0)
        }
    }
}

impl CurveEvaluator for EotfCurve {
    fn range(&self) -> CurveRange {
        self.range
    }

    fn get_y(&self, x: i64) -> i64 {
        let px_norm = x as f64 / self.range.input as f64;

        (self.evaluate(px_norm) * self.range.output as f64) as i64
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::utils::{nits_to_pq, ST2084_Y_MAX};

    const RANGE: CurveRange = CurveRange {
        input: 1 << 10,
        output: (1 << 16) - 1,
        min_x: 1,
    };

    #[test]
    fn pq_saturates_at_source_peak() {
        let eotf = EotfCurve::new(Transfer::St2084, 1000.0, RANGE);

        assert_relative_eq!(eotf.evaluate(nits_to_pq(500.0)), 0.5, epsilon = 1e-9);
        assert_eq!(eotf.evaluate(nits_to_pq(4000.0)), 1.0);
        assert_eq!(eotf.get_y(0), 0);
        assert_eq!(eotf.get_y(RANGE.input), RANGE.output);
    }

    #[test]
    fn full_range_pq_reaches_ceiling() {
        let eotf = EotfCurve::new(Transfer::St2084, ST2084_Y_MAX, RANGE);

        assert_relative_eq!(eotf.evaluate(1.0), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn hlg_ignores_peak() {
        let eotf = EotfCurve::new(Transfer::Hlg, 400.0, RANGE);

        assert_relative_eq!(eotf.evaluate(0.5), 1.0 / 12.0, epsilon = 1e-12);
    }
}
