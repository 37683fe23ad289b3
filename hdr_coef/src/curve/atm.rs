use super::{CurveEvaluator, CurveRange};
use crate::colorimetry::Transfer;
use crate::utils::{hlg_system_gamma, nits_to_pq, HLG_REFERENCE_NITS};

/// Static tone mapper for HDR10 and HLG content, mapping
/// `[0, max_in]` nits onto `[0, max_out]` nits.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticToneMapper {
    pub transfer: Transfer,
    pub max_in: f64,
    pub max_out: f64,
    range: CurveRange,
}

impl StaticToneMapper {
    pub fn new(transfer: Transfer, max_in: f64, max_out: f64, range: CurveRange) -> Self {
        Self {
            transfer,
            max_in,
            max_out,
            range,
        }
    }

    /// Output luminance in nits for an input luminance in nits
    pub fn map_nits(&self, nits: f64) -> f64 {
        if self.transfer == Transfer::Hlg {
            self.map_hlg(nits)
        } else {
            self.map_pq(nits)
        }
    }

    fn map_pq(&self, nits: f64) -> f64 {
        let x1 = self.max_out * 0.65;
        let y1 = x1;

        let x3 = self.max_in;
        let y3 = self.max_out;

        let x2 = x1 + (x3 - x1) * 4.0 / 17.0;
        let y2 = self.max_out * 0.9;

        let grey1 = nits_to_pq(x1);
        let grey2 = nits_to_pq(x2);
        let grey3 = nits_to_pq(x3);

        let slope2 = (y2 - y1) / (grey2 - grey1);
        let slope3 = (y3 - y2) / (grey3 - grey2);

        if nits < x1 {
            return nits;
        }

        if nits > self.max_in {
            return self.max_out;
        }

        let grey = nits_to_pq(nits);

        if grey <= grey2 {
            (grey - grey2) * slope2 + y2
        } else if grey <= grey3 {
            (grey - grey3) * slope3 + y3
        } else {
            self.max_out
        }
    }

    fn map_hlg(&self, nits: f64) -> f64 {
        let gamma = hlg_system_gamma(self.max_out);

        nits * (nits / HLG_REFERENCE_NITS).powf(gamma - 1.0) * self.max_out / HLG_REFERENCE_NITS
    }
}

impl CurveEvaluator for StaticToneMapper {
    fn range(&self) -> CurveRange {
        self.range
    }

    fn get_y(&self, x: i64) -> i64 {
        let px_norm = x.max(self.range.min_x) as f64 / self.range.input as f64;
        let py_out = self.map_nits(px_norm * self.max_in);

        let py_norm = py_out / self.max_out;
        (py_norm * self.range.output as f64 / px_norm) as i64
    }
}
