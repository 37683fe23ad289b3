pub const ST2084_Y_MAX: f64 = 10000.0;
pub const ST2084_M1: f64 = 2610.0 / 16384.0;
pub const ST2084_M2: f64 = (2523.0 / 4096.0) * 128.0;
pub const ST2084_C1: f64 = 3424.0 / 4096.0;
pub const ST2084_C2: f64 = (2413.0 / 4096.0) * 32.0;
pub const ST2084_C3: f64 = (2392.0 / 4096.0) * 32.0;

/// Luminance of a nominal HLG display
pub const HLG_REFERENCE_NITS: f64 = 1000.0;

const HLG_A: f64 = 0.17883277;
const HLG_B: f64 = 0.28466892;
const HLG_C: f64 = 0.55991073;

#[inline(always)]
pub fn pq_to_nits(x: f64) -> f64 {
    if x > 0.0 {
        let xpow = x.powf(1.0 / ST2084_M2);
        let num = (xpow - ST2084_C1).max(0.0);
        let den = ST2084_C2 - ST2084_C3 * xpow;

        (num / den).powf(1.0 / ST2084_M1) * ST2084_Y_MAX
    } else {
        0.0
    }
}

/// Helper function to calculate PQ codes from nits (cd/m2) values
#[inline(always)]
pub fn nits_to_pq(nits: f64) -> f64 {
    let y = nits / ST2084_Y_MAX;

    ((ST2084_C1 + ST2084_C2 * y.powf(ST2084_M1)) / (1.0 + ST2084_C3 * y.powf(ST2084_M1)))
        .powf(ST2084_M2)
}

/// Normalized linear light of an HLG signal value in [0, 1]
#[inline(always)]
pub fn hlg_to_linear(x: f64) -> f64 {
    if x <= 0.5 {
        x * x / 3.0
    } else {
        (((x - HLG_C) / HLG_A).exp() + HLG_B) / 12.0
    }
}

/// System gamma of an HLG display with the given peak luminance
#[inline(always)]
pub fn hlg_system_gamma(display_nits: f64) -> f64 {
    1.2 + 0.42 * (display_nits / HLG_REFERENCE_NITS).log10()
}

/// Luminance values above zero and up to the PQ ceiling
#[inline(always)]
pub fn is_valid_nits(nits: u32) -> bool {
    nits > 0 && nits as f64 <= ST2084_Y_MAX
}
