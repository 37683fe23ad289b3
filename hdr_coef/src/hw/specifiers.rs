use std::collections::BTreeMap;

use log::debug;

#[cfg(feature = "serde")]
use serde::Serialize;

use super::HdrHw;
use crate::curve::CurveBits;
use crate::utils::{is_valid_nits, ST2084_Y_MAX};

/// Sub-modules programming a sampled curve: an enable, x breakpoints and y values.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CurveSpecifier {
    pub mod_en: String,
    pub mod_x: String,
    pub mod_y: String,
    pub bits: CurveBits,
}

impl CurveSpecifier {
    pub fn sub_modules(&self) -> [&str; 3] {
        [&self.mod_en, &self.mod_x, &self.mod_y]
    }

    /// Breakpoint count, the node count of the x sub-module
    pub fn sample_count(&self, hw: &dyn HdrHw, layer: usize) -> Option<usize> {
        hw.sub_module_nodes(layer, &self.mod_x)
    }

    pub fn is_valid_nits(&self, nits: u32) -> bool {
        is_valid_nits(nits)
    }
}

/// Sub-modules of the PQ decoder gain stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PqSpecifier {
    pub mod_en: String,
    pub pq_en: String,
    pub coef: String,
    pub shift: String,
}

impl PqSpecifier {
    pub fn sub_modules(&self) -> [&str; 4] {
        [&self.mod_en, &self.pq_en, &self.coef, &self.shift]
    }

    pub fn is_valid_nits(&self, nits: u32) -> bool {
        is_valid_nits(nits)
    }

    /// Fixed point gain normalizing decoded PQ light to `source` nits.
    ///
    /// Returns `(coef, shift)` with `coef = round(10000 / source * 2^shift)`,
    /// using the largest shift whose coefficient still fits `coef_mask`.
    pub fn gain(source: u32, coef_mask: u32, shift_mask: u32) -> (i64, i64) {
        let gain = ST2084_Y_MAX / source.max(1) as f64;

        (0..=shift_mask.min(31))
            .rev()
            .map(|shift| ((gain * (1u64 << shift) as f64).round() as i64, shift as i64))
            .find(|(coef, _)| *coef <= coef_mask as i64)
            .unwrap_or((coef_mask as i64, 0))
    }
}

/// Specifiers of one module. Absent entries are unused by the module.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ModuleSpecifier {
    pub tone_map: Option<CurveSpecifier>,
    pub pq: Option<PqSpecifier>,
    pub eotf: Option<CurveSpecifier>,
}

/// Per layer module specifiers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ModuleSpecifiers {
    layers: BTreeMap<usize, ModuleSpecifier>,
}

impl ModuleSpecifiers {
    pub fn insert(&mut self, layer: usize, specifier: ModuleSpecifier) {
        self.layers.insert(layer, specifier);
    }

    pub fn get(&self, layer: usize) -> Option<&ModuleSpecifier> {
        self.layers.get(&layer)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Drops every specifier naming a sub-module the layer's module lacks.
    pub fn retain_usable(&mut self, hw: &dyn HdrHw) {
        for (&layer, specifier) in self.layers.iter_mut() {
            let usable = |names: &[&str]| names.iter().all(|name| hw.has_sub_module(layer, name));

            if let Some(tm) = &specifier.tone_map {
                if !usable(&tm.sub_modules()) {
                    debug!("layer {layer}: no tone map sub-modules {:?}", tm.sub_modules());
                    specifier.tone_map = None;
                }
            }

            if let Some(pq) = &specifier.pq {
                if !usable(&pq.sub_modules()) {
                    debug!("layer {layer}: no pq sub-modules {:?}", pq.sub_modules());
                    specifier.pq = None;
                }
            }

            if let Some(eotf) = &specifier.eotf {
                if !usable(&eotf.sub_modules()) {
                    debug!("layer {layer}: no eotf sub-modules {:?}", eotf.sub_modules());
                    specifier.eotf = None;
                }
            }
        }
    }
}
