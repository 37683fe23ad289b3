use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::Serialize;

use super::PackedSet;
use crate::blob::CoefficientBlob;
use crate::colorimetry::{Dataspace, HdrCapa, Standard, Transfer};

/// Output override for an input dataspace on a given display class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CustomOutput {
    pub dataspace: Dataspace,
    pub capa: HdrCapa,
}

/// Wide gamut coefficients of one module.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WcgModule {
    /// Enables programmed when input and output dataspaces match
    pub eq: PackedSet,
    /// Enables programmed when a conversion runs
    pub neq: PackedSet,
    pub eotf: BTreeMap<Transfer, PackedSet>,
    pub oetf: BTreeMap<Transfer, PackedSet>,
    pub gamut: BTreeMap<Standard, BTreeMap<Standard, PackedSet>>,
    pub custom: BTreeMap<Dataspace, CustomOutput>,
}

/// Coefficients chosen by the wide gamut pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WcgSelection<'a> {
    /// Input and output match, only the feature enables are programmed
    PassThrough(Vec<&'a CoefficientBlob>),
    /// Enables, input EOTF, output OETF then gamut matrix
    Convert(Vec<&'a CoefficientBlob>),
}

impl WcgSelection<'_> {
    pub fn is_active(&self) -> bool {
        matches!(self, WcgSelection::Convert(_))
    }
}

impl WcgModule {
    /// Output dataspace for `input`, a custom entry for the display class
    /// taking precedence over the target dataspace.
    pub fn output_dataspace(&self, input: Dataspace, target: Dataspace, capa: HdrCapa) -> Dataspace {
        match self.custom.get(&input) {
            Some(custom) if custom.capa == capa => custom.dataspace,
            _ => target,
        }
    }

    pub fn select(&self, input: Dataspace, output: Dataspace) -> WcgSelection<'_> {
        if input == output {
            return WcgSelection::PassThrough(self.eq.values().collect());
        }

        let eotf = self.eotf.get(&input.transfer).into_iter().flat_map(|set| set.values());
        let oetf = self.oetf.get(&output.transfer).into_iter().flat_map(|set| set.values());
        let gamut = self
            .gamut
            .get(&input.standard)
            .and_then(|out| out.get(&output.standard))
            .into_iter()
            .flat_map(|set| set.values());

        WcgSelection::Convert(self.neq.values().chain(eotf).chain(oetf).chain(gamut).collect())
    }
}

/// Wide gamut modules per layer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WcgTables {
    layers: BTreeMap<usize, WcgModule>,
}

impl WcgTables {
    pub fn insert(&mut self, layer: usize, module: WcgModule) {
        self.layers.insert(layer, module);
    }

    pub fn get(&self, layer: usize) -> Option<&WcgModule> {
        self.layers.get(&layer)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
