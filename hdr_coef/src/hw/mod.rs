use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::blob::{CoefficientBlob, LUT_HEADER_SIZE};
use crate::buffer::COEF_HEADER_SIZE;
use crate::colorimetry::Bpc;
use crate::error::{HdrCoefError, Result};
use crate::packer::SubModuleGeometry;

pub mod dpu;
pub mod specifiers;

#[cfg(test)]
mod tests;

pub use dpu::DpuHw;
pub use specifiers::{CurveSpecifier, ModuleSpecifier, ModuleSpecifiers, PqSpecifier};

/// Hardware variants known to the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum HwId {
    Dpu,
}

impl HwId {
    pub const ALL: &'static [HwId] = &[HwId::Dpu];

    pub fn name(self) -> &'static str {
        match self {
            HwId::Dpu => "DPU",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }

    /// Empty hardware description for the variant, filled by `HdrHw::parse`
    pub fn create(self) -> Box<dyn HdrHw> {
        match self {
            HwId::Dpu => Box::<DpuHw>::default(),
        }
    }
}

impl fmt::Display for HwId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Color functions a module can run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HdrFunctions {
    pub wcg: bool,
    pub hdr10: bool,
    pub hdr10p: bool,
    pub hlg: bool,
}

/// Vendor specific function: an enable sub-module plus the sub-modules it drives.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExtraFunction {
    pub module_en: String,
    pub sub_modules_en: Vec<String>,
    pub sub_modules: Vec<String>,
}

/// Capabilities and register layout of one hardware module.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ModuleCapabilities {
    /// Layers served by the module
    pub layers: Vec<usize>,
    pub functions: HdrFunctions,
    pub bpc8: bool,
    pub bpc10: bool,
    pub extra_functions: BTreeMap<String, ExtraFunction>,
    pub sub_modules: BTreeMap<String, SubModuleGeometry>,
}

impl ModuleCapabilities {
    pub fn sub_module(&self, name: &str) -> Option<&SubModuleGeometry> {
        self.sub_modules.get(name)
    }

    pub fn supports_bpc(&self, bpc: Bpc) -> bool {
        match bpc {
            Bpc::Bpc8 => self.bpc8,
            Bpc::Bpc10 => self.bpc10,
        }
    }

    pub fn pack(&self, name: &str, values: &[i64]) -> Result<CoefficientBlob> {
        let geometry = self
            .sub_module(name)
            .ok_or_else(|| HdrCoefError::InvalidGeometry {
                name: name.to_string(),
                reason: String::from("not declared by the module"),
            })?;

        CoefficientBlob::pack(values, geometry)
    }

    /// Size of a buffer holding every sub-module of the module once
    pub fn max_coefficient_size(&self) -> usize {
        COEF_HEADER_SIZE
            + self
                .sub_modules
                .values()
                .map(|sub| {
                    let words = sub.num_nodes / sub.nodes_per_reg.max(1) + 1;
                    LUT_HEADER_SIZE + 4 * words
                })
                .sum::<usize>()
    }
}

/// A hardware variant: its modules and how layers map onto them.
pub trait HdrHw: fmt::Debug + Send + Sync {
    fn id(&self) -> HwId;

    /// Replaces the description with the one in a capability document
    #[cfg(feature = "xml")]
    fn parse(&mut self, document: &str) -> anyhow::Result<()>;

    fn modules(&self) -> &[ModuleCapabilities];

    fn module(&self, layer: usize) -> Option<&ModuleCapabilities>;

    /// Layer indices with a module, ascending
    fn layers(&self) -> Vec<usize>;

    fn has_sub_module(&self, layer: usize, name: &str) -> bool {
        self.module(layer)
            .is_some_and(|module| module.sub_modules.contains_key(name))
    }

    fn sub_module_nodes(&self, layer: usize, name: &str) -> Option<usize> {
        self.module(layer)?.sub_module(name).map(|sub| sub.num_nodes)
    }

    fn pack(&self, layer: usize, name: &str, values: &[i64]) -> Result<CoefficientBlob> {
        self.module(layer)
            .ok_or(HdrCoefError::UnknownLayer(layer))?
            .pack(name, values)
    }

    /// Upper bound of a layer buffer, doubled for headroom.
    fn coefficient_buffer_size(&self) -> usize {
        self.modules()
            .iter()
            .map(ModuleCapabilities::max_coefficient_size)
            .max()
            .unwrap_or(0)
            * 2
    }
}
