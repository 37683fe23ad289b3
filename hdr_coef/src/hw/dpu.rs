use std::collections::BTreeMap;

use super::{HdrHw, HwId, ModuleCapabilities};

/// Display processing unit: a set of modules, each serving one or more layers.
#[derive(Debug, Default, Clone)]
pub struct DpuHw {
    pub name: String,
    modules: Vec<ModuleCapabilities>,
    layer_to_module: BTreeMap<usize, usize>,
}

impl DpuHw {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Registers a module for every layer in `module.layers`.
    ///
    /// A layer already mapped is moved to the new module.
    pub fn add_module(&mut self, module: ModuleCapabilities) {
        let idx = self.modules.len();

        for layer in &module.layers {
            self.layer_to_module.insert(*layer, idx);
        }

        self.modules.push(module);
    }
}

impl HdrHw for DpuHw {
    fn id(&self) -> HwId {
        HwId::Dpu
    }

    #[cfg(feature = "xml")]
    fn parse(&mut self, document: &str) -> anyhow::Result<()> {
        *self = crate::xml::hw::parse_dpu(document)?;

        Ok(())
    }

    fn modules(&self) -> &[ModuleCapabilities] {
        &self.modules
    }

    fn module(&self, layer: usize) -> Option<&ModuleCapabilities> {
        self.layer_to_module
            .get(&layer)
            .and_then(|&idx| self.modules.get(idx))
    }

    fn layers(&self) -> Vec<usize> {
        self.layer_to_module.keys().copied().collect()
    }
}
