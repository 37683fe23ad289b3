use std::sync::Arc;

use crate::builder::TargetDescriptor;
use crate::error::Result;
use crate::hw::{DpuHw, HdrHw, ModuleSpecifiers};
use crate::tables::{LuminanceTables, TuneTables, WcgTables};

/// Target independent configuration, read-only once loaded.
///
/// Cloning shares the underlying data, so several builders may use
/// the same capabilities.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub hw: Arc<dyn HdrHw>,
    pub specifiers: Arc<ModuleSpecifiers>,
    pub wcg: Arc<WcgTables>,
}

impl Capabilities {
    /// Specifiers naming sub-modules the hardware lacks are dropped.
    pub fn new<H: HdrHw + 'static>(hw: H, mut specifiers: ModuleSpecifiers, wcg: WcgTables) -> Self {
        specifiers.retain_usable(&hw);

        Self {
            hw: Arc::new(hw),
            specifiers: Arc::new(specifiers),
            wcg: Arc::new(wcg),
        }
    }

    /// No module at all, every function reports unsupported
    pub fn empty() -> Self {
        Self::new(DpuHw::default(), ModuleSpecifiers::default(), WcgTables::default())
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::empty()
    }
}

/// Where the builder loads its configuration from.
///
/// Loading only happens at construction, on target changes and on
/// explicit reload requests, never while a layer is being built.
pub trait ConfigSource: Send + Sync {
    fn capabilities(&self) -> Result<Capabilities>;

    /// Luminance indexed tables of the static HDR families for a target
    fn luminance_tables(
        &self,
        capabilities: &Capabilities,
        target: &TargetDescriptor,
    ) -> Result<LuminanceTables>;

    /// Override tables, `None` when the target has none
    fn tune_tables(
        &self,
        capabilities: &Capabilities,
        target: &TargetDescriptor,
    ) -> Result<Option<TuneTables>>;
}

/// Configuration already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    pub capabilities: Capabilities,
    pub luminance: LuminanceTables,
    pub tune: Option<TuneTables>,
}

impl ConfigSource for StaticConfig {
    fn capabilities(&self) -> Result<Capabilities> {
        Ok(self.capabilities.clone())
    }

    fn luminance_tables(&self, _: &Capabilities, _: &TargetDescriptor) -> Result<LuminanceTables> {
        Ok(self.luminance.clone())
    }

    fn tune_tables(&self, _: &Capabilities, _: &TargetDescriptor) -> Result<Option<TuneTables>> {
        Ok(self.tune.clone())
    }
}
