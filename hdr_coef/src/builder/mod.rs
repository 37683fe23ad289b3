use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, error, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::LayerEntries;
use crate::colorimetry::{Bpc, Dataspace, HdrCapa, Transfer};
use crate::config::{Capabilities, ConfigSource};
use crate::error::{HdrCoefError, Result};
use crate::hw::HdrFunctions;
use crate::ootf::{DefaultEstimator, DynamicMetadata, ToneCurveEstimator};
use crate::tables::{HdrFamily, LookupTables, LuminanceTables, TuneTables};

mod passes;

pub use passes::static_source_luminance;


/// Target luminance used when the target does not report one
pub const DEFAULT_TARGET_LUMINANCE: u32 = 500;

/// Source luminance of HDR10 content without usable static metadata
pub const FALLBACK_SOURCE_LUMINANCE: u32 = 1500;

/// Highest `set_log_level` value interpreted as a verbosity
pub const MAX_LOG_VERBOSITY: i32 = 100;

/// Levels above this force the target luminance to `level - FORCED_TARGET_BASE`
pub const FORCED_TARGET_BASE: i32 = 10000;

/// Builder progress within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FrameState {
    Init,
    CapabilityReady,
    TargetReady,
    BuildUpReady,
}

/// Progress of one layer within a frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    #[default]
    Init,
    BuildUpReady,
}

/// HDR processing family of a layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum HdrKind {
    #[default]
    None,
    Hdr10,
    Hdr10Plus,
    Hlg,
}

impl HdrKind {
    /// Family implied by the layer metadata alone
    pub fn classify(layer: &LayerDescriptor) -> Self {
        match layer.dataspace.transfer {
            Transfer::St2084 if layer.dynamic_metadata.is_some() => HdrKind::Hdr10Plus,
            Transfer::St2084 => HdrKind::Hdr10,
            Transfer::Hlg => HdrKind::Hlg,
            _ => HdrKind::None,
        }
    }

    /// Narrows the kind to what a module can run.
    pub fn supported_by(self, functions: &HdrFunctions) -> Self {
        let supported = match self {
            HdrKind::None => true,
            HdrKind::Hdr10 => functions.hdr10,
            HdrKind::Hdr10Plus => functions.hdr10p,
            HdrKind::Hlg => functions.hlg,
        };

        if supported {
            self
        } else {
            HdrKind::None
        }
    }

    pub fn family(self) -> Option<HdrFamily> {
        match self {
            HdrKind::None => None,
            HdrKind::Hdr10 => Some(HdrFamily::Hdr10),
            HdrKind::Hdr10Plus => Some(HdrFamily::Hdr10Plus),
            HdrKind::Hlg => Some(HdrFamily::Hlg),
        }
    }
}

/// Display the layers are composed for.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TargetDescriptor {
    pub dataspace: Dataspace,
    #[cfg_attr(feature = "serde", serde(default))]
    pub capa: HdrCapa,
    /// Peak luminance in nits, 0 when unknown
    #[cfg_attr(feature = "serde", serde(default))]
    pub peak_luminance: u32,
}

/// What the compositor knows about a layer for the current frame.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayerDescriptor {
    /// Layer is composed without color processing
    pub bypass: bool,
    pub dataspace: Dataspace,
    pub bpc: Bpc,
    /// Mastering display peak, in nits
    pub mastering_luminance: Option<u32>,
    /// Maximum content light level, in nits
    pub max_cll: Option<u32>,
    pub dynamic_metadata: Option<DynamicMetadata>,
    pub premult_alpha: bool,
    /// Row major 4x4 color transform
    pub transform_matrix: Option<[f32; 16]>,
}

/// Result of the last build of a layer.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LayerSummary {
    pub kind: HdrKind,
    /// Color pipeline enabled by the wide gamut pass
    pub active: bool,
    pub source_luminance: u32,
    pub target_luminance: u32,
    pub mandatory_count: usize,
    pub optional_count: usize,
}

#[derive(Debug, Default)]
struct LayerSlot {
    state: LayerState,
    previous: Option<LayerDescriptor>,
    target_changed: bool,
    entries: LayerEntries,
    summary: LayerSummary,
}

/// Builds the per-layer coefficient buffers of one display, frame by frame.
///
/// Calls are expected in order: `set_target_info`, `init_coefficient_buildup`,
/// then `set_layer_info` and `hdr_coef_data` for each layer.
pub struct LayerCoefficientBuilder {
    source: Arc<dyn ConfigSource>,
    estimator: Arc<dyn ToneCurveEstimator>,
    capabilities: Capabilities,
    tables: LookupTables,
    state: FrameState,
    target: Option<TargetDescriptor>,
    layers: BTreeMap<usize, LayerSlot>,

    log_level: i32,
    tune_mode: bool,
    tune_reload: bool,
    reload_requested: bool,
    forced_source_luminance: u32,
    forced_target_luminance: u32,
}

impl LayerCoefficientBuilder {
    /// Builder without capabilities, `load_capabilities` must run first.
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            source,
            estimator: Arc::new(DefaultEstimator),
            capabilities: Capabilities::empty(),
            tables: LookupTables::default(),
            state: FrameState::Init,
            target: None,
            layers: BTreeMap::new(),
            log_level: 0,
            tune_mode: false,
            tune_reload: false,
            reload_requested: false,
            forced_source_luminance: 0,
            forced_target_luminance: 0,
        }
    }

    /// Builder sharing already loaded capabilities.
    pub fn with_capabilities(capabilities: Capabilities, source: Arc<dyn ConfigSource>) -> Self {
        let mut builder = Self::new(source);
        builder.install_capabilities(capabilities);

        builder
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn ToneCurveEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Loads the capabilities from the configuration source.
    ///
    /// A load failure leaves the builder with no module, so every layer
    /// is left unprocessed.
    pub fn load_capabilities(&mut self) {
        let capabilities = match self.source.capabilities() {
            Ok(capabilities) => capabilities,
            Err(e) => {
                error!("capabilities unavailable, HDR processing disabled: {e}");
                Capabilities::empty()
            }
        };

        self.install_capabilities(capabilities);
    }

    fn install_capabilities(&mut self, capabilities: Capabilities) {
        self.layers = capabilities
            .hw
            .layers()
            .into_iter()
            .map(|layer| (layer, LayerSlot::default()))
            .collect();

        self.tables = LookupTables {
            wcg: capabilities.wcg.clone(),
            ..Default::default()
        };
        self.capabilities = capabilities;

        self.state = FrameState::CapabilityReady;

        if let Some(target) = self.target.clone() {
            self.reload_target_tables(&target);
            self.state = FrameState::TargetReady;
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn tables(&self) -> &LookupTables {
        &self.tables
    }

    pub fn target(&self) -> Option<&TargetDescriptor> {
        self.target.as_ref()
    }

    pub fn layer_state(&self, layer: usize) -> Option<LayerState> {
        self.layers.get(&layer).map(|slot| slot.state)
    }

    /// Summary of the last successful build of a layer
    pub fn layer_summary(&self, layer: usize) -> Option<&LayerSummary> {
        self.layers
            .get(&layer)
            .filter(|slot| slot.state == LayerState::BuildUpReady)
            .map(|slot| &slot.summary)
    }

    /// Sets the display of the coming frames.
    ///
    /// The luminance tables are reloaded and every layer rebuilt only when
    /// the target differs from the current one. Buffers built for a previous
    /// target are no longer served.
    pub fn set_target_info(&mut self, target: TargetDescriptor) -> Result<()> {
        self.require(FrameState::CapabilityReady, "set_target_info")?;

        if self.target.as_ref() != Some(&target) {
            if self.log_level > 0 {
                debug!("target changed to {target:?}");
            }

            self.reload_target_tables(&target);
            self.mark_layers_changed();
            self.layers
                .values_mut()
                .for_each(|slot| slot.state = LayerState::Init);
            self.target = Some(target);
        }

        self.state = FrameState::TargetReady;

        Ok(())
    }

    /// Starts a frame, applying any pending reload first.
    pub fn init_coefficient_buildup(&mut self) -> Result<()> {
        self.require(FrameState::TargetReady, "init_coefficient_buildup")?;

        if self.reload_requested {
            self.reload_requested = false;
            self.tune_reload = false;

            debug!("reloading configuration");
            self.load_capabilities();
        } else if self.tune_reload {
            self.tune_reload = false;

            if let Some(target) = self.target.clone() {
                self.tables.tune = self.load_tune_tables(&target);
            }
            self.mark_layers_changed();
        }

        self.layers
            .values_mut()
            .for_each(|slot| slot.state = LayerState::Init);

        self.state = FrameState::BuildUpReady;

        Ok(())
    }

    /// Whether a layer needs any color processing for the current target
    pub fn needs_processing(&self, layer: &LayerDescriptor) -> bool {
        let Some(target) = &self.target else {
            return false;
        };

        layer.dataspace != target.dataspace || HdrKind::classify(layer) != HdrKind::None
    }

    /// Builds the coefficients of a layer, reusing the previous frame's
    /// buffer when nothing relevant changed.
    ///
    /// On failure the layer has no coefficients for the frame.
    pub fn set_layer_info(&mut self, layer: usize, descriptor: &LayerDescriptor) -> Result<()> {
        self.require(FrameState::BuildUpReady, "set_layer_info")?;

        let target = self.target.clone().ok_or(HdrCoefError::InvalidState {
            op: "set_layer_info",
            state: self.state,
        })?;
        let target_luminance = self.target_luminance();

        let slot = self
            .layers
            .get(&layer)
            .ok_or(HdrCoefError::UnknownLayer(layer))?;

        if !self.has_changed(layer, slot, descriptor, target_luminance) {
            if let Some(slot) = self.layers.get_mut(&layer) {
                slot.state = LayerState::BuildUpReady;
            }

            return Ok(());
        }

        let output = passes::LayerBuild {
            capabilities: &self.capabilities,
            tables: &self.tables,
            estimator: self.estimator.as_ref(),
            layer,
            target: &target,
            target_luminance,
            forced_source_luminance: self.forced_source_luminance,
            tune_mode: self.tune_mode,
        }
        .run(descriptor);

        let slot = self
            .layers
            .get_mut(&layer)
            .ok_or(HdrCoefError::UnknownLayer(layer))?;

        match output {
            Ok(output) => {
                slot.summary = LayerSummary {
                    kind: output.kind,
                    active: output.active,
                    source_luminance: output.source_luminance,
                    target_luminance,
                    mandatory_count: output.entries.mandatory.len(),
                    optional_count: output.entries.optional.len(),
                };
                slot.entries = output.entries;
                slot.previous = Some(descriptor.clone());
                slot.target_changed = false;
                slot.state = LayerState::BuildUpReady;

                Ok(())
            }
            Err(e) => {
                warn!("layer {layer}: build failed: {e}");

                slot.entries = LayerEntries::default();
                slot.summary = LayerSummary::default();
                slot.previous = None;
                slot.state = LayerState::Init;

                Err(e)
            }
        }
    }

    /// Serialized coefficient buffer of a built layer
    pub fn hdr_coef_data(&self, layer: usize) -> Result<Vec<u8>> {
        let slot = self
            .layers
            .get(&layer)
            .ok_or(HdrCoefError::UnknownLayer(layer))?;

        if slot.state != LayerState::BuildUpReady {
            return Err(HdrCoefError::NotReady(layer));
        }

        if self.log_level > 1 {
            for (i, entry) in slot.entries.mandatory.iter().enumerate() {
                debug!("layer {layer}: mandatory[{i}] {:?} {:08x?}", entry.header, entry.words);
            }

            for (i, entry) in slot.entries.optional.iter().enumerate() {
                debug!("layer {layer}: optional[{i}] {:?} {:08x?}", entry.header, entry.words);
            }
        }

        slot.entries
            .serialize(layer, self.log_level, slot.summary.active)
    }

    /// Largest buffer `hdr_coef_data` can return
    pub fn coefficient_buffer_size(&self) -> usize {
        self.capabilities.hw.coefficient_buffer_size()
    }

    /// Debug control.
    ///
    /// Negative levels toggle the tune tables, levels up to 100 set the log
    /// verbosity, levels up to 10000 force the source luminance and higher
    /// levels force the target luminance to `level - 10000`.
    pub fn set_log_level(&mut self, level: i32) {
        if level < 0 {
            self.tune_mode = !self.tune_mode;
            self.tune_reload = true;
            debug!("tune mode {}", if self.tune_mode { "on" } else { "off" });
        } else if level <= MAX_LOG_VERBOSITY {
            self.log_level = level;
        } else if level <= FORCED_TARGET_BASE {
            self.set_source_luminance(level as u32);
        } else {
            self.set_target_luminance((level - FORCED_TARGET_BASE) as u32);
        }
    }

    pub fn log_level(&self) -> i32 {
        self.log_level
    }

    /// Forces the source luminance of static HDR layers, 0 to clear
    pub fn set_source_luminance(&mut self, luminance: u32) {
        if self.forced_source_luminance != luminance {
            self.forced_source_luminance = luminance;
            self.mark_layers_changed();
        }
    }

    /// Forces the target luminance, 0 to clear
    pub fn set_target_luminance(&mut self, luminance: u32) {
        if self.forced_target_luminance != luminance {
            self.forced_target_luminance = luminance;
            self.mark_layers_changed();
        }
    }

    /// Target luminance layers are mapped to.
    ///
    /// A forced value wins, otherwise the target peak or 500 nits when the
    /// target reports none.
    pub fn target_luminance(&self) -> u32 {
        if self.forced_target_luminance > 0 {
            return self.forced_target_luminance;
        }

        match self.target.as_ref().map(|t| t.peak_luminance) {
            Some(peak) if peak > 0 => peak,
            _ => DEFAULT_TARGET_LUMINANCE,
        }
    }

    /// Reloads every configuration document at the next `init_coefficient_buildup`
    pub fn request_reload(&mut self) {
        self.reload_requested = true;
    }

    fn require(&self, min: FrameState, op: &'static str) -> Result<()> {
        if self.state < min {
            return Err(HdrCoefError::InvalidState {
                op,
                state: self.state,
            });
        }

        Ok(())
    }

    fn mark_layers_changed(&mut self) {
        self.layers
            .values_mut()
            .for_each(|slot| slot.target_changed = true);
    }

    fn reload_target_tables(&mut self, target: &TargetDescriptor) {
        self.tables.luminance = match self.source.luminance_tables(&self.capabilities, target) {
            Ok(tables) => tables,
            Err(e) => {
                error!("luminance tables unavailable: {e}");
                LuminanceTables::default()
            }
        };

        if self.tune_mode {
            self.tables.tune = self.load_tune_tables(target);
        }
    }

    fn load_tune_tables(&self, target: &TargetDescriptor) -> Option<TuneTables> {
        if !self.tune_mode {
            return None;
        }

        match self.source.tune_tables(&self.capabilities, target) {
            Ok(tune) => tune,
            Err(e) => {
                error!("tune tables unavailable: {e}");
                None
            }
        }
    }

    fn has_changed(
        &self,
        layer: usize,
        slot: &LayerSlot,
        descriptor: &LayerDescriptor,
        target_luminance: u32,
    ) -> bool {
        let Some(previous) = &slot.previous else {
            return true;
        };

        let reason = if slot.target_changed {
            Some("target")
        } else if slot.summary.target_luminance != target_luminance {
            Some("target luminance")
        } else if descriptor.dynamic_metadata.is_some() {
            Some("dynamic metadata")
        } else if previous.bypass != descriptor.bypass {
            Some("bypass")
        } else if previous.bpc != descriptor.bpc {
            Some("bpc")
        } else if previous.premult_alpha != descriptor.premult_alpha {
            Some("premultiplied alpha")
        } else if previous.transform_matrix != descriptor.transform_matrix {
            Some("transform matrix")
        } else if previous.dataspace != descriptor.dataspace {
            Some("dataspace")
        } else if previous.mastering_luminance != descriptor.mastering_luminance
            || previous.max_cll != descriptor.max_cll
        {
            Some("static metadata")
        } else {
            None
        };

        if self.log_level > 0 {
            match reason {
                Some(reason) => debug!("layer {layer}: {reason} changed"),
                None => debug!("layer {layer}: unchanged"),
            }
        }

        reason.is_some()
    }
}
