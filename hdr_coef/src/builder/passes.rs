use log::{debug, warn};

use super::{HdrKind, LayerDescriptor, TargetDescriptor, FALLBACK_SOURCE_LUMINANCE};
use crate::blob::{clean_duplicates, CoefficientBlob, GroupMap};
use crate::buffer::LayerEntries;
use crate::colorimetry::Transfer;
use crate::config::Capabilities;
use crate::curve::{sample_curve, BezierCurve, CurveEvaluator, EotfCurve};
use crate::error::{HdrCoefError, Result};
use crate::hw::{CurveSpecifier, HdrHw, ModuleSpecifier, PqSpecifier};
use crate::ootf::{meta_to_meta, LuminanceStats, ToneCurveEstimator};
use crate::tables::{HdrFamily, LookupTables, WcgSelection};
use crate::utils::HLG_REFERENCE_NITS;

/// Effective source luminance of static HDR10 content.
///
/// Mastering luminance counts only above 100 nits, the lower of the two
/// static values is used when both are valid. Never below `target`.
pub fn static_source_luminance(mastering: Option<u32>, max_cll: Option<u32>, target: u32) -> u32 {
    let mastering = mastering.filter(|&nits| nits > 100);
    let max_cll = max_cll.filter(|&nits| nits > 0);

    let source = match (mastering, max_cll) {
        (Some(mastering), Some(max_cll)) => mastering.min(max_cll),
        (Some(nits), None) | (None, Some(nits)) => nits,
        (None, None) => FALLBACK_SOURCE_LUMINANCE,
    };

    source.max(target)
}

/// Enable values of a sub-module: the first node set, the others cleared
fn enable_values(nodes: usize) -> Vec<i64> {
    (0..nodes).map(|i| i64::from(i == 0)).collect()
}

pub(super) struct BuildOutput {
    pub entries: LayerEntries,
    pub kind: HdrKind,
    pub active: bool,
    pub source_luminance: u32,
}

/// One build of one layer.
pub(super) struct LayerBuild<'a> {
    pub capabilities: &'a Capabilities,
    pub tables: &'a LookupTables,
    pub estimator: &'a dyn ToneCurveEstimator,
    pub layer: usize,
    pub target: &'a TargetDescriptor,
    pub target_luminance: u32,
    pub forced_source_luminance: u32,
    pub tune_mode: bool,
}

struct Queues {
    pending: Vec<CoefficientBlob>,
    optional: Vec<CoefficientBlob>,
    groups: GroupMap,
}

impl LayerBuild<'_> {
    pub fn run(&self, descriptor: &LayerDescriptor) -> Result<BuildOutput> {
        let hw = self.capabilities.hw.as_ref();
        let module = hw
            .module(self.layer)
            .ok_or(HdrCoefError::UnknownLayer(self.layer))?;

        let mut queues = Queues {
            pending: Vec::new(),
            optional: Vec::new(),
            groups: GroupMap::default(),
        };

        let active = self.wcg_pass(descriptor, &mut queues);

        let kind = if descriptor.bypass || !module.supports_bpc(descriptor.bpc) {
            HdrKind::None
        } else {
            HdrKind::classify(descriptor).supported_by(&module.functions)
        };

        let tune = self
            .tables
            .tune
            .as_ref()
            .filter(|_| self.tune_mode)
            .and_then(|tune| tune.get(self.layer));

        let mut source_luminance = 0;

        if let Some(tune) = tune {
            debug!("layer {}: tune tables replace {kind:?} coefficients", self.layer);

            for blob in tune {
                self.queue(blob.clone(), &mut queues);
            }
        } else {
            let specifier = self.capabilities.specifiers.get(self.layer);

            source_luminance = match kind {
                HdrKind::None => 0,
                HdrKind::Hdr10 => self.static_pass(descriptor, specifier, &mut queues),
                HdrKind::Hdr10Plus => self.dynamic_pass(descriptor, specifier, &mut queues),
                HdrKind::Hlg => self.hlg_pass(specifier, &mut queues),
            };
        }

        let Queues {
            mut pending,
            optional,
            mut groups,
        } = queues;

        groups.flush_into(&mut pending);
        clean_duplicates(&mut pending);

        Ok(BuildOutput {
            entries: LayerEntries {
                mandatory: pending,
                optional,
            },
            kind,
            active,
            source_luminance,
        })
    }

    /// Wide gamut pass, returns whether the layer pipeline is enabled.
    fn wcg_pass(&self, descriptor: &LayerDescriptor, queues: &mut Queues) -> bool {
        let Some(module) = self.tables.wcg.get(self.layer) else {
            debug!("layer {}: no wide gamut module", self.layer);
            return false;
        };

        let input = descriptor.dataspace.resolved();
        let output = if descriptor.bypass {
            input
        } else {
            module
                .output_dataspace(input, self.target.dataspace.resolved(), self.target.capa)
        };

        debug!("layer {}: wide gamut {input} -> {output}", self.layer);

        match module.select(input, output) {
            WcgSelection::PassThrough(blobs) => {
                queues.optional.extend(blobs.into_iter().cloned());
                false
            }
            WcgSelection::Convert(blobs) => {
                for blob in blobs {
                    self.queue(blob.clone(), queues);
                }
                true
            }
        }
    }

    /// HDR10: static tone map, PQ gain or EOTF, then the luminance table.
    fn static_pass(
        &self,
        descriptor: &LayerDescriptor,
        specifier: Option<&ModuleSpecifier>,
        queues: &mut Queues,
    ) -> u32 {
        let source = if self.forced_source_luminance > 0 {
            self.forced_source_luminance
        } else {
            static_source_luminance(
                descriptor.mastering_luminance,
                descriptor.max_cll,
                self.target_luminance,
            )
        };

        debug!(
            "layer {}: HDR10 {source} -> {} nits",
            self.layer, self.target_luminance
        );

        if let Some(specifier) = specifier {
            if let Some(tm) = specifier.tone_map.as_ref().filter(|tm| tm.is_valid_nits(source)) {
                let mapper = self.estimator.static_curve(
                    Transfer::St2084,
                    source as f64,
                    self.target_luminance as f64,
                    tm.bits.tone_map_range(),
                );
                self.queue_curve(tm, &mapper, queues);
            }

            self.pq_and_eotf(specifier, Transfer::St2084, source, true, queues);
        }

        match self.tables.luminance.table(HdrFamily::Hdr10, self.layer) {
            Some(table) => {
                let nodes = table.select_static(source);
                if nodes.is_empty() {
                    self.lookup_miss(HdrFamily::Hdr10, source);
                }

                for node in nodes {
                    for blob in &node.blobs {
                        self.queue(blob.clone(), queues);
                    }
                }
            }
            None => self.lookup_miss(HdrFamily::Hdr10, source),
        }

        source
    }

    /// HDR10+: Bezier curve retargeted from the metadata, PQ gain or EOTF,
    /// then the luminance table.
    fn dynamic_pass(
        &self,
        descriptor: &LayerDescriptor,
        specifier: Option<&ModuleSpecifier>,
        queues: &mut Queues,
    ) -> u32 {
        let Some(meta) = &descriptor.dynamic_metadata else {
            return 0;
        };

        if let Err(e) = meta.validate() {
            warn!("layer {}: invalid dynamic metadata: {e}", self.layer);
            return 0;
        }

        // Always metadata driven, a forced source only applies to HDR10
        let stats = LuminanceStats::from(meta);
        let source = (stats.source_max_luminance() as u32).max(self.target_luminance);

        debug!(
            "layer {}: HDR10+ {source} -> {} nits",
            self.layer, self.target_luminance
        );

        if let Some(specifier) = specifier {
            if let Some(tm) = &specifier.tone_map {
                let tone_mapping = meta_to_meta(self.estimator, meta, self.target_luminance);
                let curve = BezierCurve::new(&tone_mapping, tm.bits.tone_map_range());

                self.queue_curve(tm, &curve, queues);
            }

            self.pq_and_eotf(specifier, Transfer::St2084, source, true, queues);
        }

        match self
            .tables
            .luminance
            .table(HdrFamily::Hdr10Plus, self.layer)
            .and_then(|table| table.select_dynamic(source))
        {
            Some(node) => {
                for blob in &node.blobs {
                    self.queue(blob.clone(), queues);
                }
            }
            None => self.lookup_miss(HdrFamily::Hdr10Plus, source),
        }

        source
    }

    /// HLG: fixed 1000 nit source, gamma tone map, HLG EOTF, then the
    /// module's reference table node.
    fn hlg_pass(&self, specifier: Option<&ModuleSpecifier>, queues: &mut Queues) -> u32 {
        let source = HLG_REFERENCE_NITS as u32;

        let Some(table) = self
            .tables
            .luminance
            .table(HdrFamily::Hlg, self.layer)
            .filter(|table| !table.is_empty())
        else {
            self.lookup_miss(HdrFamily::Hlg, source);
            return source;
        };

        if let Some(specifier) = specifier {
            if let Some(tm) = &specifier.tone_map {
                let mapper = self.estimator.static_curve(
                    Transfer::Hlg,
                    source as f64,
                    self.target_luminance as f64,
                    tm.bits.tone_map_range(),
                );
                self.queue_curve(tm, &mapper, queues);
            }

            self.pq_and_eotf(specifier, Transfer::Hlg, source, false, queues);
        }

        if let Some(node) = table.reference() {
            for blob in &node.blobs {
                self.queue(blob.clone(), queues);
            }
        }

        source
    }

    /// PQ gain stage, or the sampled EOTF when no gain stage is usable.
    fn pq_and_eotf(
        &self,
        specifier: &ModuleSpecifier,
        transfer: Transfer,
        source: u32,
        use_pq: bool,
        queues: &mut Queues,
    ) {
        let pq = specifier
            .pq
            .as_ref()
            .filter(|pq| use_pq && pq.is_valid_nits(source));

        if let Some(pq) = pq {
            self.queue_pq(pq, source, queues);
            return;
        }

        if let Some(eotf) = &specifier.eotf {
            if transfer == Transfer::Hlg || eotf.is_valid_nits(source) {
                let curve = EotfCurve::new(transfer, source as f64, eotf.bits.eotf_range());
                self.queue_curve(eotf, &curve, queues);
            }
        }
    }

    /// Samples and queues a curve stage, dropping the whole stage when
    /// sampling fails
    fn queue_curve(
        &self,
        specifier: &CurveSpecifier,
        curve: &dyn CurveEvaluator,
        queues: &mut Queues,
    ) {
        let hw = self.capabilities.hw.as_ref();
        let count = specifier.sample_count(hw, self.layer).unwrap_or(0);

        let points = match sample_curve(curve, count) {
            Ok(points) => points,
            Err(e) => {
                warn!("layer {}: skipping {}: {e}", self.layer, specifier.mod_en);
                return;
            }
        };
        let enable_nodes = hw.sub_module_nodes(self.layer, &specifier.mod_en).unwrap_or(1);

        self.queue_values(&specifier.mod_en, &enable_values(enable_nodes), queues);
        self.queue_values(&specifier.mod_x, &points.xs, queues);
        self.queue_values(&specifier.mod_y, &points.ys, queues);
    }

    fn queue_pq(&self, pq: &PqSpecifier, source: u32, queues: &mut Queues) {
        let hw = self.capabilities.hw.as_ref();
        let Some(module) = hw.module(self.layer) else {
            return;
        };

        let first_mask = |name: &str| {
            module
                .sub_module(name)
                .and_then(|sub| sub.masks.first().copied())
                .unwrap_or(0)
        };
        let nodes = |name: &str| module.sub_module(name).map_or(0, |sub| sub.num_nodes);

        let (coef, shift) = PqSpecifier::gain(source, first_mask(&pq.coef), first_mask(&pq.shift));

        self.queue_values(&pq.mod_en, &enable_values(nodes(&pq.mod_en)), queues);
        self.queue_values(&pq.pq_en, &enable_values(nodes(&pq.pq_en)), queues);
        self.queue_values(&pq.coef, &vec![coef; nodes(&pq.coef)], queues);
        self.queue_values(&pq.shift, &vec![shift; nodes(&pq.shift)], queues);
    }

    /// Packs and queues a sub-module, dropping it alone when packing fails
    fn queue_values(&self, name: &str, values: &[i64], queues: &mut Queues) {
        match self.capabilities.hw.pack(self.layer, name, values) {
            Ok(blob) => self.queue(blob, queues),
            Err(e) => warn!("layer {}: skipping {name}: {e}", self.layer),
        }
    }

    fn queue(&self, blob: CoefficientBlob, queues: &mut Queues) {
        if let Err(e) = blob.queue_or_group(&mut queues.pending, &mut queues.groups) {
            warn!("layer {}: {e}", self.layer);
        }
    }

    fn lookup_miss(&self, family: HdrFamily, luminance: u32) {
        let family = family.name();
        debug!(
            "layer {}: {}",
            self.layer,
            HdrCoefError::LookupMiss { family, luminance }
        );
    }
}
