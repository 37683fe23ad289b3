//! In-memory hardware and tables shared by the unit tests.

use std::collections::BTreeMap;

use crate::blob::CoefficientBlob;
use crate::colorimetry::{Standard, Transfer};
use crate::config::{Capabilities, StaticConfig};
use crate::curve::CurveBits;
use crate::hw::{
    CurveSpecifier, DpuHw, HdrFunctions, HdrHw, ModuleCapabilities, ModuleSpecifier,
    ModuleSpecifiers, PqSpecifier,
};
use crate::packer::SubModuleGeometry;
use crate::tables::{
    HdrFamily, LuminanceTable, LuminanceTables, PackedSet, TableNode, WcgModule, WcgTables,
};

/// Single bit flag at `bit` of the register at `reg_offset`
pub fn flag(name: &str, bit: u32, reg_offset: u32, group_id: i32) -> SubModuleGeometry {
    SubModuleGeometry {
        name: name.to_string(),
        num_nodes: 1,
        nodes_per_reg: 1,
        last_node_align: false,
        bit_offsets: vec![bit],
        masks: vec![1],
        reg_offset,
        reg_num: 1,
        group_id,
    }
}

/// `num_nodes` values of `width` bits, `per_reg` values per register
pub fn lut(name: &str, num_nodes: usize, per_reg: usize, width: u32, reg_offset: u32) -> SubModuleGeometry {
    SubModuleGeometry {
        name: name.to_string(),
        num_nodes,
        nodes_per_reg: per_reg,
        last_node_align: false,
        bit_offsets: (0..per_reg as u32).map(|i| i * width).collect(),
        masks: vec![(1 << width) - 1; per_reg],
        reg_offset,
        reg_num: num_nodes.div_ceil(per_reg) as u32,
        group_id: -1,
    }
}

fn full_module() -> ModuleCapabilities {
    let sub_modules = [
        flag("con_en", 0, 0x00, 0),
        flag("wcg_en", 1, 0x00, 0),
        flag("tm_en", 2, 0x00, 0),
        flag("dg_en", 3, 0x00, 0),
        flag("pq_en", 4, 0x00, 0),
        flag("pq_on", 0, 0x04, -1),
        lut("pq_coef", 1, 1, 16, 0x08),
        lut("pq_shift", 1, 1, 5, 0x0C),
        lut("eotf_lut", 4, 2, 16, 0x10),
        lut("oetf_lut", 4, 2, 16, 0x18),
        lut("gm_coef", 9, 2, 16, 0x20),
        lut("tm_x", 8, 2, 16, 0x40),
        lut("tm_y", 8, 2, 16, 0x50),
        lut("dg_x", 8, 2, 16, 0x60),
        lut("dg_y", 8, 2, 16, 0x70),
        lut("hdr_lut", 2, 1, 16, 0x80),
        lut("hdr_ctrl", 1, 1, 16, 0x90),
    ];

    ModuleCapabilities {
        layers: vec![0, 1],
        functions: HdrFunctions {
            wcg: true,
            hdr10: true,
            hdr10p: true,
            hlg: true,
        },
        bpc8: true,
        bpc10: true,
        extra_functions: BTreeMap::new(),
        sub_modules: sub_modules
            .into_iter()
            .map(|sub| (sub.name.clone(), sub))
            .collect(),
    }
}

fn wcg_only_module() -> ModuleCapabilities {
    ModuleCapabilities {
        layers: vec![2],
        functions: HdrFunctions {
            wcg: true,
            ..Default::default()
        },
        bpc8: true,
        bpc10: false,
        extra_functions: BTreeMap::new(),
        sub_modules: [flag("con_en", 0, 0x00, 0), flag("wcg_en", 1, 0x00, 0)]
            .into_iter()
            .map(|sub| (sub.name.clone(), sub))
            .collect(),
    }
}

/// Layers 0 and 1 share a module running every function, layer 2 only
/// has the wide gamut enables.
pub fn dpu() -> DpuHw {
    let mut hw = DpuHw::new("DPU");
    hw.add_module(full_module());
    hw.add_module(wcg_only_module());

    hw
}

pub fn curve_bits() -> CurveBits {
    CurveBits {
        x_bits: 12,
        y_bits: 12,
        min_x_bits: 4,
    }
}

pub fn specifier() -> ModuleSpecifier {
    ModuleSpecifier {
        tone_map: Some(CurveSpecifier {
            mod_en: String::from("tm_en"),
            mod_x: String::from("tm_x"),
            mod_y: String::from("tm_y"),
            bits: curve_bits(),
        }),
        pq: Some(PqSpecifier {
            mod_en: String::from("pq_en"),
            pq_en: String::from("pq_on"),
            coef: String::from("pq_coef"),
            shift: String::from("pq_shift"),
        }),
        eotf: Some(CurveSpecifier {
            mod_en: String::from("dg_en"),
            mod_x: String::from("dg_x"),
            mod_y: String::from("dg_y"),
            bits: curve_bits(),
        }),
    }
}

/// Same specifier on every layer, layer 2 cannot use it
pub fn specifiers() -> ModuleSpecifiers {
    let mut specifiers = ModuleSpecifiers::default();
    for layer in 0..3 {
        specifiers.insert(layer, specifier());
    }

    specifiers
}

pub fn packed(hw: &dyn HdrHw, layer: usize, name: &str, values: &[i64]) -> CoefficientBlob {
    hw.pack(layer, name, values).unwrap()
}

fn set(hw: &dyn HdrHw, layer: usize, entries: &[(&str, &[i64])]) -> PackedSet {
    entries
        .iter()
        .map(|(name, values)| (name.to_string(), packed(hw, layer, name, values)))
        .collect()
}

pub fn wcg_module(hw: &dyn HdrHw, layer: usize) -> WcgModule {
    let mut module = WcgModule {
        eq: set(hw, layer, &[("con_en", &[0]), ("wcg_en", &[0])]),
        neq: set(hw, layer, &[("con_en", &[1]), ("wcg_en", &[1])]),
        ..Default::default()
    };

    if layer == 2 {
        return module;
    }

    module.eotf.insert(Transfer::St2084, set(hw, layer, &[("eotf_lut", &[1, 2, 3, 4])]));
    module.eotf.insert(Transfer::Srgb, set(hw, layer, &[("eotf_lut", &[5, 6, 7, 8])]));
    module.eotf.insert(Transfer::Hlg, set(hw, layer, &[("eotf_lut", &[9, 10, 11, 12])]));
    module.oetf.insert(Transfer::Srgb, set(hw, layer, &[("oetf_lut", &[8, 7, 6, 5])]));
    module.oetf.insert(Transfer::St2084, set(hw, layer, &[("oetf_lut", &[4, 3, 2, 1])]));

    let matrix: &[i64] = &[1, 2, 3, 4, 5, 6, 7, 8, 9];
    module
        .gamut
        .entry(Standard::Bt2020)
        .or_default()
        .insert(Standard::Bt709, set(hw, layer, &[("gm_coef", matrix)]));
    module
        .gamut
        .entry(Standard::DciP3)
        .or_default()
        .insert(Standard::Bt709, set(hw, layer, &[("gm_coef", matrix)]));

    module
}

pub fn wcg_tables(hw: &dyn HdrHw) -> WcgTables {
    let mut tables = WcgTables::default();
    for layer in hw.layers() {
        tables.insert(layer, wcg_module(hw, layer));
    }

    tables
}

/// Bounded nodes program `hdr_lut` with `[marker, threshold]`, unbounded
/// ones program `hdr_ctrl` with `[marker]`.
pub fn node(hw: &dyn HdrHw, layer: usize, max_luminance: i32, marker: i64) -> TableNode {
    let blob = if max_luminance < 0 {
        packed(hw, layer, "hdr_ctrl", &[marker])
    } else {
        packed(hw, layer, "hdr_lut", &[marker, i64::from(max_luminance)])
    };

    TableNode {
        max_luminance,
        blobs: vec![blob],
    }
}

/// HDR10 `[500, 1000, 2000, -1]`, HDR10+ `[1000, 4000]`, HLG `[1000]`
pub fn luminance_tables(hw: &dyn HdrHw) -> LuminanceTables {
    let mut tables = LuminanceTables::default();

    for layer in [0, 1] {
        tables.insert(
            HdrFamily::Hdr10,
            layer,
            LuminanceTable::new(vec![
                node(hw, layer, 500, 1),
                node(hw, layer, 1000, 2),
                node(hw, layer, 2000, 3),
                node(hw, layer, -1, 4),
            ]),
        );
        tables.insert(
            HdrFamily::Hdr10Plus,
            layer,
            LuminanceTable::new(vec![node(hw, layer, 1000, 5), node(hw, layer, 4000, 6)]),
        );
        tables.insert(
            HdrFamily::Hlg,
            layer,
            LuminanceTable::new(vec![node(hw, layer, 1000, 7)]),
        );
    }

    tables
}

pub fn capabilities() -> Capabilities {
    let hw = dpu();
    let wcg = wcg_tables(&hw);

    Capabilities::new(hw, specifiers(), wcg)
}

pub fn static_config() -> StaticConfig {
    let capabilities = capabilities();
    let luminance = luminance_tables(capabilities.hw.as_ref());

    StaticConfig {
        capabilities,
        luminance,
        tune: None,
    }
}
