use anyhow::{ensure, Context, Result};
use log::debug;
use roxmltree::Node;

use super::{
    attribute, child_elements, elements, layer_list, parse_csv, parse_document, parse_flag,
    parse_hex, parse_value, root_element, split_names, text,
};
use crate::hw::{
    CurveSpecifier, DpuHw, ExtraFunction, HdrHw, HwId, ModuleCapabilities, ModuleSpecifier,
    ModuleSpecifiers, PqSpecifier,
};
use crate::packer::SubModuleGeometry;

pub const HW_INFO_ROOT: &str = "HDR_HW_INFO";
pub const MODULE_SPECIFIERS_ROOT: &str = "HDR_MODULE_SPECIFIERS";

/// Parses a hardware description document into a DPU.
pub fn parse_dpu(document: &str) -> Result<DpuHw> {
    let doc = parse_document(document)?;
    let root = root_element(&doc, HW_INFO_ROOT)?;

    let name = root.attribute("name").unwrap_or(HwId::Dpu.name());
    ensure!(
        HwId::from_name(name) == Some(HwId::Dpu),
        "unsupported hardware `{name}`"
    );

    let mut hw = DpuHw::new(name);

    for module in elements(root, "module") {
        let mut capabilities = ModuleCapabilities {
            layers: layer_list(module, "id")?,
            ..Default::default()
        };

        for info in child_elements(module) {
            match info.tag_name().name() {
                "capabilities" => parse_capabilities(info, &mut capabilities)?,
                "submodule_info" => {
                    for sub in elements(info, "submodule") {
                        let geometry = parse_sub_module(sub)?;
                        capabilities
                            .sub_modules
                            .insert(geometry.name.clone(), geometry);
                    }
                }
                other => debug!("module: ignoring `{other}`"),
            }
        }

        hw.add_module(capabilities);
    }

    ensure!(!hw.modules().is_empty(), "no module declared");

    Ok(hw)
}

fn parse_capabilities(node: Node, capabilities: &mut ModuleCapabilities) -> Result<()> {
    for capa in child_elements(node) {
        let name = capa.tag_name().name();
        let functions = &mut capabilities.functions;

        match name {
            "wcg" => functions.wcg = parse_flag(text(capa))?,
            "hdr10" => functions.hdr10 = parse_flag(text(capa))?,
            "hdr10p" => functions.hdr10p = parse_flag(text(capa))?,
            "hlg" => functions.hlg = parse_flag(text(capa))?,
            "bpc8" => capabilities.bpc8 = parse_flag(text(capa))?,
            "bpc10" => capabilities.bpc10 = parse_flag(text(capa))?,
            _ if child_elements(capa).next().is_some() => {
                capabilities
                    .extra_functions
                    .insert(name.to_string(), parse_extra_function(capa));
            }
            _ => debug!("capabilities: ignoring `{name}`"),
        }
    }

    Ok(())
}

fn parse_extra_function(node: Node) -> ExtraFunction {
    let mut function = ExtraFunction::default();

    for child in child_elements(node) {
        let names = || split_names(text(child)).map(String::from).collect();

        match child.tag_name().name() {
            "module-en" => function.module_en = text(child).to_string(),
            "submodules-en" => function.sub_modules_en = names(),
            "submodules" => function.sub_modules = names(),
            _ => (),
        }
    }

    function
}

fn parse_sub_module(node: Node) -> Result<SubModuleGeometry> {
    let name = attribute(node, "name")?;

    let mut geometry = SubModuleGeometry {
        name: name.to_string(),
        group_id: node
            .attribute("group-id")
            .map(parse_value::<i32>)
            .transpose()?
            .unwrap_or(-1),
        ..Default::default()
    };

    for child in child_elements(node) {
        let value = text(child);

        match child.tag_name().name() {
            "num-nodes" => geometry.num_nodes = parse_value(value)?,
            "num-nodes-per-reg" => geometry.nodes_per_reg = parse_value(value)?,
            "last-node-align" => geometry.last_node_align = parse_flag(value)?,
            "bit-offsets" => geometry.bit_offsets = parse_csv(value)?,
            "masks" => {
                geometry.masks = split_names(value)
                    .map(parse_hex)
                    .collect::<Result<Vec<_>>>()?
            }
            "reg-offset" => geometry.reg_offset = parse_hex(value)?,
            "reg-num" => geometry.reg_num = parse_value(value)?,
            other => debug!("sub-module {name}: ignoring `{other}`"),
        }
    }

    geometry
        .validate()
        .with_context(|| format!("sub-module {name}"))?;

    Ok(geometry)
}

/// Parses the module specifiers document.
///
/// Specifiers are not checked against the hardware here, see
/// `ModuleSpecifiers::retain_usable`.
pub fn parse_specifiers(document: &str) -> Result<ModuleSpecifiers> {
    let doc = parse_document(document)?;
    let root = root_element(&doc, MODULE_SPECIFIERS_ROOT)?;

    let mut specifiers = ModuleSpecifiers::default();

    for node in elements(root, "hdr-module-specifier") {
        let mut specifier = ModuleSpecifier::default();

        for child in child_elements(node) {
            match child.tag_name().name() {
                "tonemap-module-specifier" => {
                    specifier.tone_map = Some(parse_curve_specifier(child)?)
                }
                "pq-module-specifier" => specifier.pq = Some(parse_pq_specifier(child)),
                "eotf-module-specifier" => specifier.eotf = Some(parse_curve_specifier(child)?),
                other => debug!("module specifier: ignoring `{other}`"),
            }
        }

        for layer in layer_list(node, "layer")? {
            specifiers.insert(layer, specifier.clone());
        }
    }

    Ok(specifiers)
}

fn parse_curve_specifier(node: Node) -> Result<CurveSpecifier> {
    let mut specifier = CurveSpecifier::default();

    for child in child_elements(node) {
        let value = text(child);

        match child.tag_name().name() {
            "mod-en" => specifier.mod_en = value.to_string(),
            "mod-x" => specifier.mod_x = value.to_string(),
            "mod-y" => specifier.mod_y = value.to_string(),
            "mod-x-bit" => specifier.bits.x_bits = parse_value(value)?,
            "mod-y-bit" => specifier.bits.y_bits = parse_value(value)?,
            "mod-minx-bit" => specifier.bits.min_x_bits = parse_value(value)?,
            _ => (),
        }
    }

    let bits = specifier.bits;
    ensure!(
        bits.x_bits < 32 && bits.y_bits < 32 && bits.min_x_bits <= bits.x_bits,
        "invalid curve bit widths {bits:?}"
    );

    Ok(specifier)
}

fn parse_pq_specifier(node: Node) -> PqSpecifier {
    let mut specifier = PqSpecifier::default();

    for child in child_elements(node) {
        let value = text(child).to_string();

        match child.tag_name().name() {
            "mod-en" => specifier.mod_en = value,
            "pq-en" => specifier.pq_en = value,
            "coef" => specifier.coef = value,
            "shift" => specifier.shift = value,
            _ => (),
        }
    }

    specifier
}
