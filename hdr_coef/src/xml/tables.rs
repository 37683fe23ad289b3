use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::debug;
use roxmltree::Node;

use super::{
    attribute, child_elements, elements, layer_list, packed_sub_modules, parse_document,
    parse_value, root_element, text,
};
use crate::colorimetry::{Dataspace, HdrCapa, Standard, Transfer};
use crate::hw::HdrHw;
use crate::tables::{
    CustomOutput, HdrFamily, HdrIndex, IndexNode, LuminanceTable, PackedSet, TableNode,
    TuneTables, WcgModule, WcgTables,
};

pub const WCG_ROOT: &str = "WCG";
pub const TUNE_ROOT: &str = "TUNE_LUT";

/// Document names and tags of a luminance table family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyDocuments {
    /// File stem of the index document
    pub index_stem: &'static str,
    pub index_root: &'static str,
    pub table_root: &'static str,
    pub node_tag: &'static str,
}

impl FamilyDocuments {
    pub fn of(family: HdrFamily) -> Self {
        match family {
            HdrFamily::Hdr10 => Self {
                index_stem: "hdr10Info",
                index_root: "HDR10_INFO",
                table_root: "HDR10_LUT",
                node_tag: "hdr10-node",
            },
            HdrFamily::Hdr10Plus => Self {
                index_stem: "hdr10pInfo",
                index_root: "HDR10P_INFO",
                table_root: "HDR10P_LUT",
                node_tag: "hdr10p-node",
            },
            HdrFamily::Hlg => Self {
                index_stem: "hlgInfo",
                index_root: "HLG_INFO",
                table_root: "HLG_LUT",
                node_tag: "hlg-node",
            },
        }
    }
}

fn packed_set(node: Node, hw: &dyn HdrHw, layer: usize) -> Result<PackedSet> {
    Ok(packed_sub_modules(node, hw, layer)?.into_iter().collect())
}

/// Parses the wide gamut document, packing every table for its layer.
pub fn parse_wcg(document: &str, hw: &dyn HdrHw) -> Result<WcgTables> {
    let doc = parse_document(document)?;
    let root = root_element(&doc, WCG_ROOT)?;

    let mut tables = WcgTables::default();

    for node in elements(root, "wcg-module") {
        for layer in layer_list(node, "layer")? {
            let module =
                parse_wcg_module(node, hw, layer).with_context(|| format!("wcg layer {layer}"))?;
            tables.insert(layer, module);
        }
    }

    Ok(tables)
}

fn parse_wcg_module(node: Node, hw: &dyn HdrHw, layer: usize) -> Result<WcgModule> {
    let mut module = WcgModule::default();

    for info in child_elements(node) {
        match info.tag_name().name() {
            "inout-dataspace" => {
                for option in child_elements(info) {
                    match option.tag_name().name() {
                        "eq" => module.eq = packed_set(option, hw, layer)?,
                        "neq" => module.neq = packed_set(option, hw, layer)?,
                        _ => (),
                    }
                }
            }
            "inout-transfer" => {
                for side in child_elements(info) {
                    let table = match side.tag_name().name() {
                        "in" => &mut module.eotf,
                        "out" => &mut module.oetf,
                        _ => continue,
                    };

                    for transfer in elements(side, "transfer") {
                        let function: Transfer = parse_value(attribute(transfer, "function")?)?;
                        table.insert(function, packed_set(transfer, hw, layer)?);
                    }
                }
            }
            "inout-gamut" => {
                for input in elements(info, "in") {
                    let in_gamut: Standard = parse_value(attribute(input, "gamut")?)?;

                    for output in elements(input, "out") {
                        let out_gamut: Standard = parse_value(attribute(output, "gamut")?)?;

                        module
                            .gamut
                            .entry(in_gamut)
                            .or_default()
                            .insert(out_gamut, packed_set(output, hw, layer)?);
                    }
                }
            }
            "inout-custom" => {
                for input in elements(info, "in") {
                    let dataspace = parse_dataspace(input)?;

                    if let Some(output) = elements(input, "out").next() {
                        let custom = CustomOutput {
                            dataspace: parse_dataspace(output)?,
                            capa: parse_value(attribute(output, "capa")?)?,
                        };
                        module.custom.insert(dataspace, custom);
                    }
                }
            }
            other => debug!("wcg module: ignoring `{other}`"),
        }
    }

    Ok(module)
}

fn parse_dataspace(node: Node) -> Result<Dataspace> {
    Ok(Dataspace::new(
        parse_value(attribute(node, "gamut")?)?,
        parse_value(attribute(node, "transfer")?)?,
    ))
}

/// Parses a family index document listing table documents per target.
pub fn parse_index(document: &str, family: HdrFamily) -> Result<HdrIndex> {
    let doc = parse_document(document)?;
    let root = root_element(&doc, FamilyDocuments::of(family).index_root)?;

    let mut index = HdrIndex::default();

    for node in elements(root, "hdr-node") {
        let mut entry = IndexNode::default();

        for child in child_elements(node) {
            let value = text(child);

            match child.tag_name().name() {
                "capa" => entry.capa = parse_value::<HdrCapa>(value)?,
                "gamut" => entry.gamut = parse_value::<Standard>(value)?,
                "transfer-function" => entry.transfer = parse_value::<Transfer>(value)?,
                "filename" => entry.filename = value.to_string(),
                _ => (),
            }
        }

        if entry.filename.is_empty() {
            debug!("{family} index: node without filename ignored");
            continue;
        }

        index.nodes.push(entry);
    }

    Ok(index)
}

/// Parses a family table document into per-layer tables, sorted by threshold.
pub fn parse_luminance_tables(
    document: &str,
    family: HdrFamily,
    hw: &dyn HdrHw,
) -> Result<BTreeMap<usize, LuminanceTable>> {
    let documents = FamilyDocuments::of(family);

    let doc = parse_document(document)?;
    let root = root_element(&doc, documents.table_root)?;

    let mut tables = BTreeMap::new();

    for module in elements(root, "hdr-module") {
        for layer in layer_list(module, "layer")? {
            let nodes = elements(module, documents.node_tag)
                .map(|node| {
                    Ok(TableNode {
                        max_luminance: parse_value(attribute(node, "max-luminance")?)?,
                        blobs: packed_sub_modules(node, hw, layer)?
                            .into_iter()
                            .map(|(_, blob)| blob)
                            .collect(),
                    })
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("{family} layer {layer}"))?;

            tables.insert(layer, LuminanceTable::new(nodes));
        }
    }

    Ok(tables)
}

/// Parses the tune document, the override coefficients of every layer.
pub fn parse_tune(document: &str, hw: &dyn HdrHw) -> Result<TuneTables> {
    let doc = parse_document(document)?;
    let root = root_element(&doc, TUNE_ROOT)?;

    let mut tune = TuneTables::default();

    for module in elements(root, "tune-module") {
        for layer in layer_list(module, "layer")? {
            for node in elements(module, "tune-node") {
                let blobs = packed_sub_modules(node, hw, layer)?
                    .into_iter()
                    .map(|(_, blob)| blob)
                    .collect();

                tune.insert(layer, blobs);
            }
        }
    }

    Ok(tune)
}
