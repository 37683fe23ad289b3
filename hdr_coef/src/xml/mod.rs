use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, ensure, Context, Result};
use log::{debug, warn};
use roxmltree::{Document, Node};

use crate::blob::CoefficientBlob;
use crate::hw::HdrHw;

pub mod dir;
pub mod hw;
pub mod tables;


pub use dir::ConfigDir;

pub(crate) fn parse_document(document: &str) -> Result<Document<'_>> {
    Document::parse(document).context("malformed XML document")
}

/// Root element, checked against the expected document type
pub(crate) fn root_element<'a, 'input>(
    doc: &'a Document<'input>,
    name: &str,
) -> Result<Node<'a, 'input>> {
    let root = doc.root_element();

    ensure!(
        root.has_tag_name(name),
        "document of the wrong type, root node `{}` != `{name}`",
        root.tag_name().name()
    );

    Ok(root)
}

pub(crate) fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.has_tag_name(tag))
}

pub(crate) fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(Node::is_element)
}

pub(crate) fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or_default().trim()
}

pub(crate) fn attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        anyhow!(
            "missing `{name}` attribute on `{}`",
            node.tag_name().name()
        )
    })
}

pub(crate) fn parse_value<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow!("invalid value `{}`: {e}", value.trim()))
}

/// Comma separated values, whitespace and empty items ignored
pub(crate) fn parse_csv<T>(value: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    split_names(value).map(parse_value).collect()
}

pub(crate) fn split_names(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_hex(value: &str) -> Result<u32> {
    let value = value.trim();
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    u32::from_str_radix(digits, 16).with_context(|| format!("invalid hex value `{value}`"))
}

/// Integer flag, any non zero value is set
pub(crate) fn parse_flag(value: &str) -> Result<bool> {
    Ok(parse_value::<i32>(value)? != 0)
}

/// Layer list of a module attribute, `id="0,1"` or `layer="2"`
pub(crate) fn layer_list(node: Node, name: &str) -> Result<Vec<usize>> {
    let layers: Vec<usize> = parse_csv(attribute(node, name)?)?;
    ensure!(
        !layers.is_empty(),
        "empty `{name}` on `{}`",
        node.tag_name().name()
    );

    Ok(layers)
}

/// Sub-module value lists under `node`, packed for the layer's module in
/// document order.
///
/// Sub-modules the module lacks are ignored, values that fail to pack are
/// dropped with a warning.
pub(crate) fn packed_sub_modules(
    node: Node,
    hw: &dyn HdrHw,
    layer: usize,
) -> Result<Vec<(String, CoefficientBlob)>> {
    let mut packed = Vec::new();

    for sub in child_elements(node) {
        let name = sub.tag_name().name();

        if !hw.has_sub_module(layer, name) {
            debug!("layer {layer}: no sub-module {name}, ignored");
            continue;
        }

        let values: Vec<i64> =
            parse_csv(text(sub)).with_context(|| format!("values of sub-module {name}"))?;

        match hw.pack(layer, name, &values) {
            Ok(blob) => packed.push((name.to_string(), blob)),
            Err(e) => warn!("layer {layer}: skipping {name}: {e}"),
        }
    }

    Ok(packed)
}
