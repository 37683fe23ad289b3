use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::blob::CoefficientBlob;

pub mod index;
pub mod wcg;


pub use index::{HdrIndex, IndexNode};
pub use wcg::{CustomOutput, WcgModule, WcgSelection, WcgTables};

/// Threshold of a node matching any luminance
pub const UNBOUNDED_LUMINANCE: i32 = -1;

/// Packed sub-modules of one table entry, keyed by sub-module name.
pub type PackedSet = BTreeMap<String, CoefficientBlob>;

/// Static HDR families with luminance indexed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum HdrFamily {
    Hdr10,
    Hdr10Plus,
    Hlg,
}

impl HdrFamily {
    pub const ALL: &'static [HdrFamily] = &[HdrFamily::Hdr10, HdrFamily::Hdr10Plus, HdrFamily::Hlg];

    pub fn name(self) -> &'static str {
        match self {
            HdrFamily::Hdr10 => "HDR10",
            HdrFamily::Hdr10Plus => "HDR10+",
            HdrFamily::Hlg => "HLG",
        }
    }
}

impl fmt::Display for HdrFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coefficients programmed up to a source luminance.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TableNode {
    pub max_luminance: i32,
    pub blobs: Vec<CoefficientBlob>,
}

impl TableNode {
    pub fn is_unbounded(&self) -> bool {
        self.max_luminance == UNBOUNDED_LUMINANCE
    }
}

/// Nodes of one module, ascending by threshold.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LuminanceTable {
    nodes: Vec<TableNode>,
}

impl LuminanceTable {
    pub fn new(mut nodes: Vec<TableNode>) -> Self {
        nodes.sort_by_key(|node| node.max_luminance);

        Self { nodes }
    }

    pub fn nodes(&self) -> &[TableNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Static HDR10 selection: every unbounded node, then the first
    /// bounded node whose threshold is at least `source`.
    pub fn select_static(&self, source: u32) -> Vec<&TableNode> {
        let mut selected: Vec<&TableNode> = Vec::new();

        for node in &self.nodes {
            if node.is_unbounded() {
                selected.push(node);
            } else if node.max_luminance >= 0 && node.max_luminance as u32 >= source {
                selected.push(node);
                break;
            }
        }

        selected
    }

    /// HDR10+ selection: first bounded node whose threshold is at least `key`.
    pub fn select_dynamic(&self, key: u32) -> Option<&TableNode> {
        self.nodes
            .iter()
            .filter(|node| node.max_luminance >= 0)
            .find(|node| node.max_luminance as u32 >= key)
    }

    /// HLG selection: a single reference curve per module, node 0.
    pub fn reference(&self) -> Option<&TableNode> {
        self.nodes.first()
    }
}

/// Luminance indexed tables of the three static HDR families, per layer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LuminanceTables {
    families: BTreeMap<HdrFamily, BTreeMap<usize, LuminanceTable>>,
}

impl LuminanceTables {
    pub fn insert(&mut self, family: HdrFamily, layer: usize, table: LuminanceTable) {
        self.families.entry(family).or_default().insert(layer, table);
    }

    pub fn table(&self, family: HdrFamily, layer: usize) -> Option<&LuminanceTable> {
        self.families.get(&family)?.get(&layer)
    }

    /// Drops every table of a family
    pub fn clear_family(&mut self, family: HdrFamily) {
        self.families.remove(&family);
    }

    pub fn is_empty(&self) -> bool {
        self.families.values().all(BTreeMap::is_empty)
    }
}

/// Override tables replacing the computed HDR coefficients, per layer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TuneTables {
    layers: BTreeMap<usize, Vec<CoefficientBlob>>,
}

impl TuneTables {
    pub fn insert(&mut self, layer: usize, blobs: Vec<CoefficientBlob>) {
        self.layers.entry(layer).or_default().extend(blobs);
    }

    pub fn get(&self, layer: usize) -> Option<&[CoefficientBlob]> {
        self.layers.get(&layer).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Every table the builder reads.
///
/// The colorimetry tables are target independent and shared, the luminance
/// and tune tables are reloaded whenever the target changes.
#[derive(Debug, Default, Clone)]
pub struct LookupTables {
    pub wcg: Arc<WcgTables>,
    pub luminance: LuminanceTables,
    pub tune: Option<TuneTables>,
}
