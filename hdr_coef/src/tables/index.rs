use crate::colorimetry::{HdrCapa, Standard, Transfer};

/// Table document used by targets of a display class and colorimetry.
///
/// Unspecified fields match any target.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexNode {
    pub capa: HdrCapa,
    pub gamut: Standard,
    pub transfer: Transfer,
    pub filename: String,
}

impl IndexNode {
    pub fn matches(&self, capa: HdrCapa, gamut: Standard, transfer: Transfer) -> bool {
        (self.capa == HdrCapa::Unspecified || self.capa == capa)
            && (self.gamut == Standard::Unspecified || self.gamut == gamut)
            && (self.transfer == Transfer::Unspecified || self.transfer == transfer)
    }
}

/// Ordered index of a family's table documents.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HdrIndex {
    pub nodes: Vec<IndexNode>,
}

impl HdrIndex {
    /// File name of the first node matching the target
    pub fn select(&self, capa: HdrCapa, gamut: Standard, transfer: Transfer) -> Option<&str> {
        self.nodes
            .iter()
            .find(|node| node.matches(capa, gamut, transfer))
            .map(|node| node.filename.as_str())
    }
}
