use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::hw::parse_specifiers;
use super::tables::{parse_index, parse_luminance_tables, parse_tune, parse_wcg, FamilyDocuments};
use crate::builder::TargetDescriptor;
use crate::config::{Capabilities, ConfigSource};
use crate::error::{HdrCoefError, Result};
use crate::hw::{DpuHw, HdrHw, ModuleSpecifiers};
use crate::tables::{HdrFamily, LuminanceTables, TuneTables, WcgTables};

pub const HW_INFO: &str = "hdrHwInfo";
pub const MODULE_SPECIFIERS: &str = "hdrModuleSpecifiers";
pub const WCG_INFO: &str = "wcgInfo";
pub const TUNE_INFO: &str = "tuneInfo";

/// Configuration documents read from a directory.
///
/// A document `<stem>_<target name>.xml` takes precedence over `<stem>.xml`
/// when a target name is set.
#[derive(Debug, Clone)]
pub struct ConfigDir {
    root: PathBuf,
    target_name: Option<String>,
}

impl ConfigDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            target_name: None,
        }
    }

    pub fn with_target_name(mut self, name: &str) -> Self {
        self.target_name = Some(name).filter(|n| !n.is_empty()).map(String::from);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document to load for `stem`, if any exists
    pub fn document_path(&self, stem: &str) -> Option<PathBuf> {
        let targeted = self
            .target_name
            .as_ref()
            .map(|name| self.root.join(format!("{stem}_{name}.xml")));
        let default = self.root.join(format!("{stem}.xml"));

        targeted
            .into_iter()
            .chain(std::iter::once(default))
            .find(|path| path.is_file())
    }

    fn read(&self, stem: &str) -> Result<Option<(PathBuf, String)>> {
        let Some(path) = self.document_path(stem) else {
            debug!("no {stem} document in {}", self.root.display());
            return Ok(None);
        };

        read_document(&path).map(|document| Some((path, document)))
    }
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| load_error(path, e.into()))
}

fn load_error(path: &Path, e: anyhow::Error) -> HdrCoefError {
    HdrCoefError::ConfigLoad {
        path: path.display().to_string(),
        reason: format!("{e:#}"),
    }
}

impl ConfigSource for ConfigDir {
    /// The hardware document is required, missing specifiers disable the
    /// tone curves and a missing wide gamut document the conversions.
    fn capabilities(&self) -> Result<Capabilities> {
        let (path, document) = self.read(HW_INFO)?.ok_or_else(|| HdrCoefError::ConfigLoad {
            path: self.root.join(format!("{HW_INFO}.xml")).display().to_string(),
            reason: String::from("document not found"),
        })?;

        let mut hw = DpuHw::default();
        hw.parse(&document).map_err(|e| load_error(&path, e))?;

        let specifiers = match self.read(MODULE_SPECIFIERS)? {
            Some((path, document)) => {
                parse_specifiers(&document).map_err(|e| load_error(&path, e))?
            }
            None => {
                warn!("no module specifiers, tone curves disabled");
                ModuleSpecifiers::default()
            }
        };

        let wcg = match self.read(WCG_INFO)? {
            Some((path, document)) => parse_wcg(&document, &hw).map_err(|e| load_error(&path, e))?,
            None => WcgTables::default(),
        };

        Ok(Capabilities::new(hw, specifiers, wcg))
    }

    fn luminance_tables(
        &self,
        capabilities: &Capabilities,
        target: &TargetDescriptor,
    ) -> Result<LuminanceTables> {
        let mut tables = LuminanceTables::default();

        for &family in HdrFamily::ALL {
            let documents = FamilyDocuments::of(family);

            let Some((index_path, document)) = self.read(documents.index_stem)? else {
                continue;
            };

            let index = parse_index(&document, family).map_err(|e| load_error(&index_path, e))?;

            let dataspace = target.dataspace;
            let Some(filename) = index.select(target.capa, dataspace.standard, dataspace.transfer)
            else {
                debug!("{family}: no table for {:?} {dataspace}", target.capa);
                continue;
            };

            let path = self.root.join(filename);
            if !path.is_file() {
                warn!("{family}: table document {} not found", path.display());
                continue;
            }

            let document = read_document(&path)?;
            let layers = parse_luminance_tables(&document, family, capabilities.hw.as_ref())
                .map_err(|e| load_error(&path, e))?;

            for (layer, table) in layers {
                tables.insert(family, layer, table);
            }
        }

        Ok(tables)
    }

    fn tune_tables(
        &self,
        capabilities: &Capabilities,
        _: &TargetDescriptor,
    ) -> Result<Option<TuneTables>> {
        match self.read(TUNE_INFO)? {
            Some((path, document)) => parse_tune(&document, capabilities.hw.as_ref())
                .map(Some)
                .map_err(|e| load_error(&path, e)),
            None => Ok(None),
        }
    }
}
