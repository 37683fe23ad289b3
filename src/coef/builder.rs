use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use log::debug;
use serde::Deserialize;

use hdr_coef::builder::LayerSummary;
use hdr_coef::xml::ConfigDir;
use hdr_coef::{ConfigSource, LayerCoefficientBuilder, LayerDescriptor, TargetDescriptor};

use super::hdr10plus::Hdr10PlusJson;
use super::{initialize_progress_bar, input_from_either};
use crate::commands::BuildArgs;

/// One frame to compose: the display and the layers on it.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildJob {
    pub target: TargetDescriptor,

    /// Builder debug level, see `LayerCoefficientBuilder::set_log_level`
    #[serde(default)]
    pub log_level: Option<i32>,

    pub layers: Vec<JobLayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobLayer {
    pub index: usize,

    /// Takes the dynamic metadata from the HDR10+ JSON given on the command line
    #[serde(default)]
    pub hdr10plus: bool,

    #[serde(flatten)]
    pub descriptor: LayerDescriptor,
}

impl BuildJob {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed opening job {}", path.display()))?;
        let job: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid job {}", path.display()))?;
        job.validate()?;

        Ok(job)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self.layers.iter().map(|l| l.index).duplicates().next() {
            bail!("Layer {index} is listed more than once");
        }

        Ok(())
    }
}

impl JobLayer {
    /// Layer descriptor with the HDR10+ metadata of `frame` filled in
    pub fn resolve(
        &self,
        hdr10plus: Option<&Hdr10PlusJson>,
        frame: usize,
    ) -> Result<LayerDescriptor> {
        let mut descriptor = self.descriptor.clone();

        if self.hdr10plus {
            let Some(hdr10plus) = hdr10plus else {
                bail!(
                    "Layer {} requires HDR10+ metadata, see --hdr10plus-json",
                    self.index
                );
            };

            descriptor.dynamic_metadata = Some(hdr10plus.frame(frame)?.clone());
        }

        Ok(descriptor)
    }
}

pub struct CoefBuilder {
    builder: LayerCoefficientBuilder,
    output: PathBuf,
}

impl CoefBuilder {
    pub fn build(args: BuildArgs) -> Result<()> {
        let BuildArgs {
            input,
            input_pos,
            config,
            target_name,
            output,
            hdr10plus_json,
            frame,
            log_level,
        } = args;

        let input = input_from_either("build", input, input_pos)?;
        let job = BuildJob::from_path(&input)?;

        let hdr10plus = hdr10plus_json
            .as_deref()
            .map(Hdr10PlusJson::from_path)
            .transpose()?;

        let mut config = ConfigDir::new(config);
        if let Some(name) = &target_name {
            config = config.with_target_name(name);
        }

        // The builder degrades to no processing, fail early instead
        let capabilities = config.capabilities()?;
        let builder = LayerCoefficientBuilder::with_capabilities(capabilities, Arc::new(config));

        let output = output.unwrap_or(PathBuf::from("."));
        fs::create_dir_all(&output)?;

        let mut coef_builder = CoefBuilder { builder, output };

        if let Some(level) = log_level.or(job.log_level) {
            coef_builder.builder.set_log_level(level);
        }

        coef_builder.execute(&job, hdr10plus.as_ref(), frame)
    }

    fn execute(
        &mut self,
        job: &BuildJob,
        hdr10plus: Option<&Hdr10PlusJson>,
        frame: usize,
    ) -> Result<()> {
        self.builder.set_target_info(job.target.clone())?;
        self.builder.init_coefficient_buildup()?;

        println!("Building {} layers...", job.layers.len());
        let pb = initialize_progress_bar(job.layers.len() as u64)?;

        let mut summaries = Vec::with_capacity(job.layers.len());

        for layer in &job.layers {
            let descriptor = layer.resolve(hdr10plus, frame)?;

            let (summary, size) = self
                .build_layer(layer.index, &descriptor)
                .with_context(|| format!("Failed building layer {}", layer.index))?;
            summaries.push((layer.index, summary, size));

            pb.inc(1);
        }

        pb.finish_and_clear();

        for (index, summary, size) in summaries {
            println!(
                "Layer {index}: {:?}, {} mandatory and {} optional entries, {size} bytes",
                summary.kind, summary.mandatory_count, summary.optional_count,
            );
        }

        println!("Done.");

        Ok(())
    }

    fn build_layer(
        &mut self,
        index: usize,
        descriptor: &LayerDescriptor,
    ) -> Result<(LayerSummary, usize)> {
        self.builder.set_layer_info(index, descriptor)?;

        let data = self.builder.hdr_coef_data(index)?;
        let summary = self
            .builder
            .layer_summary(index)
            .cloned()
            .unwrap_or_default();

        let path = self.output.join(format!("layer_{index}.bin"));
        fs::write(&path, &data).with_context(|| format!("Failed writing {}", path.display()))?;
        debug!("layer {index}: {} bytes written to {}", data.len(), path.display());

        Ok((summary, data.len()))
    }
}
