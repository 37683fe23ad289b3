pub mod builder;
pub mod curve;
pub mod hdr10plus;
pub mod info;
pub mod plotter;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Result};
use indicatif::{ProgressBar, ProgressStyle};

use hdr_coef::colorimetry::Transfer;
use hdr_coef::curve::{
    sample_curve, CurveBits, CurveEvaluator, CurvePoints, EotfCurve, StaticToneMapper,
};
use hdr_coef::utils::{is_valid_nits, HLG_REFERENCE_NITS};
use hdr_coef::xml::ConfigDir;
use hdr_coef::ConfigSource;

use crate::commands::{CurveArgs, CurveKind, CurveTransfer};

pub fn input_from_either(cmd: &str, in1: Option<PathBuf>, in2: Option<PathBuf>) -> Result<PathBuf> {
    match in1 {
        Some(in1) => Ok(in1),
        None => match in2 {
            Some(in2) => Ok(in2),
            None => bail!("No input file provided. See `hdr_coef_tool {} --help`", cmd),
        },
    }
}

pub fn initialize_progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:60.cyan} {pos}/{len} layers")?,
    );

    Ok(pb)
}

/// A curve as the builder would program it, resolved from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSetup {
    pub kind: CurveKind,
    pub transfer: Transfer,
    pub source: f64,
    pub target: f64,
    pub bits: CurveBits,
    pub points: usize,
}

impl CurveSetup {
    pub fn from_args(args: &CurveArgs) -> Result<Self> {
        let transfer = match args.transfer {
            CurveTransfer::Pq => Transfer::St2084,
            CurveTransfer::Hlg => Transfer::Hlg,
        };

        // HLG is always mastered on the reference display
        let source = if transfer == Transfer::Hlg {
            HLG_REFERENCE_NITS as u32
        } else {
            args.source
        };

        ensure!(is_valid_nits(source), "Invalid source luminance {source}");
        ensure!(is_valid_nits(args.target), "Invalid target luminance {}", args.target);

        let (bits, points) = match &args.config {
            Some(dir) => Self::configured_bits(dir, args.layer, args.kind)?,
            None => (
                CurveBits {
                    x_bits: args.x_bits,
                    y_bits: args.y_bits,
                    min_x_bits: args.min_x_bits,
                },
                args.points,
            ),
        };

        ensure!(
            bits.x_bits < 32 && bits.y_bits < 32 && bits.min_x_bits <= bits.x_bits,
            "Invalid curve bit widths {bits:?}"
        );

        Ok(Self {
            kind: args.kind,
            transfer,
            source: source as f64,
            target: args.target as f64,
            bits,
            points,
        })
    }

    fn configured_bits(dir: &Path, layer: usize, kind: CurveKind) -> Result<(CurveBits, usize)> {
        let capabilities = ConfigDir::new(dir).capabilities()?;
        let hw = capabilities.hw.as_ref();

        let specifier = capabilities.specifiers.get(layer).and_then(|s| match kind {
            CurveKind::ToneMap => s.tone_map.as_ref(),
            CurveKind::Eotf => s.eotf.as_ref(),
        });

        let Some(specifier) = specifier else {
            bail!("Layer {layer} has no {kind:?} module specifier");
        };

        let Some(points) = specifier.sample_count(hw, layer) else {
            bail!("Layer {layer} has no sub-module {}", specifier.mod_x);
        };

        Ok((specifier.bits, points))
    }

    pub fn evaluator(&self) -> Box<dyn CurveEvaluator> {
        match self.kind {
            CurveKind::ToneMap => Box::new(self.tone_mapper()),
            CurveKind::Eotf => Box::new(self.eotf()),
        }
    }

    pub fn sample(&self) -> Result<CurvePoints> {
        Ok(sample_curve(self.evaluator().as_ref(), self.points)?)
    }

    /// Normalized output for a normalized input in `[0, 1]`
    pub fn normalized(&self, t: f64) -> f64 {
        match self.kind {
            CurveKind::ToneMap => self.tone_mapper().map_nits(t * self.source) / self.target,
            CurveKind::Eotf => self.eotf().evaluate(t),
        }
    }

    /// Sampled breakpoints mapped back onto the normalized domain of `normalized`
    pub fn normalized_breakpoints(&self, points: &CurvePoints) -> Vec<(f64, f64)> {
        let range = match self.kind {
            CurveKind::ToneMap => self.bits.tone_map_range(),
            CurveKind::Eotf => self.bits.eotf_range(),
        };

        points
            .absolute()
            .into_iter()
            .map(|(x, y)| {
                let x = x as f64 / range.input as f64;
                let y = y as f64 / range.output as f64;

                match self.kind {
                    // Tone map values are gains over the input
                    CurveKind::ToneMap => (x, y * x),
                    CurveKind::Eotf => (x, y),
                }
            })
            .collect()
    }

    fn tone_mapper(&self) -> StaticToneMapper {
        StaticToneMapper::new(
            self.transfer,
            self.source,
            self.target,
            self.bits.tone_map_range(),
        )
    }

    fn eotf(&self) -> EotfCurve {
        EotfCurve::new(self.transfer, self.source, self.bits.eotf_range())
    }
}
