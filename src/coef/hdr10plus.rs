use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use hdr_coef::ootf::{DynamicMetadata, ToneMapping};

/// Scene metadata of every frame of an HDR10+ JSON export.
#[derive(Debug, Default, Clone)]
pub struct Hdr10PlusJson {
    pub frames: Vec<DynamicMetadata>,
}

impl Hdr10PlusJson {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed opening HDR10+ JSON {}", path.display()))?;
        let json: Value = serde_json::from_reader(BufReader::new(file))?;

        Self::from_value(&json)
    }

    pub fn from_value(json: &Value) -> Result<Self> {
        let Some(scene_info) = json.get("SceneInfo").and_then(Value::as_array) else {
            bail!("Invalid HDR10+ JSON: missing SceneInfo list");
        };

        let frames = scene_info
            .iter()
            .enumerate()
            .map(|(i, e)| {
                parse_frame(e).with_context(|| format!("Invalid HDR10+ JSON: SceneInfo {i}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { frames })
    }

    pub fn frame(&self, frame: usize) -> Result<&DynamicMetadata> {
        match self.frames.get(frame) {
            Some(meta) => Ok(meta),
            None => bail!(
                "Frame {frame} out of range, the HDR10+ JSON has {} frames",
                self.frames.len()
            ),
        }
    }
}

fn parse_frame(info: &Value) -> Result<DynamicMetadata> {
    let lum = field(info, "LuminanceParameters")?;

    let maxscl = u64_list(field(lum, "MaxScl")?, "MaxScl")?;
    let Ok(maxscl) = <[u64; 3]>::try_from(maxscl.as_slice()) else {
        bail!("MaxScl must have 3 values");
    };

    let distributions = field(lum, "LuminanceDistributions")?;
    let percentages = u64_list(field(distributions, "DistributionIndex")?, "DistributionIndex")?;
    let percentiles = u64_list(field(distributions, "DistributionValues")?, "DistributionValues")?;

    let tone_mapping = info
        .get("BezierCurveData")
        .map(|bezier| -> Result<ToneMapping> {
            Ok(ToneMapping {
                knee_point_x: field(bezier, "KneePointX")?.as_u64().unwrap_or(0) as u16,
                knee_point_y: field(bezier, "KneePointY")?.as_u64().unwrap_or(0) as u16,
                anchors: u64_list(field(bezier, "Anchors")?, "Anchors")?
                    .into_iter()
                    .map(|v| v as u16)
                    .collect(),
            })
        })
        .transpose()?;

    Ok(DynamicMetadata {
        display_maximum_luminance: info
            .get("TargetedSystemDisplayMaximumLuminance")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32,
        maxscl: maxscl.map(|v| v as u32),
        percentages: percentages.into_iter().map(|v| v as u8).collect(),
        percentiles: percentiles.into_iter().map(|v| v as u32).collect(),
        tone_mapping,
    })
}

fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value> {
    value.get(key).with_context(|| format!("missing {key}"))
}

fn u64_list(value: &Value, key: &str) -> Result<Vec<u64>> {
    value
        .as_array()
        .with_context(|| format!("{key} is not a list"))?
        .iter()
        .map(|v| v.as_u64().with_context(|| format!("invalid {key} value {v}")))
        .collect()
}
