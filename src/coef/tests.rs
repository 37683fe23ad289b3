use std::path::PathBuf;

use anyhow::Result;
use approx::assert_relative_eq;
use serde_json::json;

use hdr_coef::colorimetry::{Bpc, HdrCapa, Standard, Transfer};

use super::builder::BuildJob;
use super::hdr10plus::Hdr10PlusJson;
use super::CurveSetup;
use crate::commands::{CurveArgs, CurveKind, CurveTransfer};

fn asset(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/tests").join(name)
}

fn curve_args() -> CurveArgs {
    CurveArgs {
        source: 1000,
        target: 500,
        transfer: CurveTransfer::Pq,
        kind: CurveKind::ToneMap,
        points: 32,
        x_bits: 16,
        y_bits: 16,
        min_x_bits: 4,
        config: None,
        layer: 0,
    }
}

#[test]
fn job_file() -> Result<()> {
    let job = BuildJob::from_path(&asset("job.json"))?;

    assert_eq!(job.target.capa, HdrCapa::Inner);
    assert_eq!(job.target.dataspace.standard, Standard::Bt709);
    assert_eq!(job.target.peak_luminance, 400);
    assert_eq!(job.log_level, None);

    let indices: Vec<usize> = job.layers.iter().map(|l| l.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    let hdr10 = &job.layers[0].descriptor;
    assert_eq!(hdr10.dataspace.transfer, Transfer::St2084);
    assert_eq!(hdr10.bpc, Bpc::Bpc10);
    assert_eq!(hdr10.mastering_luminance, Some(1200));
    assert!(!job.layers[0].hdr10plus);

    // Defaults for the omitted fields
    let sdr = &job.layers[1].descriptor;
    assert_eq!(sdr.bpc, Bpc::Bpc8);
    assert_eq!(sdr.max_cll, None);
    assert!(!sdr.bypass);

    Ok(())
}

#[test]
fn duplicate_job_layers() -> Result<()> {
    let job: BuildJob = serde_json::from_value(json!({
        "target": { "dataspace": { "standard": "BT709", "transfer": "SRGB" } },
        "layers": [{ "index": 1 }, { "index": 0 }, { "index": 1 }]
    }))?;

    let err = job.validate().unwrap_err();
    assert_eq!(err.to_string(), "Layer 1 is listed more than once");

    Ok(())
}

#[test]
fn hdr10plus_json() -> Result<()> {
    let hdr10plus = Hdr10PlusJson::from_path(&asset("hdr10plus.json"))?;
    assert_eq!(hdr10plus.frames.len(), 2);

    let first = hdr10plus.frame(0)?;
    assert_eq!(first.maxscl, [38000, 40000, 25000]);
    assert_eq!(first.percentages, vec![1, 5, 10, 25, 50, 75, 90, 95, 99]);
    assert_eq!(first.percentiles.last(), Some(&32000));
    assert!(first.tone_mapping.is_none());
    assert!(first.validate().is_ok());

    let second = hdr10plus.frame(1)?;
    assert_eq!(second.display_maximum_luminance, 400);
    let tm = second.tone_mapping.as_ref().unwrap();
    assert_eq!((tm.knee_point_x, tm.knee_point_y), (150, 300));
    assert_eq!(tm.anchors.len(), 9);

    assert!(hdr10plus.frame(2).is_err());
    assert!(Hdr10PlusJson::from_value(&json!({ "JSONInfo": {} })).is_err());

    let missing_maxscl = json!({
        "SceneInfo": [{
            "LuminanceParameters": {
                "LuminanceDistributions": {
                    "DistributionIndex": [99],
                    "DistributionValues": [1000]
                },
                "MaxScl": [1000, 1000]
            }
        }]
    });
    let err = Hdr10PlusJson::from_value(&missing_maxscl).unwrap_err();
    assert!(format!("{err:#}").contains("SceneInfo 0"));

    Ok(())
}

#[test]
fn hdr10plus_layers_need_metadata() -> Result<()> {
    let job = BuildJob::from_path(&asset("job_hdr10plus.json"))?;
    let layer = &job.layers[0];

    assert!(layer.resolve(None, 0).is_err());

    let hdr10plus = Hdr10PlusJson::from_path(&asset("hdr10plus.json"))?;
    let descriptor = layer.resolve(Some(&hdr10plus), 1)?;
    assert_eq!(descriptor.dynamic_metadata.as_ref(), hdr10plus.frames.get(1));

    Ok(())
}

#[test]
fn curve_setup() -> Result<()> {
    let setup = CurveSetup::from_args(&curve_args())?;
    let points = setup.sample()?;
    assert_eq!(points.xs.len(), 32);

    let breakpoints = setup.normalized_breakpoints(&points);
    assert_eq!(breakpoints.first(), Some(&(0.0, 0.0)));

    let (x, y) = *breakpoints.last().unwrap();
    assert_eq!(x, 1.0);
    assert_relative_eq!(y, 1.0, epsilon = 1e-4);
    assert_relative_eq!(setup.normalized(1.0), 1.0, epsilon = 1e-9);

    // Shadows pass through untouched
    assert_relative_eq!(setup.normalized(0.1), 0.2, epsilon = 1e-9);

    Ok(())
}

#[test]
fn hlg_curves_use_the_reference_display() -> Result<()> {
    let args = CurveArgs {
        source: 4000,
        transfer: CurveTransfer::Hlg,
        ..curve_args()
    };
    assert_eq!(CurveSetup::from_args(&args)?.source, 1000.0);

    let invalid = CurveArgs {
        target: 0,
        ..curve_args()
    };
    assert!(CurveSetup::from_args(&invalid).is_err());

    let bad_bits = CurveArgs {
        min_x_bits: 20,
        ..curve_args()
    };
    assert!(CurveSetup::from_args(&bad_bits).is_err());

    Ok(())
}

#[test]
fn curve_bits_from_a_config_dir() -> Result<()> {
    let args = CurveArgs {
        kind: CurveKind::Eotf,
        config: Some(asset("config")),
        ..curve_args()
    };

    let setup = CurveSetup::from_args(&args)?;
    assert_eq!((setup.bits.x_bits, setup.bits.y_bits, setup.bits.min_x_bits), (12, 12, 4));
    assert_eq!(setup.points, 8);
    assert_eq!(setup.sample()?.xs.len(), 8);

    // Layer 2 module has no tone map sub-modules
    let wcg_only = CurveArgs {
        config: Some(asset("config")),
        layer: 2,
        ..curve_args()
    };
    assert!(CurveSetup::from_args(&wcg_only).is_err());

    Ok(())
}
