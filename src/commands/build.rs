use clap::{Args, ValueHint};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[arg(
        id = "input",
        help = "Sets the input JSON job file to use",
        long,
        short = 'i',
        conflicts_with = "input_pos",
        required_unless_present = "input_pos",
        value_hint = ValueHint::FilePath,
    )]
    pub input: Option<PathBuf>,

    #[arg(
        id = "input_pos",
        help = "Sets the input JSON job file to use (positional)",
        conflicts_with = "input",
        required_unless_present = "input",
        value_hint = ValueHint::FilePath
    )]
    pub input_pos: Option<PathBuf>,

    #[arg(
        long,
        short = 'c',
        help = "Hardware configuration directory",
        value_hint = ValueHint::DirPath
    )]
    pub config: PathBuf,

    #[arg(
        long,
        help = "Target name, documents named `<name>_<target>.xml` take precedence"
    )]
    pub target_name: Option<String>,

    #[arg(
        long,
        short = 'o',
        help = "Output directory for the layer_<n>.bin buffers",
        value_hint = ValueHint::DirPath
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long = "hdr10plus-json",
        help = "HDR10+ JSON file providing the dynamic metadata of `hdr10plus` layers",
        value_hint = ValueHint::FilePath
    )]
    pub hdr10plus_json: Option<PathBuf>,

    #[arg(
        long,
        short = 'f',
        default_value = "0",
        help = "Frame of the HDR10+ JSON to use"
    )]
    pub frame: usize,

    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Builder debug level, overrides the job's `log_level`"
    )]
    pub log_level: Option<i32>,
}
