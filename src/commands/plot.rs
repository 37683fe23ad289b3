use clap::{Args, ValueHint};
use std::path::PathBuf;

use super::CurveArgs;

#[derive(Args, Debug)]
pub struct PlotArgs {
    #[command(flatten)]
    pub curve: CurveArgs,

    #[arg(
        long,
        short = 'o',
        help = "Output PNG image file location",
        value_hint = ValueHint::FilePath
    )]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Title to use at the top")]
    pub title: Option<String>,
}
