use clap::{Args, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct CurveArgs {
    #[arg(
        long,
        short = 's',
        default_value = "1000",
        help = "Source peak luminance, in nits"
    )]
    pub source: u32,

    #[arg(
        long,
        short = 't',
        default_value = "500",
        help = "Target peak luminance, in nits"
    )]
    pub target: u32,

    #[arg(long, value_enum, default_value = "pq", help = "Transfer function of the source")]
    pub transfer: CurveTransfer,

    #[arg(long, short = 'k', value_enum, default_value = "tone-map", help = "Curve to sample")]
    pub kind: CurveKind,

    #[arg(
        long,
        short = 'n',
        default_value = "32",
        help = "Number of breakpoints. Ignored with --config"
    )]
    pub points: usize,

    #[arg(long, default_value = "16", help = "Bit width of the curve input")]
    pub x_bits: u32,

    #[arg(long, default_value = "16", help = "Bit width of the curve output")]
    pub y_bits: u32,

    #[arg(long, default_value = "4", help = "Bit width of the smallest input step")]
    pub min_x_bits: u32,

    #[arg(
        long,
        short = 'c',
        help = "Hardware configuration directory. Bit widths and breakpoint count come from the layer's module specifiers",
        value_hint = ValueHint::DirPath
    )]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'l', default_value = "0", help = "Layer of the configuration to use")]
    pub layer: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveTransfer {
    #[value(help = "SMPTE ST 2084")]
    Pq,
    #[value(help = "Hybrid log-gamma, the source is fixed to 1000 nits")]
    Hlg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    #[value(help = "Static tone mapping gain curve")]
    ToneMap,
    #[value(help = "Linearizing EOTF")]
    Eotf,
}
