use clap::Parser;

mod build;
mod curve;
mod info;
mod plot;

pub use build::BuildArgs;
pub use curve::{CurveArgs, CurveKind, CurveTransfer};
pub use info::InfoArgs;
pub use plot::PlotArgs;

#[derive(Parser, Debug)]
pub enum Command {
    #[command(about = "Builds the coefficient buffers of a JSON job for a hardware configuration")]
    Build(BuildArgs),

    #[command(about = "Prints a binary coefficient buffer as JSON")]
    Info(InfoArgs),

    #[command(about = "Prints the sampled breakpoints of a tone mapping or EOTF curve")]
    Curve(CurveArgs),

    #[command(about = "Plots a curve along with its sampled breakpoints")]
    Plot(PlotArgs),
}
