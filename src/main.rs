use clap::Parser;

use anyhow::Result;
use env_logger::Env;

mod commands;
use commands::Command;

mod coef;
use coef::{builder::CoefBuilder, curve::CurvePrinter, info::CoefInfo, plotter::Plotter};

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Compiles HDR and wide gamut coefficients for display hardware", author = "quietvoid", version = env!("CARGO_PKG_VERSION"))]
struct Opt {
    #[command(subcommand)]
    cmd: Command,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let opt = Opt::parse();

    match opt.cmd {
        Command::Build(args) => CoefBuilder::build(args),
        Command::Info(args) => CoefInfo::info(args),
        Command::Curve(args) => CurvePrinter::print(args),
        Command::Plot(args) => Plotter::plot(args),
    }
}
