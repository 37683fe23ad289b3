use clap::{Args, ValueHint};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[arg(
        id = "input",
        help = "Sets the input coefficient buffer to use",
        long,
        short = 'i',
        conflicts_with_all = ["input_pos", "config"],
        required_unless_present_any = ["input_pos", "config"],
        value_hint = ValueHint::FilePath,
    )]
    pub input: Option<PathBuf>,

    #[arg(
        id = "input_pos",
        help = "Sets the input coefficient buffer to use (positional)",
        conflicts_with_all = ["input", "config"],
        required_unless_present_any = ["input", "config"],
        value_hint = ValueHint::FilePath
    )]
    pub input_pos: Option<PathBuf>,

    #[arg(
        long,
        short = 'c',
        help = "Prints the capabilities of a hardware configuration directory instead",
        value_hint = ValueHint::DirPath
    )]
    pub config: Option<PathBuf>,
}
