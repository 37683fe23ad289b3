use anyhow::Result;

use super::CurveSetup;
use crate::commands::CurveArgs;

pub struct CurvePrinter;

impl CurvePrinter {
    pub fn print(args: CurveArgs) -> Result<()> {
        let setup = CurveSetup::from_args(&args)?;
        let points = setup.sample()?;

        println!(
            "{:?} {:?}: {} -> {} nits, {} breakpoints",
            setup.kind, setup.transfer, setup.source, setup.target, setup.points
        );
        println!("x,y");

        // Absolute coordinates, the register layout stores the last pair as a delta
        for (x, y) in points.absolute() {
            println!("{x},{y}");
        }

        Ok(())
    }
}
