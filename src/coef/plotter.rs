use std::path::PathBuf;

use anyhow::Result;
use plotters::prelude::{
    BitMapBackend, ChartBuilder, Circle, IntoDrawingArea, LineSeries, PathElement,
    SeriesLabelPosition, WHITE,
};
use plotters::style::{Color, RGBColor, ShapeStyle, BLACK};

use super::CurveSetup;
use crate::commands::{CurveKind, PlotArgs};

const CURVE_COLOR: RGBColor = RGBColor(65, 105, 225);
const BREAKPOINT_COLOR: RGBColor = RGBColor(230, 110, 132);

/// Resolution of the continuous curve
const CURVE_STEPS: usize = 1000;

pub struct Plotter;

impl Plotter {
    pub fn plot(args: PlotArgs) -> Result<()> {
        let PlotArgs {
            curve: curve_args,
            output,
            title,
        } = args;

        let setup = CurveSetup::from_args(&curve_args)?;

        let output = output.unwrap_or(PathBuf::from("curve_plot.png"));
        let title = title.unwrap_or(match setup.kind {
            CurveKind::ToneMap => format!(
                "{} tone mapping, {} -> {} nits",
                setup.transfer, setup.source, setup.target
            ),
            CurveKind::Eotf => format!("{} EOTF, {} nits", setup.transfer, setup.source),
        });

        let points = setup.sample()?;
        let breakpoints = setup.normalized_breakpoints(&points);

        let curve: Vec<(f64, f64)> = (0..=CURVE_STEPS)
            .map(|i| {
                let t = i as f64 / CURVE_STEPS as f64;
                (t, setup.normalized(t))
            })
            .collect();
        let y_max = curve
            .iter()
            .chain(breakpoints.iter())
            .fold(1.0_f64, |acc, &(_, y)| acc.max(y));

        let root = BitMapBackend::new(&output, (1600, 1200)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root
            .margin(30, 30, 60, 60)
            .titled(&title, ("sans-serif", 40))?;

        println!("Plotting...");

        let (x_desc, y_desc) = match setup.kind {
            CurveKind::ToneMap => ("input (normalized to source)", "output (normalized to target)"),
            CurveKind::Eotf => ("signal", "linear light (normalized)"),
        };

        let mut chart = ChartBuilder::on(&root)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .margin_top(30)
            .build_cartesian_2d(0_f64..1_f64, 0_f64..y_max * 1.05)?;

        chart
            .configure_mesh()
            .bold_line_style(BLACK.mix(0.10))
            .light_line_style(BLACK.mix(0.01))
            .label_style(("sans-serif", 22))
            .axis_desc_style(("sans-serif", 24))
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()?;

        let curve_style = ShapeStyle {
            color: CURVE_COLOR.to_rgba(),
            filled: false,
            stroke_width: 2,
        };

        chart
            .draw_series(LineSeries::new(curve, curve_style))?
            .label("curve")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], curve_style));

        chart
            .draw_series(LineSeries::new(breakpoints.iter().copied(), BLACK.mix(0.5)))?
            .label(format!("interpolated ({} breakpoints)", breakpoints.len()))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.mix(0.5)));

        chart.draw_series(
            breakpoints
                .iter()
                .map(|&point| Circle::new(point, 4, BREAKPOINT_COLOR.filled())),
        )?;

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .position(SeriesLabelPosition::LowerRight)
            .label_font(("sans-serif", 24))
            .background_style(WHITE)
            .draw()?;

        root.present()?;

        println!("Done.");

        Ok(())
    }
}
