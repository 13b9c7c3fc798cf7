use std::{ops::Range, path::Path};

use plotters::{coord::Shift, prelude::*};

use crate::pipelines::token_classification::history::EpochMetrics;

/// Plot the loss curves and the accuracy curve side by side into an SVG file
pub fn plot_loss_and_accuracy_curves<P: AsRef<Path>>(
    metrics: &EpochMetrics,
    path: P,
) -> anyhow::Result<()> {
    let root = SVGBackend::new(path.as_ref(), (1200, 400)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("Unable to draw plot: {}", e))?;

    let (loss_area, accuracy_area) = root.split_horizontally(600);

    draw_chart(
        &loss_area,
        "Training and Test Loss",
        "Loss",
        &[
            Series::new("Training loss", &metrics.training_loss, BLUE, true),
            Series::new("Test loss", &metrics.test_loss, RED, true),
        ],
    )?;

    draw_chart(
        &accuracy_area,
        "Training Accuracy",
        "Accuracy",
        &[Series::new("Accuracy", &metrics.accuracy, GREEN, false)],
    )?;

    root.present()
        .map_err(|e| anyhow!("Unable to write plot to {}: {}", path.as_ref().display(), e))?;

    Ok(())
}

struct Series<'a> {
    label: &'a str,
    values: &'a [f64],
    color: RGBColor,
    markers: bool,
}

impl<'a> Series<'a> {
    fn new(label: &'a str, values: &'a [f64], color: RGBColor, markers: bool) -> Self {
        Self {
            label,
            values,
            color,
            markers,
        }
    }

    /// Points against epochs counted from 1
    fn points(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, value)| ((i + 1) as f64, *value))
            .collect()
    }
}

fn draw_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    y_desc: &str,
    series: &[Series],
) -> anyhow::Result<()> {
    let (x_range, y_range) = ranges(series);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| anyhow!("Unable to build chart {}: {}", caption, e))?;

    chart
        .configure_mesh()
        .x_desc("Epochs")
        .y_desc(y_desc)
        .draw()
        .map_err(|e| anyhow!("Unable to draw axes for {}: {}", caption, e))?;

    for line in series {
        let color = line.color;

        chart
            .draw_series(LineSeries::new(line.points(), &color))
            .map_err(|e| anyhow!("Unable to draw {}: {}", line.label, e))?
            .label(line.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

        if line.markers {
            chart
                .draw_series(
                    line.points()
                        .into_iter()
                        .map(|point| Circle::new(point, 3, color.filled())),
                )
                .map_err(|e| anyhow!("Unable to draw markers for {}: {}", line.label, e))?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| anyhow!("Unable to draw legend for {}: {}", caption, e))?;

    Ok(())
}

/// Axis ranges covering every series, padded so single points and flat lines stay visible
fn ranges(series: &[Series]) -> (Range<f64>, Range<f64>) {
    let epochs = series.iter().map(|s| s.values.len()).max().unwrap_or(0).max(1);

    let values = series.iter().flat_map(|s| s.values.iter().copied());
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });

    let (min, max) = if min > max { (0.0, 1.0) } else { (min, max) };
    let margin = ((max - min) * 0.1).max(0.05);

    (0.5..epochs as f64 + 0.5, (min - margin)..(max + margin))
}
