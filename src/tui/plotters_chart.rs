//! Plotters-powered series chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! The same widget draws the sales forecast tab and the residuals tab.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Points,
}

/// One series to draw, with its own color.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    pub kind: SeriesKind,
}

impl ChartSeries {
    pub fn line(points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self { points, color, kind: SeriesKind::Line }
    }

    pub fn points(points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self { points, color, kind: SeriesKind::Points }
    }
}

/// A render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct SalesChart<'a> {
    /// Drawn in order, so later series overlay earlier ones.
    pub series: &'a [ChartSeries],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for SalesChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out tiny areas; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for series in self.series {
                match series.kind {
                    SeriesKind::Line => {
                        chart.draw_series(LineSeries::new(series.points.iter().copied(), &series.color))?;
                    }
                    // `Pixel` rather than `Circle`: the backend scales circle radii
                    // in canvas units, which blows them up in a terminal.
                    SeriesKind::Points => {
                        chart.draw_series(series.points.iter().map(|&(x, y)| Pixel::new((x, y), series.color)))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
