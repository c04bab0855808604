//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - actual weekly sales: `o`
//! - predicted values: `-` line
//! - forward forecast: `~` line, continuing from the last predicted point

use crate::domain::Prediction;

const LEGEND: &str = "o actual | - predicted | ~ forecast";

/// Render actual vs predicted sales, followed by the forward forecast.
///
/// Points are placed by position (one column slot per week), not by date.
pub fn render_sales_plot(history: &[Prediction], forecast: &[Prediction], width: usize, height: usize) -> String {
    let total = history.len() + forecast.len();
    let (Some(first), Some(last)) = (
        history.first().or(forecast.first()),
        forecast.last().or(history.last()),
    ) else {
        return "Plot: no data\n".to_string();
    };

    let width = width.max(10);
    let height = height.max(5);
    let x_max = (total.max(2) - 1) as f64;

    let predicted: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.predicted))
        .collect();
    let actual: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.actual.map(|a| (i as f64, a)))
        .collect();
    let mut ahead: Vec<(f64, f64)> = predicted.last().copied().into_iter().collect();
    ahead.extend(
        forecast
            .iter()
            .enumerate()
            .map(|(i, p)| ((history.len() + i) as f64, p.predicted)),
    );

    let (y_min, y_max) = y_range(predicted.iter().chain(&actual).chain(&ahead)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let frame = Frame { x_max, y_min, y_max, width, height };

    // Lines first so actual points overlay them.
    draw_series(&mut grid, &predicted, &frame, '-');
    draw_series(&mut grid, &ahead, &frame, '~');
    for &(x, y) in &actual {
        grid[frame.row(y)][frame.col(x)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: weeks=[{}, {}] | sales=[{y_min:.2}, {y_max:.2}]\n",
        first.date, last.date
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(LEGEND);
    out.push('\n');
    out
}

struct Frame {
    x_max: f64,
    y_min: f64,
    y_max: f64,
    width: usize,
    height: usize,
}

impl Frame {
    fn col(&self, x: f64) -> usize {
        let u = (x / self.x_max).clamp(0.0, 1.0);
        (u * (self.width as f64 - 1.0)).round() as usize
    }

    fn row(&self, y: f64) -> usize {
        let u = ((y - self.y_min) / (self.y_max - self.y_min)).clamp(0.0, 1.0);
        // y=top is max -> row 0
        (self.height as f64 - 1.0 - (u * (self.height as f64 - 1.0))).round() as usize
    }
}

fn y_range<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        None
    } else if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat series: give it a unit band so it lands mid-plot.
        Some((min_y - 0.5, max_y + 0.5))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn draw_series(grid: &mut [Vec<char>], points: &[(f64, f64)], frame: &Frame, ch: char) {
    let mut prev = None;
    for &(x, y) in points {
        let cell = (frame.col(x), frame.row(y));
        match prev {
            Some(start) => draw_line(grid, start, cell, ch),
            None => {
                if grid[cell.1][cell.0] == ' ' {
                    grid[cell.1][cell.0] = ch;
                }
            }
        }
        prev = Some(cell);
    }
}

/// Integer line drawing (Bresenham-ish). Occupied cells are left alone.
fn draw_line(grid: &mut [Vec<char>], (x0, y0): (usize, usize), (x1, y1): (usize, usize), ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, actual: Option<f64>, predicted: f64) -> Prediction {
        Prediction {
            date: date.to_string(),
            actual,
            predicted,
        }
    }

    #[test]
    fn plot_golden_snapshot_history_only() {
        let history = vec![point("a", Some(100.0), 100.0), point("b", Some(110.0), 100.0)];
        let txt = render_sales_plot(&history, &[], 10, 5);
        let expected = concat!(
            "Plot: weeks=[a, b] | sales=[99.50, 110.50]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
            "o actual | - predicted | ~ forecast\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn plot_golden_snapshot_with_forecast() {
        let history = vec![point("a", Some(100.0), 100.0)];
        let forecast = vec![point("b", None, 110.0)];
        let txt = render_sales_plot(&history, &forecast, 10, 5);
        let expected = concat!(
            "Plot: weeks=[a, b] | sales=[99.50, 110.50]\n",
            "        ~~\n",
            "      ~~  \n",
            "    ~~    \n",
            "  ~~      \n",
            "o~        \n",
            "o actual | - predicted | ~ forecast\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_input_renders_placeholder() {
        assert_eq!(render_sales_plot(&[], &[], 10, 5), "Plot: no data\n");
    }

    #[test]
    fn flat_series_does_not_panic() {
        let history = vec![point("a", Some(5.0), 5.0), point("b", Some(5.0), 5.0)];
        let txt = render_sales_plot(&history, &[], 10, 5);
        assert_eq!(txt.lines().count(), 7);
        assert!(txt.contains('o'));
    }
}
