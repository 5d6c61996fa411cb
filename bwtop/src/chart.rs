//! Scrolling throughput chart: filled braille line, unit-scaled y labels,
//! hidden x labels and alternating background bands every two x ticks.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition},
};
use thiserror::Error;

use crate::buffer::SeriesPoint;
use crate::scale::scale;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("chart drawn before initialize()")]
    NotInitialized,
    #[error("chart surface is missing or has no area")]
    MissingSurface,
}

/// Axis, grid and legend settings applied once at initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig {
    pub title: String,
    pub series_name: String,
    pub line_color: Color,
    pub fill_color: Color,
    pub band_color: Color,
    pub axis_color: Color,
    /// Target number of x tick intervals; bands span every other one.
    pub x_ticks: usize,
    /// Target number of y tick intervals.
    pub y_ticks: usize,
    pub show_legend: bool,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            title: "Bandwidth".into(),
            series_name: "traffic".into(),
            line_color: Color::Rgb(0x3e, 0x3e, 0xf4),
            fill_color: Color::Rgb(0x22, 0x22, 0x88),
            band_color: Color::Rgb(24, 24, 40),
            axis_color: Color::DarkGray,
            x_ticks: 8,
            y_ticks: 4,
            show_legend: true,
        }
    }
}

/// Everything needed to paint one frame, rebuilt by `redraw`.
#[derive(Debug, Clone, PartialEq)]
struct Plot {
    points: Vec<SeriesPoint>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    y_labels: Vec<String>,
    bands: Vec<(f64, f64)>,
}

#[derive(Debug, Default)]
pub struct ChartRenderer {
    config: Option<AxisConfig>,
    plot: Option<Plot>,
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Bind to a measured surface and apply the axis configuration.
    pub fn initialize(
        &mut self,
        container: Option<Rect>,
        config: AxisConfig,
    ) -> Result<(), RenderError> {
        match container {
            Some(r) if r.width > 0 && r.height > 0 => {}
            _ => return Err(RenderError::MissingSurface),
        }
        self.config = Some(config);
        self.plot = None;
        Ok(())
    }

    /// Replace the plotted series and recompute bounds, labels and bands.
    ///
    /// `reference_max` is the buffer's running maximum; every y label is
    /// scaled against it.
    pub fn redraw<I>(&mut self, points: I, reference_max: f64) -> Result<(), RenderError>
    where
        I: IntoIterator<Item = SeriesPoint>,
    {
        let cfg = self.config.as_ref().ok_or(RenderError::NotInitialized)?;
        let points: Vec<SeriesPoint> = points.into_iter().collect();

        let x_max = (points.len().saturating_sub(1) as f64).max(1.0);
        let x_tick = nice_step(x_max, cfg.x_ticks);
        let bands = bands(0.0, x_max, x_tick);

        let (y_top, y_step) = y_extent(reference_max, cfg.y_ticks);
        let steps = (y_top / y_step).round().max(1.0) as usize;
        let y_labels = (0..=steps)
            .map(|i| scale(y_step * i as f64, reference_max).to_string())
            .collect();

        self.plot = Some(Plot {
            points,
            x_bounds: [0.0, x_max],
            y_bounds: [0.0, y_top],
            y_labels,
            bands,
        });
        Ok(())
    }

    pub fn y_labels(&self) -> &[String] {
        self.plot.as_ref().map(|p| p.y_labels.as_slice()).unwrap_or(&[])
    }

    pub fn x_bounds(&self) -> Option<[f64; 2]> {
        self.plot.as_ref().map(|p| p.x_bounds)
    }

    pub fn y_bounds(&self) -> Option<[f64; 2]> {
        self.plot.as_ref().map(|p| p.y_bounds)
    }

    pub fn bands(&self) -> &[(f64, f64)] {
        self.plot.as_ref().map(|p| p.bands.as_slice()).unwrap_or(&[])
    }

    pub fn point_count(&self) -> usize {
        self.plot.as_ref().map(|p| p.points.len()).unwrap_or(0)
    }

    /// Paint the last redraw into `area`. Before the first redraw only the frame is drawn.
    pub fn render(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(cfg) = self.config.as_ref() else {
            return;
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(cfg.axis_color))
            .title(cfg.title.clone());
        let Some(plot) = self.plot.as_ref() else {
            f.render_widget(block.title_bottom("waiting for data..."), area);
            return;
        };
        let inner = block.inner(area);

        let fill = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Bar)
            .style(Style::default().fg(cfg.fill_color))
            .data(&plot.points);
        let line = Dataset::default()
            .name(cfg.series_name.clone())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(cfg.line_color))
            .data(&plot.points);

        let labels: Vec<Span> = plot
            .y_labels
            .iter()
            .map(|l| Span::styled(l.clone(), Style::default().fg(Color::Gray)))
            .collect();

        let chart = Chart::new(vec![fill, line])
            .block(block)
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(cfg.axis_color))
                    .bounds(plot.x_bounds),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(cfg.axis_color))
                    .bounds(plot.y_bounds)
                    .labels(labels),
            )
            .legend_position(cfg.show_legend.then_some(LegendPosition::TopLeft))
            .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));
        f.render_widget(chart, area);

        // Bands go on after the chart so the canvas background reset does not wipe them.
        let label_w = plot
            .y_labels
            .iter()
            .map(|l| l.chars().count() as u16)
            .max()
            .unwrap_or(0)
            .min(inner.width / 3);
        let graph_x = inner.x + label_w + 1;
        let graph_w = inner.right().saturating_sub(graph_x);
        let buf = f.buffer_mut();
        for (start, end) in band_columns(&plot.bands, plot.x_bounds, graph_x, graph_w) {
            let r = Rect {
                x: start,
                y: inner.y,
                width: end - start,
                height: inner.height,
            };
            buf.set_style(r, Style::default().bg(cfg.band_color));
        }
    }
}

/// Round tick size for `range` split into about `target` intervals (1, 2, 5 × 10^k).
pub fn nice_step(range: f64, target: usize) -> f64 {
    if !(range.is_finite() && range > 0.0) {
        return 1.0;
    }
    let raw = range / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let size = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.5 {
        5.0
    } else {
        10.0
    };
    size * magnitude
}

/// Alternating bands: one tick wide, starting every two ticks from `floor(min)`.
pub fn bands(min: f64, max: f64, tick: f64) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    if !(tick > 0.0) {
        return out;
    }
    let mut x = min.floor();
    while x < max {
        out.push((x, (x + tick).min(max)));
        x += tick * 2.0;
    }
    out
}

/// Upper y bound and tick step for a running maximum. An empty or all-zero
/// window still gets a unit-high axis.
fn y_extent(reference_max: f64, ticks: usize) -> (f64, f64) {
    if !(reference_max.is_finite() && reference_max > 0.0) {
        let step = 1.0 / ticks.max(1) as f64;
        return (1.0, step);
    }
    let step = nice_step(reference_max, ticks);
    let top = (reference_max / step).ceil().max(1.0) * step;
    (top, step)
}

/// Map band data ranges onto terminal columns `[start, end)` of the graph area.
fn band_columns(
    bands: &[(f64, f64)],
    x_bounds: [f64; 2],
    graph_x: u16,
    graph_w: u16,
) -> Vec<(u16, u16)> {
    let span = x_bounds[1] - x_bounds[0];
    if graph_w == 0 || span <= 0.0 {
        return Vec::new();
    }
    let col = |x: f64| -> u16 {
        let frac = ((x - x_bounds[0]) / span).clamp(0.0, 1.0);
        graph_x + (frac * graph_w as f64).round() as u16
    };
    bands
        .iter()
        .map(|&(a, b)| (col(a), col(b)))
        .filter(|(s, e)| e > s)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn surface() -> Option<Rect> {
        Some(Rect::new(0, 0, 60, 16))
    }

    fn ready() -> ChartRenderer {
        let mut r = ChartRenderer::new();
        r.initialize(surface(), AxisConfig::default()).unwrap();
        r
    }

    #[test]
    fn redraw_before_initialize_fails() {
        let mut r = ChartRenderer::new();
        assert_eq!(
            r.redraw(vec![(0.0, 1.0)], 1.0),
            Err(RenderError::NotInitialized)
        );
    }

    #[test]
    fn missing_surface_is_fatal() {
        let mut r = ChartRenderer::new();
        assert_eq!(
            r.initialize(None, AxisConfig::default()),
            Err(RenderError::MissingSurface)
        );
        assert_eq!(
            r.initialize(Some(Rect::new(0, 0, 0, 10)), AxisConfig::default()),
            Err(RenderError::MissingSurface)
        );
        assert!(!r.is_initialized());
    }

    #[test]
    fn labels_share_the_running_max_tier() {
        let mut r = ready();
        r.redraw(vec![(0.0, 512.0), (1.0, 2048.0)], 2048.0).unwrap();
        let labels = r.y_labels();
        assert!(labels.len() >= 2);
        assert!(labels.iter().all(|l| l.ends_with(" kB")), "{labels:?}");
        assert_eq!(labels[0], "0 kB");
    }

    #[test]
    fn zero_max_labels_in_bytes() {
        let mut r = ready();
        r.redraw(vec![(0.0, 0.0), (1.0, 0.0)], 0.0).unwrap();
        assert_eq!(r.y_bounds(), Some([0.0, 1.0]));
        assert!(r.y_labels().iter().all(|l| l.ends_with(" B")));
    }

    #[test]
    fn redraw_is_idempotent() {
        let mut r = ready();
        let pts = vec![(0.0, 10.0), (1.0, 20.0), (2.0, 30.0)];
        r.redraw(pts.clone(), 30.0).unwrap();
        let first = r.plot.clone();
        r.redraw(pts, 30.0).unwrap();
        assert_eq!(r.plot, first);
        assert_eq!(r.point_count(), 3);
        assert_eq!(r.x_bounds(), Some([0.0, 2.0]));
    }

    #[test]
    fn y_axis_covers_max() {
        let mut r = ready();
        r.redraw(vec![(0.0, 37.0), (1.0, 81.0)], 81.0).unwrap();
        let [lo, hi] = r.y_bounds().unwrap();
        assert_eq!(lo, 0.0);
        assert!(hi >= 81.0);
    }

    #[test]
    fn nice_steps() {
        assert_eq!(nice_step(10.0, 5), 2.0);
        assert_eq!(nice_step(100.0, 4), 20.0);
        assert_eq!(nice_step(299.0, 8), 50.0);
        assert_eq!(nice_step(0.0, 4), 1.0);
    }

    #[test]
    fn bands_every_other_tick() {
        assert_eq!(bands(0.0, 10.0, 2.0), vec![(0.0, 2.0), (4.0, 6.0), (8.0, 10.0)]);
        assert_eq!(bands(0.0, 5.0, 2.0), vec![(0.0, 2.0), (4.0, 5.0)]);
        assert!(bands(0.0, 5.0, 0.0).is_empty());
    }

    #[test]
    fn band_columns_map_into_graph() {
        let cols = band_columns(&[(0.0, 5.0)], [0.0, 10.0], 10, 20);
        assert_eq!(cols, vec![(10, 20)]);
    }

    #[test]
    fn renders_scaled_labels_and_legend() {
        let mut r = ready();
        let pts: Vec<SeriesPoint> = (0..40).map(|i| (i as f64, 1024.0 * i as f64)).collect();
        r.redraw(pts, 39.0 * 1024.0).unwrap();

        let mut term = Terminal::new(TestBackend::new(60, 16)).unwrap();
        term.draw(|f| r.render(f, f.area())).unwrap();
        let text: String = term
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("kB"), "{text}");
        assert!(text.contains("Bandwidth"));
        assert!(text.contains("traffic"));
    }
}
