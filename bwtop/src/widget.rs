//! One bandwidth chart: its sample window and its renderer, owned together so
//! several charts can live side by side.

use ratatui::layout::Rect;
use tracing::{debug, warn};

use crate::buffer::{IngestError, SampleBuffer};
use crate::chart::{AxisConfig, ChartRenderer, RenderError};
use crate::fetch::FetchError;

/// What happened to one poll result.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Redrawn,
    SkippedFetch(FetchError),
    SkippedPayload(IngestError),
}

#[derive(Debug)]
pub struct BandwidthWidget {
    buffer: SampleBuffer,
    renderer: ChartRenderer,
}

impl BandwidthWidget {
    /// Fails when the chart surface is missing: nothing can be drawn without it.
    pub fn new(
        capacity: usize,
        container: Option<Rect>,
        config: AxisConfig,
    ) -> Result<Self, RenderError> {
        let mut renderer = ChartRenderer::new();
        renderer.initialize(container, config)?;
        Ok(Self {
            buffer: SampleBuffer::new(capacity),
            renderer,
        })
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn renderer(&self) -> &ChartRenderer {
        &self.renderer
    }

    /// Ingest a fetch outcome and redraw. Failed fetches and rejected
    /// payloads leave the window and the chart as they were.
    pub fn apply(&mut self, result: Result<Vec<f64>, FetchError>) -> Result<Applied, RenderError> {
        let samples = match result {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, "traffic poll skipped");
                return Ok(Applied::SkippedFetch(e));
            }
        };
        if let Err(e) = self.buffer.ingest(&samples) {
            warn!(error = %e, "traffic payload rejected");
            return Ok(Applied::SkippedPayload(e));
        }
        self.renderer
            .redraw(self.buffer.to_series(), self.buffer.current_max())?;
        debug!(
            len = self.buffer.len(),
            max = self.buffer.current_max(),
            "chart redrawn"
        );
        Ok(Applied::Redrawn)
    }

    pub fn render(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        self.renderer.render(f, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> BandwidthWidget {
        BandwidthWidget::new(3, Some(Rect::new(0, 0, 40, 10)), AxisConfig::default()).unwrap()
    }

    fn contents(w: &BandwidthWidget) -> Vec<f64> {
        w.buffer().samples().collect()
    }

    #[test]
    fn missing_surface_fails_construction() {
        assert_eq!(
            BandwidthWidget::new(3, None, AxisConfig::default()).unwrap_err(),
            RenderError::MissingSurface
        );
    }

    #[test]
    fn bulk_then_incremental_redraws() {
        let mut w = widget();
        assert_eq!(w.apply(Ok(vec![10.0, 20.0, 30.0])), Ok(Applied::Redrawn));
        assert_eq!(w.renderer().point_count(), 3);
        assert_eq!(w.apply(Ok(vec![40.0])), Ok(Applied::Redrawn));
        assert_eq!(contents(&w), vec![20.0, 30.0, 40.0]);
        assert_eq!(w.buffer().current_max(), 40.0);
    }

    #[test]
    fn failed_fetch_changes_nothing() {
        let mut w = widget();
        w.apply(Ok(vec![1.0, 2048.0, 3.0])).unwrap();
        let labels = w.renderer().y_labels().to_vec();

        let out = w.apply(Err(FetchError::Transport("refused".into()))).unwrap();
        assert!(matches!(out, Applied::SkippedFetch(_)));
        assert_eq!(contents(&w), vec![1.0, 2048.0, 3.0]);
        assert_eq!(w.buffer().current_max(), 2048.0);
        assert_eq!(w.renderer().y_labels(), labels.as_slice());
    }

    #[test]
    fn rejected_payload_changes_nothing() {
        let mut w = widget();
        w.apply(Ok(vec![1.0, 2.0])).unwrap();
        let out = w.apply(Ok(vec![])).unwrap();
        assert_eq!(out, Applied::SkippedPayload(IngestError::Empty));
        assert_eq!(contents(&w), vec![1.0, 2.0]);
    }

    #[test]
    fn last_applied_wins_over_issue_order() {
        let mut w = widget();
        w.apply(Ok(vec![1.0, 2.0, 3.0])).unwrap();
        // Issued first, arrives second.
        let issued_first = Ok(vec![100.0]);
        let issued_second = Ok(vec![200.0]);
        w.apply(issued_second).unwrap();
        w.apply(issued_first).unwrap();
        assert_eq!(contents(&w), vec![3.0, 200.0, 100.0]);
        assert_eq!(w.buffer().latest(), Some(100.0));
    }

    #[test]
    fn widgets_are_independent() {
        let mut a = widget();
        let mut b = widget();
        a.apply(Ok(vec![5.0, 6.0])).unwrap();
        b.apply(Ok(vec![7.0, 8.0, 9.0])).unwrap();
        assert_eq!(contents(&a), vec![5.0, 6.0]);
        assert_eq!(contents(&b), vec![7.0, 8.0, 9.0]);
    }
}
