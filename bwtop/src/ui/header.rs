//! Top header with endpoint, current/peak throughput and last update time.

use chrono::{DateTime, Local};
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders},
};

use crate::buffer::SampleBuffer;
use crate::ui::util::per_second;

pub fn draw_header(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    endpoint: &str,
    buffer: &SampleBuffer,
    last_update: Option<DateTime<Local>>,
) {
    let title = match (buffer.latest(), last_update) {
        (Some(now), Some(at)) => {
            let max = buffer.current_max();
            format!(
                "bwtop — {endpoint} | now: {} | peak: {} | updated {}  (press 'q' to quit)",
                per_second(now, max),
                per_second(max, max),
                at.format("%H:%M:%S")
            )
        }
        _ => format!("bwtop — {endpoint} | connecting... (press 'q' to quit)"),
    };
    f.render_widget(Block::default().title(title).borders(Borders::BOTTOM), area);
}
