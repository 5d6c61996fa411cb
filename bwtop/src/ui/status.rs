//! Server status pane: shows the last fragment the agent returned, as-is.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tracing::debug;

use crate::fetch::FetchError;

#[derive(Debug, Default, Clone)]
pub struct StatusPanel {
    markup: Option<String>,
}

impl StatusPanel {
    pub fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }

    /// Replace the fragment on success; a failed poll keeps the previous one.
    pub fn apply(&mut self, result: Result<String, FetchError>) {
        match result {
            Ok(m) => self.markup = Some(m),
            Err(e) => debug!(error = %e, "status poll skipped"),
        }
    }
}

pub fn draw_status(f: &mut ratatui::Frame<'_>, area: Rect, panel: &StatusPanel) {
    let block = Block::default().borders(Borders::ALL).title("Server");
    let p = match panel.markup() {
        Some(m) => Paragraph::new(m.to_string()),
        None => Paragraph::new("waiting for server info...")
            .style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(p.block(block).wrap(Wrap { trim: false }), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_poll_keeps_previous_markup() {
        let mut p = StatusPanel::default();
        assert!(p.markup().is_none());
        p.apply(Ok("<b>uptime 3s</b>".into()));
        p.apply(Err(FetchError::Status(500)));
        assert_eq!(p.markup(), Some("<b>uptime 3s</b>"));
        p.apply(Ok("uptime 8s".into()));
        assert_eq!(p.markup(), Some("uptime 8s"));
    }
}
