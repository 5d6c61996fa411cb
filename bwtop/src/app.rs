//! App state and main loop: input handling, applying poll results, and drawing.

use std::{io, sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::time::sleep;
use tracing::{debug, info};

use bwtop::buffer::SampleBuffer;
use bwtop::chart::AxisConfig;
use bwtop::fetch::{HttpManager, ManagerApi};
use bwtop::scheduler::{initial_fetch_size, spawn_status_poller, spawn_traffic_poller, PollEvent};
use bwtop::ui::{header::draw_header, status::draw_status, status::StatusPanel};
use bwtop::widget::{Applied, BandwidthWidget};

const FRAME: Duration = Duration::from_millis(100);

struct Areas {
    header: Rect,
    chart: Rect,
    status: Rect,
}

fn layout(area: Rect) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(6),    // chart
            Constraint::Length(7), // server status
        ])
        .split(area);
    Areas {
        header: rows[0],
        chart: rows[1],
        status: rows[2],
    }
}

pub struct App {
    endpoint: String,
    interval: Duration,
    axis: AxisConfig,

    widget: Option<BandwidthWidget>,
    status: StatusPanel,
    last_update: Option<DateTime<Local>>,

    // Quit flag
    should_quit: bool,
}

impl App {
    pub fn new(endpoint: impl Into<String>, interval: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            interval,
            axis: AxisConfig::default(),
            widget: None,
            status: StatusPanel::default(),
            last_update: None,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let api = Arc::new(HttpManager::new(&self.endpoint)?);

        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal, api).await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend, A: ManagerApi>(
        &mut self,
        terminal: &mut Terminal<B>,
        api: Arc<A>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        // The chart surface is measured once; its width fixes the window size.
        let sz = terminal.size()?;
        let chart = layout(Rect::new(0, 0, sz.width, sz.height)).chart;
        let surface = (chart.area() > 0).then_some(chart);
        let cols = chart.width.saturating_sub(2) as u32;
        let initial = initial_fetch_size((cols > 0).then_some(cols * 2));
        self.widget = Some(BandwidthWidget::new(initial, surface, self.axis.clone())?);
        info!(endpoint = %self.endpoint, initial, "starting pollers");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let traffic = spawn_traffic_poller(api.clone(), initial, self.interval, tx.clone());
        let status = spawn_status_poller(api, tx);

        let res = self.drive(terminal, &mut rx).await;

        traffic.abort();
        status.abort();
        res
    }

    async fn drive<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        rx: &mut UnboundedReceiver<PollEvent>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    if matches!(
                        k.code,
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc
                    ) {
                        self.should_quit = true;
                    }
                }
            }
            if self.should_quit {
                break;
            }

            // Apply whatever the pollers delivered, in arrival order
            loop {
                match rx.try_recv() {
                    Ok(ev) => self.handle_poll(ev)?,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Ok(()),
                }
            }

            // Draw
            terminal.draw(|f| self.draw(f))?;

            sleep(FRAME).await;
        }
        Ok(())
    }

    fn handle_poll(&mut self, ev: PollEvent) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(missing) = ev.shortfall() {
            debug!(missing, "traffic response shorter than requested");
        }
        match ev {
            PollEvent::Traffic { result, .. } => {
                if let Some(w) = self.widget.as_mut() {
                    if w.apply(result)? == Applied::Redrawn {
                        self.last_update = Some(Local::now());
                    }
                }
            }
            PollEvent::Status(result) => self.status.apply(result),
        }
        Ok(())
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let areas = layout(f.area());
        let empty = SampleBuffer::default();
        let buffer = self.widget.as_ref().map(|w| w.buffer()).unwrap_or(&empty);
        draw_header(f, areas.header, &self.endpoint, buffer, self.last_update);
        if let Some(w) = self.widget.as_ref() {
            w.render(f, areas.chart);
        }
        draw_status(f, areas.status, &self.status);
    }
}
