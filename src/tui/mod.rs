pub mod pane;
pub mod results;
pub mod sites;
pub mod status;
pub mod surface;

pub use pane::{Pane, PanelController};
pub use results::ResultsPane;
pub use sites::SitesPane;
pub use status::StatusPane;
pub use surface::{SortColumn, TuiSurface};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use std::io;
use std::time::{Duration, Instant};

const SITES_PANE_WIDTH_PERCENT: u16 = 25;
const PAGE_STEP: isize = 10;
const MAX_EVENTS_PER_TICK: usize = 512;

/// Which pane receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sites,
    Results,
}

/// Main TUI application
pub struct TuiApp {
    sites: SitesPane,
    results: ResultsPane,
    status: StatusPane,
    focus: Focus,
    should_quit: bool,
    last_tick: Instant,
    tick_rate: Duration,
}

impl TuiApp {
    pub fn new(tick_rate: Duration) -> Self {
        Self {
            sites: SitesPane::new(),
            results: ResultsPane::new(),
            status: StatusPane::new(),
            focus: Focus::Sites,
            should_quit: false,
            last_tick: Instant::now(),
            tick_rate,
        }
    }

    /// Run the TUI application until the user quits
    pub fn run<B: Backend>(mut self, terminal: &mut Terminal<B>, panel: &mut PanelController) -> io::Result<()> {
        loop {
            // Apply worker events on this thread before drawing; a burst spills into later ticks
            panel.process_pending_events_up_to(MAX_EVENTS_PER_TICK);

            terminal.draw(|f| self.ui(f, panel))?;

            let timeout = self.tick_rate
                .checked_sub(self.last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            if crossterm::event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key, panel),
                    Event::Mouse(mouse) => self.handle_mouse(mouse, panel),
                    _ => {}
                }
            }

            if self.should_quit {
                break;
            }

            if self.last_tick.elapsed() >= self.tick_rate {
                self.last_tick = Instant::now();
            }
        }

        if panel.request_stop() {
            log::info!("[tui] quit: stopping active crawl");
        }

        Ok(())
    }

    /// Draw the UI
    fn ui(&mut self, frame: &mut ratatui::Frame, panel: &PanelController) {
        let (sites_area, results_area, status_area) = self.split(frame.area());

        self.sites.render(frame, sites_area, panel, self.focus == Focus::Sites);
        self.results.render(frame, results_area, panel, self.focus == Focus::Results);
        self.status.render(frame, status_area, panel, false);
    }

    fn split(&self, area: Rect) -> (Rect, Rect, Rect) {
        let (_, status_height) = self.status.min_size();
        let (results_width, _) = self.results.min_size();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(status_height)])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(SITES_PANE_WIDTH_PERCENT),
                Constraint::Min(results_width),
            ])
            .split(rows[0]);

        (columns[0], columns[1], rows[1])
    }

    pub fn handle_key(&mut self, key: KeyEvent, panel: &mut PanelController) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Sites => Focus::Results,
                    Focus::Results => Focus::Sites,
                };
                let id = match self.focus {
                    Focus::Sites => self.sites.id(),
                    Focus::Results => self.results.id(),
                };
                log::debug!("[tui] focus: pane={}", id);
            }
            KeyCode::Enter | KeyCode::Char('s') => {
                panel.surface_mut().clear_message();
                match panel.start_selected() {
                    Ok(Some(handle)) => log::debug!("[tui] started: session={} site={}", handle.id, handle.site),
                    Ok(None) => panel.surface_mut().set_message("a crawl is already running"),
                    Err(e) => panel.surface_mut().set_message(e.to_string()),
                }
            }
            KeyCode::Char('x') => {
                panel.request_stop();
            }
            KeyCode::Char('o') => panel.surface_mut().cycle_sort(),
            KeyCode::Char('r') => panel.surface_mut().toggle_sort_direction(),
            KeyCode::End | KeyCode::Char('G') => panel.surface_mut().resume_follow(),
            KeyCode::Char('k') | KeyCode::Up => self.navigate(panel, -1),
            KeyCode::Char('j') | KeyCode::Down => self.navigate(panel, 1),
            KeyCode::PageUp => self.navigate(panel, -PAGE_STEP),
            KeyCode::PageDown => self.navigate(panel, PAGE_STEP),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, panel: &mut PanelController) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Right) | MouseEventKind::Down(MouseButton::Left) => {
                let row = self.results.row_at(panel, mouse.column, mouse.row);
                if row.is_some() || mouse.kind == MouseEventKind::Down(MouseButton::Right) {
                    self.focus = Focus::Results;
                    if let Some(record) = panel.on_right_click(row) {
                        log::debug!("[tui] row_picked: uri={}", record.uri);
                    }
                }
            }
            MouseEventKind::ScrollUp => self.navigate(panel, -1),
            MouseEventKind::ScrollDown => self.navigate(panel, 1),
            _ => {}
        }
    }

    fn navigate(&mut self, panel: &mut PanelController, delta: isize) {
        match self.focus {
            Focus::Sites => {
                let names: Vec<String> = panel.registry().names().into_iter().map(String::from).collect();
                if names.is_empty() {
                    return;
                }
                let current = panel.selected_site()
                    .and_then(|selected| names.iter().position(|n| n == selected))
                    .unwrap_or(0);
                let next = current.saturating_add_signed(delta).min(names.len() - 1);
                panel.on_site_selected(&names[next]);
            }
            Focus::Results => {
                let records = panel.log().snapshot();
                panel.surface_mut().move_selection(&records, delta);
            }
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Check if the application should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Set the quit flag
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal after TUI mode
pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
