//! Terminal dashboard for live oximeter readings
//!
//! Run with: cargo run --example oximeter_dashboard -- [ADDRESS]
//!
//! ## Keyboard Controls
//!
//! | Key | Action |
//! |-----|--------|
//! | `L` | Start/stop CSV logging |
//! | `F` | Cycle minimum signal strength filter |
//! | `Q/Esc` | Quit |

use berry_oximeter::{BerryOximeter, OximeterReading, ReadingStatus, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use std::collections::VecDeque;
use std::io::{self, stdout, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Pleth samples kept for the waveform (about four seconds).
const WAVEFORM_LEN: usize = 240;

/// Main terminal type alias
type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

struct App {
    oximeter: BerryOximeter,
    readings: broadcast::Receiver<OximeterReading>,
    pleth: VecDeque<u64>,
    latest: Option<OximeterReading>,
    received: u64,
    min_signal: Option<u8>,
    log_file: Option<PathBuf>,
    status: String,
    start_time: Instant,
}

impl App {
    fn new(oximeter: BerryOximeter) -> Self {
        let readings = oximeter.subscribe_readings();
        Self {
            oximeter,
            readings,
            pleth: VecDeque::with_capacity(WAVEFORM_LEN),
            latest: None,
            received: 0,
            min_signal: None,
            log_file: None,
            status: "Connected".to_string(),
            start_time: Instant::now(),
        }
    }

    fn drain_readings(&mut self) {
        loop {
            match self.readings.try_recv() {
                Ok(reading) => {
                    self.received += 1;
                    if self.pleth.len() == WAVEFORM_LEN {
                        self.pleth.pop_front();
                    }
                    self.pleth.push_back(u64::from(reading.pleth.unwrap_or(0)));
                    self.latest = Some(reading);
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }

        if !self.oximeter.is_connected() {
            self.status = "Connection lost".to_string();
        }
    }

    fn toggle_logging(&mut self) {
        if let Some(path) = self.oximeter.stop_logging() {
            self.status = format!("Saved {}", path.display());
            self.log_file = None;
            return;
        }

        match self.oximeter.start_logging(None) {
            Ok(path) => {
                self.status = format!("Logging to {}", path.display());
                self.log_file = Some(path);
            }
            Err(e) => self.status = format!("Logging failed: {}", e),
        }
    }

    fn cycle_filter(&mut self) {
        self.min_signal = match self.min_signal {
            None => Some(1),
            Some(n) if n >= berry_oximeter::MAX_SIGNAL_STRENGTH => None,
            Some(n) => Some(n + 1),
        };

        match self.oximeter.set_filter(self.min_signal) {
            Ok(()) => {
                self.status = match self.min_signal {
                    Some(n) => format!("Filtering readings below signal {}", n),
                    None => "Filter off".to_string(),
                }
            }
            Err(e) => self.status = format!("Filter rejected: {}", e),
        }
    }
}

fn setup_terminal() -> io::Result<Terminal> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(terminal: &mut Terminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn render_ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Gauges
            Constraint::Min(8),    // Waveform
            Constraint::Length(4), // Details
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let elapsed = app.start_time.elapsed().as_secs();
    let header = Paragraph::new(format!(
        " {} ({}) | Readings: {} | Uptime: {:02}:{:02}:{:02}",
        app.oximeter.device_address().unwrap_or_default(),
        app.oximeter.connection_state(),
        app.received,
        elapsed / 3600,
        (elapsed % 3600) / 60,
        elapsed % 60
    ))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" BERRY OXIMETER ")
            .title_alignment(Alignment::Center),
    );
    frame.render_widget(header, chunks[0]);

    let gauges = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let spo2 = app.latest.as_ref().and_then(|r| r.spo2);
    let spo2_color = match spo2 {
        Some(v) if v >= 95 => Color::Green,
        Some(v) if v >= 90 => Color::Yellow,
        Some(_) => Color::Red,
        None => Color::DarkGray,
    };
    let spo2_gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" SpO2 "))
        .gauge_style(Style::default().fg(spo2_color))
        .percent(u16::from(spo2.unwrap_or(0)))
        .label(spo2.map(|v| format!("{}%", v)).unwrap_or_else(|| "---".into()));
    frame.render_widget(spo2_gauge, gauges[0]);

    let pulse = app.latest.as_ref().and_then(|r| r.pulse_rate);
    let pulse_gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Pulse "))
        .gauge_style(Style::default().fg(Color::Magenta))
        .percent(pulse.map(|p| (p.min(250) * 100 / 250) as u16).unwrap_or(0))
        .label(
            pulse
                .map(|v| format!("{} BPM", v))
                .unwrap_or_else(|| "--- BPM".into()),
        );
    frame.render_widget(pulse_gauge, gauges[1]);

    let waveform: Vec<u64> = app.pleth.iter().copied().collect();
    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(" Pleth "))
        .style(Style::default().fg(Color::Cyan))
        .max(100)
        .data(&waveform[..]);
    frame.render_widget(sparkline, chunks[2]);

    let details = match &app.latest {
        Some(reading) => {
            let status_style = if reading.status == ReadingStatus::Reading {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Yellow)
            };
            vec![
                Line::from(vec![
                    Span::raw("Status: "),
                    Span::styled(reading.status.as_str().to_uppercase(), status_style),
                    Span::raw(if reading.pulse_beep { "  ♥" } else { "" }),
                ]),
                Line::from(format!(
                    "Signal: {}/8   Bar: {}   Filter: {}   Log: {}",
                    reading.signal_strength,
                    reading.bar_graph,
                    app.min_signal
                        .map(|n| format!(">= {}", n))
                        .unwrap_or_else(|| "off".into()),
                    app.log_file
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "off".into())
                )),
            ]
        }
        None => vec![Line::from("Waiting for readings...")],
    };
    frame.render_widget(
        Paragraph::new(details).block(Block::default().borders(Borders::ALL)),
        chunks[3],
    );

    let status_bar = Paragraph::new(format!(" {}  |  [L] Log  [F] Filter  [Q] Quit", app.status))
        .style(Style::default().fg(Color::Black).bg(Color::Cyan));
    frame.render_widget(status_bar, chunks[4]);
}

async fn run_app(terminal: &mut Terminal, app: &mut App) -> Result<()> {
    loop {
        app.drain_readings();

        terminal.draw(|frame| render_ui(frame, &*app))?;

        // Yield to the runtime so the notification tasks keep running
        tokio::time::sleep(Duration::from_millis(30)).await;

        if event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => break,
                        KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_logging(),
                        KeyCode::Char('f') | KeyCode::Char('F') => app.cycle_filter(),
                        _ => {}
                    }
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let address = std::env::args().nth(1);

    println!("Connecting to oximeter...");
    let oximeter = BerryOximeter::new();
    oximeter.connect(address.as_deref()).await?;

    let mut app = App::new(oximeter);

    // Setup terminal
    let mut terminal = setup_terminal()?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    let _ = restore_terminal(&mut terminal);

    app.oximeter.close().await?;
    result
}
