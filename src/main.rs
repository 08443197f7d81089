use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};

use nba_sgp::config::{SgpConfig, load_dotenv};
use nba_sgp::logging::init_file_logging;
use nba_sgp::model::Slip;
use nba_sgp::provider::{SourceKind, spawn_provider};
use nba_sgp::ranking::BetProfile;
use nba_sgp::report::{headline, slip_lines};
use nba_sgp::slip::SlipOutcome;
use nba_sgp::state::{AppState, Delta, FormField, ProviderCommand, apply_delta};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(state: AppState, cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        let typing = self.state.focus == FormField::Matchup;
        match key.code {
            KeyCode::Esc => {
                if self.state.help_overlay {
                    self.state.help_overlay = false;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Tab | KeyCode::Down => self.state.focus = self.state.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.state.focus = self.state.focus.prev(),
            KeyCode::Left => self.state.adjust_focused(-1),
            KeyCode::Right => self.state.adjust_focused(1),
            KeyCode::Enter => self.request_build(),
            KeyCode::Backspace => self.state.backspace(),
            KeyCode::Char(c) if typing => self.state.input_char(c),
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('+') | KeyCode::Char('=') => self.state.adjust_focused(1),
            KeyCode::Char('-') => self.state.adjust_focused(-1),
            _ => {}
        }
    }

    fn request_build(&mut self) {
        let Some(req) = self.state.begin_build() else {
            self.state.push_log("[INFO] Build already running");
            return;
        };
        self.state
            .push_log(format!("[INFO] Building {} ({} legs)", req.matchup, req.model.legs));
        if self.cmd_tx.send(ProviderCommand::Build(req)).is_err() {
            apply_delta(
                &mut self.state,
                Delta::BuildFailed("worker thread is gone".to_string()),
            );
        }
    }
}

fn main() -> io::Result<()> {
    load_dotenv();
    let _log_guard = init_file_logging();

    let cfg = SgpConfig::from_env();
    let kind = SourceKind::from_env();
    let state = AppState::new(&cfg, kind.label(cfg.season));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(tx, cmd_rx, kind, cfg);

    let mut app = App::new(state, cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(body[0]);

    render_form(frame, left[0], &app.state);
    render_progress(frame, left[1], &app.state);
    render_logs(frame, left[2], &app.state);
    render_result(frame, body[1], &app.state);

    let footer = Paragraph::new(
        "Tab/↑/↓ Field | ←/→ Adjust | Enter Build | Esc Quit | ? Help",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area);
    }
}

fn header_text(state: &AppState) -> String {
    let line1 = format!("  (o)  NBA SGP BUILDER | {}", state.source_label);
    let line2 = format!(
        "       Last 5 only | minutes gate {}+ all or {} over {} | floor lines | max 1 opposing leg",
        state.model.gate.all_games_min, state.model.gate.heavy_games, state.model.gate.heavy_minutes
    );
    format!("{line1}\n{line2}")
}

fn render_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let field = |label: &str, value: String, focused: bool| -> Line<'static> {
        let style = if focused {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{label:<18}"), Style::default().fg(Color::DarkGray)),
            Span::styled(value, style),
        ])
    };

    let cursor = if state.focus == FormField::Matchup { "_" } else { "" };
    let lines = vec![
        field(
            "Matchup",
            format!("{}{cursor}", state.matchup),
            state.focus == FormField::Matchup,
        ),
        field(
            "Final slip legs",
            format!("< {} >", state.model.legs),
            state.focus == FormField::Legs,
        ),
        field(
            "Players per team",
            format!("< {} >", state.players_per_team),
            state.focus == FormField::PlayersPerTeam,
        ),
        field(
            "Bet profile",
            format!("< {} >", state.model.profile.label()),
            state.focus == FormField::Profile,
        ),
    ];
    let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Build"));
    frame.render_widget(form, area);
}

fn render_progress(frame: &mut Frame, area: Rect, state: &AppState) {
    let label = if state.running {
        format!("{}%  {}", state.progress, state.status)
    } else if state.progress == 100 {
        "Done".to_string()
    } else {
        "Idle".to_string()
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .percent(state.progress.min(100))
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_logs(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = state.logs.len().saturating_sub(visible);
    let lines: Vec<Line> = state
        .logs
        .iter()
        .skip(skip)
        .map(|l| {
            let color = if l.starts_with("[WARN]") {
                Color::Yellow
            } else {
                Color::Gray
            };
            Line::from(Span::styled(l.clone(), Style::default().fg(color)))
        })
        .collect();
    let logs = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log"));
    frame.render_widget(logs, area);
}

fn render_result(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().borders(Borders::ALL).title("Slip");

    if let Some(err) = state.error.as_deref() {
        let p = Paragraph::new(format!("Temporary API issue. Try again shortly.\n\n{err}"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(p, area);
        return;
    }

    let Some(report) = state.report.as_ref() else {
        let hint = if state.running {
            "Crunching the numbers..."
        } else {
            "Enter a matchup like `LAL vs DAL` and press Enter"
        };
        let p = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(p, area);
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    match &report.outcome {
        SlipOutcome::Built {
            final_slip,
            safe_slip,
        } => {
            lines.push(Line::from(Span::styled(
                headline(report),
                Style::default().fg(Color::Green),
            )));
            lines.push(Line::from(""));
            push_slip(&mut lines, "Final Slip", final_slip);
            lines.push(Line::from(""));
            push_slip(&mut lines, "SAFE Slip", safe_slip);
            if report.profile == BetProfile::HigherRisk {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Higher-risk profile: candidate ordering is more aggressive.",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        SlipOutcome::NoQualifyingSlip => {
            let msg = state
                .no_bet_message
                .clone()
                .unwrap_or_else(|| "No qualifying slip".to_string());
            lines.push(Line::from(Span::styled(
                msg,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                headline(report),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    if !state.fetch_failures.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} players skipped (fetch errors)", state.fetch_failures.len()),
            Style::default().fg(Color::Yellow),
        )));
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(p, area);
}

fn push_slip(lines: &mut Vec<Line<'static>>, title: &str, slip: &Slip) {
    lines.push(Line::from(Span::styled(
        title.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for text in slip_lines(slip) {
        lines.push(Line::from(format!("  {text}")));
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup);
    let text = "\
Tab / ↑ / ↓   move between fields
← / → / + / - adjust legs, players, profile
Enter         build a slip for the matchup
Backspace     edit the matchup text
?             toggle this help
Esc           quit (q too, outside the matchup field)

Players need 5 recent games and steady minutes.
Lines are the worst of the last 5, minus 10%.
REB/AST first, then PRA, PTS last.
At most one leg comes from the weaker side.";
    let help = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: false });
    frame.render_widget(help, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
