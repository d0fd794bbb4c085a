use std::{
    env, io,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    text::{Line, Span, Text},
    widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use outliner_tui::{
    config::Config,
    cursor::CursorService,
    editor::{Editor, Outcome},
    keys::Chord,
    logging,
    render::{RenderResult, render_outline},
    theme::Theme,
};

const STATUS_TIMEOUT: Duration = Duration::from_secs(6);
const DEFAULT_LOG_FILE: &str = "outliner.log";

fn main() -> Result<()> {
    run()
}

struct Args {
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut config = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let Some(path) = args.next() else {
                    bail!("--config needs a file argument");
                };
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                eprintln!("Usage: outliner [--config <file.json>]");
                std::process::exit(0);
            }
            other => bail!("unexpected argument {other:?}"),
        }
    }
    Ok(Args { config })
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => Config::load_or_default(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let log_file = config
        .log_file
        .clone()
        .unwrap_or_else(|| env::temp_dir().join(DEFAULT_LOG_FILE));
    logging::init(&log_file)?;
    tracing::info!(log_file = %log_file.display(), "outliner starting");

    let mut app = App::new(&config);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("failed to enter alternate screen")?;
    // Chords like ctrl+shift+enter are only distinguishable with the
    // enhanced keyboard protocol.
    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .ok();
    } else {
        tracing::info!("keyboard enhancement not supported by terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags).ok();
    }
    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )
    .ok();
    terminal.show_cursor().ok();
    tracing::info!("outliner stopped");

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while !app.should_quit() {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt);
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

struct App {
    editor: Editor,
    theme: Theme,
    scroll_top: usize,
    last_view_height: usize,
    should_quit: bool,
    status_message: Option<(String, Instant)>,
}

impl App {
    fn new(config: &Config) -> Self {
        Self {
            editor: Editor::with_config(config),
            theme: Theme::new(),
            scroll_top: 0,
            last_view_height: 1,
            should_quit: false,
            status_message: Some(("Ctrl-Q quits".to_string(), Instant::now())),
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(vertical[0]);
        let text_area = horizontal[0];
        let scrollbar_area = horizontal[1];
        let status_area = vertical[1];

        let render = render_outline(
            self.editor.levels(),
            self.editor.caret(),
            text_area.width.max(1) as usize,
            &self.theme,
        );

        let viewport_height = text_area.height as usize;
        self.last_view_height = viewport_height.max(1);
        self.adjust_scroll(&render, viewport_height);

        let visible: Vec<Line<'static>> = render
            .lines
            .iter()
            .skip(self.scroll_top)
            .take(viewport_height)
            .cloned()
            .collect();
        frame.render_widget(Paragraph::new(Text::from(visible)), text_area);

        let mut scrollbar_state = ScrollbarState::new(render.total_lines).position(self.scroll_top);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);

        if let Some(cursor) = render.cursor {
            if cursor.line >= self.scroll_top && cursor.line < self.scroll_top + viewport_height {
                let cursor_y = text_area.y + (cursor.line - self.scroll_top) as u16;
                let cursor_x = text_area.x + cursor.column.min(text_area.width - 1);
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }

        frame.render_widget(Paragraph::new(self.status_line()), status_area);
    }

    fn status_line(&mut self) -> Line<'static> {
        self.prune_status_message();
        let trail = self
            .editor
            .breadcrumbs()
            .iter()
            .map(|level| level.to_string())
            .collect::<Vec<_>>()
            .join(" > ");
        let mut spans = vec![
            Span::styled(format!(" {trail} "), self.theme.breadcrumb_style()),
            Span::styled(
                format!("| levels: {} ", self.editor.levels().len().saturating_sub(1)),
                self.theme.status_bar_style(),
            ),
        ];
        let pending = self.editor.pending_fetches();
        if pending > 0 {
            spans.push(Span::styled(
                format!("| fetching {pending} "),
                self.theme.status_bar_style(),
            ));
        }
        if let Some(selection) = self.editor.cursor().selection() {
            spans.push(Span::styled(
                format!("| selected {} ", selection.chars().count()),
                self.theme.status_bar_style(),
            ));
        }
        if let Some((message, _)) = &self.status_message {
            spans.push(Span::styled(format!("| {message}"), self.theme.report_style()));
        }
        Line::from(spans).style(self.theme.status_bar_style())
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn adjust_scroll(&mut self, render: &RenderResult, viewport_height: usize) {
        let viewport = viewport_height.max(1);
        let max_scroll = render.total_lines.saturating_sub(viewport);
        if let Some(cursor) = &render.cursor {
            if cursor.line < self.scroll_top {
                self.scroll_top = cursor.line;
            } else if cursor.line >= self.scroll_top + viewport {
                self.scroll_top = cursor.line.saturating_add(1).saturating_sub(viewport);
            }
        }
        if self.scroll_top > max_scroll {
            self.scroll_top = max_scroll;
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Paste(text) => {
                self.editor.insert_text(&text);
            }
            _ => {}
        }
        self.collect_reports();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        if self.editor.handle_key_event(&key) == Outcome::Handled {
            return;
        }

        // Keys no command claims get ordinary text editing.
        let typed = Chord::from_key_event(&key).and_then(|chord| chord.typed_char(&key));
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => {
                self.editor.insert_line_break();
            }
            (KeyCode::Backspace, _) => {
                self.editor.delete_backward();
            }
            (KeyCode::Left, m) if m.contains(KeyModifiers::SHIFT) => {
                self.editor.select_left();
            }
            (KeyCode::Right, m) if m.contains(KeyModifiers::SHIFT) => {
                self.editor.select_right();
            }
            (KeyCode::Home, m) if m.contains(KeyModifiers::SHIFT) => {
                self.editor.select_to_line_start();
            }
            (KeyCode::End, m) if m.contains(KeyModifiers::SHIFT) => {
                self.editor.select_to_line_end();
            }
            (KeyCode::Left, _) => {
                self.editor.move_left();
            }
            (KeyCode::Right, _) => {
                self.editor.move_right();
            }
            (KeyCode::Up, _) => {
                self.editor.move_up();
            }
            (KeyCode::Down, _) => {
                self.editor.move_down();
            }
            (KeyCode::PageUp, _) => {
                self.scroll_top = self.scroll_top.saturating_sub(self.last_view_height);
            }
            (KeyCode::PageDown, _) => {
                self.scroll_top += self.last_view_height;
            }
            _ => {
                if let Some(ch) = typed {
                    self.editor.insert_char(ch);
                }
            }
        }
    }

    fn on_tick(&mut self) {
        if self.editor.poll_fetches() > 0 {
            self.collect_reports();
        }
        self.prune_status_message();
    }

    fn collect_reports(&mut self) {
        if let Some(report) = self.editor.take_reports().pop() {
            self.status_message = Some((report.message, Instant::now()));
        }
    }
}
