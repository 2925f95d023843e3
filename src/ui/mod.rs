//! Terminal dashboard
//!
//! Single-threaded polling loop: tick the engine, draw, then wait for
//! input with a bounded timeout so the loop resumes on the next tick
//! even with no keys pressed. The registry and profile are only ever
//! touched from this loop.

mod draw;

use std::time::Instant;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::activity::ActivityLog;
use crate::classify::SandboxClassifier;
use crate::config::WatchConfig;
use crate::engine::{Engine, TickReport};
use crate::error::Result;
use crate::launch;
use crate::limits::{LimitEdit, LimitPolicy, Mode};
use crate::snapshot::SystemSource;

/// Which edit-prompt field is being filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditField {
    CpuTime,
    RamMb,
    MaxProcesses,
    MaxOpenFiles,
}

impl EditField {
    fn label(self) -> &'static str {
        match self {
            EditField::CpuTime => "CPU Time (s; empty=unlimited): ",
            EditField::RamMb => "RAM (MB; empty=unlimited): ",
            EditField::MaxProcesses => "Max processes (empty=unlimited): ",
            EditField::MaxOpenFiles => "Max open files (empty=unlimited): ",
        }
    }

    fn next(self) -> Option<EditField> {
        match self {
            EditField::CpuTime => Some(EditField::RamMb),
            EditField::RamMb => Some(EditField::MaxProcesses),
            EditField::MaxProcesses => Some(EditField::MaxOpenFiles),
            EditField::MaxOpenFiles => None,
        }
    }
}

/// In-progress limit edit driven by the prompt overlay
struct EditState {
    field: EditField,
    buffer: String,
    pending: LimitEdit,
}

impl EditState {
    fn new() -> Self {
        Self {
            field: EditField::CpuTime,
            buffer: String::new(),
            pending: LimitEdit::default(),
        }
    }

    /// Commit the current buffer and advance; returns the finished edit
    /// after the last field. Non-numeric input falls back to unbounded.
    fn commit_field(&mut self) -> Option<LimitEdit> {
        let value = LimitEdit::parse_field(&self.buffer);
        match self.field {
            EditField::CpuTime => self.pending.cpu_time_secs = value,
            EditField::RamMb => self.pending.ram_mb = value,
            EditField::MaxProcesses => self.pending.max_processes = value.map(|v| v as usize),
            EditField::MaxOpenFiles => self.pending.max_open_files = value,
        }
        self.buffer.clear();
        match self.field.next() {
            Some(next) => {
                self.field = next;
                None
            }
            None => Some(self.pending.clone()),
        }
    }
}

/// Everything the dashboard carries between ticks
pub struct App {
    pub(crate) engine: Engine<SystemSource>,
    pub(crate) config: WatchConfig,
    pub(crate) report: TickReport,
    pub(crate) scroll: usize,
    /// Log pane height recorded by the last draw, for the scroll clamp
    pub(crate) log_visible: usize,
    pub(crate) started: Instant,
    edit: Option<EditState>,
    quit: bool,
}

impl App {
    fn new(config: WatchConfig, initial_mode: Mode) -> Self {
        let classifier = SandboxClassifier::new(&config.project_dir);
        let mut log = ActivityLog::with_sink(config.log_capacity, &config.log_file);
        log.info("UI started");
        let engine = Engine::new(
            SystemSource::new(),
            classifier,
            LimitPolicy::new(initial_mode),
            log,
        );
        Self {
            engine,
            config,
            report: TickReport::default(),
            scroll: 0,
            log_visible: 0,
            started: Instant::now(),
            edit: None,
            quit: false,
        }
    }

    /// Prompt line for the limits box while an edit is in progress
    pub(crate) fn edit_prompt(&self) -> Option<String> {
        self.edit
            .as_ref()
            .map(|e| format!("{}{}", e.field.label(), e.buffer))
    }

    fn run_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> Result<()> {
        while !self.quit {
            let tick_started = Instant::now();
            self.report = self.engine.tick();
            terminal.draw(|frame| draw::draw(frame, self))?;
            self.poll_input(tick_started)?;
        }
        Ok(())
    }

    /// Block on input for at most the remainder of the tick interval
    fn poll_input(&mut self, tick_started: Instant) -> Result<()> {
        loop {
            let elapsed = tick_started.elapsed();
            let Some(remaining) = self.config.tick.checked_sub(elapsed) else {
                return Ok(());
            };
            if !event::poll(remaining)? {
                return Ok(());
            }
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
            if self.quit {
                return Ok(());
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        if self.edit.is_some() {
            self.handle_edit_key(code);
            return;
        }
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let mode = self.engine.policy().mode();
                launch::launch_sandbox(&self.config, mode, self.engine.log_mut());
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.engine.cycle_mode();
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.edit = Some(EditState::new());
            }
            KeyCode::Up => {
                // stop at the oldest full window so Down takes effect
                // immediately afterwards
                let max = self.engine.log().max_scroll(self.log_visible);
                self.scroll = (self.scroll + 1).min(max);
            }
            KeyCode::Down => self.scroll = self.scroll.saturating_sub(1),
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some(edit) = self.edit.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => self.edit = None,
            KeyCode::Enter => {
                if let Some(done) = edit.commit_field() {
                    self.engine.edit_limits(&done);
                    self.edit = None;
                }
            }
            KeyCode::Backspace => {
                edit.buffer.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => edit.buffer.push(c),
            _ => {}
        }
    }
}

/// Run the dashboard until the operator quits
pub fn run(config: WatchConfig, initial_mode: Mode) -> Result<()> {
    let mut app = App::new(config, initial_mode);
    let mut terminal = ratatui::init();
    let result = app.run_loop(&mut terminal);
    ratatui::restore();
    result
}
