mod keymap;
mod review_flow;
#[cfg(test)]
mod test_support;
mod theme;
mod ui;

use std::io::{Stdout, stdout};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use codepick_app::App;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use review_flow::ReviewScreen;

use crate::ui::modal::{MessageKind, render_message_modal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiExit {
    Submitted,
    Closed,
    Canceled,
}

pub(crate) struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub(crate) fn enter() -> Result<Self> {
        let terminal = enter_with_ops(&mut CrosstermOps)?;
        Ok(Self { terminal })
    }

    pub(crate) fn draw<F>(&mut self, draw_fn: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame<'_>),
    {
        self.terminal
            .draw(draw_fn)
            .context("failed to render terminal")?;
        Ok(())
    }

    pub(crate) fn autoresize(&mut self) -> Result<()> {
        self.terminal
            .autoresize()
            .context("failed to autoresize terminal")?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = teardown(&mut CrosstermOps, &SETUP_ORDER);
    }
}

/// Terminal modes switched on before the review screen draws, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupStep {
    RawMode,
    AltScreen,
    MouseCapture,
}

const SETUP_ORDER: [SetupStep; 3] = [
    SetupStep::RawMode,
    SetupStep::AltScreen,
    SetupStep::MouseCapture,
];

impl SetupStep {
    fn label(self) -> &'static str {
        match self {
            Self::RawMode => "raw mode",
            Self::AltScreen => "alternate screen",
            Self::MouseCapture => "mouse capture",
        }
    }
}

trait TerminalOps {
    type Terminal;

    fn enable(&mut self, step: SetupStep) -> Result<()>;
    fn disable(&mut self, step: SetupStep) -> Result<()>;
    fn create_terminal(&mut self) -> Result<Self::Terminal>;
}

struct CrosstermOps;

impl TerminalOps for CrosstermOps {
    type Terminal = Terminal<CrosstermBackend<Stdout>>;

    fn enable(&mut self, step: SetupStep) -> Result<()> {
        let mut out = stdout();
        match step {
            SetupStep::RawMode => enable_raw_mode()?,
            SetupStep::AltScreen => execute!(out, EnterAlternateScreen, Hide)?,
            SetupStep::MouseCapture => execute!(out, EnableMouseCapture)?,
        }
        Ok(())
    }

    fn disable(&mut self, step: SetupStep) -> Result<()> {
        let mut out = stdout();
        match step {
            SetupStep::RawMode => disable_raw_mode()?,
            SetupStep::AltScreen => execute!(out, Show, LeaveAlternateScreen)?,
            SetupStep::MouseCapture => execute!(out, DisableMouseCapture)?,
        }
        Ok(())
    }

    fn create_terminal(&mut self) -> Result<Self::Terminal> {
        Terminal::new(CrosstermBackend::new(stdout())).context("failed to create terminal backend")
    }
}

/// Enables every step, then builds the terminal. On failure the steps that
/// already succeeded are undone in reverse order.
fn enter_with_ops<O: TerminalOps>(ops: &mut O) -> Result<O::Terminal> {
    for (done, step) in SETUP_ORDER.iter().enumerate() {
        if let Err(error) = ops.enable(*step) {
            let error = error.context(format!("failed to enable {}", step.label()));
            return Err(with_rollback(ops, &SETUP_ORDER[..done], error));
        }
    }

    ops.create_terminal()
        .map_err(|error| with_rollback(ops, &SETUP_ORDER, error))
}

fn with_rollback<O: TerminalOps>(
    ops: &mut O,
    enabled: &[SetupStep],
    setup_error: anyhow::Error,
) -> anyhow::Error {
    match teardown(ops, enabled) {
        Some(cleanup_error) => {
            anyhow!("{setup_error:#}\nterminal rollback cleanup failed: {cleanup_error:#}")
        }
        None => setup_error,
    }
}

/// Disables `enabled` in reverse. Every step is attempted even after a
/// failure.
fn teardown<O: TerminalOps>(ops: &mut O, enabled: &[SetupStep]) -> Option<anyhow::Error> {
    let failures = enabled
        .iter()
        .rev()
        .filter_map(|step| {
            ops.disable(*step)
                .err()
                .map(|error| format!("failed to disable {}: {error:#}", step.label()))
        })
        .collect::<Vec<_>>();

    if failures.is_empty() {
        None
    } else {
        Some(anyhow!(failures.join("\n")))
    }
}

pub(crate) fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainReason {
    Timeout,
    AfterInput,
}

trait TickTarget {
    fn on_tick(&mut self);
    fn should_drain_after_input(&self) -> bool;
}

impl TickTarget for ReviewScreen {
    fn on_tick(&mut self) {
        ReviewScreen::on_tick(self);
    }

    fn should_drain_after_input(&self) -> bool {
        ReviewScreen::should_drain_after_input(self)
    }
}

/// Drains background workers on every idle tick, and after input only while
/// something is in flight so a busy keyboard cannot starve a result.
fn drain_workers<T: TickTarget>(target: &mut T, reason: DrainReason) -> bool {
    if reason == DrainReason::AfterInput && !target.should_drain_after_input() {
        return false;
    }

    target.on_tick();
    true
}

/// Runs the interactive review screen for the report at `report_path` until
/// the selection is submitted or the user leaves.
pub fn run_review(app: &App, report_path: &Path) -> Result<UiExit> {
    let mut screen = ReviewScreen::new(app, report_path)?;
    let mut session = TerminalSession::enter()?;
    let mut global_error: Option<String> = None;
    const TICK_RATE: Duration = Duration::from_millis(120);

    loop {
        session.draw(|frame| {
            screen.render(frame);

            if let Some(message) = global_error.as_deref() {
                render_global_error(frame, message);
            }
        })?;

        let has_event = event::poll(TICK_RATE).context("failed to poll terminal event")?;
        if !has_event {
            drain_workers(&mut screen, DrainReason::Timeout);
            continue;
        }

        let event = event::read().context("failed to read terminal event")?;
        let key = match event {
            Event::Resize(_, _) => {
                session.autoresize()?;
                continue;
            }
            Event::Mouse(mouse) => {
                if global_error.is_none() {
                    screen.on_mouse(mouse);
                    drain_workers(&mut screen, DrainReason::AfterInput);
                }
                continue;
            }
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press) => key,
            _ => continue,
        };

        if is_ctrl_c(key) {
            return Ok(UiExit::Canceled);
        }

        if global_error.is_some() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                global_error = None;
            }
            continue;
        }

        match screen.on_key(key, app) {
            Ok(Some(exit)) => return Ok(exit),
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), "review action failed");
                global_error = Some(format!("{error:#}"));
            }
        }

        drain_workers(&mut screen, DrainReason::AfterInput);
    }
}

fn render_global_error(frame: &mut ratatui::Frame<'_>, message: &str) {
    let text = format!("Operation failed.\n\n{message}");
    render_message_modal(frame, MessageKind::Error, &text, "Enter/Esc: continue");
}

pub(crate) fn centered_rect(
    percent_x: u16,
    percent_y: u16,
    area: ratatui::layout::Rect,
) -> ratatui::layout::Rect {
    let pct_x = percent_x.min(100);
    let pct_y = percent_y.min(100);

    let [_, vertical, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .areas(area);
    let [_, horizontal, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .areas(vertical);
    horizontal
}
