mod keys;
mod render;

use std::path::{Path, PathBuf};

use anyhow::Result;
use codepick_app::{App, GenerationSession, GenerationUpdate, LookupSession, load_report};
use codepick_core::selection::{SelectionStore, StoreOutcome};
use codepick_core::submission::SubmissionReceipt;
use crossterm::event::{KeyEvent, MouseEvent, MouseEventKind};

use crate::UiExit;
use crate::ui::binary_choice::BinaryChoice;
use crate::ui::loading::LoadingState;
use crate::ui::modal::MessageKind;
use crate::ui::search_modal::SearchModal;
use crate::ui::selection_table::clamp_cursor;

const SCROLL_STEP: u16 = 5;

pub(crate) trait ReviewFlowOps {
    fn load_report(&self, path: &Path) -> Result<String>;
    fn submit(&self, report: &str, store: &SelectionStore) -> Result<SubmissionReceipt>;
    fn generation_session(&self) -> GenerationSession;
    fn lookup_session(&self) -> LookupSession;
}

impl ReviewFlowOps for App {
    fn load_report(&self, path: &Path) -> Result<String> {
        load_report(path)
    }

    fn submit(&self, report: &str, store: &SelectionStore) -> Result<SubmissionReceipt> {
        App::submit(self, report, store)
    }

    fn generation_session(&self) -> GenerationSession {
        App::generation_session(self)
    }

    fn lookup_session(&self) -> LookupSession {
        App::lookup_session(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowSignal {
    Continue,
    Exit(UiExit),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FlowMessage {
    kind: MessageKind,
    text: String,
}

pub(crate) struct ReviewScreen {
    flow: ReviewFlow,
}

impl ReviewScreen {
    pub(crate) fn new(app: &App, report_path: &Path) -> Result<Self> {
        Ok(Self {
            flow: ReviewFlow::new(app, report_path)?,
        })
    }

    pub(crate) fn render(&self, frame: &mut ratatui::Frame<'_>) {
        self.flow.render(frame);
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent, app: &App) -> Result<Option<UiExit>> {
        match self.flow.on_key(key, app)? {
            FlowSignal::Continue => Ok(None),
            FlowSignal::Exit(exit) => Ok(Some(exit)),
        }
    }

    pub(crate) fn on_tick(&mut self) {
        self.flow.on_tick();
    }

    pub(crate) fn on_mouse(&mut self, mouse: MouseEvent) {
        self.flow.on_mouse(mouse);
    }

    pub(crate) fn should_drain_after_input(&self) -> bool {
        self.flow.should_drain_after_input()
    }
}

struct ReviewFlow {
    report_path: PathBuf,
    report: String,
    store: SelectionStore,
    generation: GenerationSession,
    cursor: usize,
    report_scroll: u16,
    search: Option<SearchModal>,
    confirm_submit: Option<BinaryChoice>,
    message: Option<FlowMessage>,
    exit_after_message: bool,
    status: Option<String>,
    loading: LoadingState,
}

impl ReviewFlow {
    fn new(ops: &dyn ReviewFlowOps, report_path: &Path) -> Result<Self> {
        let report = ops.load_report(report_path)?;
        Ok(Self {
            report_path: report_path.to_path_buf(),
            report,
            store: SelectionStore::new(),
            generation: ops.generation_session(),
            cursor: 0,
            report_scroll: 0,
            search: None,
            confirm_submit: None,
            message: None,
            exit_after_message: false,
            status: None,
            loading: LoadingState::default(),
        })
    }

    fn selected_code(&self) -> Option<String> {
        self.store
            .entries()
            .get(self.cursor)
            .map(|entry| entry.code().to_string())
    }

    fn show(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.message = Some(FlowMessage {
            kind,
            text: text.into(),
        });
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    /// Reports an ignored store operation on the status line.
    fn note_outcome(&mut self, code: &str, outcome: StoreOutcome, applied: &str) {
        match outcome {
            StoreOutcome::Applied => self.set_status(format!("{code}: {applied}")),
            StoreOutcome::Ignored(reason) => {
                tracing::debug!(code, %reason, "selection edit ignored");
                self.set_status(format!("{code}: {reason}"));
            }
        }
        self.cursor = clamp_cursor(self.cursor, self.store.len());
    }

    fn scroll_report(&mut self, up: bool) {
        let max = u16::try_from(self.report.lines().count()).unwrap_or(u16::MAX);
        self.report_scroll = if up {
            self.report_scroll.saturating_sub(SCROLL_STEP)
        } else {
            self.report_scroll.saturating_add(SCROLL_STEP).min(max)
        };
    }

    fn should_drain_after_input(&self) -> bool {
        self.generation.is_running()
            || self.search.as_ref().is_some_and(SearchModal::is_loading)
    }

    fn on_tick(&mut self) {
        self.loading.next_frame();

        if let Some(search) = &mut self.search {
            search.on_tick();
        }

        match self.generation.poll(&mut self.store) {
            Some(GenerationUpdate::Succeeded { merged, .. }) => {
                let mut status = format!("Merged {} suggested codes", merged.appended);
                if merged.skipped_duplicates > 0 {
                    status.push_str(&format!(
                        " ({} already selected)",
                        merged.skipped_duplicates
                    ));
                }
                self.set_status(status);
            }
            Some(GenerationUpdate::Failed { message, .. }) => {
                self.status = None;
                self.show(
                    MessageKind::Error,
                    format!("Code generation failed.\n\n{message}"),
                );
            }
            Some(GenerationUpdate::Stale { .. }) | None => {}
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if self.search.is_some() || self.message.is_some() {
            return;
        }

        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_report(true),
            MouseEventKind::ScrollDown => self.scroll_report(false),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use anyhow::{Result, anyhow};
    use codepick_app::{GenerationSession, LookupSession};
    use codepick_core::entry::{CandidateCode, CodeEntry, Origin};
    use codepick_core::selection::SelectionStore;
    use codepick_core::submission::{SubmissionReceipt, SubmitError};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::{FlowSignal, ReviewFlow, ReviewFlowOps};
    use crate::UiExit;
    use crate::test_support::{ScriptedLookup, ScriptedRunner};
    use crate::ui::modal::MessageKind;

    struct FakeOps {
        report: RefCell<String>,
        runner: Arc<ScriptedRunner>,
        lookup: Arc<ScriptedLookup>,
        submitted: RefCell<Vec<Vec<CodeEntry>>>,
        fail_submit: bool,
    }

    impl FakeOps {
        fn new(report: &str) -> Self {
            Self {
                report: RefCell::new(report.to_string()),
                runner: Arc::new(ScriptedRunner::default()),
                lookup: Arc::new(ScriptedLookup::default()),
                submitted: RefCell::new(Vec::new()),
                fail_submit: false,
            }
        }
    }

    impl ReviewFlowOps for FakeOps {
        fn load_report(&self, _path: &Path) -> Result<String> {
            Ok(self.report.borrow().clone())
        }

        fn submit(&self, _report: &str, store: &SelectionStore) -> Result<SubmissionReceipt> {
            if store.is_empty() {
                return Err(SubmitError::EmptySelection.into());
            }
            if self.fail_submit {
                return Err(anyhow!("output directory is read-only"));
            }
            self.submitted.borrow_mut().push(store.snapshot());
            Ok(SubmissionReceipt::Written(PathBuf::from(
                "/tmp/out/20261016T101500000Z.json",
            )))
        }

        fn generation_session(&self) -> GenerationSession {
            GenerationSession::new(self.runner.clone())
        }

        fn lookup_session(&self) -> LookupSession {
            LookupSession::new(self.lookup.clone(), 20)
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn flow(ops: &FakeOps) -> ReviewFlow {
        ReviewFlow::new(ops, Path::new("/tmp/report.txt")).expect("flow")
    }

    fn press(flow: &mut ReviewFlow, ops: &FakeOps, code: KeyCode) -> FlowSignal {
        flow.on_key(key(code), ops).expect("key")
    }

    fn codes(flow: &ReviewFlow) -> Vec<(String, u32, Origin)> {
        flow.store
            .entries()
            .iter()
            .map(|entry| (entry.code().to_string(), entry.quantity(), entry.origin()))
            .collect()
    }

    fn message_kind(flow: &ReviewFlow) -> Option<MessageKind> {
        flow.message.as_ref().map(|message| message.kind)
    }

    fn render_output(flow: &ReviewFlow, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal
            .draw(|frame| flow.render(frame))
            .expect("render review flow");
        format!("{}", terminal.backend())
    }

    #[test]
    fn blank_report_refuses_generation() {
        let ops = FakeOps::new("   \n");
        let mut flow = flow(&ops);

        press(&mut flow, &ops, KeyCode::Char('g'));

        assert_eq!(message_kind(&flow), Some(MessageKind::Notice));
        assert!(!flow.generation.is_running());
        assert!(ops.runner.reports().is_empty());
    }

    #[test]
    fn generation_result_merges_after_manual_edits() {
        let ops = FakeOps::new("Chest pain, ECG performed.");
        let mut flow = flow(&ops);

        press(&mut flow, &ops, KeyCode::Char('g'));
        assert!(flow.should_drain_after_input());
        flow.store.add(CodeEntry::user_added("M1", "Manual", None));

        ops.runner.finish(
            1,
            Ok(vec![CandidateCode::new("A1"), CandidateCode::new("M1")]),
        );
        flow.on_tick();

        assert_eq!(
            codes(&flow),
            vec![
                ("M1".to_string(), 1, Origin::UserAdded),
                ("A1".to_string(), 1, Origin::AiSuggested),
            ]
        );
        assert_eq!(
            flow.status.as_deref(),
            Some("Merged 1 suggested codes (1 already selected)")
        );
        assert_eq!(ops.runner.reports(), vec!["Chest pain, ECG performed.".to_string()]);
    }

    #[test]
    fn canceled_generation_never_merges() {
        let ops = FakeOps::new("report");
        let mut flow = flow(&ops);

        press(&mut flow, &ops, KeyCode::Char('g'));
        press(&mut flow, &ops, KeyCode::Char('x'));
        assert_eq!(flow.status.as_deref(), Some("Generation canceled"));
        assert!(ops.runner.is_canceled(1));

        ops.runner.finish(1, Ok(vec![CandidateCode::new("A1")]));
        flow.on_tick();

        assert!(flow.store.is_empty());
        assert!(flow.message.is_none());
    }

    #[test]
    fn restarting_generation_drops_superseded_result() {
        let ops = FakeOps::new("report");
        let mut flow = flow(&ops);

        press(&mut flow, &ops, KeyCode::Char('g'));
        press(&mut flow, &ops, KeyCode::Char('g'));
        assert_eq!(ops.runner.tokens(), vec![1, 2]);

        ops.runner.finish(1, Ok(vec![CandidateCode::new("OLD")]));
        ops.runner.finish(2, Ok(vec![CandidateCode::new("NEW")]));
        flow.on_tick();

        assert_eq!(codes(&flow), vec![("NEW".to_string(), 1, Origin::AiSuggested)]);
    }

    #[test]
    fn generation_failure_opens_error_and_keeps_store() {
        let ops = FakeOps::new("report");
        let mut flow = flow(&ops);
        flow.store.add(CodeEntry::user_added("M1", "Manual", None));

        press(&mut flow, &ops, KeyCode::Char('g'));
        ops.runner.finish(1, Err("engine returned 502".to_string()));
        flow.on_tick();

        assert_eq!(message_kind(&flow), Some(MessageKind::Error));
        assert!(
            flow.message
                .as_ref()
                .is_some_and(|message| message.text.contains("engine returned 502"))
        );
        assert_eq!(flow.store.len(), 1);

        assert_eq!(press(&mut flow, &ops, KeyCode::Enter), FlowSignal::Continue);
        assert!(flow.message.is_none());
    }

    #[test]
    fn quantity_keys_respect_floor() {
        let ops = FakeOps::new("report");
        let mut flow = flow(&ops);
        flow.store.add(CodeEntry::user_added("A1", "Visit", None));

        press(&mut flow, &ops, KeyCode::Char('+'));
        press(&mut flow, &ops, KeyCode::Char('+'));
        assert_eq!(codes(&flow)[0].1, 3);

        press(&mut flow, &ops, KeyCode::Char('-'));
        press(&mut flow, &ops, KeyCode::Char('-'));
        press(&mut flow, &ops, KeyCode::Char('-'));
        assert_eq!(codes(&flow)[0].1, 1);
        assert_eq!(
            flow.status.as_deref(),
            Some("A1: quantity cannot go below 1")
        );
        assert_eq!(codes(&flow)[0].2, Origin::UserAdded);
    }

    #[test]
    fn toggle_and_remove_clamp_cursor() {
        let ops = FakeOps::new("report");
        let mut flow = flow(&ops);
        for code in ["A1", "A2", "A3"] {
            flow.store.add(CodeEntry::user_added(code, code, None));
        }

        press(&mut flow, &ops, KeyCode::Char('j'));
        press(&mut flow, &ops, KeyCode::Char('j'));
        press(&mut flow, &ops, KeyCode::Char('j'));
        assert_eq!(flow.cursor, 2);

        press(&mut flow, &ops, KeyCode::Char(' '));
        assert_eq!(flow.store.len(), 2);
        assert_eq!(flow.cursor, 1);
        assert_eq!(flow.status.as_deref(), Some("A3: deselected"));

        press(&mut flow, &ops, KeyCode::Char('k'));
        press(&mut flow, &ops, KeyCode::Char('d'));
        assert_eq!(codes(&flow), vec![("A2".to_string(), 1, Origin::UserAdded)]);
        assert_eq!(flow.cursor, 0);

        press(&mut flow, &ops, KeyCode::Char('d'));
        press(&mut flow, &ops, KeyCode::Char('d'));
        assert!(flow.store.is_empty());
        assert_eq!(flow.cursor, 0);
    }

    #[test]
    fn search_pick_adds_manual_entry_and_reports_duplicate() {
        let ops = FakeOps::new("report");
        let mut flow = flow(&ops);

        press(&mut flow, &ops, KeyCode::Char('/'));
        assert!(flow.search.is_some());
        ops.lookup.answer_last(&["B7"]);
        flow.on_tick();
        press(&mut flow, &ops, KeyCode::Enter);

        assert!(flow.search.is_none());
        assert_eq!(codes(&flow), vec![("B7".to_string(), 1, Origin::UserAdded)]);
        assert_eq!(flow.status.as_deref(), Some("B7: added"));

        press(&mut flow, &ops, KeyCode::Char('/'));
        ops.lookup.answer_last(&["B7"]);
        flow.on_tick();
        press(&mut flow, &ops, KeyCode::Enter);

        assert_eq!(flow.store.len(), 1);
        assert_eq!(
            flow.status.as_deref(),
            Some("B7: code is already selected")
        );
    }

    #[test]
    fn keys_typed_in_search_do_not_edit_selection() {
        let ops = FakeOps::new("report");
        let mut flow = flow(&ops);
        flow.store.add(CodeEntry::user_added("A1", "Visit", None));

        press(&mut flow, &ops, KeyCode::Char('/'));
        press(&mut flow, &ops, KeyCode::Char('d'));
        press(&mut flow, &ops, KeyCode::Char('q'));

        assert_eq!(flow.store.len(), 1);
        assert_eq!(ops.lookup.queries(), vec!["", "d", "dq"]);

        press(&mut flow, &ops, KeyCode::Esc);
        assert!(flow.search.is_none());
    }

    #[test]
    fn submit_requires_entries_and_confirmation() {
        let ops = FakeOps::new("report");
        let mut flow = flow(&ops);

        press(&mut flow, &ops, KeyCode::Char('s'));
        assert_eq!(message_kind(&flow), Some(MessageKind::Notice));
        assert!(flow.confirm_submit.is_none());
        press(&mut flow, &ops, KeyCode::Esc);

        flow.store.add(CodeEntry::user_added("A1", "Visit", None));
        press(&mut flow, &ops, KeyCode::Char('s'));
        assert!(flow.confirm_submit.is_some());

        press(&mut flow, &ops, KeyCode::Enter);
        assert!(flow.confirm_submit.is_none());
        assert!(ops.submitted.borrow().is_empty());

        press(&mut flow, &ops, KeyCode::Char('s'));
        press(&mut flow, &ops, KeyCode::Char('y'));
        assert_eq!(ops.submitted.borrow().len(), 1);
        assert_eq!(message_kind(&flow), Some(MessageKind::Success));
        assert!(
            flow.message
                .as_ref()
                .is_some_and(|message| message.text.contains("20261016T101500000Z.json"))
        );

        assert_eq!(
            press(&mut flow, &ops, KeyCode::Enter),
            FlowSignal::Exit(UiExit::Submitted)
        );
    }

    #[test]
    fn submit_failure_keeps_selection_open() {
        let mut ops = FakeOps::new("report");
        ops.fail_submit = true;
        let mut flow = flow(&ops);
        flow.store.add(CodeEntry::user_added("A1", "Visit", None));

        press(&mut flow, &ops, KeyCode::Char('s'));
        press(&mut flow, &ops, KeyCode::Char('y'));

        assert_eq!(message_kind(&flow), Some(MessageKind::Error));
        assert_eq!(press(&mut flow, &ops, KeyCode::Esc), FlowSignal::Continue);
        assert_eq!(flow.store.len(), 1);
    }

    #[test]
    fn reload_picks_up_edited_report() {
        let ops = FakeOps::new("");
        let mut flow = flow(&ops);
        flow.report_scroll = 10;

        *ops.report.borrow_mut() = "Follow-up visit.".to_string();
        press(&mut flow, &ops, KeyCode::Char('r'));

        assert_eq!(flow.report, "Follow-up visit.");
        assert_eq!(flow.report_scroll, 0);

        press(&mut flow, &ops, KeyCode::Char('g'));
        assert_eq!(ops.runner.reports(), vec!["Follow-up visit.".to_string()]);
    }

    #[test]
    fn report_scroll_follows_page_keys_and_wheel() {
        let ops = FakeOps::new(&"line\n".repeat(12));
        let mut flow = flow(&ops);

        press(&mut flow, &ops, KeyCode::PageDown);
        press(&mut flow, &ops, KeyCode::PageDown);
        press(&mut flow, &ops, KeyCode::PageDown);
        assert_eq!(flow.report_scroll, 12);

        flow.on_mouse(MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(flow.report_scroll, 7);

        press(&mut flow, &ops, KeyCode::PageUp);
        press(&mut flow, &ops, KeyCode::PageUp);
        assert_eq!(flow.report_scroll, 0);
    }

    #[test]
    fn quit_cancels_running_generation() {
        let ops = FakeOps::new("report");
        let mut flow = flow(&ops);

        press(&mut flow, &ops, KeyCode::Char('g'));
        assert_eq!(
            press(&mut flow, &ops, KeyCode::Char('q')),
            FlowSignal::Exit(UiExit::Closed)
        );
        assert!(ops.runner.is_canceled(1));
    }

    #[test]
    fn render_shows_report_selection_and_hints() {
        let ops = FakeOps::new("Patient presents with chest pain.");
        let mut flow = flow(&ops);
        flow.store.add(
            CodeEntry::user_added("09543", "Signal exam", None).with_quantity(2),
        );
        press(&mut flow, &ops, KeyCode::Char('g'));

        let output = render_output(&flow, 140, 30);

        assert!(output.contains("/tmp/report.txt"));
        assert!(output.contains("Generating codes"));
        assert!(output.contains("Patient presents with chest pain."));
        assert!(output.contains("Selection (1 codes, 2 units)"));
        assert!(output.contains("Signal exam"));
        assert!(output.contains("g: generate"));
    }

    #[test]
    fn render_narrow_terminal_stacks_panes() {
        let ops = FakeOps::new("");
        let flow = flow(&ops);

        let output = render_output(&flow, 60, 30);

        assert!(output.contains("(report is empty)"));
        assert!(output.contains("No codes selected."));
        assert!(output.contains("g gen"));
    }
}
