use anyhow::Result;
use codepick_core::entry::CodeEntry;
use codepick_core::submission::{SubmissionReceipt, SubmitError};
use crossterm::event::KeyEvent;

use crate::UiExit;
use crate::keymap;
use crate::ui::binary_choice::{BinaryChoice, BinaryChoiceEvent};
use crate::ui::modal::MessageKind;
use crate::ui::search_modal::{SearchModal, SearchSignal};

use super::{FlowSignal, ReviewFlow, ReviewFlowOps};

impl ReviewFlow {
    pub(super) fn on_key(&mut self, key: KeyEvent, ops: &dyn ReviewFlowOps) -> Result<FlowSignal> {
        if self.message.is_some() {
            return Ok(self.on_key_message(key));
        }
        if self.confirm_submit.is_some() {
            return Ok(self.on_key_confirm_submit(key, ops));
        }
        if self.search.is_some() {
            self.on_key_search(key);
            return Ok(FlowSignal::Continue);
        }

        self.on_key_main(key, ops)
    }

    fn on_key_message(&mut self, key: KeyEvent) -> FlowSignal {
        if !keymap::is_confirm(key) && !keymap::is_back(key) {
            return FlowSignal::Continue;
        }

        self.message = None;
        if self.exit_after_message {
            return FlowSignal::Exit(UiExit::Submitted);
        }
        FlowSignal::Continue
    }

    fn on_key_confirm_submit(&mut self, key: KeyEvent, ops: &dyn ReviewFlowOps) -> FlowSignal {
        let Some(choice) = &mut self.confirm_submit else {
            return FlowSignal::Continue;
        };

        match choice.on_key(key) {
            BinaryChoiceEvent::Continue => {}
            BinaryChoiceEvent::ConfirmNo | BinaryChoiceEvent::Back => {
                self.confirm_submit = None;
            }
            BinaryChoiceEvent::ConfirmYes => {
                self.confirm_submit = None;
                self.submit(ops);
            }
        }
        FlowSignal::Continue
    }

    fn submit(&mut self, ops: &dyn ReviewFlowOps) {
        match ops.submit(&self.report, &self.store) {
            Ok(receipt) => {
                let mut text = format!(
                    "Submitted {} codes ({} units).",
                    self.store.len(),
                    self.store.total_units()
                );
                if let SubmissionReceipt::Written(path) = receipt {
                    text.push_str(&format!("\n\nWritten to {}", path.display()));
                }
                self.exit_after_message = true;
                self.show(MessageKind::Success, text);
            }
            Err(error)
                if matches!(
                    error.downcast_ref::<SubmitError>(),
                    Some(SubmitError::EmptySelection)
                ) =>
            {
                self.show(
                    MessageKind::Notice,
                    "Select at least one code before submitting.",
                );
            }
            Err(error) => {
                self.show(MessageKind::Error, format!("{error:#}"));
            }
        }
    }

    fn on_key_search(&mut self, key: KeyEvent) {
        let Some(search) = &mut self.search else {
            return;
        };

        match search.on_key(key) {
            SearchSignal::Continue => {}
            SearchSignal::Close => self.search = None,
            SearchSignal::Pick(found) => {
                self.search = None;
                let code = found.code.clone();
                let outcome = self.store.add(CodeEntry::from_match(found));
                if let Some(position) = self.store.position(&code)
                    && outcome.is_applied()
                {
                    self.cursor = position;
                }
                self.note_outcome(&code, outcome, "added");
            }
        }
    }

    fn on_key_main(&mut self, key: KeyEvent, ops: &dyn ReviewFlowOps) -> Result<FlowSignal> {
        if keymap::is_quit(key) || keymap::is_back(key) {
            self.generation.cancel();
            return Ok(FlowSignal::Exit(UiExit::Closed));
        }

        if keymap::is_up(key) {
            self.cursor = self.cursor.saturating_sub(1);
        } else if keymap::is_down(key) {
            if self.cursor + 1 < self.store.len() {
                self.cursor += 1;
            }
        } else if keymap::is_scroll_up(key) {
            self.scroll_report(true);
        } else if keymap::is_scroll_down(key) {
            self.scroll_report(false);
        } else if keymap::is_generate(key) {
            self.start_generation();
        } else if keymap::is_cancel_generation(key) {
            if self.generation.cancel() {
                self.set_status("Generation canceled");
            } else {
                self.set_status("No generation is running");
            }
        } else if keymap::is_search(key) {
            self.search = Some(SearchModal::open(ops.lookup_session()));
        } else if keymap::is_increment(key) {
            if let Some(code) = self.selected_code() {
                let outcome = self.store.increment(&code);
                self.note_outcome(&code, outcome, "quantity increased");
            }
        } else if keymap::is_decrement(key) {
            if let Some(code) = self.selected_code() {
                let outcome = self.store.decrement(&code);
                self.note_outcome(&code, outcome, "quantity decreased");
            }
        } else if keymap::is_toggle(key) {
            if let Some(code) = self.selected_code() {
                let outcome = self.store.toggle(&code);
                self.note_outcome(&code, outcome, "deselected");
            }
        } else if keymap::is_remove(key) {
            if let Some(code) = self.selected_code() {
                let outcome = self.store.remove(self.cursor);
                self.note_outcome(&code, outcome, "removed");
            }
        } else if keymap::is_reload(key) {
            self.report = ops.load_report(&self.report_path)?;
            self.report_scroll = 0;
            self.set_status("Report reloaded");
        } else if keymap::is_submit(key) {
            if self.store.is_empty() {
                self.show(
                    MessageKind::Notice,
                    "Select at least one code before submitting.",
                );
            } else {
                self.confirm_submit = Some(BinaryChoice::new(false));
            }
        }

        Ok(FlowSignal::Continue)
    }

    fn start_generation(&mut self) {
        if self.report.trim().is_empty() {
            self.show(
                MessageKind::Notice,
                "The report is empty. Write the report, then press r to reload it.",
            );
            return;
        }

        let token = self.generation.start(&self.report);
        tracing::debug!(token, "generation requested from review screen");
        self.set_status("Generating codes");
    }
}
