use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::style::Color;
use ratatui::text::{Line, Span, Text};

use crate::keymap;
use crate::theme;
use crate::ui::modal::{ModalSpec, render_modal};
use crate::ui::text::compact_hint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BinaryChoice {
    pub(crate) yes_selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryChoiceEvent {
    Continue,
    ConfirmYes,
    ConfirmNo,
    Back,
}

impl BinaryChoice {
    pub(crate) fn new(default_yes: bool) -> Self {
        Self {
            yes_selected: default_yes,
        }
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> BinaryChoiceEvent {
        if keymap::is_back(key) {
            return BinaryChoiceEvent::Back;
        }

        match key.code {
            KeyCode::Char('y') => return BinaryChoiceEvent::ConfirmYes,
            KeyCode::Char('n') => return BinaryChoiceEvent::ConfirmNo,
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.yes_selected = !self.yes_selected;
                return BinaryChoiceEvent::Continue;
            }
            _ => {}
        }

        if keymap::is_toggle(key) {
            self.yes_selected = !self.yes_selected;
            return BinaryChoiceEvent::Continue;
        }

        if keymap::is_confirm(key) {
            if self.yes_selected {
                BinaryChoiceEvent::ConfirmYes
            } else {
                BinaryChoiceEvent::ConfirmNo
            }
        } else {
            BinaryChoiceEvent::Continue
        }
    }

    #[cfg(test)]
    pub(crate) fn selected_label(&self) -> &'static str {
        if self.yes_selected { "Yes" } else { "No" }
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>, title: &str, lines: Vec<Line<'static>>) {
        let key_text = compact_hint(
            frame.area().width,
            "Space/Tab: toggle    Enter: confirm    y/n: answer    Esc: back",
            "Space: toggle    Enter: confirm    Esc: back",
            "Space toggle | Enter | Esc",
        );

        let (yes_style, no_style) = if self.yes_selected {
            (theme::table_highlight(Color::Green), theme::secondary_text())
        } else {
            (theme::secondary_text(), theme::table_highlight(Color::Red))
        };

        let mut body = lines;
        body.push(Line::from(""));
        body.push(Line::from(vec![
            Span::styled(" Yes ", yes_style),
            Span::raw("   "),
            Span::styled(" No ", no_style),
        ]));

        render_modal(
            frame,
            ModalSpec {
                title,
                title_style: Some(theme::focus_prompt()),
                body: Text::from(body),
                key_hint: Some(key_text),
                width_pct: 60,
                height_pct: 40,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::{BinaryChoice, BinaryChoiceEvent};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn space_and_tab_toggle_selection() {
        let mut choice = BinaryChoice::new(true);
        assert_eq!(choice.selected_label(), "Yes");

        assert_eq!(
            choice.on_key(key(KeyCode::Char(' '))),
            BinaryChoiceEvent::Continue
        );
        assert_eq!(choice.selected_label(), "No");

        assert_eq!(choice.on_key(key(KeyCode::Tab)), BinaryChoiceEvent::Continue);
        assert_eq!(choice.selected_label(), "Yes");
    }

    #[test]
    fn enter_confirms_current_selection() {
        let mut choice = BinaryChoice::new(true);
        assert_eq!(
            choice.on_key(key(KeyCode::Enter)),
            BinaryChoiceEvent::ConfirmYes
        );

        let mut choice = BinaryChoice::new(false);
        assert_eq!(
            choice.on_key(key(KeyCode::Enter)),
            BinaryChoiceEvent::ConfirmNo
        );
    }

    #[test]
    fn y_and_n_answer_directly() {
        let mut choice = BinaryChoice::new(false);
        assert_eq!(
            choice.on_key(key(KeyCode::Char('y'))),
            BinaryChoiceEvent::ConfirmYes
        );
        assert_eq!(
            choice.on_key(key(KeyCode::Char('n'))),
            BinaryChoiceEvent::ConfirmNo
        );
    }

    #[test]
    fn esc_returns_back_without_changing_selection() {
        let mut choice = BinaryChoice::new(false);
        assert_eq!(choice.on_key(key(KeyCode::Esc)), BinaryChoiceEvent::Back);
        assert_eq!(choice.selected_label(), "No");
    }
}
