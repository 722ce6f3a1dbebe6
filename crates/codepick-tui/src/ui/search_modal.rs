use codepick_app::LookupSession;
use codepick_core::entry::CatalogMatch;
use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Color;
use ratatui::text::Line;
use ratatui::widgets::{Clear, Paragraph, Row, Table, TableState};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::centered_rect;
use crate::keymap;
use crate::theme;
use crate::ui::loading::LoadingState;
use crate::ui::text::{clip, compact_hint, focus_line, key_hint_height, key_hint_paragraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SearchSignal {
    Continue,
    Close,
    Pick(CatalogMatch),
}

/// Catalog search popup. Every edit of the query starts a new lookup; the
/// session drops results for queries that were superseded meanwhile.
pub(crate) struct SearchModal {
    input: Input,
    session: LookupSession,
    selected: usize,
}

impl SearchModal {
    pub(crate) fn open(mut session: LookupSession) -> Self {
        session.submit("");
        Self {
            input: Input::default(),
            session,
            selected: 0,
        }
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> SearchSignal {
        if keymap::is_back(key) {
            return SearchSignal::Close;
        }

        match key.code {
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                return SearchSignal::Continue;
            }
            KeyCode::Down => {
                if self.selected + 1 < self.matches().len() {
                    self.selected += 1;
                }
                return SearchSignal::Continue;
            }
            _ => {}
        }

        if keymap::is_confirm(key) {
            return match self.matches().get(self.selected) {
                Some(found) => SearchSignal::Pick(found.clone()),
                None => SearchSignal::Continue,
            };
        }

        let before = self.input.value().to_string();
        if self.input.handle_event(&Event::Key(key)).is_some() && self.input.value() != before {
            self.session.submit(self.input.value());
            self.selected = 0;
        }

        SearchSignal::Continue
    }

    /// Drains the lookup worker. Returns true when results changed.
    pub(crate) fn on_tick(&mut self) -> bool {
        if !self.session.poll() {
            return false;
        }

        let len = self.matches().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        true
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub(crate) fn query(&self) -> &str {
        self.input.value()
    }

    fn matches(&self) -> &[CatalogMatch] {
        &self.session.outcome().matches
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>, loading: &LoadingState) {
        let area = centered_rect(80, 70, frame.area());
        let key_text = compact_hint(
            area.width,
            "Type: search    Up/Down: move    Enter: add code    Esc: close",
            "Type: search    Up/Down    Enter: add    Esc: close",
            "Up/Down | Enter add | Esc",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let [query_area, status_area, results_area, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(4),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        frame.render_widget(Clear, area);
        self.render_query(frame, query_area);

        let status = if self.session.is_loading() {
            loading.line("Searching catalog")
        } else if let Some(error) = self.session.outcome().error.as_deref() {
            Line::styled(format!("Search failed: {error}"), theme::error_prompt())
        } else {
            Line::styled(
                format!("{} matches", self.matches().len()),
                theme::secondary_text(),
            )
        };
        frame.render_widget(Paragraph::new(status), status_area);

        self.render_results(frame, results_area);
        frame.render_widget(
            key_hint_paragraph(key_text).block(theme::key_block()),
            footer,
        );
    }

    fn render_query(&self, frame: &mut Frame<'_>, area: Rect) {
        let width = area.width.saturating_sub(2) as usize;
        let scroll = self.input.visual_scroll(width);
        let paragraph = Paragraph::new(self.input.value())
            .scroll((0, scroll as u16))
            .block(theme::chrome(focus_line("Search catalog")));
        frame.render_widget(paragraph, area);

        if width == 0 {
            return;
        }
        let relative = self
            .input
            .visual_cursor()
            .saturating_sub(scroll)
            .min(width.saturating_sub(1));
        frame.set_cursor_position((area.x + 1 + relative as u16, area.y + 1));
    }

    fn render_results(&self, frame: &mut Frame<'_>, area: Rect) {
        if self.matches().is_empty() {
            let message = if self.session.is_loading() {
                ""
            } else {
                "No matching codes."
            };
            frame.render_widget(
                Paragraph::new(message).block(theme::chrome("Matches")),
                area,
            );
            return;
        }

        let description_width = area.width.saturating_sub(40).max(8) as usize;
        let rows = self.matches().iter().map(|found| {
            Row::new(vec![
                found.code.clone(),
                clip(&found.name, 28),
                clip(
                    found.description.as_deref().unwrap_or_default(),
                    description_width,
                ),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Length(28),
                Constraint::Min(8),
            ],
        )
        .header(Row::new(["Code", "Name", "Description"]).style(theme::table_header(Color::Cyan)))
        .block(theme::chrome("Matches"))
        .row_highlight_style(theme::table_highlight(Color::Cyan))
        .highlight_symbol(">> ");

        let mut state = TableState::new();
        state.select(Some(self.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }
}
