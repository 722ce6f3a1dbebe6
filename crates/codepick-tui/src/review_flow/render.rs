use codepick_app::{CANCELED_MESSAGE, GenerationState};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Paragraph;

use super::ReviewFlow;
use crate::theme;
use crate::ui::modal::render_message_modal;
use crate::ui::selection_table::{SelectionTableRender, render_selection_table};
use crate::ui::text::{
    clip, compact_hint, focus_line, key_hint_height, key_hint_paragraph, label_value_line,
    wrapped_paragraph,
};

impl ReviewFlow {
    pub(super) fn render(&self, frame: &mut ratatui::Frame<'_>) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "g: generate    x: cancel    /: search    +/-: quantity    Space: deselect    d: remove    r: reload    s: submit    q: quit",
            "g: generate    x: cancel    /: search    +/-: qty    Space/d: remove    s: submit    q: quit",
            "g gen | / search | +/- qty | d rm | s submit | q",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let [header, body, status, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(1),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        self.render_header(frame, header);

        let direction = if area.width >= 100 {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        let [report_area, selection_area] = Layout::default()
            .direction(direction)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .areas(body);
        self.render_report(frame, report_area);

        let title = if self.store.is_empty() {
            focus_line("Selection")
        } else {
            focus_line(format!(
                "Selection ({} codes, {} units)",
                self.store.len(),
                self.store.total_units()
            ))
        };
        render_selection_table(
            frame,
            selection_area,
            SelectionTableRender {
                title,
                entries: self.store.entries(),
                cursor: self.cursor,
                focused: self.search.is_none(),
            },
        );

        if let Some(message) = self.status.as_deref() {
            frame.render_widget(
                Paragraph::new(Line::styled(
                    clip(message, area.width as usize),
                    theme::secondary_text(),
                )),
                status,
            );
        }

        frame.render_widget(
            key_hint_paragraph(key_text).block(theme::key_block()),
            footer,
        );

        self.render_overlays(frame);
    }

    fn render_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            label_value_line("Report", self.report_path.display().to_string()),
            self.generation_line(),
        ];
        frame.render_widget(
            wrapped_paragraph(Text::from(lines)).block(theme::chrome("codepick")),
            area,
        );
    }

    fn generation_line(&self) -> Line<'static> {
        match self.generation.state() {
            GenerationState::Idle => label_value_line("Generation", "not started"),
            GenerationState::Running { .. } => self.loading.line("Generating codes"),
            GenerationState::Succeeded { merged, .. } => label_value_line(
                "Generation",
                format!("done, {} codes merged", merged.appended),
            ),
            GenerationState::Failed { message, .. } if message == CANCELED_MESSAGE => {
                label_value_line("Generation", "canceled")
            }
            GenerationState::Failed { message, .. } => Line::from(vec![
                Span::styled("Generation: ", theme::secondary_text()),
                Span::styled(format!("failed: {message}"), theme::error_prompt()),
            ]),
        }
    }

    fn render_report(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let body = if self.report.trim().is_empty() {
            Text::from(Line::styled("(report is empty)", theme::secondary_text()))
        } else {
            Text::from(self.report.as_str())
        };
        frame.render_widget(
            wrapped_paragraph(body)
                .scroll((self.report_scroll, 0))
                .block(theme::chrome("Report")),
            area,
        );
    }

    fn render_overlays(&self, frame: &mut ratatui::Frame<'_>) {
        if let Some(search) = &self.search {
            search.render(frame, &self.loading);
        }

        if let Some(choice) = &self.confirm_submit {
            choice.render(
                frame,
                "Submit selection",
                vec![
                    Line::from(format!(
                        "Submit {} codes ({} units) for this report?",
                        self.store.len(),
                        self.store.total_units()
                    )),
                    Line::styled(
                        "The selection cannot be edited after submission.",
                        theme::secondary_text(),
                    ),
                ],
            );
        }

        if let Some(message) = &self.message {
            render_message_modal(frame, message.kind, &message.text, "Enter/Esc: continue");
        }
    }
}
