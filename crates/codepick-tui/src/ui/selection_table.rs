use codepick_core::entry::CodeEntry;
use ratatui::Frame;
use ratatui::layout::{Constraint, Margin, Rect};
use ratatui::style::Color;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, Table, TableState,
};

use crate::theme;
use crate::ui::text::clip;

pub(crate) struct SelectionTableRender<'a> {
    pub(crate) title: Line<'a>,
    pub(crate) entries: &'a [CodeEntry],
    pub(crate) cursor: usize,
    pub(crate) focused: bool,
}

/// Keeps a cursor inside a list of `len` rows.
pub(crate) fn clamp_cursor(cursor: usize, len: usize) -> usize {
    if len == 0 { 0 } else { cursor.min(len - 1) }
}

pub(crate) fn render_selection_table(
    frame: &mut Frame<'_>,
    area: Rect,
    render: SelectionTableRender<'_>,
) {
    if render.entries.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from("No codes selected."),
            Line::styled(
                "Press g to generate suggestions or / to search the catalog.",
                theme::secondary_text(),
            ),
        ])
        .block(theme::chrome(render.title));
        frame.render_widget(empty, area);
        return;
    }

    let name_width = area.width.saturating_sub(34).max(8) as usize;
    let rows = render.entries.iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.code().to_string()),
            Cell::from(clip(entry.name(), name_width)),
            Cell::from(entry.quantity().to_string()),
            Cell::from(Span::styled(
                entry.origin().label(),
                theme::origin(entry.origin()),
            )),
        ])
    });

    let highlight = if render.focused {
        theme::table_highlight(Color::Cyan)
    } else {
        theme::secondary_text()
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(["Code", "Name", "Qty", "Origin"]).style(theme::table_header(Color::Cyan)))
    .block(theme::chrome(render.title))
    .row_highlight_style(highlight)
    .highlight_symbol(">> ");

    let cursor = clamp_cursor(render.cursor, render.entries.len());
    let mut state = TableState::new();
    state.select(Some(cursor));
    frame.render_stateful_widget(table, area, &mut state);

    let viewport = area.height.saturating_sub(3) as usize;
    let mut scrollbar_state = ScrollbarState::new(render.entries.len())
        .position(cursor)
        .viewport_content_length(viewport);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None),
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}
