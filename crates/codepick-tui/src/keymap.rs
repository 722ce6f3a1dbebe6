use crossterm::event::{KeyCode, KeyEvent};

pub(crate) fn is_back(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Esc)
}

pub(crate) fn is_confirm(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter)
}

pub(crate) fn is_up(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Up | KeyCode::Char('k'))
}

pub(crate) fn is_down(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Down | KeyCode::Char('j'))
}

pub(crate) fn is_toggle(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char(' '))
}

pub(crate) fn is_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q'))
}

pub(crate) fn is_generate(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('g'))
}

pub(crate) fn is_cancel_generation(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('x'))
}

pub(crate) fn is_search(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('/'))
}

pub(crate) fn is_increment(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('+') | KeyCode::Char('='))
}

pub(crate) fn is_decrement(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('-'))
}

pub(crate) fn is_remove(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('d') | KeyCode::Delete)
}

pub(crate) fn is_reload(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('r'))
}

pub(crate) fn is_submit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('s'))
}

pub(crate) fn is_scroll_up(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::PageUp)
}

pub(crate) fn is_scroll_down(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::PageDown)
}
