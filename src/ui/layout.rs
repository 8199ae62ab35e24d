use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub const CARD_HEIGHT: u16 = 8;
pub const BUTTON_HEIGHT: u16 = 3;
const DEPOSIT_WIDTH: u16 = 22;
const WITHDRAW_WIDTH: u16 = 26;

#[derive(Debug, Clone, Copy)]
pub struct UiAreas {
    pub size: Rect,
    pub header: Rect,
    pub card: Rect,
    pub deposit_button: Rect,
    pub withdraw_button: Rect,
    pub button_hint: Rect,
    pub activity: Rect,
    pub status_line: Rect,
    pub command_line: Rect,
}

impl UiAreas {
    /// Whether a terminal cell lies inside `rect`
    pub fn hit(rect: Rect, column: u16, row: u16) -> bool {
        column >= rect.x
            && column < rect.x.saturating_add(rect.width)
            && row >= rect.y
            && row < rect.y.saturating_add(rect.height)
    }
}

pub fn areas(size: Rect) -> UiAreas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(CARD_HEIGHT),
            Constraint::Length(BUTTON_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(size);

    let buttons = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(DEPOSIT_WIDTH),
            Constraint::Length(1),
            Constraint::Length(WITHDRAW_WIDTH),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(vertical[2]);

    let footer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(vertical[4]);

    UiAreas {
        size,
        header: vertical[0],
        card: vertical[1],
        deposit_button: buttons[0],
        withdraw_button: buttons[2],
        button_hint: buttons[4],
        activity: vertical[3],
        status_line: footer_chunks[0],
        command_line: footer_chunks[1],
    }
}
