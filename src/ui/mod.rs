pub mod chart;
pub mod header;
pub mod help;
pub mod statusbar;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::App;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let groups = app.focus.groups();
    let views = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, groups.len() as u32); groups.len()])
        .split(chunks[1]);

    for (kind, area) in groups.iter().zip(views.iter()) {
        chart::render(frame, *area, &app.model, *kind, app.show_legend, &app.theme);
    }

    header::render(frame, chunks[0], &app.model, app.focus, &app.theme);
    statusbar::render(
        frame,
        chunks[2],
        app.status_message.as_ref(),
        &app.theme,
        app.follow,
    );

    // Help overlay on top
    if app.show_help() {
        help::render(frame, frame.area(), app);
    }
}
