use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::app::{App, Focus};
use crate::plot::series::PlotModel;
use crate::ui::theme::Theme;

const KEY_WIDTH: usize = 8;

/// Series shown in the charts for `focus`.
fn series_in_view(model: &PlotModel, focus: Focus) -> usize {
    focus
        .groups()
        .iter()
        .map(|&kind| model.group_series(kind).len())
        .sum()
}

/// Keybinds plus the views `Tab` cycles through, with the active one marked.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let entries = app.help_entries();

    let mut lines: Vec<Line> = entries
        .iter()
        .map(|(key, desc)| key_line(key, desc, theme))
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        " Views",
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    )));
    lines.extend(
        Focus::ALL
            .iter()
            .map(|&focus| view_line(focus, app.focus, &app.model, theme)),
    );

    let width = 44u16.min(area.width.saturating_sub(4));
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let [overlay] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [overlay] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            format!(" Keybinds · view: {} ", app.focus.label()),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(overlay);

    frame.render_widget(Clear, overlay);
    frame.render_widget(block, overlay);
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(theme.surface_bg)),
        inner,
    );
}

fn key_line(key: &str, desc: &str, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(" {key:>KEY_WIDTH$} "),
            Style::default()
                .fg(theme.pill_key_fg)
                .bg(theme.pill_key_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {desc}"), Style::default().fg(theme.pill_desc_fg)),
    ])
}

fn view_line(focus: Focus, active: Focus, model: &PlotModel, theme: &Theme) -> Line<'static> {
    let (marker, style) = if focus == active {
        (
            "\u{25b8}",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (" ", Style::default().fg(theme.text_secondary))
    };
    Line::from(Span::styled(
        format!(
            " {marker} {:<KEY_WIDTH$} {} series",
            focus.label(),
            series_in_view(model, focus)
        ),
        style,
    ))
}
