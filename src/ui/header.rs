use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::app::Focus;
use crate::format::{format_seconds, truncate_unicode};
use crate::plot::series::PlotModel;
use crate::ui::theme::Theme;

pub fn render(frame: &mut Frame, area: Rect, model: &PlotModel, focus: Focus, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [x_min, x_max] = model.x_bounds();
    let meta = format!(
        "  {}  {} series  view: {}",
        format_seconds(x_max - x_min),
        model.series.len(),
        focus.label()
    );
    let title_width = (inner.width as usize)
        .saturating_sub(meta.len() + " memtrail ".len() + 2)
        .max(8);

    let line = Line::from(vec![
        Span::styled(
            " memtrail ",
            Style::default()
                .fg(theme.header_accent_fg)
                .bg(theme.header_accent_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            truncate_unicode(&model.title, title_width),
            Style::default()
                .fg(theme.text_primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(meta, Style::default().fg(theme.text_secondary)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}
