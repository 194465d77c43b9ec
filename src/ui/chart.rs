use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{
    Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, LegendPosition,
};

use crate::format::{format_axis, format_seconds, truncate_unicode};
use crate::plot::TOTAL_MEM_COLUMN;
use crate::plot::series::{GroupKind, PlotModel, Unit};
use crate::ui::theme::Theme;

const LEGEND_LABEL_WIDTH: usize = 28;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    model: &PlotModel,
    kind: GroupKind,
    show_legend: bool,
    theme: &Theme,
) {
    let series = model.group_series(kind);

    let datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let color = if s.name == TOTAL_MEM_COLUMN {
                theme.total_series
            } else {
                theme.series_color(i)
            };
            Dataset::default()
                .name(truncate_unicode(&s.label(), LEGEND_LABEL_WIDTH))
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(&s.points)
        })
        .collect();

    let unit = match kind {
        GroupKind::Cpu => Unit::Percent,
        GroupKind::Mem => Unit::Megabytes,
    };
    let [x_min, x_max] = model.x_bounds();
    let [y_min, y_max] = model.y_bounds(kind);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            format!(" {} ({} series) ", kind.key(), series.len()),
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));

    let x_axis = Axis::default()
        .title(Span::styled("time", Style::default().fg(theme.text_secondary)))
        .style(Style::default().fg(theme.text_secondary))
        .bounds([x_min, x_max])
        .labels(vec![
            format_seconds(x_min),
            format_seconds((x_min + x_max) / 2.0),
            format_seconds(x_max),
        ]);

    let y_axis = Axis::default()
        .title(Span::styled(
            unit.label(),
            Style::default().fg(theme.text_secondary),
        ))
        .style(Style::default().fg(theme.text_secondary))
        .bounds([y_min, y_max])
        .labels(vec![
            format_axis(y_min, unit.label()),
            format_axis((y_min + y_max) / 2.0, unit.label()),
            format_axis(y_max, unit.label()),
        ]);

    let legend_position = show_legend.then_some(LegendPosition::TopLeft);
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(legend_position)
        .hidden_legend_constraints((Constraint::Percentage(60), Constraint::Percentage(90)));

    frame.render_widget(chart, area);
}
