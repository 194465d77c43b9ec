use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub header_accent_bg: Color,
    pub header_accent_fg: Color,
    pub status_err: Color,
    pub statusbar_bg: Color,
    pub overlay_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub accent: Color,
    pub pill_key_bg: Color,
    pub pill_key_fg: Color,
    pub pill_desc_fg: Color,
    pub surface_bg: Color,
    pub total_series: Color,
    pub series_palette: [Color; 8],
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            header_accent_bg: Color::Green,
            header_accent_fg: Color::Black,
            status_err: Color::Red,
            statusbar_bg: Color::DarkGray,
            overlay_border: Color::DarkGray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            accent: Color::Green,
            pill_key_bg: Color::Yellow,
            pill_key_fg: Color::Black,
            pill_desc_fg: Color::White,
            surface_bg: Color::DarkGray,
            total_series: Color::Rgb(236, 72, 153),
            series_palette: [
                Color::Rgb(192, 132, 252),
                Color::Rgb(96, 165, 250),
                Color::Rgb(34, 211, 238),
                Color::Rgb(45, 212, 191),
                Color::Rgb(52, 211, 153),
                Color::Rgb(251, 146, 60),
                Color::Rgb(248, 113, 113),
                Color::Rgb(129, 140, 248),
            ],
        }
    }

    /// Stable color for the `index`-th series of a chart.
    pub fn series_color(&self, index: usize) -> Color {
        self.series_palette[index % self.series_palette.len()]
    }
}
