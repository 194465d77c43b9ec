use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('\u{2026}');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

pub fn format_mb(mb: f64) -> String {
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if mb >= 1.0 {
        format!("{mb:.1} MB")
    } else {
        format!("{:.0} KB", mb * 1024.0)
    }
}

pub fn format_seconds(secs: f64) -> String {
    if secs >= 3600.0 {
        let total = secs as u64;
        format!("{}h{:02}m", total / 3600, (total % 3600) / 60)
    } else if secs >= 60.0 {
        let total = secs as u64;
        format!("{}m{:02}s", total / 60, total % 60)
    } else if secs >= 10.0 {
        format!("{secs:.0}s")
    } else {
        format!("{secs:.2}s")
    }
}

/// Axis tick label for a value in `unit`.
pub fn format_axis(value: f64, unit: &str) -> String {
    match unit {
        "MB" => format_mb(value),
        "%" => format!("{value:.0}%"),
        _ => format!("{value:.1}"),
    }
}
