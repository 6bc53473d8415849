use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::MediaType;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Footer line of `[key] Label` pairs.
pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (idx, (key, label)) in hints.iter().enumerate() {
        spans.push(Span::styled(format!("[{key}]"), key_style));
        let gap = if idx + 1 == hints.len() { "" } else { "   " };
        spans.push(Span::raw(format!(" {label}{gap}")));
    }
    Line::from(spans)
}

/// Colored badge for a media type.
pub(crate) fn kind_badge(kind: MediaType) -> Span<'static> {
    let color = match kind {
        MediaType::Movie => Color::Magenta,
        MediaType::Book => Color::Blue,
        MediaType::Unknown => Color::DarkGray,
    };
    Span::styled(
        format!("{:<5}", kind.label()),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

/// Five stars, filled up to `rating` rounded down.
pub(crate) fn star_spans(rating: f64) -> Vec<Span<'static>> {
    let filled = rating.clamp(0.0, 5.0).floor() as usize;
    vec![
        Span::styled("★".repeat(filled), Style::default().fg(Color::Yellow)),
        Span::styled("☆".repeat(5 - filled), Style::default().fg(Color::DarkGray)),
    ]
}

/// Cut `text` to `width` characters, marking the cut with an ellipsis.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("Arrival", 10), "Arrival");
        assert_eq!(truncate("Arrival", 4), "Arr…");
        assert_eq!(truncate("Arrival", 0), "");
    }

    #[test]
    fn key_hints_pairs_keys_and_labels() {
        let line = key_hints(&[("q", "Quit"), ("x", "Export")]);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "[q] Quit   [x] Export");
    }

    #[test]
    fn stars_floor_and_clamp() {
        let text = |r: f64| -> String {
            star_spans(r)
                .iter()
                .map(|s| s.content.as_ref().to_string())
                .collect()
        };
        assert_eq!(text(3.0), "★★★☆☆");
        assert_eq!(text(4.6), "★★★★☆");
        assert_eq!(text(7.0), "★★★★★");
        assert_eq!(text(-1.0), "☆☆☆☆☆");
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow::anyhow!("disk full").context("failed to export");
        assert_eq!(surface_error(&err), "disk full");
    }
}
