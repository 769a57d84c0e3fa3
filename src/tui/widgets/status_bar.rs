use ratatui::layout::Rect;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::widgets::color::Palette;

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

/// Join as many hints as fit in `max_width`, ending in "..." when some
/// were dropped.
pub fn fit_hints(hints: &[String], max_width: usize) -> String {
    let mut out = String::new();
    for (i, hint) in hints.iter().enumerate() {
        let current = out.chars().count();
        let added = if i == 0 {
            hint.chars().count()
        } else {
            SEPARATOR.chars().count() + hint.chars().count()
        };

        if current + added > max_width {
            let keep = max_width.saturating_sub(ELLIPSIS.len());
            let base = if i == 0 { hint.as_str() } else { out.as_str() };
            let mut truncated: String = base.chars().take(keep).collect();
            truncated.push_str(ELLIPSIS);
            return truncated;
        }

        if i > 0 {
            out.push_str(SEPARATOR);
        }
        out.push_str(hint);
    }
    out
}

pub fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    message: Option<&String>,
    key_hints: &[String],
    palette: &Palette,
) {
    let max_width = area.width as usize;
    let (content, style) = match message {
        Some(msg) => {
            let content = if msg.chars().count() > max_width {
                msg.chars().take(max_width.saturating_sub(3)).collect::<String>() + ELLIPSIS
            } else {
                msg.clone()
            };
            (content, palette.highlight())
        }
        None => (fit_hints(key_hints, max_width), palette.base()),
    };

    let paragraph = Paragraph::new(content).style(style).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<String> {
        vec!["q: Quit".into(), "n: Next".into(), "p: Prev".into()]
    }

    #[test]
    fn all_hints_fit() {
        assert_eq!(fit_hints(&hints(), 80), "q: Quit • n: Next • p: Prev");
    }

    #[test]
    fn overflow_is_marked() {
        assert_eq!(fit_hints(&hints(), 20), "q: Quit • n: Next...");
        assert_eq!(fit_hints(&hints(), 6), "q: ...");
    }
}
