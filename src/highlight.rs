//! Render match spans into marked-up text for display

use crate::text::TextHighlight;

/// Opening and closing markers wrapped around each highlighted span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub open: String,
    pub close: String,
}

impl Markers {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self { open: open.into(), close: close.into() }
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new("<mark>", "</mark>")
    }
}

/// Wrap each highlighted span of `text` in `<mark>`/`</mark>`.
pub fn render(text: &str, highlights: &[TextHighlight]) -> String {
    render_with(text, highlights, &Markers::default())
}

/// Wrap each highlighted span of `text` in the given markers.
///
/// Highlights may arrive in any order and may overlap; they are sorted by
/// start first. A span that overlaps text already emitted is clipped to its
/// remainder. Spans outside `text` or not on char boundaries are ignored.
pub fn render_with(text: &str, highlights: &[TextHighlight], markers: &Markers) -> String {
    if text.trim().is_empty() || highlights.is_empty() {
        return text.to_string();
    }

    let mut sorted: Vec<&TextHighlight> = highlights.iter().collect();
    sorted.sort_by_key(|h| (h.start_index, h.length));

    let mut out = String::with_capacity(text.len() + highlights.len() * (markers.open.len() + markers.close.len()));
    let mut cursor = 0;

    for h in sorted {
        let start = h.start_index.max(cursor);
        let Some(end) = h.end_index() else {
            continue;
        };
        if end <= start || text.get(start..end).is_none() {
            continue;
        }

        out.push_str(&text[cursor..start]);
        out.push_str(&markers.open);
        out.push_str(&text[start..end]);
        out.push_str(&markers.close);
        cursor = end;
    }

    out.push_str(&text[cursor..]);
    out
}
