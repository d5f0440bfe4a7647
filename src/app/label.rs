use std::borrow::Cow;

/// Truncates `text` to fit `max_width` pixels at `font_size`, appending `...`.
///
/// The average character width is approximated as `font_size / 1.5` instead of
/// measuring glyphs, so the fit stays cheap enough to re-evaluate on every
/// render. The result is deterministic and feeds the node render memo check.
pub(super) fn ellipsis(text: &str, font_size: f32, max_width: f32) -> Cow<'_, str> {
    let average_char_width = font_size / 1.5;
    let allowed_chars = (max_width / average_char_width).floor().max(0.0) as usize;

    if text.is_empty() || text.chars().count() <= allowed_chars {
        return Cow::Borrowed(text);
    }

    let truncated: String = text.chars().take(allowed_chars).collect();
    Cow::Owned(format!("{truncated}..."))
}
