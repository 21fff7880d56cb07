use crate::fonts::LoadedFont;

pub(crate) const PT_PER_MM: f32 = 72.0 / 25.4;

/// Width of `text` in millimetres.
pub(crate) fn text_width_mm(font: &LoadedFont, text: &str, font_size: f32) -> f32 {
    font.text_width(text, font_size) / PT_PER_MM
}

/// Greedy word wrap to `max_width` millimetres.
///
/// Newlines are hard breaks and blank lines survive as empty strings. Runs of
/// whitespace inside a line collapse to a single space. A word wider than the
/// whole line is split between characters rather than overflowing.
pub(crate) fn wrap_text(
    text: &str,
    font: &LoadedFont,
    font_size: f32,
    max_width: f32,
) -> Vec<String> {
    let space_w = text_width_mm(font, " ", font_size);
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in paragraph.split_whitespace() {
            let word_w = text_width_mm(font, word, font_size);

            if word_w > max_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let (mut pieces, last_w) = break_word(word, font, font_size, max_width);
                current = pieces.pop().unwrap_or_default();
                current_w = last_w;
                lines.extend(pieces);
                continue;
            }

            if current.is_empty() {
                current.push_str(word);
                current_w = word_w;
            } else if current_w + space_w + word_w <= max_width {
                current.push(' ');
                current.push_str(word);
                current_w += space_w + word_w;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
                current_w = word_w;
            }
        }
        lines.push(current);
    }

    // Trailing blank lines only push content down
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Split an over-long word into pieces that each fit `max_width`. Returns the
/// pieces and the width of the last one, which later words may continue.
fn break_word(
    word: &str,
    font: &LoadedFont,
    font_size: f32,
    max_width: f32,
) -> (Vec<String>, f32) {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_w = 0.0f32;
    for ch in word.chars() {
        let ch_w = font.char_width_1000(ch) * font_size / 1000.0 / PT_PER_MM;
        if !piece.is_empty() && piece_w + ch_w > max_width {
            pieces.push(std::mem::take(&mut piece));
            piece_w = 0.0;
        }
        piece.push(ch);
        piece_w += ch_w;
    }
    pieces.push(piece);
    (pieces, piece_w)
}
