use super::canvas::{Canvas, Rgba};

pub const GLYPH_WIDTH: i32 = 3;
pub const GLYPH_HEIGHT: i32 = 5;

type GlyphRows = [u8; GLYPH_HEIGHT as usize];

/// 3x5 bitmap glyphs, most significant bit on the left. Lower case letters
/// render with their upper case glyph.
const GLYPHS: &[(char, GlyphRows)] = &[
    ('!', [0b010, 0b010, 0b010, 0b000, 0b010]),
    ('#', [0b101, 0b111, 0b101, 0b111, 0b101]),
    ('%', [0b101, 0b001, 0b010, 0b100, 0b101]),
    ('(', [0b001, 0b010, 0b010, 0b010, 0b001]),
    (')', [0b100, 0b010, 0b010, 0b010, 0b100]),
    ('*', [0b000, 0b101, 0b010, 0b101, 0b000]),
    ('+', [0b000, 0b010, 0b111, 0b010, 0b000]),
    (',', [0b000, 0b000, 0b000, 0b010, 0b100]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    ('/', [0b001, 0b001, 0b010, 0b100, 0b100]),
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b111, 0b001, 0b111, 0b100, 0b111]),
    ('3', [0b111, 0b001, 0b111, 0b001, 0b111]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('6', [0b111, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b010, 0b010, 0b010]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b111]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    ('<', [0b001, 0b010, 0b100, 0b010, 0b001]),
    ('=', [0b000, 0b111, 0b000, 0b111, 0b000]),
    ('>', [0b100, 0b010, 0b001, 0b010, 0b100]),
    ('?', [0b111, 0b001, 0b011, 0b000, 0b010]),
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b111, 0b100, 0b100, 0b100, 0b111]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b111, 0b100, 0b101, 0b101, 0b111]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b111, 0b001, 0b001, 0b101, 0b111]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b101, 0b111, 0b111, 0b111, 0b101]),
    ('O', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b111, 0b101, 0b101, 0b111, 0b001]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('[', [0b110, 0b100, 0b100, 0b100, 0b110]),
    (']', [0b011, 0b001, 0b001, 0b001, 0b011]),
    ('_', [0b000, 0b000, 0b000, 0b000, 0b111]),
    ('{', [0b011, 0b010, 0b110, 0b010, 0b011]),
    ('}', [0b110, 0b010, 0b011, 0b010, 0b110]),
];

const UNKNOWN_GLYPH: GlyphRows = [0b111, 0b101, 0b101, 0b101, 0b111];

fn glyph_rows(ch: char) -> Option<GlyphRows> {
    if ch == ' ' {
        return None;
    }
    let upper = ch.to_ascii_uppercase();
    Some(
        GLYPHS
            .iter()
            .find(|(glyph, _)| *glyph == upper)
            .map(|(_, rows)| *rows)
            .unwrap_or(UNKNOWN_GLYPH),
    )
}

pub fn glyph_advance(scale: i32) -> i32 {
    (GLYPH_WIDTH + 1) * scale
}

pub fn line_advance(scale: i32) -> i32 {
    (GLYPH_HEIGHT + 2) * scale
}

pub fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * glyph_advance(scale)
}

/// Draws `text` with its top-left corner at (`x`, `y`), each font pixel
/// expanded to a `scale` x `scale` block.
pub fn draw_text(canvas: &mut Canvas<'_>, x: i32, y: i32, text: &str, color: Rgba, scale: i32) {
    let scale = scale.max(1);
    let mut cursor_x = x;
    for ch in text.chars() {
        if let Some(rows) = glyph_rows(ch) {
            for (row_index, row_bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                        continue;
                    }
                    canvas.fill_rect(
                        cursor_x + col * scale,
                        y + row_index as i32 * scale,
                        scale,
                        scale,
                        color,
                    );
                }
            }
        }
        cursor_x += glyph_advance(scale);
    }
}
