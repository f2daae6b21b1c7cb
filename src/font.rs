use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use fontdue::Font;

/// Prioritized system font candidates, CJK-capable fonts first so Japanese
/// comments in source files render. Missing entries are skipped silently.
pub const FONT_CANDIDATES: &[&str] = &[
    // macOS
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.dfont",
    // Linux
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/fonts-japanese-gothic.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    // Windows
    "C:\\Windows\\Fonts\\msgothic.ttc",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
];

#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub bitmap: Vec<u8>,
}

enum FontSource {
    Truetype(Font),
    Builtin,
}

/// Text painter over a raw RGBA frame.
///
/// Holds one font at one point size plus an instance-scoped glyph cache, so
/// concurrent use means one painter per caller. Construction never fails:
/// when no system font candidate loads, the painter degrades to a built-in
/// 5x7 bitmap font (coarser glyphs, same API).
pub struct CodePainter {
    source: FontSource,
    font_size: f32,
    glyph_cache: HashMap<char, GlyphBitmap>,
}

impl CodePainter {
    /// Loads the first usable candidate font, falling back to the built-in
    /// bitmap font. Soft degradation only, never an error.
    pub fn load(font_size: f32) -> Self {
        for candidate in FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            if let Ok(painter) = Self::from_path(path, font_size) {
                return painter;
            }
        }
        eprintln!("warning: no system font candidate found, using built-in bitmap font");
        Self::builtin(font_size)
    }

    pub fn from_path(font_path: &Path, font_size: f32) -> Result<Self> {
        let font_bytes = fs::read(font_path)
            .with_context(|| format!("failed to read font file {}", font_path.display()))?;
        let font = Font::from_bytes(font_bytes, fontdue::FontSettings::default())
            .map_err(|error| anyhow!("failed to parse font {}: {error}", font_path.display()))?;
        Ok(Self {
            source: FontSource::Truetype(font),
            font_size,
            glyph_cache: HashMap::new(),
        })
    }

    pub fn builtin(font_size: f32) -> Self {
        Self {
            source: FontSource::Builtin,
            font_size,
            glyph_cache: HashMap::new(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.source, FontSource::Builtin)
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Horizontal advance of the reference glyph 'M'; the per-column cell
    /// width used for layout sizing.
    pub fn advance_width(&self) -> f32 {
        self.char_advance('M')
    }

    fn char_advance(&self, ch: char) -> f32 {
        match &self.source {
            FontSource::Truetype(font) => font.metrics(ch, self.font_size).advance_width,
            FontSource::Builtin => builtin::advance(self.font_size),
        }
    }

    /// Width `text` will occupy when drawn.
    pub fn measure(&self, text: &str) -> f32 {
        text.chars().map(|ch| self.char_advance(ch)).sum()
    }

    fn ascent(&self) -> f32 {
        match &self.source {
            FontSource::Truetype(font) => font
                .horizontal_line_metrics(self.font_size)
                .map(|metrics| metrics.ascent)
                .unwrap_or(self.font_size),
            FontSource::Builtin => 0.0,
        }
    }

    /// Draws a single line of text with its top-left corner at (x, y),
    /// alpha-blending glyph coverage over the existing frame contents.
    pub fn draw_line(
        &mut self,
        frame: &mut [u8],
        frame_width: u32,
        frame_height: u32,
        x: u32,
        y: u32,
        text: &str,
        color: [u8; 4],
    ) {
        if text.is_empty() {
            return;
        }

        let baseline = y as f32 + self.ascent();
        let mut pen_x = x as f32;

        for ch in text.chars() {
            let advance = self.char_advance(ch);
            let (glyph_x, glyph_y) = match &self.source {
                FontSource::Truetype(font) => {
                    let metrics = font.metrics(ch, self.font_size);
                    (
                        pen_x + metrics.xmin as f32,
                        baseline - metrics.height as f32 - metrics.ymin as f32,
                    )
                }
                FontSource::Builtin => (pen_x, y as f32),
            };

            if !self.glyph_cache.contains_key(&ch) {
                let glyph = match &self.source {
                    FontSource::Truetype(font) => {
                        let (metrics, bitmap) = font.rasterize(ch, self.font_size);
                        GlyphBitmap {
                            width: metrics.width,
                            height: metrics.height,
                            bitmap,
                        }
                    }
                    FontSource::Builtin => builtin::rasterize(ch, self.font_size),
                };
                self.glyph_cache.insert(ch, glyph);
            }
            let glyph = &self.glyph_cache[&ch];

            if glyph.width > 0 && glyph.height > 0 {
                blend_glyph(
                    frame,
                    frame_width,
                    frame_height,
                    glyph_x.round() as i32,
                    glyph_y.round() as i32,
                    glyph,
                    color,
                );
            }
            pen_x += advance;
        }
    }
}

/// Byte offset of pixel (x, y) in a tightly packed RGBA frame. Computed in
/// usize; supersampled frames on large sources exceed u32 offsets.
pub fn pixel_index(frame_width: u32, x: u32, y: u32) -> usize {
    (y as usize * frame_width as usize + x as usize) * 4
}

pub fn blend_glyph(
    frame: &mut [u8],
    frame_width: u32,
    frame_height: u32,
    x: i32,
    y: i32,
    glyph: &GlyphBitmap,
    color: [u8; 4],
) {
    for row in 0..glyph.height {
        let py = y + row as i32;
        if py < 0 || py >= frame_height as i32 {
            continue;
        }

        for col in 0..glyph.width {
            let px = x + col as i32;
            if px < 0 || px >= frame_width as i32 {
                continue;
            }

            let mask = glyph.bitmap[row * glyph.width + col];
            if mask == 0 {
                continue;
            }

            let alpha = ((u16::from(mask) * u16::from(color[3])) / 255) as u8;
            let idx = pixel_index(frame_width, px as u32, py as u32);
            blend_pixel(frame, idx, [color[0], color[1], color[2], alpha]);
        }
    }
}

pub fn blend_pixel(frame: &mut [u8], idx: usize, src: [u8; 4]) {
    let alpha = u16::from(src[3]);
    if alpha == 0 {
        return;
    }

    let inv_alpha = 255_u16.saturating_sub(alpha);

    for channel in 0..3 {
        let dst = u16::from(frame[idx + channel]);
        let src_c = u16::from(src[channel]);
        frame[idx + channel] = ((src_c * alpha + dst * inv_alpha + 127) / 255) as u8;
    }
    frame[idx + 3] = 255;
}

#[cfg(test)]
mod tests {
    use super::pixel_index;

    #[test]
    fn pixel_offsets_stay_correct_past_u32_range() {
        // A tall supersampled frame: the byte offset of a bottom-row pixel
        // does not fit in u32 and must not wrap.
        let idx = pixel_index(70_000, 69_999, 68_000);
        assert_eq!(idx, (68_000_usize * 70_000 + 69_999) * 4);
        assert!(idx > u32::MAX as usize);
    }

    #[test]
    fn pixel_offsets_match_row_major_layout() {
        assert_eq!(pixel_index(10, 0, 0), 0);
        assert_eq!(pixel_index(10, 3, 0), 12);
        assert_eq!(pixel_index(10, 0, 2), 80);
    }
}

/// Built-in 5x7 ASCII bitmap font, column-major (five bytes per glyph, bit 0
/// is the top row). Rendered by nearest-neighbor scaling into a 6x8 cell.
mod builtin {
    use super::GlyphBitmap;

    const CELL_WIDTH: f32 = 6.0;
    const CELL_HEIGHT: f32 = 8.0;

    pub fn advance(font_size: f32) -> f32 {
        CELL_WIDTH * font_size / CELL_HEIGHT
    }

    pub fn rasterize(ch: char, font_size: f32) -> GlyphBitmap {
        let columns = match glyph_columns(ch) {
            Some(columns) => columns,
            None => {
                return GlyphBitmap {
                    width: 0,
                    height: 0,
                    bitmap: Vec::new(),
                }
            }
        };

        let scale = font_size / CELL_HEIGHT;
        let width = (5.0 * scale).ceil().max(1.0) as usize;
        let height = (7.0 * scale).ceil().max(1.0) as usize;
        let mut bitmap = vec![0u8; width * height];

        for (py, row) in bitmap.chunks_mut(width).enumerate() {
            let source_row = ((py as f32 / scale) as usize).min(6);
            for (px, out) in row.iter_mut().enumerate() {
                let source_col = ((px as f32 / scale) as usize).min(4);
                if (columns[source_col] >> source_row) & 1 == 1 {
                    *out = 255;
                }
            }
        }

        GlyphBitmap {
            width,
            height,
            bitmap,
        }
    }

    fn glyph_columns(ch: char) -> Option<&'static [u8; 5]> {
        if ch == ' ' {
            return None;
        }
        let code = ch as usize;
        if !(0x21..=0x7e).contains(&code) {
            // Unknown codepoints render as a hollow box.
            return Some(&REPLACEMENT);
        }
        Some(&GLYPHS[code - 0x21])
    }

    const REPLACEMENT: [u8; 5] = [0x7f, 0x41, 0x41, 0x41, 0x7f];

    #[rustfmt::skip]
    const GLYPHS: [[u8; 5]; 94] = [
        [0x00, 0x00, 0x5f, 0x00, 0x00], // !
        [0x00, 0x07, 0x00, 0x07, 0x00], // "
        [0x14, 0x7f, 0x14, 0x7f, 0x14], // #
        [0x24, 0x2a, 0x7f, 0x2a, 0x12], // $
        [0x23, 0x13, 0x08, 0x64, 0x62], // %
        [0x36, 0x49, 0x55, 0x22, 0x50], // &
        [0x00, 0x05, 0x03, 0x00, 0x00], // '
        [0x00, 0x1c, 0x22, 0x41, 0x00], // (
        [0x00, 0x41, 0x22, 0x1c, 0x00], // )
        [0x14, 0x08, 0x3e, 0x08, 0x14], // *
        [0x08, 0x08, 0x3e, 0x08, 0x08], // +
        [0x00, 0x50, 0x30, 0x00, 0x00], // ,
        [0x08, 0x08, 0x08, 0x08, 0x08], // -
        [0x00, 0x60, 0x60, 0x00, 0x00], // .
        [0x20, 0x10, 0x08, 0x04, 0x02], // /
        [0x3e, 0x51, 0x49, 0x45, 0x3e], // 0
        [0x00, 0x42, 0x7f, 0x40, 0x00], // 1
        [0x42, 0x61, 0x51, 0x49, 0x46], // 2
        [0x21, 0x41, 0x45, 0x4b, 0x31], // 3
        [0x18, 0x14, 0x12, 0x7f, 0x10], // 4
        [0x27, 0x45, 0x45, 0x45, 0x39], // 5
        [0x3c, 0x4a, 0x49, 0x49, 0x30], // 6
        [0x01, 0x71, 0x09, 0x05, 0x03], // 7
        [0x36, 0x49, 0x49, 0x49, 0x36], // 8
        [0x06, 0x49, 0x49, 0x29, 0x1e], // 9
        [0x00, 0x36, 0x36, 0x00, 0x00], // :
        [0x00, 0x56, 0x36, 0x00, 0x00], // ;
        [0x08, 0x14, 0x22, 0x41, 0x00], // <
        [0x14, 0x14, 0x14, 0x14, 0x14], // =
        [0x00, 0x41, 0x22, 0x14, 0x08], // >
        [0x02, 0x01, 0x51, 0x09, 0x06], // ?
        [0x32, 0x49, 0x79, 0x41, 0x3e], // @
        [0x7e, 0x11, 0x11, 0x11, 0x7e], // A
        [0x7f, 0x49, 0x49, 0x49, 0x36], // B
        [0x3e, 0x41, 0x41, 0x41, 0x22], // C
        [0x7f, 0x41, 0x41, 0x22, 0x1c], // D
        [0x7f, 0x49, 0x49, 0x49, 0x41], // E
        [0x7f, 0x09, 0x09, 0x09, 0x01], // F
        [0x3e, 0x41, 0x49, 0x49, 0x7a], // G
        [0x7f, 0x08, 0x08, 0x08, 0x7f], // H
        [0x00, 0x41, 0x7f, 0x41, 0x00], // I
        [0x20, 0x40, 0x41, 0x3f, 0x01], // J
        [0x7f, 0x08, 0x14, 0x22, 0x41], // K
        [0x7f, 0x40, 0x40, 0x40, 0x40], // L
        [0x7f, 0x02, 0x0c, 0x02, 0x7f], // M
        [0x7f, 0x04, 0x08, 0x10, 0x7f], // N
        [0x3e, 0x41, 0x41, 0x41, 0x3e], // O
        [0x7f, 0x09, 0x09, 0x09, 0x06], // P
        [0x3e, 0x41, 0x51, 0x21, 0x5e], // Q
        [0x7f, 0x09, 0x19, 0x29, 0x46], // R
        [0x46, 0x49, 0x49, 0x49, 0x31], // S
        [0x01, 0x01, 0x7f, 0x01, 0x01], // T
        [0x3f, 0x40, 0x40, 0x40, 0x3f], // U
        [0x1f, 0x20, 0x40, 0x20, 0x1f], // V
        [0x3f, 0x40, 0x38, 0x40, 0x3f], // W
        [0x63, 0x14, 0x08, 0x14, 0x63], // X
        [0x07, 0x08, 0x70, 0x08, 0x07], // Y
        [0x61, 0x51, 0x49, 0x45, 0x43], // Z
        [0x00, 0x7f, 0x41, 0x41, 0x00], // [
        [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
        [0x00, 0x41, 0x41, 0x7f, 0x00], // ]
        [0x04, 0x02, 0x01, 0x02, 0x04], // ^
        [0x40, 0x40, 0x40, 0x40, 0x40], // _
        [0x00, 0x01, 0x02, 0x04, 0x00], // `
        [0x20, 0x54, 0x54, 0x54, 0x78], // a
        [0x7f, 0x48, 0x44, 0x44, 0x38], // b
        [0x38, 0x44, 0x44, 0x44, 0x20], // c
        [0x38, 0x44, 0x44, 0x48, 0x7f], // d
        [0x38, 0x54, 0x54, 0x54, 0x18], // e
        [0x08, 0x7e, 0x09, 0x01, 0x02], // f
        [0x0c, 0x52, 0x52, 0x52, 0x3e], // g
        [0x7f, 0x08, 0x04, 0x04, 0x78], // h
        [0x00, 0x44, 0x7d, 0x40, 0x00], // i
        [0x20, 0x40, 0x44, 0x3d, 0x00], // j
        [0x7f, 0x10, 0x28, 0x44, 0x00], // k
        [0x00, 0x41, 0x7f, 0x40, 0x00], // l
        [0x7c, 0x04, 0x18, 0x04, 0x78], // m
        [0x7c, 0x08, 0x04, 0x04, 0x78], // n
        [0x38, 0x44, 0x44, 0x44, 0x38], // o
        [0x7c, 0x14, 0x14, 0x14, 0x08], // p
        [0x08, 0x14, 0x14, 0x18, 0x7c], // q
        [0x7c, 0x08, 0x04, 0x04, 0x08], // r
        [0x48, 0x54, 0x54, 0x54, 0x20], // s
        [0x04, 0x3f, 0x44, 0x40, 0x20], // t
        [0x3c, 0x40, 0x40, 0x20, 0x7c], // u
        [0x1c, 0x20, 0x40, 0x20, 0x1c], // v
        [0x3c, 0x40, 0x30, 0x40, 0x3c], // w
        [0x44, 0x28, 0x10, 0x28, 0x44], // x
        [0x0c, 0x50, 0x50, 0x50, 0x3c], // y
        [0x44, 0x64, 0x54, 0x4c, 0x44], // z
        [0x00, 0x08, 0x36, 0x41, 0x00], // {
        [0x00, 0x00, 0x7f, 0x00, 0x00], // |
        [0x00, 0x41, 0x36, 0x08, 0x00], // }
        [0x08, 0x04, 0x08, 0x10, 0x08], // ~
    ];

    #[cfg(test)]
    mod tests {
        use super::rasterize;

        #[test]
        fn builtin_letter_has_visible_pixels() {
            let glyph = rasterize('A', 16.0);
            assert!(glyph.width > 0 && glyph.height > 0);
            assert!(glyph.bitmap.iter().any(|&mask| mask > 0));
        }

        #[test]
        fn builtin_space_is_empty() {
            let glyph = rasterize(' ', 16.0);
            assert_eq!(glyph.width, 0);
            assert_eq!(glyph.height, 0);
        }
    }
}
