use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::RgbaImage;

use crate::font::{pixel_index, CodePainter};
use crate::theme::Theme;
use crate::tokenizer::Tokenizer;

/// Outer margin around the whole image, in nominal pixels.
pub const PADDING: u32 = 30;
/// Width of the line-number gutter.
pub const LINE_NUMBER_WIDTH: u32 = 50;
/// Spacing between the gutter and the code column.
pub const LINE_NUMBER_PADDING: u32 = 15;
/// Vertical space reserved under a title line.
pub const TITLE_SPACING: u32 = 10;
/// Linear supersampling factor. Paint happens at this multiple of the
/// nominal size and the finished raster is Lanczos-downsampled; memory and
/// CPU cost scale with its square.
pub const SUPERSAMPLE: u32 = 4;
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f32 = 1.5;

/// Nominal (post-downsample) canvas dimensions, fixed before any drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePlan {
    pub width: u32,
    pub height: u32,
    pub content_height: u32,
}

/// Single-pass sizing: the canvas is allocated at final size up front and
/// never resized mid-render.
pub fn plan_dimensions(
    lines: &[&str],
    char_width: u32,
    line_height: u32,
    has_title: bool,
) -> ImagePlan {
    let max_line_length = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as u32;

    let content_width = max_line_length * char_width + LINE_NUMBER_WIDTH + LINE_NUMBER_PADDING * 2;
    let content_height = lines.len() as u32 * line_height;

    let width = content_width + PADDING * 2;
    let mut height = content_height + PADDING * 2;
    if has_title {
        height += line_height + TITLE_SPACING;
    }

    ImagePlan {
        width,
        height,
        content_height,
    }
}

/// Syntax-highlighted code screenshot renderer.
///
/// Each render call is a self-contained single pass; the only state shared
/// across calls is the immutable theme and the painters' glyph caches, so
/// repeated renders of the same input are idempotent.
pub struct CodeImageGenerator {
    theme: &'static Theme,
    tokenizer: Tokenizer,
    line_height: u32,
    /// Nominal-size painter, used only for layout metrics.
    metrics_painter: CodePainter,
    /// Supersampled painter everything is drawn with.
    paint_painter: CodePainter,
}

impl CodeImageGenerator {
    pub fn new(theme_name: &str, font_size: f32) -> Self {
        Self::with_painters(
            theme_name,
            font_size,
            CodePainter::load(font_size),
            CodePainter::load(font_size * SUPERSAMPLE as f32),
        )
    }

    /// Built-in-font generator; hermetic, independent of installed fonts.
    pub fn with_builtin_font(theme_name: &str, font_size: f32) -> Self {
        Self::with_painters(
            theme_name,
            font_size,
            CodePainter::builtin(font_size),
            CodePainter::builtin(font_size * SUPERSAMPLE as f32),
        )
    }

    fn with_painters(
        theme_name: &str,
        font_size: f32,
        metrics_painter: CodePainter,
        paint_painter: CodePainter,
    ) -> Self {
        Self {
            theme: Theme::named(theme_name),
            tokenizer: Tokenizer::new(),
            line_height: (font_size * LINE_HEIGHT_RATIO) as u32,
            metrics_painter,
            paint_painter,
        }
    }

    pub fn theme(&self) -> &'static Theme {
        self.theme
    }

    /// Renders `code` and writes the image to `output_path`, format inferred
    /// from the extension.
    pub fn generate_image(
        &mut self,
        code: &str,
        output_path: &Path,
        title: Option<&str>,
    ) -> Result<()> {
        let image = self.render(code, title);
        image
            .save(output_path)
            .with_context(|| format!("failed to save image {}", output_path.display()))?;
        println!("Image saved to: {}", output_path.display());
        Ok(())
    }

    /// Renders `code` to a finished (downsampled) raster.
    pub fn render(&mut self, code: &str, title: Option<&str>) -> RgbaImage {
        let lines = code.split('\n').collect::<Vec<_>>();
        let char_width = self.metrics_painter.advance_width().ceil().max(1.0) as u32;
        let plan = plan_dimensions(&lines, char_width, self.line_height, title.is_some());

        let scale = SUPERSAMPLE;
        let frame_width = plan.width * scale;
        let frame_height = plan.height * scale;
        // Paint straight into the image buffer. Byte offsets are computed in
        // usize throughout; supersampled frames on large sources exceed
        // u32::MAX bytes.
        let mut supersampled = RgbaImage::new(frame_width, frame_height);
        let frame = &mut *supersampled;

        // Paint order is back to front: background, title, gutter, lines,
        // border.
        fill_rect(
            frame,
            frame_width,
            0,
            0,
            frame_width,
            frame_height,
            self.theme.background.rgba(255),
        );

        let mut y_offset = PADDING * scale;
        if let Some(title) = title {
            self.paint_painter.draw_line(
                frame,
                frame_width,
                frame_height,
                PADDING * scale,
                y_offset,
                title,
                self.theme.default_text.rgba(255),
            );
            y_offset += (self.line_height + TITLE_SPACING) * scale;
        }

        fill_rect(
            frame,
            frame_width,
            PADDING * scale,
            y_offset,
            LINE_NUMBER_WIDTH * scale,
            plan.content_height * scale,
            self.theme.line_number_bg.rgba(255),
        );

        for (index, line) in lines.iter().enumerate() {
            let line_y = y_offset + index as u32 * self.line_height * scale;

            let line_number = format!("{:>3}", index + 1);
            self.paint_painter.draw_line(
                frame,
                frame_width,
                frame_height,
                (PADDING + 5) * scale,
                line_y,
                &line_number,
                self.theme.line_number_fg.rgba(255),
            );

            let mut x_offset = ((PADDING + LINE_NUMBER_WIDTH + LINE_NUMBER_PADDING) * scale) as f32;
            for token in self.tokenizer.tokenize(line) {
                let color = self.theme.color(token.category);
                self.paint_painter.draw_line(
                    frame,
                    frame_width,
                    frame_height,
                    x_offset.round() as u32,
                    line_y,
                    &token.text,
                    color.rgba(255),
                );
                x_offset += self.paint_painter.measure(&token.text);
            }
        }

        draw_border(
            frame,
            frame_width,
            frame_height,
            scale,
            self.theme.border.rgba(255),
        );

        image::imageops::resize(&supersampled, plan.width, plan.height, FilterType::Lanczos3)
    }
}

fn fill_rect(
    frame: &mut [u8],
    frame_width: u32,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    color: [u8; 4],
) {
    let frame_height = (frame.len() / 4 / frame_width.max(1) as usize) as u32;
    for py in y..(y + height).min(frame_height) {
        for px in x..(x + width).min(frame_width) {
            let idx = pixel_index(frame_width, px, py);
            frame[idx..idx + 4].copy_from_slice(&color);
        }
    }
}

/// 1-unit border at nominal resolution, so `scale` pixels pre-downsample.
fn draw_border(frame: &mut [u8], frame_width: u32, frame_height: u32, scale: u32, color: [u8; 4]) {
    fill_rect(frame, frame_width, 0, 0, frame_width, scale, color);
    fill_rect(
        frame,
        frame_width,
        0,
        frame_height - scale,
        frame_width,
        scale,
        color,
    );
    fill_rect(frame, frame_width, 0, 0, scale, frame_height, color);
    fill_rect(
        frame,
        frame_width,
        frame_width - scale,
        0,
        scale,
        frame_height,
        color,
    );
}

#[cfg(test)]
mod tests {
    use super::{plan_dimensions, LINE_NUMBER_PADDING, LINE_NUMBER_WIDTH, PADDING, TITLE_SPACING};

    #[test]
    fn plan_accounts_for_gutter_and_padding() {
        let lines = ["let x = 1;", "x"];
        let plan = plan_dimensions(&lines, 10, 24, false);
        assert_eq!(
            plan.width,
            10 * 10 + LINE_NUMBER_WIDTH + LINE_NUMBER_PADDING * 2 + PADDING * 2
        );
        assert_eq!(plan.height, 2 * 24 + PADDING * 2);
        assert_eq!(plan.content_height, 48);
    }

    #[test]
    fn title_adds_one_line_plus_spacing() {
        let lines = ["x"];
        let without = plan_dimensions(&lines, 8, 21, false);
        let with = plan_dimensions(&lines, 8, 21, true);
        assert_eq!(with.height, without.height + 21 + TITLE_SPACING);
        assert_eq!(with.width, without.width);
    }

    #[test]
    fn empty_input_still_has_positive_dimensions() {
        let lines = [""];
        let plan = plan_dimensions(&lines, 8, 21, false);
        assert!(plan.width > 0);
        assert!(plan.height > 0);
    }
}
