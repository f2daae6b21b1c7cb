//! Letterboxing of screenshots to a uniform video frame.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::{imageops, Rgba, RgbaImage};

use crate::scenes::Project;
use crate::theme::Color;

/// Fraction of the target frame the scaled image may occupy; the rest stays
/// background so screenshots do not touch the frame edges.
pub const MARGIN_FACTOR: f32 = 0.9;

/// Scaled size and centered placement for an image letterboxed into a
/// `target_width` x `target_height` frame, aspect ratio preserved.
pub fn letterbox_geometry(
    original_width: u32,
    original_height: u32,
    target_width: u32,
    target_height: u32,
) -> (u32, u32, u32, u32) {
    let scale_x = target_width as f32 / original_width.max(1) as f32;
    let scale_y = target_height as f32 / original_height.max(1) as f32;
    let scale = scale_x.min(scale_y) * MARGIN_FACTOR;

    let new_width = ((original_width as f32 * scale) as u32).max(1);
    let new_height = ((original_height as f32 * scale) as u32).max(1);
    let x_offset = (target_width - new_width.min(target_width)) / 2;
    let y_offset = (target_height - new_height.min(target_height)) / 2;

    (new_width, new_height, x_offset, y_offset)
}

/// Resizes every screenshot in `screenshot_dir` onto a background-colored
/// canvas of the project resolution, writing results into `resized_dir`.
pub fn resize_screenshots(project: &Project) -> Result<()> {
    let target = project.resolution;
    println!(
        "Resizing screenshots to {}x{}...",
        target.width, target.height
    );

    if !project.screenshot_dir.exists() {
        bail!(
            "screenshot directory {} not found. Run the screenshots step first",
            project.screenshot_dir.display()
        );
    }

    let mut entries = fs::read_dir(&project.screenshot_dir)
        .with_context(|| {
            format!(
                "failed to read screenshot directory {}",
                project.screenshot_dir.display()
            )
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
        .collect::<Vec<_>>();
    entries.sort();

    if entries.is_empty() {
        bail!(
            "no PNG files found in {}",
            project.screenshot_dir.display()
        );
    }

    fs::create_dir_all(&project.resized_dir).with_context(|| {
        format!(
            "failed to create resized directory {}",
            project.resized_dir.display()
        )
    })?;

    let background = project.background_color();
    for input_path in &entries {
        let file_name = input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("\nProcessing {file_name}...");

        if let Err(error) = letterbox_one(input_path, project, background) {
            eprintln!("  error processing {file_name}: {error:#}");
        }
    }

    println!(
        "\nAll screenshots resized and saved to {}",
        project.resized_dir.display()
    );
    Ok(())
}

fn letterbox_one(input_path: &Path, project: &Project, background: Color) -> Result<()> {
    let target = project.resolution;
    let img = image::open(input_path)
        .with_context(|| format!("failed to open image {}", input_path.display()))?
        .into_rgba8();

    let (original_width, original_height) = img.dimensions();
    println!("  Original size: {original_width}x{original_height}");

    let (new_width, new_height, x_offset, y_offset) =
        letterbox_geometry(original_width, original_height, target.width, target.height);

    let resized = imageops::resize(&img, new_width, new_height, FilterType::Lanczos3);

    let mut canvas = RgbaImage::from_pixel(
        target.width,
        target.height,
        Rgba(background.rgba(255)),
    );
    imageops::overlay(&mut canvas, &resized, x_offset as i64, y_offset as i64);

    let output_path = project
        .resized_dir
        .join(input_path.file_name().unwrap_or_default());
    canvas
        .save(&output_path)
        .with_context(|| format!("failed to save image {}", output_path.display()))?;

    println!("  Saved to {}", output_path.display());
    println!("  Resized to: {new_width}x{new_height}, centered at ({x_offset}, {y_offset})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::letterbox_geometry;

    #[test]
    fn wide_image_is_limited_by_width() {
        let (w, h, x, y) = letterbox_geometry(3840, 1080, 1920, 1080);
        assert_eq!(w, (3840.0_f32 * 0.45) as u32);
        assert_eq!(h, (1080.0_f32 * 0.45) as u32);
        assert_eq!(x, (1920 - w) / 2);
        assert_eq!(y, (1080 - h) / 2);
    }

    #[test]
    fn result_always_fits_inside_target() {
        for (ow, oh) in [(100, 100), (5000, 200), (200, 5000), (1920, 1080), (1, 1)] {
            let (w, h, x, y) = letterbox_geometry(ow, oh, 1920, 1080);
            assert!(w <= 1920 && h <= 1080, "{ow}x{oh} scaled to {w}x{h}");
            assert!(x + w <= 1920);
            assert!(y + h <= 1080);
        }
    }

    #[test]
    fn aspect_ratio_is_roughly_preserved() {
        let (w, h, _, _) = letterbox_geometry(800, 400, 1920, 1080);
        let original = 800.0 / 400.0;
        let scaled = w as f32 / h as f32;
        assert!((original - scaled).abs() < 0.05);
    }
}
