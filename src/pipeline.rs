//! Sequential pipeline orchestration: screenshots -> audio -> resize ->
//! video, with an up-front requirements probe and a final summary.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::audio::{detect_tts_backend, generate_audio};
use crate::exec::tool_available;
use crate::renderer::CodeImageGenerator;
use crate::resize::resize_screenshots;
use crate::scenes::{LineRange, Project};
use crate::video::assemble_video;

/// Verifies external collaborators before any work starts.
pub fn check_requirements() -> Result<()> {
    println!("Checking requirements...");

    let ffmpeg = tool_available("ffmpeg", "-version");
    println!(
        "  ffmpeg: {}",
        if ffmpeg { "ok" } else { "missing (install ffmpeg)" }
    );

    let tts = detect_tts_backend();
    match tts {
        Some(backend) => println!("  tts: ok ({})", backend.program()),
        None => println!("  tts: missing (say or espeak)"),
    }

    if !ffmpeg {
        bail!("ffmpeg not available - video generation is not possible");
    }
    if tts.is_none() {
        bail!("no TTS backend available - narration generation is not possible");
    }
    Ok(())
}

/// Maps a scene's 1-based inclusive line range onto 0-based half-open slice
/// bounds for a file of `line_count` lines. An end past the file is clamped;
/// a range entirely past the file yields None.
pub fn scene_slice(range: LineRange, line_count: usize) -> Option<(usize, usize)> {
    let end = range.end.min(line_count);
    if range.start > end {
        return None;
    }
    Some((range.start - 1, end))
}

/// Renders every scene's slice of the source file into the screenshot
/// directory, using the project theme and font size.
pub fn generate_screenshots(project: &Project) -> Result<()> {
    let code = fs::read_to_string(&project.source)
        .with_context(|| format!("failed to read source file {}", project.source.display()))?;
    let lines = code.split('\n').collect::<Vec<_>>();

    fs::create_dir_all(&project.screenshot_dir).with_context(|| {
        format!(
            "failed to create screenshot directory {}",
            project.screenshot_dir.display()
        )
    })?;

    let mut generator = CodeImageGenerator::new(&project.theme, project.font_size);
    let source_name = project.source_file_name();

    for scene in &project.scenes {
        if scene.lines.end > lines.len() {
            eprintln!(
                "warning: scene '{}' ends at line {} but {} has only {} lines",
                scene.id,
                scene.lines.end,
                source_name,
                lines.len()
            );
        }
        let Some((start, end)) = scene_slice(scene.lines, lines.len()) else {
            eprintln!(
                "warning: scene '{}' is entirely past end of file, skipping",
                scene.id
            );
            continue;
        };
        let scene_code = lines[start..end].join("\n");

        let output_path = project.screenshot_dir.join(scene.image_file_name());
        println!("Generating {}...", output_path.display());
        generator.generate_image(&scene_code, &output_path, Some(&scene.title(&source_name)))?;
    }

    println!(
        "\nAll {} screenshots generated in {}",
        project.scenes.len(),
        project.screenshot_dir.display()
    );
    Ok(())
}

/// Runs the whole pipeline in order, aborting on the first failed step.
pub fn run_pipeline(project: &Project) -> Result<()> {
    check_requirements()?;

    println!("\n1. Generating screenshots...");
    generate_screenshots(project).context("screenshot generation failed")?;

    println!("\n2. Generating audio files...");
    generate_audio(project).context("audio generation failed")?;

    println!("\n3. Resizing screenshots...");
    resize_screenshots(project).context("screenshot resizing failed")?;

    println!("\n4. Creating video...");
    assemble_video(project).context("video creation failed")?;

    show_summary(project);
    Ok(())
}

/// Prints counts and sizes of everything the pipeline produced.
pub fn show_summary(project: &Project) {
    println!("\nGenerated files summary");

    report_dir(&project.screenshot_dir, "png", "Screenshots");
    report_dir(&project.resized_dir, "png", "Resized screenshots");
    report_dir(&project.audio_dir, "mp3", "Audio files");

    if let Ok(metadata) = fs::metadata(&project.output) {
        println!(
            "  Final video: {} ({:.2} MB)",
            project.output.display(),
            metadata.len() as f64 / (1024.0 * 1024.0)
        );
    }
}

fn report_dir(dir: &Path, extension: &str, label: &str) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut count = 0usize;
    let mut total_bytes = 0u64;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == extension) {
            count += 1;
            total_bytes += entry.metadata().map(|metadata| metadata.len()).unwrap_or(0);
        }
    }
    if count > 0 {
        println!(
            "  {label} ({}): {count} files, {:.2} MB",
            dir.display(),
            total_bytes as f64 / (1024.0 * 1024.0)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::scene_slice;
    use crate::scenes::LineRange;

    #[test]
    fn in_range_scene_maps_to_zero_based_half_open_bounds() {
        assert_eq!(scene_slice(LineRange { start: 1, end: 30 }, 97), Some((0, 30)));
        assert_eq!(scene_slice(LineRange { start: 91, end: 97 }, 97), Some((90, 97)));
        assert_eq!(scene_slice(LineRange { start: 97, end: 97 }, 97), Some((96, 97)));
    }

    #[test]
    fn end_past_the_file_is_clamped() {
        assert_eq!(scene_slice(LineRange { start: 91, end: 120 }, 97), Some((90, 97)));
        assert_eq!(scene_slice(LineRange { start: 1, end: 5 }, 3), Some((0, 3)));
    }

    #[test]
    fn scene_entirely_past_the_file_is_skipped() {
        assert_eq!(scene_slice(LineRange { start: 98, end: 120 }, 97), None);
        assert_eq!(scene_slice(LineRange { start: 1, end: 2 }, 0), None);
    }
}
