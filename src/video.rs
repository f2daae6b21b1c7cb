//! Per-scene video segments and lossless concatenation via ffmpeg.
//!
//! Each scene becomes a still-image-plus-audio H.264 segment; segments are
//! then concatenated stream-copy into the final file. Argument lists are
//! built by pure functions so the exact encoder invocations stay testable.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::exec::{run_tool, run_tool_capture};
use crate::scenes::{Project, Resolution};

pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_BITRATE: &str = "192k";
pub const TEMP_DIR_NAME: &str = "temp_video_files";

/// Still image + narration -> one H.264/AAC segment of fixed duration.
pub fn segment_args(
    image: &Path,
    audio: &Path,
    resolution: Resolution,
    fps: u32,
    total_duration: f32,
    output: &Path,
) -> Vec<String> {
    vec![
        "-loop".to_owned(),
        "1".to_owned(),
        "-i".to_owned(),
        image.to_string_lossy().into_owned(),
        "-i".to_owned(),
        audio.to_string_lossy().into_owned(),
        "-c:v".to_owned(),
        VIDEO_CODEC.to_owned(),
        "-tune".to_owned(),
        "stillimage".to_owned(),
        "-c:a".to_owned(),
        AUDIO_CODEC.to_owned(),
        "-b:a".to_owned(),
        AUDIO_BITRATE.to_owned(),
        "-pix_fmt".to_owned(),
        "yuv420p".to_owned(),
        "-s".to_owned(),
        resolution.ffmpeg_size(),
        "-r".to_owned(),
        fps.to_string(),
        "-t".to_owned(),
        format!("{total_duration:.1}"),
        "-shortest".to_owned(),
        output.to_string_lossy().into_owned(),
        "-y".to_owned(),
    ]
}

/// Concat-demuxer stream copy; no re-encode.
pub fn concat_args(list_file: &Path, output: &Path) -> Vec<String> {
    vec![
        "-f".to_owned(),
        "concat".to_owned(),
        "-safe".to_owned(),
        "0".to_owned(),
        "-i".to_owned(),
        list_file.to_string_lossy().into_owned(),
        "-c".to_owned(),
        "copy".to_owned(),
        output.to_string_lossy().into_owned(),
        "-y".to_owned(),
    ]
}

pub fn probe_stream_args(output: &Path) -> Vec<String> {
    vec![
        "-v".to_owned(),
        "error".to_owned(),
        "-select_streams".to_owned(),
        "v:0".to_owned(),
        "-show_entries".to_owned(),
        "stream=width,height,r_frame_rate,duration".to_owned(),
        "-of".to_owned(),
        "default=noprint_wrappers=1".to_owned(),
        output.to_string_lossy().into_owned(),
    ]
}

/// The concat demuxer wants absolute paths; relative entries would resolve
/// against the list file.
pub fn concat_list_contents(segments: &[PathBuf]) -> String {
    let mut contents = String::new();
    for segment in segments {
        contents.push_str(&format!("file '{}'\n", segment.display()));
    }
    contents
}

/// Builds every scene's segment, concatenates them into `project.output`,
/// and removes the intermediate working directory. Scenes with missing
/// inputs are reported and skipped.
pub fn assemble_video(project: &Project) -> Result<()> {
    let temp_dir = project
        .output
        .parent()
        .map_or_else(|| PathBuf::from(TEMP_DIR_NAME), |dir| dir.join(TEMP_DIR_NAME));
    fs::create_dir_all(&temp_dir)
        .with_context(|| format!("failed to create temp directory {}", temp_dir.display()))?;

    println!("Creating video segments for each scene...");
    println!("Target resolution: {}", project.resolution.ffmpeg_size());
    println!("Frame rate: {} fps", project.fps);

    let mut segments = Vec::new();
    for scene in &project.scenes {
        println!("\nProcessing {}...", scene.id);

        let image_file = project.resized_dir.join(scene.image_file_name());
        if !image_file.exists() {
            eprintln!("  error: image file {} not found", image_file.display());
            continue;
        }
        let audio_file = project.audio_dir.join(scene.audio_file_name());
        if !audio_file.exists() {
            eprintln!("  error: audio file {} not found", audio_file.display());
            continue;
        }

        let segment = temp_dir.join(scene.segment_file_name());
        let args = segment_args(
            &image_file,
            &audio_file,
            project.resolution,
            project.fps,
            scene.total_duration(),
            &segment,
        );
        match run_tool("ffmpeg", &args) {
            Ok(()) => {
                println!(
                    "  created segment {} ({:.1}s: content {:.1}s, gap {:.1}s)",
                    segment.display(),
                    scene.total_duration(),
                    scene.duration,
                    scene.gap
                );
                segments.push(canonical(&segment));
            }
            Err(error) => eprintln!("  error creating video segment: {error:#}"),
        }
    }

    if segments.is_empty() {
        bail!("no video segments were created; nothing to concatenate");
    }

    let list_file = temp_dir.join("concat.txt");
    fs::write(&list_file, concat_list_contents(&segments))
        .with_context(|| format!("failed to write concat list {}", list_file.display()))?;

    println!("\nConcatenating all video segments...");
    run_tool("ffmpeg", &concat_args(&list_file, &project.output))?;
    println!("Wrote {}", project.output.display());

    if let Ok(info) = run_tool_capture("ffprobe", &probe_stream_args(&project.output)) {
        println!("\nVideo info:\n{info}");
    }
    if let Ok(metadata) = fs::metadata(&project.output) {
        println!(
            "File size: {:.2} MB",
            metadata.len() as f64 / (1024.0 * 1024.0)
        );
    }

    println!("\nCleaning up temporary files...");
    fs::remove_dir_all(&temp_dir)
        .with_context(|| format!("failed to remove temp directory {}", temp_dir.display()))?;

    Ok(())
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{concat_args, concat_list_contents, segment_args};
    use crate::scenes::Resolution;

    #[test]
    fn segment_args_match_encoder_contract() {
        let args = segment_args(
            Path::new("pic_resized/scene01_html.png"),
            Path::new("audio/scene01_narration.mp3"),
            Resolution {
                width: 1920,
                height: 1080,
            },
            30,
            13.0,
            Path::new("tmp/scene01_video.mp4"),
        );
        let expected = [
            "-loop",
            "1",
            "-i",
            "pic_resized/scene01_html.png",
            "-i",
            "audio/scene01_narration.mp3",
            "-c:v",
            "libx264",
            "-tune",
            "stillimage",
            "-c:a",
            "aac",
            "-b:a",
            "192k",
            "-pix_fmt",
            "yuv420p",
            "-s",
            "1920x1080",
            "-r",
            "30",
            "-t",
            "13.0",
            "-shortest",
            "tmp/scene01_video.mp4",
            "-y",
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn segment_duration_keeps_one_decimal_place() {
        let args = segment_args(
            Path::new("a.png"),
            Path::new("a.mp3"),
            Resolution {
                width: 1280,
                height: 720,
            },
            30,
            11.5,
            Path::new("a.mp4"),
        );
        assert!(args
            .windows(2)
            .any(|pair| pair[0] == "-t" && pair[1] == "11.5"));
    }

    #[test]
    fn concat_uses_stream_copy() {
        let args = concat_args(Path::new("tmp/concat.txt"), Path::new("out.mp4"));
        assert_eq!(
            args,
            ["-f", "concat", "-safe", "0", "-i", "tmp/concat.txt", "-c", "copy", "out.mp4", "-y"]
        );
    }

    #[test]
    fn concat_list_has_one_quoted_entry_per_segment() {
        let contents = concat_list_contents(&[
            PathBuf::from("/tmp/a.mp4"),
            PathBuf::from("/tmp/b.mp4"),
        ]);
        assert_eq!(contents, "file '/tmp/a.mp4'\nfile '/tmp/b.mp4'\n");
    }
}
