//! Per-scene narration synthesis via a local text-to-speech command.
//!
//! Backend is chosen by availability probing: the macOS `say` command first,
//! then `espeak`. Synthesized intermediates (aiff/wav) are converted to MP3
//! with ffmpeg and removed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::exec::{run_tool, run_tool_capture, tool_available};
use crate::scenes::{Project, Scene, TtsConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsBackend {
    /// macOS built-in `say`.
    Say,
    /// Linux `espeak`.
    Espeak,
}

impl TtsBackend {
    pub fn program(&self) -> &'static str {
        match self {
            TtsBackend::Say => "say",
            TtsBackend::Espeak => "espeak",
        }
    }

    /// `say` writes aiff, `espeak` writes wav.
    pub fn intermediate_extension(&self) -> &'static str {
        match self {
            TtsBackend::Say => "aiff",
            TtsBackend::Espeak => "wav",
        }
    }

    pub fn synth_args(&self, tts: &TtsConfig, output: &Path, text: &str) -> Vec<String> {
        match self {
            TtsBackend::Say => vec![
                "-v".to_owned(),
                tts.macos_voice.clone(),
                "-r".to_owned(),
                tts.macos_rate.to_string(),
                "-o".to_owned(),
                output.to_string_lossy().into_owned(),
                text.to_owned(),
            ],
            TtsBackend::Espeak => vec![
                "-v".to_owned(),
                tts.espeak_voice.clone(),
                "-s".to_owned(),
                tts.espeak_speed.to_string(),
                "-w".to_owned(),
                output.to_string_lossy().into_owned(),
                text.to_owned(),
            ],
        }
    }
}

/// Probes for a usable TTS command. First hit wins.
pub fn detect_tts_backend() -> Option<TtsBackend> {
    if tool_available("say", "--version") {
        return Some(TtsBackend::Say);
    }
    if tool_available("espeak", "--version") {
        return Some(TtsBackend::Espeak);
    }
    None
}

pub fn mp3_convert_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-i".to_owned(),
        input.to_string_lossy().into_owned(),
        "-acodec".to_owned(),
        "mp3".to_owned(),
        "-ab".to_owned(),
        "128k".to_owned(),
        output.to_string_lossy().into_owned(),
        "-y".to_owned(),
    ]
}

pub fn probe_duration_args(path: &Path) -> Vec<String> {
    vec![
        "-v".to_owned(),
        "error".to_owned(),
        "-show_entries".to_owned(),
        "format=duration".to_owned(),
        "-of".to_owned(),
        "default=noprint_wrappers=1:nokey=1".to_owned(),
        path.to_string_lossy().into_owned(),
    ]
}

pub fn probe_duration_seconds(path: &Path) -> Result<f64> {
    let stdout = run_tool_capture("ffprobe", &probe_duration_args(path))?;
    stdout
        .trim()
        .parse::<f64>()
        .with_context(|| format!("unparseable ffprobe duration '{}'", stdout.trim()))
}

fn intermediate_path(project: &Project, scene: &Scene, backend: TtsBackend) -> PathBuf {
    project
        .audio_dir
        .join(scene.intermediate_audio_file_name(backend.intermediate_extension()))
}

/// Synthesizes narration for every scene, converts to MP3, and reports the
/// resulting durations. Per-scene synthesis failures are reported and
/// skipped, matching the best-effort posture of the rest of the pipeline.
pub fn generate_audio(project: &Project) -> Result<()> {
    let backend = match detect_tts_backend() {
        Some(backend) => backend,
        None => bail!(
            "no suitable TTS system found. Install the `say` command (macOS, built-in) \
             or espeak (Linux: sudo apt-get install espeak)"
        ),
    };
    println!("Using {} for audio generation", backend.program());

    fs::create_dir_all(&project.audio_dir).with_context(|| {
        format!(
            "failed to create audio directory {}",
            project.audio_dir.display()
        )
    })?;

    for scene in &project.scenes {
        let output = intermediate_path(project, scene, backend);
        println!("Generating audio for {}...", scene.id);
        let args = backend.synth_args(&project.tts, &output, &scene.narration);
        if let Err(error) = run_tool(backend.program(), &args) {
            eprintln!("  error generating audio for {}: {error:#}", scene.id);
            continue;
        }
    }

    println!("\nConverting audio files to MP3...");
    for scene in &project.scenes {
        let input = intermediate_path(project, scene, backend);
        if !input.exists() {
            continue;
        }
        let mp3 = project.audio_dir.join(scene.audio_file_name());
        println!("Converting {}...", scene.id);
        match run_tool("ffmpeg", &mp3_convert_args(&input, &mp3)) {
            Ok(()) => {
                if let Err(error) = fs::remove_file(&input) {
                    eprintln!("  could not remove {}: {error}", input.display());
                }
            }
            Err(error) => eprintln!("  error converting {} to MP3: {error:#}", scene.id),
        }
    }

    println!("\nAudio file durations:");
    for scene in &project.scenes {
        let mp3 = project.audio_dir.join(scene.audio_file_name());
        if !mp3.exists() {
            continue;
        }
        match probe_duration_seconds(&mp3) {
            Ok(duration) => println!("  {}: {duration:.1} seconds", scene.id),
            Err(_) => println!("  {}: unable to get duration", scene.id),
        }
    }

    Ok(())
}
