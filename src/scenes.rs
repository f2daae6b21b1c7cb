use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::theme::{Color, Theme};

/// Project manifest: the source file to slice, the scene table driving
/// screenshot/audio/video generation, and output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub source: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,
    #[serde(default = "default_resized_dir")]
    pub resized_dir: PathBuf,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
    /// Letterbox background behind resized screenshots.
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub tts: TtsConfig,
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Resolution {
    pub fn ffmpeg_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TtsConfig {
    #[serde(default = "default_macos_voice")]
    pub macos_voice: String,
    #[serde(default = "default_macos_rate")]
    pub macos_rate: u32,
    #[serde(default = "default_espeak_voice")]
    pub espeak_voice: String,
    #[serde(default = "default_espeak_speed")]
    pub espeak_speed: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            macos_voice: default_macos_voice(),
            macos_rate: default_macos_rate(),
            espeak_voice: default_espeak_voice(),
            espeak_speed: default_espeak_speed(),
        }
    }
}

/// One named slice of the source file with narration text and timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    pub id: String,
    pub name: String,
    pub lines: LineRange,
    /// Main display time in seconds, estimated from narration length.
    pub duration: f32,
    /// Silent spacing after the scene (last scene usually sets 0).
    #[serde(default = "default_gap")]
    pub gap: f32,
    pub narration: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineRange {
    /// 1-based, inclusive.
    pub start: usize,
    pub end: usize,
}

impl Scene {
    pub fn image_file_name(&self) -> String {
        format!("{}_{}.png", self.id, self.name)
    }

    pub fn audio_file_name(&self) -> String {
        format!("{}_narration.mp3", self.id)
    }

    pub fn intermediate_audio_file_name(&self, extension: &str) -> String {
        format!("{}_narration.{extension}", self.id)
    }

    pub fn segment_file_name(&self) -> String {
        format!("{}_video.mp4", self.id)
    }

    pub fn title(&self, source_name: &str) -> String {
        format!(
            "{} - Lines {}-{}",
            source_name, self.lines.start, self.lines.end
        )
    }

    pub fn total_duration(&self) -> f32 {
        self.duration + self.gap
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("tutorial.mp4")
}
fn default_theme() -> String {
    "light".to_owned()
}
fn default_font_size() -> f32 {
    16.0
}
fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("pic")
}
fn default_resized_dir() -> PathBuf {
    PathBuf::from("pic_resized")
}
fn default_audio_dir() -> PathBuf {
    PathBuf::from("audio")
}
fn default_background() -> String {
    "#2d2d2d".to_owned()
}
fn default_fps() -> u32 {
    30
}
fn default_gap() -> f32 {
    1.0
}
fn default_macos_voice() -> String {
    "Kyoko".to_owned()
}
fn default_macos_rate() -> u32 {
    225
}
fn default_espeak_voice() -> String {
    "ja".to_owned()
}
fn default_espeak_speed() -> u32 {
    150
}

pub fn load_and_validate_project(path: &Path) -> Result<Project> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read project manifest {}", path.display()))?;
    let mut project: Project = serde_yaml::from_str(&contents).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!(
            "failed to parse yaml in {} at {}: {}",
            path.display(),
            location,
            error
        )
    })?;

    validate_project(&mut project, path)?;
    Ok(project)
}

fn validate_project(project: &mut Project, manifest_path: &Path) -> Result<()> {
    if project.scenes.is_empty() {
        bail!("project must define at least one scene");
    }

    // Unknown theme names would silently fall back at render time; reject
    // them here to catch manifest typos.
    if !Theme::is_known(&project.theme) {
        bail!(
            "unknown theme '{}'. Expected one of: dark, light",
            project.theme
        );
    }

    if project.font_size <= 0.0 {
        bail!("font_size must be > 0, got {}", project.font_size);
    }
    if project.fps == 0 {
        bail!("fps must be > 0");
    }
    if project.resolution.width == 0 || project.resolution.height == 0 {
        bail!(
            "resolution must be positive, got {}x{}",
            project.resolution.width,
            project.resolution.height
        );
    }

    Color::from_hex(&project.background)
        .with_context(|| format!("invalid background color '{}'", project.background))?;

    let mut seen_ids = HashSet::with_capacity(project.scenes.len());
    for scene in &project.scenes {
        if !seen_ids.insert(scene.id.clone()) {
            bail!("duplicate scene id '{}'", scene.id);
        }
        if scene.lines.start == 0 {
            bail!("scene '{}' line numbers are 1-based; start must be >= 1", scene.id);
        }
        if scene.lines.start > scene.lines.end {
            bail!(
                "scene '{}' has inverted line range {}-{}",
                scene.id,
                scene.lines.start,
                scene.lines.end
            );
        }
        if scene.duration <= 0.0 {
            bail!("scene '{}' duration must be > 0", scene.id);
        }
        if scene.gap < 0.0 {
            bail!("scene '{}' gap must be >= 0", scene.id);
        }
    }

    let manifest_dir = manifest_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let source = resolve(&manifest_dir, &project.source);
    if !source.exists() {
        bail!("source file does not exist: {}", source.display());
    }
    if !source.is_file() {
        bail!("source path is not a file: {}", source.display());
    }
    project.source = source;

    // Working directories and the output live next to the manifest.
    project.screenshot_dir = resolve(&manifest_dir, &project.screenshot_dir);
    project.resized_dir = resolve(&manifest_dir, &project.resized_dir);
    project.audio_dir = resolve(&manifest_dir, &project.audio_dir);
    project.output = resolve(&manifest_dir, &project.output);

    Ok(())
}

fn resolve(manifest_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        manifest_dir.join(path)
    }
}

impl Project {
    pub fn source_file_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn background_color(&self) -> Color {
        // Validated at load time.
        Color::from_hex(&self.background).unwrap_or(Color::rgb(0x2d, 0x2d, 0x2d))
    }
}
