use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use codereel::pipeline::{check_requirements, generate_screenshots, run_pipeline};
use codereel::renderer::CodeImageGenerator;
use codereel::scenes::load_and_validate_project;
use codereel::{audio, resize, video};

#[derive(Debug, Parser)]
#[command(name = "codereel")]
#[command(about = "Tutorial video compiler: code screenshots + narration -> mp4")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render one source file to dark and light themed screenshots.
    Render {
        /// Source file to render.
        #[arg(default_value = "index.html")]
        input: PathBuf,
        /// Font size in pixels.
        #[arg(long, default_value_t = 14.0)]
        font_size: f32,
    },
    /// Validate a project manifest and probe for required tools.
    Check { manifest: PathBuf },
    /// Generate per-scene screenshots.
    Screenshots { manifest: PathBuf },
    /// Generate per-scene narration audio.
    Audio { manifest: PathBuf },
    /// Letterbox screenshots to the project resolution.
    Resize { manifest: PathBuf },
    /// Assemble per-scene segments and concatenate the final video.
    Video { manifest: PathBuf },
    /// Run every step in order.
    Pipeline { manifest: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { input, font_size } => run_render(&input, font_size),
        Commands::Check { manifest } => run_check(&manifest),
        Commands::Screenshots { manifest } => {
            generate_screenshots(&load_and_validate_project(&manifest)?)
        }
        Commands::Audio { manifest } => audio::generate_audio(&load_and_validate_project(&manifest)?),
        Commands::Resize { manifest } => {
            resize::resize_screenshots(&load_and_validate_project(&manifest)?)
        }
        Commands::Video { manifest } => video::assemble_video(&load_and_validate_project(&manifest)?),
        Commands::Pipeline { manifest } => run_pipeline(&load_and_validate_project(&manifest)?),
    }
}

fn run_check(manifest_path: &Path) -> Result<()> {
    let project = load_and_validate_project(manifest_path)?;

    println!(
        "OK: {} ({} scenes, {} theme, {} @ {} fps)",
        manifest_path.display(),
        project.scenes.len(),
        project.theme,
        project.resolution.ffmpeg_size(),
        project.fps
    );
    check_requirements()
}

/// Standalone converter: one input file, both themes.
fn run_render(input: &Path, font_size: f32) -> Result<()> {
    let code = fs::read_to_string(input)
        .with_context(|| format!("failed to read input file {}", input.display()))?;

    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "code".to_owned());

    for theme in ["dark", "light"] {
        let mut generator = CodeImageGenerator::new(theme, font_size);
        let output = PathBuf::from(format!("{stem}_{theme}_simple.png"));
        let title = format!(
            "{file_name} - {} Theme",
            if theme == "dark" { "Dark" } else { "Light" }
        );
        generator.generate_image(&code, &output, Some(&title))?;
    }

    println!("\nSuccessfully generated:");
    println!("  - Dark theme: {stem}_dark_simple.png");
    println!("  - Light theme: {stem}_light_simple.png");
    Ok(())
}
