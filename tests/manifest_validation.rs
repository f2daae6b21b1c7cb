use std::fs;
use std::path::PathBuf;

use codereel::scenes::load_and_validate_project;
use tempfile::TempDir;

const MINIMAL_MANIFEST: &str = r#"
source: index.html
scenes:
  - id: scene01
    name: html_structure
    lines: { start: 1, end: 3 }
    duration: 12.0
    narration: "The HTML structure sets up the page."
"#;

fn write_project(manifest: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("index.html"), "<html>\n<body>\n</body>\n</html>\n")
        .expect("source file");
    let manifest_path = dir.path().join("reel.yaml");
    fs::write(&manifest_path, manifest).expect("manifest file");
    (dir, manifest_path)
}

#[test]
fn minimal_manifest_parses_with_defaults() {
    let (dir, manifest_path) = write_project(MINIMAL_MANIFEST);
    let project = load_and_validate_project(&manifest_path).expect("manifest should load");

    assert_eq!(project.theme, "light");
    assert_eq!(project.font_size, 16.0);
    assert_eq!(project.fps, 30);
    assert_eq!(project.resolution.width, 1920);
    assert_eq!(project.resolution.height, 1080);
    assert_eq!(project.background, "#2d2d2d");
    assert_eq!(project.scenes.len(), 1);
    assert_eq!(project.scenes[0].gap, 1.0);

    // Paths are resolved against the manifest directory.
    assert_eq!(project.source, dir.path().join("index.html"));
    assert_eq!(project.screenshot_dir, dir.path().join("pic"));
    assert_eq!(project.audio_dir, dir.path().join("audio"));
}

#[test]
fn scene_derived_names_follow_conventions() {
    let (_dir, manifest_path) = write_project(MINIMAL_MANIFEST);
    let project = load_and_validate_project(&manifest_path).expect("manifest should load");
    let scene = &project.scenes[0];

    assert_eq!(scene.image_file_name(), "scene01_html_structure.png");
    assert_eq!(scene.audio_file_name(), "scene01_narration.mp3");
    assert_eq!(scene.segment_file_name(), "scene01_video.mp4");
    assert_eq!(scene.title("index.html"), "index.html - Lines 1-3");
    assert_eq!(scene.total_duration(), 13.0);
}

#[test]
fn missing_source_file_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let manifest_path = dir.path().join("reel.yaml");
    fs::write(&manifest_path, MINIMAL_MANIFEST).expect("manifest file");

    let error = load_and_validate_project(&manifest_path).unwrap_err();
    assert!(error.to_string().contains("does not exist"), "{error:#}");
}

#[test]
fn duplicate_scene_ids_are_rejected() {
    let manifest = r#"
source: index.html
scenes:
  - id: scene01
    name: a
    lines: { start: 1, end: 2 }
    duration: 5.0
    narration: first
  - id: scene01
    name: b
    lines: { start: 2, end: 3 }
    duration: 5.0
    narration: second
"#;
    let (_dir, manifest_path) = write_project(manifest);
    let error = load_and_validate_project(&manifest_path).unwrap_err();
    assert!(error.to_string().contains("duplicate scene id"), "{error:#}");
}

#[test]
fn inverted_line_range_is_rejected() {
    let manifest = r#"
source: index.html
scenes:
  - id: scene01
    name: a
    lines: { start: 5, end: 2 }
    duration: 5.0
    narration: text
"#;
    let (_dir, manifest_path) = write_project(manifest);
    let error = load_and_validate_project(&manifest_path).unwrap_err();
    assert!(error.to_string().contains("inverted line range"), "{error:#}");
}

#[test]
fn zero_based_line_numbers_are_rejected() {
    let manifest = r#"
source: index.html
scenes:
  - id: scene01
    name: a
    lines: { start: 0, end: 2 }
    duration: 5.0
    narration: text
"#;
    let (_dir, manifest_path) = write_project(manifest);
    assert!(load_and_validate_project(&manifest_path).is_err());
}

#[test]
fn unknown_theme_is_rejected_at_manifest_level() {
    let manifest = r#"
source: index.html
theme: solarized
scenes:
  - id: scene01
    name: a
    lines: { start: 1, end: 2 }
    duration: 5.0
    narration: text
"#;
    let (_dir, manifest_path) = write_project(manifest);
    let error = load_and_validate_project(&manifest_path).unwrap_err();
    assert!(error.to_string().contains("unknown theme"), "{error:#}");
}

#[test]
fn invalid_background_color_is_rejected() {
    let manifest = r#"
source: index.html
background: "2d2d2d"
scenes:
  - id: scene01
    name: a
    lines: { start: 1, end: 2 }
    duration: 5.0
    narration: text
"#;
    let (_dir, manifest_path) = write_project(manifest);
    assert!(load_and_validate_project(&manifest_path).is_err());
}

#[test]
fn unknown_fields_are_rejected() {
    let manifest = r#"
source: index.html
frames_per_second: 60
scenes:
  - id: scene01
    name: a
    lines: { start: 1, end: 2 }
    duration: 5.0
    narration: text
"#;
    let (_dir, manifest_path) = write_project(manifest);
    let error = load_and_validate_project(&manifest_path).unwrap_err();
    assert!(error.to_string().contains("failed to parse yaml"), "{error:#}");
}

#[test]
fn empty_scene_list_is_rejected() {
    let manifest = "source: index.html\nscenes: []\n";
    let (_dir, manifest_path) = write_project(manifest);
    let error = load_and_validate_project(&manifest_path).unwrap_err();
    assert!(error.to_string().contains("at least one scene"), "{error:#}");
}
