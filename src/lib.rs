//! codereel: a small tutorial-video compiler.
//!
//! Slices an HTML/CSS/JS source file into labeled scenes, renders each scene
//! as a syntax-highlighted screenshot, synthesizes narration with a local
//! TTS command, letterboxes the images to a uniform frame, and stitches
//! image+audio pairs into one video with ffmpeg.

pub mod audio;
pub mod exec;
pub mod font;
pub mod pipeline;
pub mod renderer;
pub mod resize;
pub mod scenes;
pub mod theme;
pub mod tokenizer;
pub mod video;
