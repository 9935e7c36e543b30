//! asmviz is a parameterized animation generator for the Mastermind-in-
//! assembly writeup.
//!
//! Each visualization is an [`Animation`] variant that emits an ordered list
//! of [`Step`]s; the timeline validates and interpolates them, the CPU
//! backend rasterizes each frame, and `ffmpeg` encodes the result as a GIF
//! or MP4 at one of three quality presets.
#![forbid(unsafe_code)]

pub mod animation;
pub mod animations;
pub mod config;
pub mod encode;
mod foundation;
pub mod registry;
pub mod render;
pub mod scene;

pub use crate::animation::base::{Animation, Script, Theme};
pub use crate::animation::ease::Ease;
pub use crate::config::{Config, ConfigMap, global_defaults, resolve};
pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, LOGICAL_HEIGHT, LOGICAL_WIDTH, Point, Rect, Rgba8, Vec2,
};
pub use crate::foundation::error::{AsmvizError, AsmvizResult};
pub use crate::registry::Registry;
pub use crate::render::backend::{FrameRgba, RenderBackend};
pub use crate::render::pipeline::{RenderJob, RenderReport, render_frame_png, render_job};
pub use crate::render::presets::{OutputFormat, PresetTable, Quality, QualityPreset};
pub use crate::scene::model::{Entity, EntityKind, Scene, ShapeKind};
pub use crate::scene::step::{Action, Step};
pub use crate::scene::timeline::{Cue, Timeline};
