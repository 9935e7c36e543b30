//! End-to-end render orchestration.
//!
//! [`render_job`] takes an animation name, configuration overrides and an
//! output selection, and drives the full chain: registry lookup, lifecycle
//! assembly, timeline validation, per-frame rasterization and encoding.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    animation::base::Script,
    config::ConfigMap,
    encode::ffmpeg::{EncodeConfig, FfmpegEncoder},
    foundation::error::{AsmvizError, AsmvizResult},
    registry::Registry,
    render::{
        backend::RenderBackend,
        cpu::CpuBackend,
        presets::{OutputFormat, PresetTable, Quality},
    },
    scene::timeline::Timeline,
};

/// One requested render: which animation, how, and where to.
#[derive(Clone, Debug)]
pub struct RenderJob {
    pub animation: String,
    pub overrides: ConfigMap,
    pub format: OutputFormat,
    pub quality: Quality,
    pub out_dir: PathBuf,
}

/// What a finished render produced.
#[derive(Clone, Debug)]
pub struct RenderReport {
    pub out_path: PathBuf,
    pub frames: u64,
    pub duration_secs: f64,
}

/// Run `job` to completion and return where the artifact landed.
pub fn render_job(registry: &Registry, job: &RenderJob) -> AsmvizResult<RenderReport> {
    let timeline = build_timeline(registry, job)?;

    let preset = PresetTable::default().preset(job.quality);
    let frames = preset.fps.secs_to_frames_ceil(timeline.total_secs());
    let out_path = job
        .out_dir
        .join(&job.animation)
        .with_extension(job.format.extension());

    info!(
        animation = %job.animation,
        format = %job.format,
        quality = %job.quality,
        width = preset.canvas.width,
        height = preset.canvas.height,
        fps = preset.fps.as_f64(),
        frames,
        "starting render"
    );

    let mut backend = CpuBackend::new(load_font_bytes(registry, job)?)?;
    let encoder = FfmpegEncoder::new(EncodeConfig {
        out_path: out_path.clone(),
        canvas: preset.canvas,
        fps: preset.fps,
        format: job.format,
    })?;

    let out_path = stream_frames(&timeline, &mut backend, encoder, preset, frames)?;

    Ok(RenderReport {
        out_path,
        frames,
        duration_secs: timeline.total_secs(),
    })
}

/// Render a single frame at `t` seconds to a PNG, for inspection without a
/// full encode.
pub fn render_frame_png(
    registry: &Registry,
    job: &RenderJob,
    t_secs: f64,
    out_path: &Path,
) -> AsmvizResult<()> {
    let timeline = build_timeline(registry, job)?;
    let preset = PresetTable::default().preset(job.quality);

    let mut backend = CpuBackend::new(load_font_bytes(registry, job)?)?;
    let scene = timeline.scene_at(t_secs.clamp(0.0, timeline.total_secs()))?;
    let frame = backend.render_scene(&scene, preset.canvas)?;

    crate::encode::ffmpeg::ensure_parent_dir(out_path)?;
    image::save_buffer_with_format(
        out_path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| AsmvizError::engine(format!("write png '{}': {e}", out_path.display())))?;
    Ok(())
}

fn build_timeline(registry: &Registry, job: &RenderJob) -> AsmvizResult<Timeline> {
    let anim = registry.create(&job.animation, &job.overrides)?;
    let script = Script::assemble(anim.as_ref())?;
    debug!(steps = script.steps.len(), "assembled lifecycle");
    script.into_timeline()
}

fn load_font_bytes(registry: &Registry, job: &RenderJob) -> AsmvizResult<Vec<u8>> {
    let cfg = registry.resolve(&job.animation, &job.overrides)?;
    let source = cfg.get_str("font_source")?;
    std::fs::read(source)
        .map_err(|e| AsmvizError::engine(format!("failed to read font '{source}': {e}")))
}

fn stream_frames(
    timeline: &Timeline,
    backend: &mut dyn RenderBackend,
    mut encoder: FfmpegEncoder,
    preset: crate::render::presets::QualityPreset,
    frames: u64,
) -> AsmvizResult<PathBuf> {
    for frame_idx in 0..frames {
        let t = frame_idx as f64 * preset.fps.frame_duration_secs();
        let result = timeline
            .scene_at(t)
            .and_then(|scene| backend.render_scene(&scene, preset.canvas))
            .and_then(|frame| encoder.encode_frame(&frame));
        if let Err(e) = result {
            // Drop the partial file so a failed render leaves nothing behind.
            encoder.abort();
            return Err(e);
        }
    }
    encoder.finish()
}
