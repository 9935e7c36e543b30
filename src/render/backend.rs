use crate::{
    foundation::{core::Canvas, error::AsmvizResult},
    scene::model::Scene,
};

/// A rendered frame as RGBA8 pixels.
///
/// Scenes always carry an opaque background color, so frames come back with
/// every alpha byte at 255 and can be streamed to the encoder as-is.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

/// A renderer that rasterizes one scene state into a frame.
///
/// The backend owns whatever contexts and caches it needs across frames; the
/// pipeline calls it once per output frame with the interpolated scene.
pub trait RenderBackend {
    fn render_scene(&mut self, scene: &Scene, canvas: Canvas) -> AsmvizResult<FrameRgba>;
}
