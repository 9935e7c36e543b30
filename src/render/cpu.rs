//! CPU raster backend powered by `vello_cpu`.
//!
//! Scripts lay entities out in the logical 1920x1080 plane; this backend
//! applies one uniform scale so every quality preset renders from the same
//! timeline. Text is shaped with Parley from the configured font bytes.

use kurbo::Shape as _;

use crate::{
    foundation::{
        core::{Affine, LOGICAL_HEIGHT, LOGICAL_WIDTH, Point, Rect, Rgba8, Vec2},
        error::{AsmvizError, AsmvizResult},
    },
    render::backend::{FrameRgba, RenderBackend},
    scene::model::{Entity, EntityKind, Scene, ShapeKind},
};

use crate::foundation::core::Canvas;

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Stateful helper for building Parley layouts from one registered font.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    fn new(font_bytes: Vec<u8>) -> AsmvizResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            AsmvizError::engine("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| AsmvizError::engine("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    fn layout_plain(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> AsmvizResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(AsmvizError::engine("text size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// CPU raster backend. Owns the render context and text engine so repeated
/// frames reuse both.
pub struct CpuBackend {
    ctx: Option<vello_cpu::RenderContext>,
    text: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
}

impl CpuBackend {
    pub fn new(font_bytes: Vec<u8>) -> AsmvizResult<Self> {
        let text = TextLayoutEngine::new(font_bytes.clone())?;
        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            ctx: None,
            text,
            font,
        })
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> AsmvizResult<R>,
    ) -> AsmvizResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn draw_entity(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        entity: &Entity,
        scale: f64,
    ) -> AsmvizResult<()> {
        let opacity = entity.opacity.clamp(0.0, 1.0) as f32;
        if opacity <= 0.0 {
            return Ok(());
        }
        ctx.set_transform(affine_to_cpu(Affine::scale(scale)));
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }

        let pos = entity.pos;
        let color = entity.color;
        match &entity.kind {
            EntityKind::Label { text, font_size } => {
                self.draw_text_centered(ctx, text, *font_size, color, pos, scale)?;
            }
            EntityKind::Counter {
                label,
                value,
                font_size,
            } => {
                self.draw_text_centered(ctx, &value.to_string(), *font_size, color, pos, scale)?;
                self.draw_text_centered(
                    ctx,
                    label,
                    font_size * 0.55,
                    color,
                    Vec2::new(pos.x, pos.y + font_size * 0.95),
                    scale,
                )?;
            }
            EntityKind::Register {
                label,
                value,
                width,
                height,
            } => {
                let rect = centered_rect(pos, *width, *height);
                fill_rect(ctx, &rect, color.with_alpha(40));
                stroke_rect(ctx, &rect, 3.0, color);
                self.draw_text_centered(
                    ctx,
                    label,
                    26.0,
                    color,
                    Vec2::new(pos.x, rect.y0 - 26.0),
                    scale,
                )?;
                self.draw_text_centered(
                    ctx,
                    &format!("0x{value:08X}"),
                    height * 0.42,
                    Rgba8::opaque(255, 255, 255),
                    pos,
                    scale,
                )?;
            }
            EntityKind::CodeBlock {
                lines,
                highlighted,
                font_size,
                highlight_color,
            } => {
                self.draw_code_block(ctx, lines, *highlighted, *font_size, color, *highlight_color, pos, scale)?;
            }
            EntityKind::Shape { shape, size } => {
                draw_shape(ctx, *shape, pos, *size, color);
            }
            EntityKind::DotGrid {
                rows,
                cols,
                live,
                radius,
                gap,
            } => {
                draw_dot_grid(ctx, pos, *rows, *cols, *live, *radius, *gap, color);
            }
        }

        if opacity < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }

    fn draw_text_centered(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        font_size: f64,
        color: Rgba8,
        center: Vec2,
        scale: f64,
    ) -> AsmvizResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let layout = self
            .text
            .layout_plain(text, font_size as f32, color.into())?;
        let origin = Vec2::new(
            center.x - f64::from(layout.width()) / 2.0,
            center.y - f64::from(layout.height()) / 2.0,
        );
        draw_layout(ctx, &layout, &self.font, origin, scale);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_code_block(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        lines: &[String],
        highlighted: Option<usize>,
        font_size: f64,
        color: Rgba8,
        highlight_color: Rgba8,
        center: Vec2,
        scale: f64,
    ) -> AsmvizResult<()> {
        let line_h = font_size * 1.6;
        let layouts = lines
            .iter()
            .map(|line| self.text.layout_plain(line, font_size as f32, color.into()))
            .collect::<AsmvizResult<Vec<_>>>()?;
        let max_w = layouts
            .iter()
            .map(|l| f64::from(l.width()))
            .fold(0.0f64, f64::max);

        let top = center.y - lines.len() as f64 * line_h / 2.0;
        let left = center.x - max_w / 2.0;

        if let Some(hl) = highlighted {
            let rect = Rect::new(
                left - 12.0,
                top + hl as f64 * line_h,
                left + max_w + 12.0,
                top + (hl as f64 + 1.0) * line_h,
            );
            fill_rect(ctx, &rect, highlight_color.with_alpha(70));
        }

        for (i, layout) in layouts.iter().enumerate() {
            let line_top = top + i as f64 * line_h + (line_h - f64::from(layout.height())) / 2.0;
            draw_layout(ctx, layout, &self.font, Vec2::new(left, line_top), scale);
        }
        Ok(())
    }
}

impl RenderBackend for CpuBackend {
    fn render_scene(&mut self, scene: &Scene, canvas: Canvas) -> AsmvizResult<FrameRgba> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| AsmvizError::engine("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| AsmvizError::engine("canvas height exceeds u16"))?;
        let scale = f64::from(canvas.width) / LOGICAL_WIDTH;

        self.with_ctx_mut(width, height, |this, ctx| {
            ctx.set_transform(affine_to_cpu(Affine::scale(scale)));
            let bg = scene.background;
            fill_rect(
                ctx,
                &Rect::new(0.0, 0.0, LOGICAL_WIDTH, LOGICAL_HEIGHT),
                Rgba8::opaque(bg.r, bg.g, bg.b),
            );

            for (_, entity) in scene.entities() {
                this.draw_entity(ctx, entity, scale)?;
            }

            ctx.flush();
            let mut pixmap = vello_cpu::Pixmap::new(width, height);
            ctx.render_to_pixmap(&mut pixmap);
            Ok(FrameRgba {
                width: canvas.width,
                height: canvas.height,
                data: pixmap.data_as_u8_slice().to_vec(),
            })
        })
    }
}

fn centered_rect(center: Vec2, width: f64, height: f64) -> Rect {
    Rect::new(
        center.x - width / 2.0,
        center.y - height / 2.0,
        center.x + width / 2.0,
        center.y + height / 2.0,
    )
}

fn fill_rect(ctx: &mut vello_cpu::RenderContext, rect: &Rect, color: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        rect.x0, rect.y0, rect.x1, rect.y1,
    ));
}

fn stroke_rect(ctx: &mut vello_cpu::RenderContext, rect: &Rect, thickness: f64, color: Rgba8) {
    let t = thickness;
    fill_rect(ctx, &Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + t), color);
    fill_rect(ctx, &Rect::new(rect.x0, rect.y1 - t, rect.x1, rect.y1), color);
    fill_rect(ctx, &Rect::new(rect.x0, rect.y0, rect.x0 + t, rect.y1), color);
    fill_rect(ctx, &Rect::new(rect.x1 - t, rect.y0, rect.x1, rect.y1), color);
}

fn fill_path(ctx: &mut vello_cpu::RenderContext, path: &kurbo::BezPath, color: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_path(&bezpath_to_cpu(path));
}

fn draw_shape(
    ctx: &mut vello_cpu::RenderContext,
    shape: ShapeKind,
    pos: Vec2,
    size: Vec2,
    color: Rgba8,
) {
    match shape {
        ShapeKind::Rect => {
            let rect = centered_rect(pos, size.x, size.y);
            fill_rect(ctx, &rect, color.with_alpha(60));
            stroke_rect(ctx, &rect, 3.0, color);
        }
        ShapeKind::Bar => {
            fill_rect(ctx, &centered_rect(pos, size.x, size.y), color);
        }
        ShapeKind::Dot => {
            let radius = size.x.max(size.y) / 2.0;
            let circle = kurbo::Circle::new(Point::new(pos.x, pos.y), radius);
            let mut path = kurbo::BezPath::new();
            for el in circle.path_elements(0.1) {
                path.push(el);
            }
            fill_path(ctx, &path, color);
        }
        ShapeKind::Arrow => {
            // Rightward arrow: shaft plus a triangular head filling `size`.
            let head_w = (size.x * 0.4).min(size.y);
            let shaft_h = size.y * 0.3;
            let shaft = Rect::new(
                pos.x - size.x / 2.0,
                pos.y - shaft_h / 2.0,
                pos.x + size.x / 2.0 - head_w,
                pos.y + shaft_h / 2.0,
            );
            fill_rect(ctx, &shaft, color);

            let mut head = kurbo::BezPath::new();
            head.move_to(Point::new(pos.x + size.x / 2.0 - head_w, pos.y - size.y / 2.0));
            head.line_to(Point::new(pos.x + size.x / 2.0 - head_w, pos.y + size.y / 2.0));
            head.line_to(Point::new(pos.x + size.x / 2.0, pos.y));
            head.close_path();
            fill_path(ctx, &head, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_dot_grid(
    ctx: &mut vello_cpu::RenderContext,
    center: Vec2,
    rows: usize,
    cols: usize,
    live: usize,
    radius: f64,
    gap: f64,
    color: Rgba8,
) {
    let pitch = 2.0 * radius + gap;
    let grid_w = cols as f64 * pitch - gap;
    let grid_h = rows as f64 * pitch - gap;
    let origin = Vec2::new(
        center.x - grid_w / 2.0 + radius,
        center.y - grid_h / 2.0 + radius,
    );

    for row in 0..rows {
        for col in 0..cols {
            let index = row * cols + col;
            let c = if index < live {
                color
            } else {
                color.with_alpha(28)
            };
            let p = Point::new(
                origin.x + col as f64 * pitch,
                origin.y + row as f64 * pitch,
            );
            let circle = kurbo::Circle::new(p, radius);
            let mut path = kurbo::BezPath::new();
            for el in circle.path_elements(0.1) {
                path.push(el);
            }
            fill_path(ctx, &path, c);
        }
    }
}

fn draw_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrushRgba8>,
    font: &vello_cpu::peniko::FontData,
    origin: Vec2,
    scale: f64,
) {
    ctx.set_transform(affine_to_cpu(
        Affine::scale(scale) * Affine::translate(origin),
    ));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    ctx.set_transform(affine_to_cpu(Affine::scale(scale)));
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
