//! Immediate-mode drawing.
//!
//! Shapes are tessellated as they are ended and accumulated into one
//! batch. When the batch would exceed the limits it is uploaded and drawn
//! right away, and accumulation restarts from empty.

use crate::{
    Color, DeletionQueue, FlushPolicy, GeometryContext, GeometryLimits, GeometryResult, ImmediateSink,
    Primitive, RawVertexStore, StreamingGeometry, TessGeometry, TessStyle, TextureRunCache, Topology,
    VertexAttributes, VertexCode,
};
use glam::{Affine3A, Vec2, Vec3};
use tessel_core::profiling::profile_function;
use tessel_test_utils::{DrawCall, PrimitivePass, RenderContext, TextureHandle};

/// Appends a batch to the frame's buffers and draws it: one fill draw per
/// texture run, then lines and points.
pub struct UploadSink<'a> {
    pub gpu: &'a mut StreamingGeometry,
    pub render: &'a dyn RenderContext,
    pub deletions: &'a DeletionQueue,
    pub flushes: usize,
}

impl ImmediateSink for UploadSink<'_> {
    fn flush(&mut self, geometry: &TessGeometry, runs: &TextureRunCache) {
        if geometry.is_empty() {
            return;
        }
        let [fill, line, point] = self.gpu.append(self.render, geometry, self.deletions);
        for run in runs.runs() {
            let indices = run.index_range();
            self.render.draw_indexed(
                DrawCall::new(
                    PrimitivePass::Fill,
                    fill.index + indices.start..fill.index + indices.end,
                    run.texture,
                )
                .with_base_vertex(fill.vertex as i32),
            );
        }
        for (pass, base) in [(PrimitivePass::Line, line), (PrimitivePass::Point, point)] {
            let count = geometry.index_count(pass) as u32;
            if count > 0 {
                self.render.draw_indexed(
                    DrawCall::new(pass, base.index..base.index + count, None).with_base_vertex(base.vertex as i32),
                );
            }
        }
        self.flushes += 1;
    }
}

pub struct ImmediateRenderer {
    raw: RawVertexStore,
    tess: TessGeometry,
    runs: TextureRunCache,
    gpu: StreamingGeometry,
    limits: GeometryLimits,
    attributes: VertexAttributes,
    style: TessStyle,
    texture: Option<TextureHandle>,
    transform: Option<Affine3A>,
    topology: Topology,
    flushes: usize,
}

impl ImmediateRenderer {
    pub fn new(limits: GeometryLimits) -> Self {
        Self {
            raw: RawVertexStore::new(limits.max_vertices),
            tess: TessGeometry::new(),
            runs: TextureRunCache::new(),
            gpu: StreamingGeometry::new(),
            limits,
            attributes: VertexAttributes::default(),
            style: TessStyle::default(),
            texture: None,
            transform: None,
            topology: Topology::Polygon,
            flushes: 0,
        }
    }

    pub fn style(&self) -> &TessStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: TessStyle) {
        self.attributes.stroke_weight = style.stroke_weight;
        self.style = style;
    }

    pub fn set_fill(&mut self, color: Color) {
        self.attributes.fill = color;
    }

    pub fn set_stroke(&mut self, color: Color) {
        self.attributes.stroke = color;
    }

    pub fn set_stroke_weight(&mut self, weight: f32) {
        self.attributes.stroke_weight = weight;
        self.style.stroke_weight = weight;
    }

    pub fn set_normal(&mut self, normal: Vec3) {
        self.attributes.normal = normal;
        self.raw.set_explicit_normals(true);
    }

    pub fn set_texcoord(&mut self, texcoord: Vec2) {
        self.attributes.texcoord = texcoord;
    }

    pub fn set_texture(&mut self, texture: Option<TextureHandle>) {
        self.texture = texture;
    }

    /// Transform baked into every shape ended from now on.
    pub fn set_transform(&mut self, transform: Option<Affine3A>) {
        self.transform = transform;
    }

    /// Start a new frame once the previous frame's draws have been submitted.
    ///
    /// Batches of one frame occupy consecutive regions of the same buffers;
    /// this rewinds to the front.
    pub fn begin_frame(&mut self) {
        self.gpu.begin_frame();
    }

    /// Batches uploaded and drawn so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Geometry accumulated since the last flush.
    pub fn pending(&self) -> &TessGeometry {
        &self.tess
    }

    pub fn texture_runs(&self) -> &TextureRunCache {
        &self.runs
    }

    pub fn begin_shape(&mut self, topology: Topology) {
        self.raw.clear();
        self.topology = topology;
    }

    pub fn vertex(&mut self, position: Vec3) -> GeometryResult<()> {
        self.raw
            .add_vertex(position, &self.attributes, VertexCode::Vertex)
            .map(|_| ())
    }

    pub fn bezier_vertex(&mut self, c1: Vec3, c2: Vec3, end: Vec3) -> GeometryResult<()> {
        self.raw
            .bezier_vertex(c1, c2, end, &self.attributes, self.limits.bezier_detail)
    }

    pub fn quadratic_vertex(&mut self, control: Vec3, end: Vec3) -> GeometryResult<()> {
        self.raw
            .quadratic_vertex(control, end, &self.attributes, self.limits.bezier_detail)
    }

    pub fn curve_vertex(&mut self, point: Vec3) -> GeometryResult<()> {
        self.raw.curve_vertex(
            point,
            &self.attributes,
            self.limits.curve_detail,
            self.limits.curve_tightness,
        )
    }

    pub fn break_contour(&mut self) {
        self.raw.break_contour();
    }

    /// Tessellate the shape begun with [`begin_shape`](Self::begin_shape).
    pub fn end_shape(
        &mut self,
        ctx: &mut GeometryContext,
        render: &dyn RenderContext,
        closed: bool,
    ) -> GeometryResult<()> {
        ctx.tessellator.set_style(self.style);
        ctx.tessellator
            .finish_primitive(self.topology, &mut self.raw, closed);
        self.tessellate(ctx, render, self.topology)
    }

    /// Draw a primitive shape with the current style.
    pub fn shape(
        &mut self,
        ctx: &mut GeometryContext,
        render: &dyn RenderContext,
        primitive: Primitive,
    ) -> GeometryResult<()> {
        self.raw.clear();
        primitive.generate(&mut self.raw, &self.attributes, &self.style, &self.limits)?;
        ctx.tessellator.set_style(self.style);
        if !primitive.generates_edges() {
            ctx.tessellator
                .finish_primitive(primitive.topology(), &mut self.raw, true);
        }
        self.tessellate(ctx, render, primitive.topology())
    }

    fn tessellate(
        &mut self,
        ctx: &mut GeometryContext,
        render: &dyn RenderContext,
        topology: Topology,
    ) -> GeometryResult<()> {
        profile_function!();

        let GeometryContext {
            tessellator,
            deletions,
            ..
        } = ctx;
        tessellator.set_transform(self.transform);

        let mut sink = UploadSink {
            gpu: &mut self.gpu,
            render,
            deletions,
            flushes: 0,
        };
        let result = tessellator.tessellate(
            topology,
            &self.raw,
            &mut self.tess,
            &mut FlushPolicy::Immediate {
                runs: &mut self.runs,
                texture: self.texture,
                sink: &mut sink,
            },
        );
        self.flushes += sink.flushes;
        tessellator.set_transform(None);

        self.runs
            .extend_or_start(self.texture, self.tess.fill.index_count() as u32);
        result
    }

    /// Upload and draw whatever has accumulated.
    pub fn flush(&mut self, ctx: &GeometryContext, render: &dyn RenderContext) {
        let mut sink = UploadSink {
            gpu: &mut self.gpu,
            render,
            deletions: &ctx.deletions,
            flushes: 0,
        };
        sink.flush(&self.tess, &self.runs);
        self.flushes += sink.flushes;
        self.tess.clear();
        self.runs.clear();
    }

    /// Release GPU buffers through the context's deletion queue.
    pub fn release(&mut self, ctx: &GeometryContext) {
        self.gpu.release(&ctx.deletions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Channel;
    use tessel_test_utils::MockRenderContext;

    fn rect(x: f32) -> Primitive {
        Primitive::Rect {
            origin: Vec2::new(x, 0.0),
            size: Vec2::splat(4.0),
        }
    }

    #[test]
    fn test_accumulates_until_flush() {
        let mock = MockRenderContext::new();
        let mut ctx = GeometryContext::default();
        let mut renderer = ImmediateRenderer::new(ctx.limits().clone());
        renderer.set_style(TessStyle::default().with_stroke(false));

        for i in 0..3 {
            renderer.shape(&mut ctx, &mock, rect(i as f32 * 10.0)).unwrap();
        }
        assert_eq!(renderer.pending().fill.vertex_count(), 12);
        assert_eq!(renderer.texture_runs().len(), 1);
        assert_eq!(mock.count_draws(), 0);

        renderer.flush(&ctx, &mock);
        assert_eq!(renderer.flush_count(), 1);
        assert_eq!(mock.draws_for(PrimitivePass::Fill), vec![DrawCall::new(PrimitivePass::Fill, 0..18, None)]);
        assert!(renderer.pending().is_empty());
    }

    #[test]
    fn test_texture_switch_splits_draws() {
        let mock = MockRenderContext::new();
        let mut ctx = GeometryContext::default();
        let mut renderer = ImmediateRenderer::new(ctx.limits().clone());
        renderer.set_style(TessStyle::default().with_stroke(false));

        renderer.set_texture(Some(TextureHandle(1)));
        renderer.shape(&mut ctx, &mock, rect(0.0)).unwrap();
        renderer.set_texture(Some(TextureHandle(2)));
        renderer.shape(&mut ctx, &mock, rect(10.0)).unwrap();
        renderer.flush(&ctx, &mock);

        let draws = mock.draws_for(PrimitivePass::Fill);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].texture, Some(TextureHandle(1)));
        assert_eq!(draws[1].indices, 6..12);
    }

    #[test]
    fn test_overflow_flushes_mid_frame() {
        let mock = MockRenderContext::new();
        let limits = GeometryLimits::default().with_max_vertices(10);
        let mut ctx = GeometryContext::new(limits.clone());
        let mut renderer = ImmediateRenderer::new(limits);
        renderer.set_style(TessStyle::default().with_stroke(false));

        for i in 0..5 {
            renderer.shape(&mut ctx, &mock, rect(i as f32 * 10.0)).unwrap();
        }
        // Two rects fit per batch; the third and fifth force a flush.
        assert_eq!(renderer.flush_count(), 2);
        assert_eq!(renderer.pending().fill.vertex_count(), 4);
        assert_eq!(renderer.texture_runs().runs()[0].index_range(), 0..6);
    }

    #[test]
    fn test_batches_in_one_frame_keep_their_own_data() {
        let mock = MockRenderContext::new();
        let limits = GeometryLimits::default().with_max_vertices(10);
        let mut ctx = GeometryContext::new(limits.clone());
        let mut renderer = ImmediateRenderer::new(limits);
        renderer.set_style(TessStyle::default().with_stroke(false));

        renderer.begin_frame();
        for i in 0..5 {
            renderer.shape(&mut ctx, &mock, rect(i as f32 * 10.0)).unwrap();
        }
        renderer.flush(&ctx, &mock);
        assert_eq!(renderer.flush_count(), 3);

        let draws = mock.draws_for(PrimitivePass::Fill);
        let ranges: Vec<_> = draws.iter().map(|d| (d.indices.clone(), d.base_vertex)).collect();
        assert_eq!(ranges, vec![(0..12, 0), (12..24, 8), (24..30, 16)]);

        // The second batch outgrew the first buffer; its replacement holds
        // both, and the third batch lands behind them.
        let positions = mock.buffer_labeled(Channel::FillPosition.label()).unwrap();
        assert_eq!(mock.writes_to(positions), vec![(0, 192), (192, 48)]);

        renderer.begin_frame();
        mock.clear_calls();
        renderer.shape(&mut ctx, &mock, rect(0.0)).unwrap();
        renderer.flush(&ctx, &mock);
        assert_eq!(mock.draws_for(PrimitivePass::Fill)[0].base_vertex, 0);
    }

    #[test]
    fn test_transform_applies_to_positions() {
        let mock = MockRenderContext::new();
        let mut ctx = GeometryContext::default();
        let mut renderer = ImmediateRenderer::new(ctx.limits().clone());
        renderer.set_style(TessStyle::default().with_stroke(false));
        renderer.set_transform(Some(Affine3A::from_translation(Vec3::new(0.0, 100.0, 0.0))));

        renderer.begin_shape(Topology::Triangles);
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            renderer.vertex(p).unwrap();
        }
        renderer.end_shape(&mut ctx, &mock, false).unwrap();
        assert_eq!(renderer.pending().fill.vertices.positions[0], [0.0, 100.0, 0.0]);
    }

    #[test]
    fn test_bezier_without_vertex_leaves_state() {
        let mut renderer = ImmediateRenderer::new(GeometryLimits::default());
        renderer.begin_shape(Topology::Polygon);
        assert!(renderer.bezier_vertex(Vec3::X, Vec3::Y, Vec3::ONE).is_err());
        assert!(renderer.pending().is_empty());
    }
}
