//! Tessellation of raw vertex ranges into fill, line and point geometry.
//!
//! Fill topologies (triangles, fans, strips, quads) copy the raw range and
//! generate indices directly. Polygons go through Lyon. Strokes expand the
//! edge list into screen-space ribbons, and points into sprites.

use crate::{
    CapacityKind, GeometryError, GeometryLimits, GeometryResult, LineCap, RawVertex, RawVertexStore,
    TessGeometry, TessStyle, TextureRunCache, VertexAttributes, VertexCode,
};
use glam::{Affine3A, Mat3, Vec2, Vec3, Vec4};
use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, FillVertexConstructor,
    VertexBuffers, VertexSource,
};
use lyon::math::point;
use lyon::path::{EndpointId, Path};
use std::f32::consts::TAU;
use tessel_core::profiling::profile_function;
use tessel_test_utils::{PrimitivePass, TextureHandle};

/// How a primitive's raw vertices are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    Points,
    Lines,
    Triangles,
    TriangleFan,
    TriangleStrip,
    Quads,
    QuadStrip,
    #[default]
    Polygon,
}

/// Receives partial geometry when immediate-mode tessellation runs out of room.
pub trait ImmediateSink {
    fn flush(&mut self, geometry: &TessGeometry, runs: &TextureRunCache);
}

/// What to do when a primitive would exceed the configured limits.
pub enum FlushPolicy<'a> {
    /// Fail with [`GeometryError::CapacityOverflow`].
    Retained,
    /// Hand the accumulated geometry to `sink`, reset and keep going.
    Immediate {
        runs: &'a mut TextureRunCache,
        texture: Option<TextureHandle>,
        sink: &'a mut dyn ImmediateSink,
    },
}

/// Segment count of a round point sprite.
pub fn point_accuracy(weight: f32, min_accuracy: usize) -> usize {
    ((TAU * weight / 20.0) as usize).max(min_accuracy)
}

pub struct Tessellator {
    fill_tessellator: FillTessellator,
    style: TessStyle,
    limits: GeometryLimits,
    /// Baked into emitted geometry, with its normal matrix.
    transform: Option<(Affine3A, Mat3)>,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new(GeometryLimits::default())
    }
}

impl Tessellator {
    pub fn new(limits: GeometryLimits) -> Self {
        Self {
            fill_tessellator: FillTessellator::new(),
            style: TessStyle::default(),
            limits,
            transform: None,
        }
    }

    pub fn with_style(mut self, style: TessStyle) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> &TessStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: TessStyle) {
        self.style = style;
    }

    pub fn limits(&self) -> &GeometryLimits {
        &self.limits
    }

    /// Transform baked into everything emitted until it is reset.
    pub fn set_transform(&mut self, transform: Option<Affine3A>) {
        self.transform = transform.map(|t| (t, tessel_core::math::normal_matrix(&t)));
    }

    /// Generate stroke edges and flat normals for the raw store's current
    /// primitive, as `topology` connects it.
    pub fn finish_primitive(&self, topology: Topology, raw: &mut RawVertexStore, closed: bool) {
        let (fill, stroke) = (self.style.fill, self.style.stroke);
        match topology {
            Topology::Points => {}
            Topology::Lines => {
                let first = raw.first_vertex();
                for pair in 0..raw.vertex_range().len() / 2 {
                    let a = first + 2 * pair;
                    raw.add_edge(a, a + 1, true, true);
                }
            }
            Topology::Triangles => {
                if stroke {
                    raw.add_triangles_edges();
                }
                if fill {
                    raw.calc_triangles_normals();
                }
            }
            Topology::TriangleFan => {
                if stroke {
                    raw.add_triangle_fan_edges();
                }
                if fill {
                    raw.calc_triangle_fan_normals();
                }
            }
            Topology::TriangleStrip => {
                if stroke {
                    raw.add_triangle_strip_edges();
                }
                if fill {
                    raw.calc_triangle_strip_normals();
                }
            }
            Topology::Quads => {
                if stroke {
                    raw.add_quads_edges();
                }
                if fill {
                    raw.calc_quads_normals();
                }
            }
            Topology::QuadStrip => {
                if stroke {
                    raw.add_quad_strip_edges();
                }
                if fill {
                    raw.calc_quad_strip_normals();
                }
            }
            Topology::Polygon => {
                if stroke {
                    raw.add_polygon_edges(closed);
                }
            }
        }
    }

    /// Tessellate the raw store's current primitive into `tess`.
    pub fn tessellate(
        &mut self,
        topology: Topology,
        raw: &RawVertexStore,
        tess: &mut TessGeometry,
        policy: &mut FlushPolicy<'_>,
    ) -> GeometryResult<()> {
        profile_function!();

        if self.style.fill {
            match topology {
                Topology::Points | Topology::Lines => {}
                Topology::Polygon => self.tessellate_polygon(raw, tess, policy)?,
                _ => {
                    let indices = fill_indices(topology, raw.vertex_range().len());
                    self.copy_fill_range(raw, &indices, tess, policy)?;
                }
            }
        }

        if self.style.stroke {
            match topology {
                Topology::Points => self.tessellate_points(raw, tess, policy)?,
                _ => self.tessellate_edges(raw, tess, policy)?,
            }
        }
        Ok(())
    }

    // ====================
    // Capacity
    // ====================

    fn overflow(&self, vertices: usize, indices: usize) -> Option<GeometryError> {
        if vertices > self.limits.max_vertices {
            Some(GeometryError::CapacityOverflow {
                kind: CapacityKind::Vertices,
                requested: vertices,
                limit: self.limits.max_vertices,
            })
        } else if indices > self.limits.max_indices {
            Some(GeometryError::CapacityOverflow {
                kind: CapacityKind::Indices,
                requested: indices,
                limit: self.limits.max_indices,
            })
        } else {
            None
        }
    }

    /// Ensure `pass` can take `vertices` and `indices` more elements.
    fn make_room(
        &self,
        tess: &mut TessGeometry,
        pass: PrimitivePass,
        vertices: usize,
        indices: usize,
        policy: &mut FlushPolicy<'_>,
    ) -> GeometryResult<()> {
        let Some(err) = self.overflow(
            tess.vertex_count(pass) + vertices,
            tess.index_count(pass) + indices,
        ) else {
            return Ok(());
        };

        match policy {
            FlushPolicy::Retained => Err(err),
            FlushPolicy::Immediate { runs, texture, sink } => {
                // A primitive that cannot fit an empty buffer never will.
                if let Some(err) = self.overflow(vertices, indices) {
                    return Err(err);
                }
                runs.extend_or_start(*texture, tess.fill.index_count() as u32);
                tracing::debug!(
                    "Flushing immediate geometry: {} fill, {} line, {} point vertices",
                    tess.fill.vertex_count(),
                    tess.line.vertex_count(),
                    tess.point.vertex_count()
                );
                sink.flush(tess, &**runs);
                tess.clear();
                runs.restart();
                Ok(())
            }
        }
    }

    // ====================
    // Emission
    // ====================

    fn place(&self, position: Vec3) -> Vec3 {
        match &self.transform {
            Some((transform, _)) => transform.transform_point3(position),
            None => position,
        }
    }

    fn push_fill(&self, tess: &mut TessGeometry, position: Vec3, attributes: &VertexAttributes) -> u32 {
        match &self.transform {
            Some((transform, normal_matrix)) => {
                let mut attributes = *attributes;
                attributes.normal = (*normal_matrix * attributes.normal).normalize_or_zero();
                tess.fill.push_vertex(transform.transform_point3(position), &attributes)
            }
            None => tess.fill.push_vertex(position, attributes),
        }
    }

    fn copy_fill_range(
        &self,
        raw: &RawVertexStore,
        indices: &[u32],
        tess: &mut TessGeometry,
        policy: &mut FlushPolicy<'_>,
    ) -> GeometryResult<()> {
        if indices.is_empty() {
            return Ok(());
        }
        let range = raw.vertex_range();
        self.make_room(tess, PrimitivePass::Fill, range.len(), indices.len(), policy)?;

        let base = tess.fill.vertex_count() as u32;
        tess.fill.reserve_vertices(range.len());
        tess.fill.reserve_indices(indices.len());
        for i in range {
            let v = raw.vertex(i);
            self.push_fill(tess, v.position, &v.attributes);
        }
        tess.fill.indices.extend(indices.iter().map(|i| base + i));
        Ok(())
    }

    // ====================
    // Polygons
    // ====================

    fn tessellate_polygon(
        &mut self,
        raw: &RawVertexStore,
        tess: &mut TessGeometry,
        policy: &mut FlushPolicy<'_>,
    ) -> GeometryResult<()> {
        let range = raw.vertex_range();
        if range.len() < 3 {
            return Ok(());
        }

        let normal = tessel_core::math::newell_normal(range.clone().map(|i| raw.vertex(i).position));
        let project: fn(Vec3) -> lyon::math::Point = match tessel_core::math::dominant_axis(normal) {
            0 => |p: Vec3| point(p.y, p.z),
            1 => |p: Vec3| point(p.z, p.x),
            _ => |p: Vec3| point(p.x, p.y),
        };

        // Endpoint ids are handed out by the builder; map each back to its raw vertex.
        let mut endpoints: Vec<usize> = Vec::with_capacity(range.len());
        let mut record = |id: EndpointId, raw_index: usize| {
            let slot = id.0 as usize;
            if endpoints.len() <= slot {
                endpoints.resize(slot + 1, raw_index);
            }
            endpoints[slot] = raw_index;
        };

        let mut builder = Path::builder();
        let mut open = false;
        for i in range.clone() {
            let v = raw.vertex(i);
            if open && v.code == VertexCode::Break {
                builder.end(true);
                open = false;
            }
            let p = project(v.position);
            let id = if open { builder.line_to(p) } else { builder.begin(p) };
            open = true;
            record(id, i);
        }
        if open {
            builder.end(true);
        }
        let path = builder.build();

        let rule = if self.style.solid {
            FillRule::NonZero
        } else {
            FillRule::EvenOdd
        };
        let options = FillOptions::default()
            .with_tolerance(self.limits.tolerance)
            .with_fill_rule(rule);

        let mut buffers: VertexBuffers<RawVertex, u32> = VertexBuffers::new();
        // Sources only carry endpoint ids when the tessellator is fed id events.
        let result = self.fill_tessellator.tessellate_with_ids(
            path.id_iter(),
            &path,
            Some(&path),
            &options,
            &mut BuffersBuilder::new(
                &mut buffers,
                AttributeBlender {
                    raw,
                    endpoints: &endpoints,
                    fallback: range.start,
                },
            ),
        );
        if let Err(err) = result {
            tracing::warn!("Polygon tessellation failed: {:?}", err);
            return Ok(());
        }

        let VertexBuffers {
            mut vertices,
            indices,
        } = buffers;
        if !raw.has_explicit_normals() {
            for tri in indices.chunks_exact(3) {
                let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
                let mut n = tessel_core::math::face_normal(
                    vertices[a].position,
                    vertices[b].position,
                    vertices[c].position,
                );
                // Lyon picks its own output winding; face the polygon's side.
                if n.dot(normal) < 0.0 {
                    n = -n;
                }
                for i in [a, b, c] {
                    vertices[i].attributes.normal = n;
                }
            }
        }

        self.make_room(tess, PrimitivePass::Fill, vertices.len(), indices.len(), policy)?;
        let base = tess.fill.vertex_count() as u32;
        tess.fill.reserve_vertices(vertices.len());
        for v in &vertices {
            self.push_fill(tess, v.position, &v.attributes);
        }
        tess.fill.indices.extend(indices.iter().map(|i| base + i));
        Ok(())
    }

    // ====================
    // Strokes
    // ====================

    fn tessellate_edges(
        &self,
        raw: &RawVertexStore,
        tess: &mut TessGeometry,
        policy: &mut FlushPolicy<'_>,
    ) -> GeometryResult<()> {
        for edge in raw.edges() {
            self.add_line(raw.vertex(edge.a), raw.vertex(edge.b), tess, policy)?;
        }
        Ok(())
    }

    /// Four-vertex ribbon; the shader offsets each vertex perpendicular to
    /// the segment by its signed half width.
    fn add_line(
        &self,
        a: &RawVertex,
        b: &RawVertex,
        tess: &mut TessGeometry,
        policy: &mut FlushPolicy<'_>,
    ) -> GeometryResult<()> {
        self.make_room(tess, PrimitivePass::Line, 4, 6, policy)?;

        let (pa, pb) = (self.place(a.position), self.place(b.position));
        let wa = a.attributes.stroke_weight * 0.5;
        let wb = b.attributes.stroke_weight * 0.5;

        let line = &mut tess.line;
        let base = line.push_vertex(pa, a.attributes.stroke, pb.extend(wa).to_array());
        line.push_vertex(pa, a.attributes.stroke, pb.extend(-wa).to_array());
        line.push_vertex(pb, b.attributes.stroke, pa.extend(-wb).to_array());
        line.push_vertex(pb, b.attributes.stroke, pa.extend(wb).to_array());
        line.push_triangle(base, base + 1, base + 2);
        line.push_triangle(base + 2, base + 1, base + 3);
        Ok(())
    }

    // ====================
    // Points
    // ====================

    fn tessellate_points(
        &self,
        raw: &RawVertexStore,
        tess: &mut TessGeometry,
        policy: &mut FlushPolicy<'_>,
    ) -> GeometryResult<()> {
        for i in raw.vertex_range() {
            let v = raw.vertex(i);
            match self.style.cap {
                LineCap::Round => self.add_round_point(v, tess, policy)?,
                LineCap::Square | LineCap::Butt => self.add_square_point(v, tess, policy)?,
            }
        }
        Ok(())
    }

    fn add_round_point(
        &self,
        v: &RawVertex,
        tess: &mut TessGeometry,
        policy: &mut FlushPolicy<'_>,
    ) -> GeometryResult<()> {
        let weight = v.attributes.stroke_weight;
        let perimeter = point_accuracy(weight, self.limits.min_accuracy);
        self.make_room(tess, PrimitivePass::Point, perimeter + 1, 3 * perimeter, policy)?;

        let center = self.place(v.position);
        let color = v.attributes.stroke;
        let radius = weight * 0.5;
        let point = &mut tess.point;
        let base = point.push_vertex(center, color, [0.0, 0.0]);
        for k in 0..perimeter {
            let (sin, cos) = (TAU * k as f32 / perimeter as f32).sin_cos();
            point.push_vertex(center, color, [radius * cos, radius * sin]);
        }
        for k in 0..perimeter as u32 {
            let next = (k + 1) % perimeter as u32;
            point.push_triangle(base, base + 1 + k, base + 1 + next);
        }
        Ok(())
    }

    fn add_square_point(
        &self,
        v: &RawVertex,
        tess: &mut TessGeometry,
        policy: &mut FlushPolicy<'_>,
    ) -> GeometryResult<()> {
        self.make_room(tess, PrimitivePass::Point, 5, 12, policy)?;

        let center = self.place(v.position);
        let color = v.attributes.stroke;
        let h = v.attributes.stroke_weight * 0.5;
        let point = &mut tess.point;
        let base = point.push_vertex(center, color, [0.0, 0.0]);
        for offset in [[-h, -h], [h, -h], [h, h], [-h, h]] {
            point.push_vertex(center, color, offset);
        }
        for k in 0..4 {
            point.push_triangle(base, base + 1 + k, base + 1 + (k + 1) % 4);
        }
        Ok(())
    }
}

/// Indices (relative to the first vertex) for the direct fill topologies.
fn fill_indices(topology: Topology, n: usize) -> Vec<u32> {
    let n = n as u32;
    let mut out = Vec::new();
    match topology {
        Topology::Triangles => out.extend(0..n / 3 * 3),
        Topology::TriangleFan if n >= 3 => {
            for i in 1..n - 1 {
                out.extend([0, i, i + 1]);
            }
        }
        Topology::TriangleStrip if n >= 3 => {
            for i in 1..n - 1 {
                if i % 2 == 0 {
                    out.extend([i, i - 1, i + 1]);
                } else {
                    out.extend([i, i + 1, i - 1]);
                }
            }
        }
        Topology::Quads => {
            for q in 0..n / 4 {
                let i0 = 4 * q;
                out.extend([i0, i0 + 1, i0 + 3, i0 + 1, i0 + 2, i0 + 3]);
            }
        }
        Topology::QuadStrip => {
            for qd in 1..(n / 2).max(1) {
                let i0 = 2 * (qd - 1);
                let (i1, i2, i3) = (i0 + 1, 2 * qd + 1, 2 * qd);
                out.extend([i0, i1, i3, i1, i2, i3]);
            }
        }
        _ => {}
    }
    out
}

/// Builds output vertices for Lyon by blending the raw vertices each one
/// was derived from.
struct AttributeBlender<'a> {
    raw: &'a RawVertexStore,
    endpoints: &'a [usize],
    /// Raw vertex used when no source resolves.
    fallback: usize,
}

impl AttributeBlender<'_> {
    fn endpoint(&self, id: EndpointId) -> Option<&RawVertex> {
        if id == EndpointId::INVALID {
            return None;
        }
        self.endpoints.get(id.0 as usize).map(|&i| self.raw.vertex(i))
    }
}

impl FillVertexConstructor<RawVertex> for AttributeBlender<'_> {
    fn new_vertex(&mut self, vertex: FillVertex) -> RawVertex {
        let mut blend = Blend::default();
        let mut single = None;
        let mut sources = 0;
        for source in vertex.sources() {
            match source {
                VertexSource::Endpoint { id } => {
                    if let Some(v) = self.endpoint(id) {
                        single = if sources == 0 { Some(*v) } else { None };
                        blend.add(v, 1.0);
                        sources += 1;
                    }
                }
                VertexSource::Edge { from, to, t } => {
                    if let (Some(a), Some(b)) = (self.endpoint(from), self.endpoint(to)) {
                        single = None;
                        blend.add(a, 1.0 - t);
                        blend.add(b, t);
                        sources += 1;
                    }
                }
            }
        }
        match single {
            Some(v) => v,
            None if sources == 0 => {
                tracing::warn!("Fill vertex without a known source, using the first vertex");
                *self.raw.vertex(self.fallback)
            }
            None => blend.finish(),
        }
    }
}

/// Weighted sum of vertex attributes.
#[derive(Default)]
struct Blend {
    weight: f32,
    position: Vec3,
    fill: Vec4,
    stroke: Vec4,
    stroke_weight: f32,
    normal: Vec3,
    texcoord: Vec2,
    ambient: Vec4,
    specular: Vec4,
    emissive: Vec4,
    shininess: f32,
}

impl Blend {
    fn add(&mut self, v: &RawVertex, w: f32) {
        let a = &v.attributes;
        self.weight += w;
        self.position += v.position * w;
        self.fill += a.fill.to_vec4() * w;
        self.stroke += a.stroke.to_vec4() * w;
        self.stroke_weight += a.stroke_weight * w;
        self.normal += a.normal * w;
        self.texcoord += a.texcoord * w;
        self.ambient += a.material.ambient.to_vec4() * w;
        self.specular += a.material.specular.to_vec4() * w;
        self.emissive += a.material.emissive.to_vec4() * w;
        self.shininess += a.material.shininess * w;
    }

    fn finish(self) -> RawVertex {
        let inv = if self.weight > 0.0 { 1.0 / self.weight } else { 0.0 };
        let attributes = VertexAttributes {
            fill: crate::Color::from_vec4(self.fill * inv),
            stroke: crate::Color::from_vec4(self.stroke * inv),
            stroke_weight: self.stroke_weight * inv,
            normal: self.normal.normalize_or_zero(),
            texcoord: self.texcoord * inv,
            material: crate::Material {
                ambient: crate::Color::from_vec4(self.ambient * inv),
                specular: crate::Color::from_vec4(self.specular * inv),
                emissive: crate::Color::from_vec4(self.emissive * inv),
                shininess: self.shininess * inv,
            },
        };
        RawVertex {
            position: self.position * inv,
            attributes,
            code: VertexCode::Vertex,
        }
    }
}
