//! Raw vertex store: the unprocessed vertices and stroke edges of one shape.
//!
//! Vertices are appended as the shape is authored. A tessellation pass reads
//! the current primitive's sub-range (`first_vertex..=last_vertex`) together
//! with the edges generated for it, so one store can host several primitives
//! that are tessellated independently.

use crate::{CapacityKind, Color, GeometryError, GeometryResult};
use bitflags::bitflags;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};
use std::ops::Range;

/// Role of a vertex in the authored stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexCode {
    #[default]
    Vertex,
    /// Emitted while flattening a Catmull-Rom span.
    Curve,
    /// Emitted while flattening a bezier (or quadratic) segment.
    Bezier,
    /// First vertex of a new contour.
    Break,
}

bitflags! {
    /// Position of an edge within its contour. An empty state is a middle edge.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EdgeState: u8 {
        const START = 1 << 0;
        const END = 1 << 1;
        /// A segment that is both the start and the end of its contour.
        const ISOLATED = Self::START.bits() | Self::END.bits();
    }
}

/// A stroke edge between two vertices of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub state: EdgeState,
}

/// Lighting material channels carried per vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Color,
    pub specular: Color,
    pub emissive: Color,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Color::from_hex(0xCCCCCC),
            specular: Color::from_hex(0x808080),
            emissive: Color::BLACK,
            shininess: 1.0,
        }
    }
}

/// Everything about a vertex except its position and code.
///
/// Authoring code keeps one of these as the "current" state and stamps it
/// onto every vertex it appends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttributes {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_weight: f32,
    pub normal: Vec3,
    pub texcoord: Vec2,
    pub material: Material,
}

impl Default for VertexAttributes {
    fn default() -> Self {
        Self {
            fill: Color::WHITE,
            stroke: Color::BLACK,
            stroke_weight: 1.0,
            normal: Vec3::Z,
            texcoord: Vec2::ZERO,
            material: Material::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawVertex {
    pub position: Vec3,
    pub attributes: VertexAttributes,
    pub code: VertexCode,
}

/// Append-only store of authored vertices and their stroke edges.
#[derive(Debug, Clone)]
pub struct RawVertexStore {
    vertices: Vec<RawVertex>,
    edges: Vec<Edge>,
    first_vertex: usize,
    first_edge: usize,
    max_vertices: usize,
    explicit_normals: bool,
    break_pending: bool,
    curve_points: Vec<Vec3>,
}

impl RawVertexStore {
    pub fn new(max_vertices: usize) -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            first_vertex: 0,
            first_edge: 0,
            max_vertices,
            explicit_normals: false,
            break_pending: false,
            curve_points: Vec::new(),
        }
    }

    /// Drop every vertex and edge; used when a shape's draw list is reset.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.first_vertex = 0;
        self.first_edge = 0;
        self.explicit_normals = false;
        self.break_pending = false;
        self.curve_points.clear();
    }

    /// Drop the edge list only; vertices stay. Used before regenerating
    /// edges for a restyled shape.
    pub fn clear_edges(&mut self) {
        self.edges.clear();
        self.first_edge = 0;
    }

    /// Start a new primitive: the next tessellation pass only consumes what
    /// is appended after this call.
    pub fn begin_primitive(&mut self) {
        self.first_vertex = self.vertices.len();
        self.first_edge = self.edges.len();
        self.break_pending = false;
        self.curve_points.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn first_vertex(&self) -> usize {
        self.first_vertex
    }

    /// Last vertex of the current primitive, if it has any.
    pub fn last_vertex(&self) -> Option<usize> {
        (self.vertices.len() > self.first_vertex).then(|| self.vertices.len() - 1)
    }

    pub fn first_edge(&self) -> usize {
        self.first_edge
    }

    pub fn last_edge(&self) -> Option<usize> {
        (self.edges.len() > self.first_edge).then(|| self.edges.len() - 1)
    }

    /// Half-open range of the current primitive's vertices.
    pub fn vertex_range(&self) -> Range<usize> {
        self.first_vertex..self.vertices.len()
    }

    pub fn edge_range(&self) -> Range<usize> {
        self.first_edge..self.edges.len()
    }

    pub fn vertex(&self, index: usize) -> &RawVertex {
        &self.vertices[index]
    }

    pub fn vertices(&self) -> &[RawVertex] {
        &self.vertices
    }

    /// Mutable access for in-place edits that keep topology (recolor, transform).
    pub fn vertices_mut(&mut self) -> &mut [RawVertex] {
        &mut self.vertices
    }

    /// Edges of the current primitive.
    pub fn edges(&self) -> &[Edge] {
        &self.edges[self.edge_range()]
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    /// Whether normals were supplied by the author and must not be recomputed.
    pub fn has_explicit_normals(&self) -> bool {
        self.explicit_normals
    }

    pub fn set_explicit_normals(&mut self, explicit: bool) {
        self.explicit_normals = explicit;
    }

    fn ensure_capacity(&self, extra: usize) -> GeometryResult<()> {
        let requested = self.vertices.len() + extra;
        if requested > self.max_vertices {
            return Err(GeometryError::CapacityOverflow {
                kind: CapacityKind::Vertices,
                requested,
                limit: self.max_vertices,
            });
        }
        Ok(())
    }

    /// Append a vertex and return its index.
    ///
    /// After [`break_contour`](Self::break_contour) the vertex is tagged
    /// [`VertexCode::Break`] regardless of `code`.
    pub fn add_vertex(
        &mut self,
        position: Vec3,
        attributes: &VertexAttributes,
        code: VertexCode,
    ) -> GeometryResult<usize> {
        self.ensure_capacity(1)?;
        let code = if std::mem::take(&mut self.break_pending) {
            VertexCode::Break
        } else {
            code
        };
        self.vertices.push(RawVertex {
            position,
            attributes: *attributes,
            code,
        });
        Ok(self.vertices.len() - 1)
    }

    pub fn add_edge(&mut self, a: usize, b: usize, start: bool, end: bool) -> usize {
        let mut state = EdgeState::empty();
        state.set(EdgeState::START, start);
        state.set(EdgeState::END, end);
        self.edges.push(Edge { a, b, state });
        self.edges.len() - 1
    }

    /// Mark the next appended vertex as the start of a new contour.
    ///
    /// Ignored while the current primitive is still empty.
    pub fn break_contour(&mut self) {
        if self.last_vertex().is_some() {
            self.break_pending = true;
        }
        self.curve_points.clear();
    }

    fn last_position(&self) -> Option<Vec3> {
        self.last_vertex().map(|i| self.vertices[i].position)
    }

    // ====================
    // Curves
    // ====================

    /// Cubic bezier from the last vertex through `c1`, `c2` to `end`.
    ///
    /// Flattened with forward differencing into `detail` vertices.
    pub fn bezier_vertex(
        &mut self,
        c1: Vec3,
        c2: Vec3,
        end: Vec3,
        attributes: &VertexAttributes,
        detail: usize,
    ) -> GeometryResult<()> {
        let start = self
            .last_position()
            .ok_or(GeometryError::Precondition("bezier_vertex requires a preceding vertex"))?;
        let detail = detail.max(1);
        self.ensure_capacity(detail)?;

        let a = -start + 3.0 * c1 - 3.0 * c2 + end;
        let b = 3.0 * start - 6.0 * c1 + 3.0 * c2;
        let c = -3.0 * start + 3.0 * c1;
        self.emit_forward_differenced(a, b, c, start, detail, attributes, VertexCode::Bezier)
    }

    /// Quadratic bezier from the last vertex through `control` to `end`,
    /// elevated to a cubic.
    pub fn quadratic_vertex(
        &mut self,
        control: Vec3,
        end: Vec3,
        attributes: &VertexAttributes,
        detail: usize,
    ) -> GeometryResult<()> {
        let start = self
            .last_position()
            .ok_or(GeometryError::Precondition("quadratic_vertex requires a preceding vertex"))?;
        let c1 = start + (control - start) * (2.0 / 3.0);
        let c2 = end + (control - end) * (2.0 / 3.0);
        self.bezier_vertex(c1, c2, end, attributes, detail)
    }

    /// Catmull-Rom control point.
    ///
    /// Control points are buffered; once four are available each new point
    /// emits the span between the middle two.
    pub fn curve_vertex(
        &mut self,
        point: Vec3,
        attributes: &VertexAttributes,
        detail: usize,
        tightness: f32,
    ) -> GeometryResult<()> {
        let detail = detail.max(1);
        let first_span = self.curve_points.len() == 3;
        if self.curve_points.len() >= 3 {
            self.ensure_capacity(detail + usize::from(first_span))?;
        }
        self.curve_points.push(point);
        let n = self.curve_points.len();
        if n < 4 {
            return Ok(());
        }

        let [p0, p1, p2, p3] = [
            self.curve_points[n - 4],
            self.curve_points[n - 3],
            self.curve_points[n - 2],
            self.curve_points[n - 1],
        ];
        if first_span {
            self.add_vertex(p1, attributes, VertexCode::Curve)?;
        }

        let s = tightness;
        let a = (s - 1.0) / 2.0 * p0 + (s + 3.0) / 2.0 * p1 + (-3.0 - s) / 2.0 * p2 + (1.0 - s) / 2.0 * p3;
        let b = (1.0 - s) * p0 + (-5.0 - s) / 2.0 * p1 + (s + 2.0) * p2 + (s - 1.0) / 2.0 * p3;
        let c = (s - 1.0) / 2.0 * p0 + (1.0 - s) / 2.0 * p2;
        self.emit_forward_differenced(a, b, c, p1, detail, attributes, VertexCode::Curve)
    }

    /// Emit `detail` points of `a t^3 + b t^2 + c t + d` for `t` in `(0, 1]`.
    #[allow(clippy::too_many_arguments)]
    fn emit_forward_differenced(
        &mut self,
        a: Vec3,
        b: Vec3,
        c: Vec3,
        d: Vec3,
        detail: usize,
        attributes: &VertexAttributes,
        code: VertexCode,
    ) -> GeometryResult<()> {
        let h = 1.0 / detail as f32;
        let (h2, h3) = (h * h, h * h * h);

        let mut f = d;
        let mut df = a * h3 + b * h2 + c * h;
        let mut d2f = 6.0 * a * h3 + 2.0 * b * h2;
        let d3f = 6.0 * a * h3;

        for _ in 0..detail {
            f += df;
            df += d2f;
            d2f += d3f;
            self.add_vertex(f, attributes, code)?;
        }
        Ok(())
    }

    // ====================
    // Edge generators
    // ====================

    /// Three edges per independent triangle.
    pub fn add_triangles_edges(&mut self) {
        let first = self.first_vertex;
        for t in 0..self.vertex_range().len() / 3 {
            let i0 = first + 3 * t;
            self.add_closed_ring(&[i0, i0 + 1, i0 + 2]);
        }
    }

    /// Edges of each fan triangle, radiating from the first vertex.
    pub fn add_triangle_fan_edges(&mut self) {
        let range = self.vertex_range();
        if range.len() < 3 {
            return;
        }
        let center = range.start;
        for i in range.start + 1..range.end - 1 {
            self.add_closed_ring(&[center, i, i + 1]);
        }
    }

    /// Edges of each strip triangle; the pair order alternates with parity.
    pub fn add_triangle_strip_edges(&mut self) {
        let range = self.vertex_range();
        if range.len() < 3 {
            return;
        }
        for i in range.start + 1..range.end - 1 {
            let (i1, i2) = if (i - range.start) % 2 == 0 {
                (i - 1, i + 1)
            } else {
                (i + 1, i - 1)
            };
            self.add_closed_ring(&[i, i1, i2]);
        }
    }

    pub fn add_quads_edges(&mut self) {
        let first = self.first_vertex;
        for q in 0..self.vertex_range().len() / 4 {
            let i0 = first + 4 * q;
            self.add_closed_ring(&[i0, i0 + 1, i0 + 2, i0 + 3]);
        }
    }

    pub fn add_quad_strip_edges(&mut self) {
        let first = self.first_vertex;
        let n = self.vertex_range().len();
        for qd in 1..n / 2 {
            let i0 = first + 2 * (qd - 1);
            let i1 = i0 + 1;
            let i2 = first + 2 * qd + 1;
            let i3 = first + 2 * qd;
            self.add_closed_ring(&[i0, i1, i2, i3]);
        }
    }

    /// Edges along each contour, following break codes.
    ///
    /// With `closed` every contour gets a final edge back to its first
    /// vertex; otherwise the last edge of each contour carries `END`.
    pub fn add_polygon_edges(&mut self, closed: bool) {
        let range = self.vertex_range();
        if range.is_empty() {
            return;
        }

        let mut contours = Vec::new();
        let mut contour_start = range.start;
        for i in range.start + 1..range.end {
            if self.vertices[i].code == VertexCode::Break {
                contours.push(contour_start..i);
                contour_start = i;
            }
        }
        contours.push(contour_start..range.end);

        for contour in contours {
            if contour.len() < 2 {
                continue;
            }
            if closed && contour.len() > 2 {
                let ring: Vec<usize> = contour.collect();
                self.add_closed_ring(&ring);
            } else {
                let last = contour.end - 1;
                for i in contour.start..last {
                    self.add_edge(i, i + 1, i == contour.start, i + 1 == last);
                }
            }
        }
    }

    fn add_closed_ring(&mut self, ring: &[usize]) {
        let n = ring.len();
        for k in 0..n {
            self.add_edge(ring[k], ring[(k + 1) % n], k == 0, k == n - 1);
        }
    }

    // ====================
    // Normal calculators
    // ====================

    /// Flat normal of `(i0, i1, i2)` written to all three vertices.
    pub fn calc_triangle_normal(&mut self, i0: usize, i1: usize, i2: usize) {
        let normal = tessel_core::math::face_normal(
            self.vertices[i0].position,
            self.vertices[i1].position,
            self.vertices[i2].position,
        );
        for i in [i0, i1, i2] {
            self.vertices[i].attributes.normal = normal;
        }
    }

    pub fn calc_triangles_normals(&mut self) {
        if self.explicit_normals {
            return;
        }
        let first = self.first_vertex;
        for t in 0..self.vertex_range().len() / 3 {
            let i0 = first + 3 * t;
            self.calc_triangle_normal(i0, i0 + 1, i0 + 2);
        }
    }

    pub fn calc_triangle_fan_normals(&mut self) {
        let range = self.vertex_range();
        if self.explicit_normals || range.len() < 3 {
            return;
        }
        for i in range.start + 1..range.end - 1 {
            self.calc_triangle_normal(range.start, i, i + 1);
        }
    }

    pub fn calc_triangle_strip_normals(&mut self) {
        let range = self.vertex_range();
        if self.explicit_normals || range.len() < 3 {
            return;
        }
        for i in range.start + 1..range.end - 1 {
            if (i - range.start) % 2 == 0 {
                self.calc_triangle_normal(i, i - 1, i + 1);
            } else {
                self.calc_triangle_normal(i, i + 1, i - 1);
            }
        }
    }

    pub fn calc_quads_normals(&mut self) {
        if self.explicit_normals {
            return;
        }
        let first = self.first_vertex;
        for q in 0..self.vertex_range().len() / 4 {
            let i0 = first + 4 * q;
            self.calc_triangle_normal(i0, i0 + 1, i0 + 3);
            self.calc_triangle_normal(i0 + 1, i0 + 2, i0 + 3);
        }
    }

    pub fn calc_quad_strip_normals(&mut self) {
        if self.explicit_normals {
            return;
        }
        let first = self.first_vertex;
        for qd in 1..self.vertex_range().len() / 2 {
            let i0 = first + 2 * (qd - 1);
            let i1 = i0 + 1;
            let i2 = first + 2 * qd + 1;
            let i3 = first + 2 * qd;
            self.calc_triangle_normal(i0, i1, i3);
            self.calc_triangle_normal(i1, i2, i3);
        }
    }

    // ====================
    // Primitive generators
    // ====================

    /// Axis-aligned rectangle with unit UVs, wound for [`Topology::Quads`](crate::Topology::Quads).
    pub fn generate_rect(
        &mut self,
        origin: Vec2,
        size: Vec2,
        attributes: &VertexAttributes,
    ) -> GeometryResult<()> {
        self.ensure_capacity(4)?;
        let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        for (u, v) in corners {
            let mut attrs = *attributes;
            attrs.texcoord = Vec2::new(u, v);
            let p = origin + size * Vec2::new(u, v);
            self.add_vertex(p.extend(0.0), &attrs, VertexCode::Vertex)?;
        }
        Ok(())
    }

    /// Ellipse centered at `center` with diameters `size`.
    ///
    /// Emits a center vertex when `fill` is set, so the result tessellates
    /// as a triangle fan. The ring is closed by repeating its first vertex,
    /// and with `stroke` one edge per ring segment is added.
    pub fn generate_ellipse(
        &mut self,
        center: Vec2,
        size: Vec2,
        fill: bool,
        stroke: bool,
        attributes: &VertexAttributes,
        min_accuracy: usize,
    ) -> GeometryResult<()> {
        let radius = size.abs() * 0.5;
        let accuracy = ellipse_accuracy(radius, min_accuracy);
        self.ensure_capacity(accuracy + 1 + usize::from(fill))?;

        if fill {
            let mut attrs = *attributes;
            attrs.texcoord = Vec2::splat(0.5);
            self.add_vertex(center.extend(0.0), &attrs, VertexCode::Vertex)?;
        }

        let ring_start = self.vertices.len();
        for k in 0..=accuracy {
            let angle = TAU * (k % accuracy) as f32 / accuracy as f32;
            let (sin, cos) = angle.sin_cos();
            let mut attrs = *attributes;
            attrs.texcoord = Vec2::new(0.5 + 0.5 * cos, 0.5 + 0.5 * sin);
            let p = center + radius * Vec2::new(cos, sin);
            self.add_vertex(p.extend(0.0), &attrs, VertexCode::Vertex)?;
        }

        if stroke {
            for k in 0..accuracy {
                let i = ring_start + k;
                self.add_edge(i, i + 1, k == 0, k + 1 == accuracy);
            }
        }
        Ok(())
    }

    /// Box centered at the origin: six quads with face normals and unit UVs.
    pub fn generate_box(&mut self, size: Vec3, attributes: &VertexAttributes) -> GeometryResult<()> {
        // Corner signs per face, counter-clockwise seen from outside.
        const FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]]),
            ([0.0, 0.0, -1.0], [[1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]]),
            ([1.0, 0.0, 0.0], [[1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]]),
            ([-1.0, 0.0, 0.0], [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]]),
            ([0.0, 1.0, 0.0], [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]]),
            ([0.0, -1.0, 0.0], [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]]),
        ];
        const UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        self.ensure_capacity(24)?;
        let half = size * 0.5;
        for (normal, corners) in FACES {
            for (corner, uv) in corners.iter().zip(UVS) {
                let mut attrs = *attributes;
                attrs.normal = Vec3::from(normal);
                attrs.texcoord = Vec2::from(uv);
                self.add_vertex(half * Vec3::from(*corner), &attrs, VertexCode::Vertex)?;
            }
        }
        self.explicit_normals = true;
        Ok(())
    }

    /// UV sphere centered at the origin as independent triangles with
    /// outward normals.
    pub fn generate_sphere(
        &mut self,
        radius: f32,
        detail: (usize, usize),
        attributes: &VertexAttributes,
    ) -> GeometryResult<()> {
        let (du, dv) = (detail.0.max(3), detail.1.max(2));
        self.ensure_capacity(6 * du * dv)?;

        let point = |i: usize, j: usize| {
            let theta = TAU * i as f32 / du as f32;
            let phi = PI * j as f32 / dv as f32;
            let dir = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            (dir, Vec2::new(i as f32 / du as f32, j as f32 / dv as f32))
        };

        for j in 0..dv {
            for i in 0..du {
                let a = point(i, j);
                let b = point(i + 1, j);
                let c = point(i + 1, j + 1);
                let d = point(i, j + 1);
                for (dir, uv) in [a, c, b, a, d, c] {
                    let mut attrs = *attributes;
                    attrs.normal = dir;
                    attrs.texcoord = uv;
                    self.add_vertex(dir * radius, &attrs, VertexCode::Vertex)?;
                }
            }
        }
        self.explicit_normals = true;
        Ok(())
    }
}

/// Segment count for an ellipse of the given radii.
pub fn ellipse_accuracy(radius: Vec2, min_accuracy: usize) -> usize {
    let mean = (radius.x + radius.y) * 0.5;
    ((TAU * mean / 20.0) as usize).max(min_accuracy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(points: &[(f32, f32)]) -> RawVertexStore {
        let mut raw = RawVertexStore::new(1024);
        let attrs = VertexAttributes::default();
        for &(x, y) in points {
            raw.add_vertex(Vec3::new(x, y, 0.0), &attrs, VertexCode::Vertex)
                .unwrap();
        }
        raw
    }

    #[test]
    fn test_add_vertex_ranges() {
        let mut raw = store_with(&[(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(raw.first_vertex(), 0);
        assert_eq!(raw.last_vertex(), Some(1));

        raw.begin_primitive();
        assert_eq!(raw.last_vertex(), None);
        assert!(raw.vertex_range().is_empty());
        assert_eq!(raw.vertex_count(), 2);
    }

    #[test]
    fn test_vertex_ceiling() {
        let mut raw = RawVertexStore::new(2);
        let attrs = VertexAttributes::default();
        raw.add_vertex(Vec3::ZERO, &attrs, VertexCode::Vertex).unwrap();
        raw.add_vertex(Vec3::ONE, &attrs, VertexCode::Vertex).unwrap();
        let err = raw.add_vertex(Vec3::X, &attrs, VertexCode::Vertex).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::CapacityOverflow {
                kind: CapacityKind::Vertices,
                requested: 3,
                limit: 2
            }
        ));
        assert_eq!(raw.vertex_count(), 2);
    }

    #[test]
    fn test_closed_polygon_edges_wrap() {
        let mut raw = store_with(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.5, 1.5)]);
        raw.add_polygon_edges(true);

        let edges = raw.edges();
        assert_eq!(edges.len(), 5);
        assert_eq!(edges[0].state, EdgeState::START);
        assert_eq!(edges[2].state, EdgeState::empty());
        assert_eq!((edges[4].a, edges[4].b), (4, 0));
        assert_eq!(edges[4].state, EdgeState::END);
    }

    #[test]
    fn test_polygon_edges_follow_breaks() {
        let mut raw = store_with(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]);
        raw.break_contour();
        let attrs = VertexAttributes::default();
        for (x, y) in [(1.0, 1.0), (2.0, 1.0), (2.0, 2.0)] {
            raw.add_vertex(Vec3::new(x, y, 0.0), &attrs, VertexCode::Vertex).unwrap();
        }
        assert_eq!(raw.vertex(3).code, VertexCode::Break);

        raw.add_polygon_edges(true);
        let edges = raw.edges();
        assert_eq!(edges.len(), 6);
        assert_eq!((edges[2].a, edges[2].b), (2, 0));
        assert_eq!((edges[5].a, edges[5].b), (5, 3));
    }

    #[test]
    fn test_open_polyline_edges() {
        let mut raw = store_with(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        raw.add_polygon_edges(false);
        let edges = raw.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].state, EdgeState::START);
        assert_eq!(edges[1].state, EdgeState::END);

        let mut segment = store_with(&[(0.0, 0.0), (1.0, 0.0)]);
        segment.add_polygon_edges(false);
        assert_eq!(segment.edges()[0].state, EdgeState::ISOLATED);
    }

    #[test]
    fn test_fan_edges_radiate_from_first() {
        let mut raw = store_with(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        raw.add_triangle_fan_edges();
        let edges = raw.edges();
        assert_eq!(edges.len(), 6);
        assert_eq!(edges[0].a, 0);
        assert_eq!(edges[3].a, 0);
        assert_eq!(edges[5].b, 0);
    }

    #[test]
    fn test_edges_respect_primitive_offset() {
        let mut raw = store_with(&[(9.0, 9.0)]);
        raw.begin_primitive();
        let attrs = VertexAttributes::default();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
            raw.add_vertex(Vec3::new(x, y, 0.0), &attrs, VertexCode::Vertex).unwrap();
        }
        raw.add_triangles_edges();
        assert_eq!(raw.edges().len(), 3);
        assert_eq!(raw.edges()[0].a, 1);
    }

    #[test]
    fn test_quad_strip_edges() {
        let mut raw = store_with(&[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0), (2.0, 0.0), (2.0, 1.0)]);
        raw.add_quad_strip_edges();
        let edges = raw.edges();
        assert_eq!(edges.len(), 8);
        assert_eq!((edges[0].a, edges[0].b), (0, 1));
        assert_eq!((edges[1].a, edges[1].b), (1, 3));
        assert_eq!((edges[2].a, edges[2].b), (3, 2));
    }

    #[test]
    fn test_triangle_normals_flat() {
        let mut raw = store_with(&[(1.0, 0.0), (0.0, 0.0), (0.0, 1.0)]);
        for v in raw.vertices_mut() {
            v.attributes.normal = Vec3::X;
        }
        raw.calc_triangles_normals();
        for v in raw.vertices() {
            assert!((v.attributes.normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_explicit_normals_kept() {
        let mut raw = store_with(&[(1.0, 0.0), (0.0, 0.0), (0.0, 1.0)]);
        for v in raw.vertices_mut() {
            v.attributes.normal = Vec3::X;
        }
        raw.set_explicit_normals(true);
        raw.calc_triangles_normals();
        assert_eq!(raw.vertex(0).attributes.normal, Vec3::X);
    }

    #[test]
    fn test_bezier_requires_vertex() {
        let mut raw = RawVertexStore::new(64);
        let attrs = VertexAttributes::default();
        let err = raw.bezier_vertex(Vec3::X, Vec3::Y, Vec3::ONE, &attrs, 20).unwrap_err();
        assert!(matches!(err, GeometryError::Precondition(_)));
        assert_eq!(raw.vertex_count(), 0);
    }

    #[test]
    fn test_bezier_endpoint_exact() {
        let mut raw = store_with(&[(0.0, 0.0)]);
        let attrs = VertexAttributes::default();
        raw.bezier_vertex(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(10.0, 10.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            &attrs,
            20,
        )
        .unwrap();
        assert_eq!(raw.vertex_count(), 21);
        let end = raw.vertex(20).position;
        assert!((end - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-3);
        // Midpoint of this symmetric curve is at (5, 7.5).
        let mid = raw.vertex(10).position;
        assert!((mid - Vec3::new(5.0, 7.5, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_quadratic_matches_cubic_elevation() {
        let mut raw = store_with(&[(0.0, 0.0)]);
        let attrs = VertexAttributes::default();
        raw.quadratic_vertex(Vec3::new(5.0, 10.0, 0.0), Vec3::new(10.0, 0.0, 0.0), &attrs, 2)
            .unwrap();
        // B(0.5) of the quadratic is (5, 5).
        assert!((raw.vertex(1).position - Vec3::new(5.0, 5.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_curve_vertex_buffers_until_four() {
        let mut raw = RawVertexStore::new(256);
        let attrs = VertexAttributes::default();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (2.0, 1.0)] {
            raw.curve_vertex(Vec3::new(x, y, 0.0), &attrs, 10, 0.0).unwrap();
        }
        assert_eq!(raw.vertex_count(), 0);

        raw.curve_vertex(Vec3::new(3.0, 1.0, 0.0), &attrs, 10, 0.0).unwrap();
        assert_eq!(raw.vertex_count(), 11);
        assert_eq!(raw.vertex(0).position, Vec3::new(1.0, 0.0, 0.0));
        assert!((raw.vertex(10).position - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-4);

        raw.curve_vertex(Vec3::new(4.0, 0.0, 0.0), &attrs, 10, 0.0).unwrap();
        assert_eq!(raw.vertex_count(), 21);
    }

    #[test]
    fn test_ellipse_vertex_and_edge_counts() {
        let mut raw = RawVertexStore::new(1024);
        let attrs = VertexAttributes::default();
        raw.generate_ellipse(Vec2::ZERO, Vec2::splat(10.0), true, true, &attrs, 6)
            .unwrap();
        // Small ellipse: accuracy clamps to 6.
        assert_eq!(raw.vertex_count(), 1 + 7);
        assert_eq!(raw.edges().len(), 6);
        assert_eq!(raw.vertex(1).position, raw.vertex(7).position);
    }

    #[test]
    fn test_ellipse_accuracy_grows() {
        assert_eq!(ellipse_accuracy(Vec2::splat(5.0), 6), 6);
        assert_eq!(ellipse_accuracy(Vec2::splat(100.0), 6), 31);
    }

    #[test]
    fn test_box_has_explicit_normals() {
        let mut raw = RawVertexStore::new(64);
        raw.generate_box(Vec3::splat(2.0), &VertexAttributes::default()).unwrap();
        assert_eq!(raw.vertex_count(), 24);
        assert!(raw.has_explicit_normals());
        assert_eq!(raw.vertex(0).attributes.normal, Vec3::Z);
        assert_eq!(raw.vertex(0).position, Vec3::new(-1.0, -1.0, 1.0));
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let mut raw = RawVertexStore::new(4096);
        raw.generate_sphere(3.0, (8, 6), &VertexAttributes::default()).unwrap();
        assert_eq!(raw.vertex_count(), 6 * 8 * 6);
        for v in raw.vertices() {
            assert!((v.position.length() - 3.0).abs() < 1e-4);
        }
    }
}
