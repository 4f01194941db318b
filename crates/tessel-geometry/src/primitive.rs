//! Parametric primitive shapes and the raw vertices they generate.

use crate::{GeometryLimits, GeometryResult, RawVertexStore, TessStyle, Topology, VertexAttributes, VertexCode};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Point(Vec3),
    Line(Vec3, Vec3),
    Triangle([Vec3; 3]),
    Quad([Vec3; 4]),
    Rect { origin: Vec2, size: Vec2 },
    /// Ellipse with diameters `size`.
    Ellipse { center: Vec2, size: Vec2 },
    Box(Vec3),
    Sphere(f32),
}

impl Primitive {
    pub fn topology(&self) -> Topology {
        match self {
            Primitive::Point(_) => Topology::Points,
            Primitive::Line(..) => Topology::Lines,
            Primitive::Triangle(_) | Primitive::Sphere(_) => Topology::Triangles,
            Primitive::Quad(_) | Primitive::Rect { .. } | Primitive::Box(_) => Topology::Quads,
            Primitive::Ellipse { .. } => Topology::TriangleFan,
        }
    }

    /// Whether [`generate`](Self::generate) already emits the stroke edges.
    pub fn generates_edges(&self) -> bool {
        matches!(self, Primitive::Ellipse { .. })
    }

    /// Append this primitive's vertices to `raw` as one new primitive range.
    pub fn generate(
        &self,
        raw: &mut RawVertexStore,
        attributes: &VertexAttributes,
        style: &TessStyle,
        limits: &GeometryLimits,
    ) -> GeometryResult<()> {
        raw.begin_primitive();
        match *self {
            Primitive::Point(p) => {
                raw.add_vertex(p, attributes, VertexCode::Vertex)?;
            }
            Primitive::Line(a, b) => {
                raw.add_vertex(a, attributes, VertexCode::Vertex)?;
                raw.add_vertex(b, attributes, VertexCode::Vertex)?;
            }
            Primitive::Triangle(points) => {
                for p in points {
                    raw.add_vertex(p, attributes, VertexCode::Vertex)?;
                }
            }
            Primitive::Quad(points) => {
                for p in points {
                    raw.add_vertex(p, attributes, VertexCode::Vertex)?;
                }
            }
            Primitive::Rect { origin, size } => raw.generate_rect(origin, size, attributes)?,
            Primitive::Ellipse { center, size } => raw.generate_ellipse(
                center,
                size,
                style.fill,
                style.stroke,
                attributes,
                limits.min_accuracy,
            )?,
            Primitive::Box(size) => raw.generate_box(size, attributes)?,
            Primitive::Sphere(radius) => raw.generate_sphere(radius, limits.sphere_detail, attributes)?,
        }
        Ok(())
    }
}
