//! Tessellation tests through the public API.
//!
//! These tests verify index counts, stroke edges and point sprites for the
//! supported topologies, both directly and through shape tree leaves.

use glam::{Vec2, Vec3};
use tessel_geometry::{
    GeometryContext, GeometryError, GeometryLimits, LineCap, Primitive, RawVertexStore, ShapeKind,
    ShapeTree, TessStyle, Tessellator, Topology, VertexAttributes, VertexCode,
};

fn ring(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / n as f32;
            Vec3::new(angle.cos() * 10.0, angle.sin() * 10.0, 0.0)
        })
        .collect()
}

fn leaf_with(tree: &mut ShapeTree, kind: ShapeKind, points: &[Vec3], style: TessStyle) -> tessel_geometry::NodeId {
    let leaf = tree.create(kind);
    tree.add_shape(tree.root(), leaf).unwrap();
    tree.set_style(leaf, style).unwrap();
    for &p in points {
        tree.vertex(leaf, p).unwrap();
    }
    leaf
}

// ====================
// Fill Topologies
// ====================

#[test]
fn test_triangle_fan_index_count() {
    for n in [3, 5, 8] {
        let mut ctx = GeometryContext::default();
        let mut tree = ShapeTree::new(ctx.limits().clone());
        leaf_with(
            &mut tree,
            ShapeKind::Geometry {
                topology: Topology::TriangleFan,
            },
            &ring(n),
            TessStyle::default().with_stroke(false),
        );

        tree.prepare(&mut ctx);
        assert_eq!(tree.geometry().fill.vertex_count(), n);
        assert_eq!(tree.geometry().fill.index_count(), 3 * (n - 2), "fan of {n}");
    }
}

#[test]
fn test_square_path_fill_and_stroke() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let square = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::new(10.0, 10.0, 0.0),
        Vec3::new(0.0, 10.0, 0.0),
    ];
    leaf_with(&mut tree, ShapeKind::Path { closed: true }, &square, TessStyle::default());

    tree.prepare(&mut ctx);
    let geometry = tree.geometry();
    assert_eq!(geometry.fill.index_count(), 6);
    // One ribbon per closing edge: four vertices and six indices each.
    assert_eq!(geometry.line.vertex_count(), 16);
    assert_eq!(geometry.line.index_count(), 24);
}

#[test]
fn test_path_with_hole_uses_even_odd() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let path = tree.create(ShapeKind::Path { closed: true });
    tree.add_shape(tree.root(), path).unwrap();
    tree.set_style(path, TessStyle::default().with_stroke(false).with_solid(false))
        .unwrap();

    for (x, y) in [(0.0, 0.0), (30.0, 0.0), (30.0, 30.0), (0.0, 30.0)] {
        tree.vertex(path, Vec3::new(x, y, 0.0)).unwrap();
    }
    tree.break_contour(path).unwrap();
    for (x, y) in [(10.0, 10.0), (20.0, 10.0), (20.0, 20.0), (10.0, 20.0)] {
        tree.vertex(path, Vec3::new(x, y, 0.0)).unwrap();
    }

    tree.prepare(&mut ctx);
    let fill = &tree.geometry().fill;
    assert_eq!(fill.vertex_count(), 8);
    assert!(fill.index_count() > 0);

    // No triangle may cover the hole.
    let positions = &fill.vertices.positions;
    for tri in fill.indices.chunks(3) {
        let centroid = tri
            .iter()
            .map(|&i| Vec3::from(positions[i as usize]))
            .sum::<Vec3>()
            / 3.0;
        let inside_hole = (10.0..20.0).contains(&centroid.x) && (10.0..20.0).contains(&centroid.y);
        assert!(!inside_hole, "triangle {tri:?} covers the hole");
    }
}

#[test]
fn test_curves_flatten_into_path() {
    let limits = GeometryLimits::default().with_bezier_detail(10);
    let mut ctx = GeometryContext::new(limits.clone());
    let mut tree = ShapeTree::new(limits);
    let path = tree.create(ShapeKind::Path { closed: false });
    tree.add_shape(tree.root(), path).unwrap();
    tree.set_style(path, TessStyle::default().with_fill(false)).unwrap();

    tree.vertex(path, Vec3::ZERO).unwrap();
    tree.bezier_vertex(path, Vec3::new(0.0, 10.0, 0.0), Vec3::new(10.0, 10.0, 0.0), Vec3::new(10.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(tree.node(path).unwrap().raw.vertex_count(), 11);

    tree.prepare(&mut ctx);
    // An open contour of eleven vertices strokes ten segments.
    assert_eq!(tree.geometry().line.vertex_count(), 40);
}

// ====================
// Stroke Edges
// ====================

#[test]
fn test_closed_polygon_has_one_edge_per_vertex() {
    let tessellator = Tessellator::default();
    for n in [3, 4, 7] {
        let mut raw = RawVertexStore::new(64);
        let attrs = VertexAttributes::default();
        for p in ring(n) {
            raw.add_vertex(p, &attrs, VertexCode::Vertex).unwrap();
        }
        tessellator.finish_primitive(Topology::Polygon, &mut raw, true);
        assert_eq!(raw.edge_count(), n);

        raw.clear_edges();
        tessellator.finish_primitive(Topology::Polygon, &mut raw, false);
        assert_eq!(raw.edge_count(), n - 1);
    }
}

#[test]
fn test_lines_stroke_pairs() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let points = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
    leaf_with(
        &mut tree,
        ShapeKind::Geometry {
            topology: Topology::Lines,
        },
        &points,
        TessStyle::default(),
    );

    tree.prepare(&mut ctx);
    let geometry = tree.geometry();
    assert!(geometry.fill.is_empty());
    assert_eq!(geometry.line.vertex_count(), 8);
    assert_eq!(geometry.line.index_count(), 12);
}

// ====================
// Points
// ====================

#[test]
fn test_round_points_are_fans() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    leaf_with(
        &mut tree,
        ShapeKind::Geometry {
            topology: Topology::Points,
        },
        &[Vec3::ZERO, Vec3::X, Vec3::Y],
        TessStyle::default(),
    );

    tree.prepare(&mut ctx);
    let point = &tree.geometry().point;
    // Each point: a center plus a ring of p vertices, and p triangles.
    assert_eq!(point.index_count(), 3 * (point.vertex_count() - 3));
    assert!(tree.geometry().fill.is_empty());
}

#[test]
fn test_square_points_have_five_vertices() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    leaf_with(
        &mut tree,
        ShapeKind::Geometry {
            topology: Topology::Points,
        },
        &[Vec3::ZERO, Vec3::X],
        TessStyle::default().with_cap(LineCap::Square),
    );

    tree.prepare(&mut ctx);
    assert_eq!(tree.geometry().point.vertex_count(), 10);
    assert_eq!(tree.geometry().point.index_count(), 24);
}

// ====================
// Primitives
// ====================

#[test]
fn test_box_has_explicit_normals() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let cube = tree.create_primitive(Primitive::Box(Vec3::splat(2.0)));
    tree.add_shape(tree.root(), cube).unwrap();
    tree.set_style(cube, TessStyle::default().with_stroke(false)).unwrap();

    tree.prepare(&mut ctx);
    let fill = &tree.geometry().fill;
    assert_eq!(fill.vertex_count(), 24);
    assert_eq!(fill.index_count(), 36);
    assert_eq!(fill.vertices.normals[0], [0.0, 0.0, 1.0]);
}

#[test]
fn test_ellipse_fill_and_outline() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let ellipse = tree.create_primitive(Primitive::Ellipse {
        center: Vec2::ZERO,
        size: Vec2::splat(20.0),
    });
    tree.add_shape(tree.root(), ellipse).unwrap();

    tree.prepare(&mut ctx);
    let geometry = tree.geometry();
    let ring = geometry.fill.vertex_count() - 2;
    assert_eq!(geometry.fill.index_count(), 3 * ring);
    assert_eq!(geometry.line.vertex_count(), 4 * ring);
}

// ====================
// Preconditions
// ====================

#[test]
fn test_authoring_a_primitive_is_rejected() {
    let mut tree = ShapeTree::new(GeometryLimits::default());
    let rect = tree.create_primitive(Primitive::Rect {
        origin: Vec2::ZERO,
        size: Vec2::ONE,
    });
    let err = tree.vertex(rect, Vec3::ZERO).unwrap_err();
    assert!(matches!(err, GeometryError::Precondition(_)));
}

#[test]
fn test_bezier_without_start_leaves_path_unchanged() {
    let mut tree = ShapeTree::new(GeometryLimits::default());
    let path = tree.create(ShapeKind::Path { closed: false });
    let err = tree.bezier_vertex(path, Vec3::X, Vec3::Y, Vec3::ONE).unwrap_err();
    assert!(matches!(err, GeometryError::Precondition(_)));
    assert_eq!(tree.node(path).unwrap().raw.vertex_count(), 0);
}

#[test]
fn test_vertex_capacity_overflow() {
    let mut tree = ShapeTree::new(GeometryLimits::default().with_max_vertices(3));
    let path = tree.create(ShapeKind::Path { closed: true });
    for p in ring(3) {
        tree.vertex(path, p).unwrap();
    }
    let err = tree.vertex(path, Vec3::ZERO).unwrap_err();
    assert!(matches!(err, GeometryError::CapacityOverflow { .. }));
    assert_eq!(tree.node(path).unwrap().raw.vertex_count(), 3);
}
