//! Shape tree aggregation, partial updates and draw submission.
//!
//! Drawing is verified against the recording mock context, so no GPU is
//! needed.

use glam::{Vec2, Vec3};
use tessel_geometry::{
    Channel, Color, DrawCall, GeometryContext, GeometryLimits, NodeId, Primitive, PrimitivePass,
    ShapeTree, TessStyle, TextureHandle,
};
use tessel_test_utils::MockRenderContext;

fn rect(x: f32) -> Primitive {
    Primitive::Rect {
        origin: Vec2::new(x, 0.0),
        size: Vec2::splat(10.0),
    }
}

/// `count` rects directly under the root.
fn rects(tree: &mut ShapeTree, count: usize) -> Vec<NodeId> {
    (0..count)
        .map(|i| {
            let leaf = tree.create_primitive(rect(i as f32 * 20.0));
            tree.add_shape(tree.root(), leaf).unwrap();
            leaf
        })
        .collect()
}

// ====================
// Offsets
// ====================

#[test]
fn test_two_rects_are_contiguous() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let leaves = rects(&mut tree, 2);
    tree.set_style(tree.root(), TessStyle::default().with_stroke(false))
        .unwrap();

    let stats = tree.prepare(&mut ctx);
    assert!(stats.aggregated);
    assert_eq!(stats.retessellated, 2);
    assert_eq!(stats.totals.vertices, [8, 0, 0]);
    assert_eq!(stats.totals.indices, [12, 0, 0]);

    let second = tree.node(leaves[1]).unwrap().tess.range(PrimitivePass::Fill);
    assert_eq!(second.first_vertex, 4);
    assert_eq!(second.first_index, 6);
    assert_eq!(second.last_index, 11);
    assert!(tree.geometry().fill.indices[6..].iter().all(|&i| (4..8).contains(&i)));
}

#[test]
fn test_group_range_spans_children() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let group = tree.create_group();
    tree.add_shape(tree.root(), group).unwrap();
    for i in 0..2 {
        let leaf = tree.create_primitive(rect(i as f32 * 20.0));
        tree.add_shape(group, leaf).unwrap();
    }
    let tail = tree.create_primitive(rect(100.0));
    tree.add_shape(tree.root(), tail).unwrap();

    tree.prepare(&mut ctx);
    let range = *tree.node(group).unwrap().tess.range(PrimitivePass::Fill);
    assert_eq!(range.first_vertex, 0);
    assert_eq!(range.vertex_count, 8);
    assert_eq!(range.last_vertex, 7);
    assert_eq!(range.index_range(), 0..12);
    let tail = tree.node(tail).unwrap().tess.range(PrimitivePass::Fill);
    assert_eq!(tail.first_vertex, 8);

    let root = tree.node(tree.root()).unwrap().tess.range(PrimitivePass::Line);
    assert_eq!(root.vertex_count as usize, tree.geometry().line.vertex_count());
}

#[test]
fn test_aggregation_is_idempotent() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    rects(&mut tree, 3);

    tree.prepare(&mut ctx);
    let fill_indices = tree.geometry().fill.indices.clone();
    let line_indices = tree.geometry().line.indices.clone();
    let positions = tree.geometry().fill.vertices.positions.clone();

    tree.mark_stale(tree.root(), tessel_geometry::Stale::AGGREGATION);
    let stats = tree.prepare(&mut ctx);
    assert!(stats.aggregated);
    assert_eq!(stats.retessellated, 0);
    assert_eq!(tree.geometry().fill.indices, fill_indices);
    assert_eq!(tree.geometry().line.indices, line_indices);
    assert_eq!(tree.geometry().fill.vertices.positions, positions);
}

#[test]
fn test_new_leaf_shifts_later_offsets() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let leaves = rects(&mut tree, 2);
    tree.prepare(&mut ctx);

    let late = tree.create_primitive(rect(200.0));
    tree.add_shape(tree.root(), late).unwrap();
    let stats = tree.prepare(&mut ctx);
    assert_eq!(stats.retessellated, 1);
    assert_eq!(stats.totals.vertices[0], 12);

    let first = tree.node(leaves[0]).unwrap().tess.range(PrimitivePass::Fill);
    assert_eq!(first.first_vertex, 0);
    assert!(tree.geometry().fill.indices[12..].iter().all(|&i| (8..12).contains(&i)));
}

#[test]
fn test_overflowing_leaf_is_dropped() {
    let limits = GeometryLimits::default().with_max_vertices(8);
    let mut ctx = GeometryContext::new(limits.clone());
    let mut tree = ShapeTree::new(limits);
    let leaves = rects(&mut tree, 2);
    tree.set_style(leaves[0], TessStyle::default().with_stroke(false))
        .unwrap();

    // The second rect's outline needs sixteen line vertices.
    let stats = tree.prepare(&mut ctx);
    assert_eq!(stats.aborted, vec![leaves[1]]);
    assert_eq!(tree.geometry().fill.vertex_count(), 4);
    assert!(tree.geometry().line.is_empty());
}

// ====================
// Partial Updates
// ====================

#[test]
fn test_recolor_writes_only_that_span() {
    let mock = MockRenderContext::new();
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let leaves = rects(&mut tree, 3);
    tree.prepare(&mut ctx);
    tree.draw(&ctx, &mock);

    let colors = mock.buffer_labeled(Channel::FillColor.label()).unwrap();
    mock.clear_calls();

    tree.set_fill(leaves[1], Color::RED).unwrap();
    let stats = tree.prepare(&mut ctx);
    assert!(!stats.aggregated);
    tree.draw(&ctx, &mock);

    // Vertices 4..8, four bytes each.
    assert_eq!(mock.writes_to(colors), vec![(16, 16)]);
    assert_eq!(mock.count_buffer_writes(), 1);
    assert_eq!(mock.count_buffer_creates(), 0);

    let fill_colors = &tree.geometry().fill.vertices.colors;
    assert_eq!(fill_colors[0], Color::WHITE);
    assert!(fill_colors[4..8].iter().all(|c| *c == Color::RED));
    assert_eq!(fill_colors[8], Color::WHITE);
}

#[test]
fn test_adjacent_recolors_merge_into_one_write() {
    let mock = MockRenderContext::new();
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let leaves = rects(&mut tree, 3);
    tree.prepare(&mut ctx);
    tree.draw(&ctx, &mock);
    let colors = mock.buffer_labeled(Channel::FillColor.label()).unwrap();
    mock.clear_calls();

    tree.set_fill(leaves[0], Color::BLUE).unwrap();
    tree.set_fill(leaves[1], Color::GREEN).unwrap();
    assert_eq!(tree.dirty_spans().span_count(Channel::FillColor), 1);
    tree.draw(&ctx, &mock);

    assert_eq!(mock.writes_to(colors), vec![(0, 32)]);
    assert!(tree.dirty_spans().is_empty());
}

#[test]
fn test_leaf_translate_patches_positions() {
    let mock = MockRenderContext::new();
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let leaves = rects(&mut tree, 2);
    tree.prepare(&mut ctx);
    tree.draw(&ctx, &mock);
    let positions = mock.buffer_labeled(Channel::FillPosition.label()).unwrap();
    mock.clear_calls();

    tree.translate(leaves[1], Vec3::new(0.0, 5.0, 0.0)).unwrap();
    assert!(!tree.is_stale());
    assert_eq!(tree.geometry().fill.vertices.positions[4], [20.0, 5.0, 0.0]);
    tree.draw(&ctx, &mock);

    assert_eq!(mock.writes_to(positions), vec![(48, 48)]);
}

#[test]
fn test_center_moves_leaf_through_spans() {
    let mock = MockRenderContext::new();
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let leaves = rects(&mut tree, 2);
    tree.prepare(&mut ctx);
    tree.draw(&ctx, &mock);
    let positions = mock.buffer_labeled(Channel::FillPosition.label()).unwrap();
    mock.clear_calls();

    tree.center(leaves[1], Vec3::new(100.0, 100.0, 0.0)).unwrap();
    assert!(!tree.is_stale());
    assert_eq!(tree.node(leaves[1]).unwrap().tess.center(), Some(Vec3::new(100.0, 100.0, 0.0)));
    assert_eq!(tree.geometry().fill.vertices.positions[4], [95.0, 95.0, 0.0]);
    tree.draw(&ctx, &mock);

    assert_eq!(mock.writes_to(positions), vec![(48, 48)]);
}

#[test]
fn test_stroke_weight_reaggregates() {
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let leaves = rects(&mut tree, 2);
    tree.prepare(&mut ctx);

    tree.set_stroke_weight(leaves[0], 6.0).unwrap();
    let stats = tree.prepare(&mut ctx);
    assert!(stats.aggregated);
    assert_eq!(stats.retessellated, 1);
    assert_eq!(tree.geometry().line.vertices.dir_widths[0][3], 3.0);
}

// ====================
// Draws
// ====================

#[test]
fn test_single_texture_tree_draws_once_per_pass() {
    let mock = MockRenderContext::new();
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    rects(&mut tree, 3);
    tree.prepare(&mut ctx);
    tree.draw(&ctx, &mock);

    assert_eq!(
        mock.draws_for(PrimitivePass::Fill),
        vec![DrawCall::new(PrimitivePass::Fill, 0..18, None)]
    );
    assert_eq!(mock.draws_for(PrimitivePass::Line).len(), 1);
    assert!(mock.draws_for(PrimitivePass::Point).is_empty());
}

#[test]
fn test_texture_runs_split_fill_draws() {
    let mock = MockRenderContext::new();
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    rects(&mut tree, 2);
    tree.set_textures(tree.root(), &[TextureHandle(1), TextureHandle(2)])
        .unwrap();
    tree.prepare(&mut ctx);
    assert_eq!(tree.texture_runs().len(), 2);

    tree.draw(&ctx, &mock);
    assert_eq!(
        mock.draws_for(PrimitivePass::Fill),
        vec![
            DrawCall::new(PrimitivePass::Fill, 0..6, Some(TextureHandle(1))),
            DrawCall::new(PrimitivePass::Fill, 6..12, Some(TextureHandle(2))),
        ]
    );

    // Same texture everywhere collapses to one run.
    tree.set_textures(tree.root(), &[TextureHandle(1), TextureHandle(1)])
        .unwrap();
    tree.prepare(&mut ctx);
    assert_eq!(tree.texture_runs().len(), 1);
    mock.clear_calls();
    tree.draw(&ctx, &mock);
    assert_eq!(
        mock.draws_for(PrimitivePass::Fill),
        vec![DrawCall::new(PrimitivePass::Fill, 0..12, Some(TextureHandle(1)))]
    );
}

#[test]
fn test_group_transform_is_drawn_separately() {
    let mock = MockRenderContext::new();
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    let group = tree.create_group();
    tree.add_shape(tree.root(), group).unwrap();
    let inner = tree.create_primitive(rect(0.0));
    tree.add_shape(group, inner).unwrap();
    let outer = tree.create_primitive(rect(20.0));
    tree.add_shape(tree.root(), outer).unwrap();
    tree.translate(group, Vec3::new(100.0, 0.0, 0.0)).unwrap();

    tree.prepare(&mut ctx);
    tree.draw(&ctx, &mock);

    let fills = mock.draws_for(PrimitivePass::Fill);
    assert_eq!(fills.len(), 2);
    assert_eq!(fills[0].indices, 0..6);
    assert_eq!(
        fills[0].transform,
        Some(glam::Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0)))
    );
    assert_eq!(fills[1].indices, 6..12);
    assert_eq!(fills[1].transform, None);
}

// ====================
// Buffers
// ====================

#[test]
fn test_release_goes_through_deletion_queue() {
    let mock = MockRenderContext::new();
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    rects(&mut tree, 2);
    tree.prepare(&mut ctx);
    tree.draw(&ctx, &mock);
    let created = mock.count_buffer_creates();
    assert!(created > 0);

    tree.release(&ctx);
    assert!(tree.gpu().is_empty());
    assert_eq!(mock.count_buffer_destroys(), 0);
    assert_eq!(ctx.deletions().len(), created);

    assert_eq!(ctx.drain_deletions(&mock), created);
    assert_eq!(mock.count_buffer_destroys(), created);
    assert!(ctx.deletions().is_empty());

    // The next draw uploads into fresh buffers.
    tree.draw(&ctx, &mock);
    assert_eq!(mock.count_buffer_creates(), 2 * created);
}

#[test]
fn test_growth_replaces_buffers() {
    let mock = MockRenderContext::new();
    let mut ctx = GeometryContext::default();
    let mut tree = ShapeTree::new(ctx.limits().clone());
    rects(&mut tree, 1);
    tree.prepare(&mut ctx);
    tree.draw(&ctx, &mock);
    let first_colors = mock.buffer_labeled(Channel::FillColor.label()).unwrap();

    rects(&mut tree, 8);
    tree.prepare(&mut ctx);
    tree.draw(&ctx, &mock);
    let second_colors = mock.buffer_labeled(Channel::FillColor.label()).unwrap();

    assert_ne!(first_colors, second_colors);
    assert!(!ctx.deletions().is_empty());
}
