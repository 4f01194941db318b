//! Headless Frames Example - Retained and Immediate Geometry Side by Side
//!
//! Runs a short frame loop against the recording mock context, so no GPU or
//! window is needed:
//! - A retained tree of rects and ellipses, recolored and moved every frame
//!   (dirty-span writes only)
//! - An immediate-mode burst of shapes that overflows the batch limits and
//!   flushes mid-frame
//!
//! Run with `RUST_LOG=debug` for per-frame stats, and enable the `profiling`
//! feature to inspect scopes in puffin_viewer.

use glam::{Vec2, Vec3};
use tessel_core::logging;
use tessel_core::profiling::{ProfilingBackend, init_profiling, new_frame};
use tessel_geometry::{
    Color, GeometryContext, GeometryLimits, ImmediateRenderer, Primitive, ShapeTree, TessStyle,
};
use tessel_test_utils::MockRenderContext;

const FRAMES: usize = 60;

fn main() {
    logging::init();
    init_profiling(ProfilingBackend::PuffinHttp);

    let render = MockRenderContext::new();
    let limits = GeometryLimits::default().with_max_vertices(256);
    let mut ctx = GeometryContext::new(limits.clone());

    let mut tree = ShapeTree::new(limits.clone());
    let group = tree.create_group();
    tree.add_shape(tree.root(), group).unwrap();
    let leaves: Vec<_> = (0..16)
        .map(|i| {
            let origin = Vec2::new((i % 4) as f32 * 30.0, (i / 4) as f32 * 30.0);
            let primitive = if i % 2 == 0 {
                Primitive::Rect {
                    origin,
                    size: Vec2::splat(20.0),
                }
            } else {
                Primitive::Ellipse {
                    center: origin + 10.0,
                    size: Vec2::splat(20.0),
                }
            };
            let leaf = tree.create_primitive(primitive);
            tree.add_shape(group, leaf).unwrap();
            leaf
        })
        .collect();

    let mut immediate = ImmediateRenderer::new(limits);
    immediate.set_style(TessStyle::default().with_stroke(false));

    for frame in 0..FRAMES {
        new_frame();
        render.clear_calls();

        let leaf = leaves[frame % leaves.len()];
        let t = frame as f32 / FRAMES as f32;
        tree.set_fill(leaf, Color::rgb(t, 0.2, 1.0 - t)).unwrap();
        tree.translate(leaf, Vec3::new(0.0, 0.5, 0.0)).unwrap();
        let stats = tree.prepare(&mut ctx);
        tree.draw(&ctx, &render);

        immediate.begin_frame();
        for i in 0..100 {
            let origin = Vec2::new(i as f32 * 4.0, 200.0 + t * 50.0);
            immediate
                .shape(
                    &mut ctx,
                    &render,
                    Primitive::Rect {
                        origin,
                        size: Vec2::splat(3.0),
                    },
                )
                .unwrap();
        }
        immediate.flush(&ctx, &render);

        let released = ctx.drain_deletions(&render);
        tracing::debug!(
            frame,
            aggregated = stats.aggregated,
            writes = render.count_buffer_writes(),
            draws = render.count_draws(),
            released,
            "frame done"
        );
    }

    tracing::info!(
        "{} frames, {} immediate batches",
        FRAMES,
        immediate.flush_count()
    );
}
