//! Retained shape tree.
//!
//! Leaves own their raw and tessellated geometry; groups own only ordered
//! children. [`ShapeTree::prepare`] re-tessellates stale leaves and
//! aggregates the whole tree into one set of root buffers, which
//! [`ShapeTree::draw`] uploads and draws with as few range draws as the
//! textures and transforms allow.
//!
//! Edits that keep topology (recolor, leaf transforms) bypass aggregation:
//! they patch the root buffers in place and record dirty spans.

use crate::aggregate::{self, AggregateStats};
use crate::{
    Channel, Color, DirtySpanCache, FlushPolicy, GeometryContext, GeometryError, GeometryLimits,
    GeometryResult, GpuGeometry, PassCounters, Primitive, RawVertexStore, TessGeometry, TessStyle,
    Tessellator, TextureRunCache, Topology, VertexAttributes, VertexCode,
};
use bitflags::bitflags;
use glam::{Affine3A, Mat4, Quat, Vec2, Vec3};
use std::collections::BTreeSet;
use tessel_core::alloc::HashMap;
use tessel_core::profiling::profile_function;
use tessel_test_utils::{DrawCall, PrimitivePass, RenderContext, TextureHandle};

/// Node identifier in the shape tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

bitflags! {
    /// What must be redone for a node before the next draw.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Stale: u8 {
        /// Raw data or style changed; the leaf must be tessellated again.
        const TESSELLATION = 1 << 0;
        /// Offsets below this node changed; the tree must be aggregated.
        const AGGREGATION = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    Group,
    /// Vertices authored one by one, connected by `topology`.
    Geometry { topology: Topology },
    /// Polygon with contours; `closed` adds the closing stroke edge.
    Path { closed: bool },
    Primitive(Primitive),
}

pub struct ShapeNode {
    pub kind: ShapeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub raw: RawVertexStore,
    pub tess: TessGeometry,
    /// Stamped onto every vertex authored next.
    pub attributes: VertexAttributes,
    pub style: TessStyle,
    pub texture: Option<TextureHandle>,
    /// On a leaf, baked into its geometry. On a group, applied at draw time.
    pub transform: Option<Affine3A>,
    pub stale: Stale,
}

impl ShapeNode {
    fn new(kind: ShapeKind, max_vertices: usize) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            raw: RawVertexStore::new(max_vertices),
            tess: TessGeometry::new(),
            attributes: VertexAttributes::default(),
            style: TessStyle::default(),
            texture: None,
            transform: None,
            stale: Stale::TESSELLATION | Stale::AGGREGATION,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ShapeKind::Group)
    }

    fn is_authored(&self) -> bool {
        matches!(self.kind, ShapeKind::Geometry { .. } | ShapeKind::Path { .. })
    }

    /// Rebuild `tess` from `raw` with this node's style.
    fn retessellate(&mut self, tessellator: &mut Tessellator, limits: &GeometryLimits) -> GeometryResult<()> {
        self.tess.clear();
        tessellator.set_style(self.style);
        tessellator.set_transform(None);

        let topology = match self.kind {
            ShapeKind::Group => return Ok(()),
            ShapeKind::Geometry { topology } => {
                self.raw.clear_edges();
                tessellator.finish_primitive(topology, &mut self.raw, true);
                topology
            }
            ShapeKind::Path { closed } => {
                self.raw.clear_edges();
                tessellator.finish_primitive(Topology::Polygon, &mut self.raw, closed);
                Topology::Polygon
            }
            ShapeKind::Primitive(primitive) => {
                self.raw.clear();
                primitive.generate(&mut self.raw, &self.attributes, &self.style, limits)?;
                if !primitive.generates_edges() {
                    tessellator.finish_primitive(primitive.topology(), &mut self.raw, true);
                }
                primitive.topology()
            }
        };

        tessellator.tessellate(topology, &self.raw, &mut self.tess, &mut FlushPolicy::Retained)?;
        if let Some(transform) = self.transform {
            self.tess.apply_transform(&transform);
        }
        Ok(())
    }
}

/// Hierarchy of shapes aggregated into one set of GPU buffers.
pub struct ShapeTree {
    nodes: HashMap<NodeId, ShapeNode>,
    root: NodeId,
    next_id: usize,
    limits: GeometryLimits,
    geometry: TessGeometry,
    runs: TextureRunCache,
    dirty: DirtySpanCache,
    gpu: GpuGeometry,
    /// Set once `geometry` reflects the node offsets.
    aggregated: bool,
    upload_pending: bool,
    runs_dirty: bool,
}

impl ShapeTree {
    /// Create a tree whose root is an empty group.
    pub fn new(limits: GeometryLimits) -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::default();
        nodes.insert(root, ShapeNode::new(ShapeKind::Group, limits.max_vertices));
        Self {
            nodes,
            root,
            next_id: 1,
            limits,
            geometry: TessGeometry::new(),
            runs: TextureRunCache::new(),
            dirty: DirtySpanCache::new(),
            gpu: GpuGeometry::new(),
            aggregated: false,
            upload_pending: false,
            runs_dirty: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&ShapeNode> {
        self.nodes.get(&id)
    }

    /// The aggregated root geometry.
    pub fn geometry(&self) -> &TessGeometry {
        &self.geometry
    }

    pub fn texture_runs(&self) -> &TextureRunCache {
        &self.runs
    }

    pub fn dirty_spans(&self) -> &DirtySpanCache {
        &self.dirty
    }

    pub fn gpu(&self) -> &GpuGeometry {
        &self.gpu
    }

    /// Whether anything must be re-tessellated or re-aggregated.
    pub fn is_stale(&self) -> bool {
        self.nodes.get(&self.root).is_some_and(|root| !root.stale.is_empty())
    }

    // ====================
    // Structure
    // ====================

    /// Create a detached node. Attach it with [`add_shape`](Self::add_shape).
    pub fn create(&mut self, kind: ShapeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, ShapeNode::new(kind, self.limits.max_vertices));
        id
    }

    pub fn create_group(&mut self) -> NodeId {
        self.create(ShapeKind::Group)
    }

    pub fn create_primitive(&mut self, primitive: Primitive) -> NodeId {
        self.create(ShapeKind::Primitive(primitive))
    }

    /// Append `child` to `parent`'s children. `parent` must be a group.
    pub fn add_shape(&mut self, parent: NodeId, child: NodeId) -> GeometryResult<()> {
        if child == self.root || self.subtree(child).contains(&parent) {
            return Err(precondition("a shape cannot contain itself or the root"));
        }
        let parent_node = self.nodes.get(&parent).ok_or(GeometryError::NodeNotFound(parent.0))?;
        if !parent_node.is_group() {
            return Err(precondition("add_shape requires a group parent"));
        }
        let child_node = self.nodes.get_mut(&child).ok_or(GeometryError::NodeNotFound(child.0))?;
        if child_node.parent.is_some() {
            return Err(precondition("shape already has a parent"));
        }
        child_node.parent = Some(parent);

        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(child);
        }
        self.mark_stale(parent, Stale::AGGREGATION);
        Ok(())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Flag `id` and propagate aggregation staleness to its ancestors.
    pub fn mark_stale(&mut self, id: NodeId, flags: Stale) {
        if flags.is_empty() {
            return;
        }
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.stale |= flags;

        let mut current = node.parent;
        while let Some(parent_id) = current {
            let Some(parent) = self.nodes.get_mut(&parent_id) else {
                break;
            };
            if parent.stale.contains(Stale::AGGREGATION) {
                break;
            }
            parent.stale |= Stale::AGGREGATION;
            current = parent.parent;
        }
    }

    // ====================
    // Authoring
    // ====================

    fn authored_mut(&mut self, id: NodeId, op: &'static str) -> GeometryResult<&mut ShapeNode> {
        let node = self.nodes.get_mut(&id).ok_or(GeometryError::NodeNotFound(id.0))?;
        if !node.is_authored() {
            return Err(precondition(op));
        }
        Ok(node)
    }

    fn authored(&mut self, id: NodeId, op: &'static str, f: impl FnOnce(&mut ShapeNode, &GeometryLimits) -> GeometryResult<()>) -> GeometryResult<()> {
        let limits = self.limits.clone();
        let node = self.authored_mut(id, op)?;
        f(node, &limits)?;
        self.mark_stale(id, Stale::TESSELLATION);
        Ok(())
    }

    pub fn vertex(&mut self, id: NodeId, position: Vec3) -> GeometryResult<()> {
        self.authored(id, "vertex requires a geometry or path shape", |node, _| {
            node.raw
                .add_vertex(position, &node.attributes, VertexCode::Vertex)
                .map(|_| ())
        })
    }

    pub fn bezier_vertex(&mut self, id: NodeId, c1: Vec3, c2: Vec3, end: Vec3) -> GeometryResult<()> {
        self.authored(id, "bezier_vertex requires a geometry or path shape", |node, limits| {
            node.raw
                .bezier_vertex(c1, c2, end, &node.attributes, limits.bezier_detail)
        })
    }

    pub fn quadratic_vertex(&mut self, id: NodeId, control: Vec3, end: Vec3) -> GeometryResult<()> {
        self.authored(id, "quadratic_vertex requires a geometry or path shape", |node, limits| {
            node.raw
                .quadratic_vertex(control, end, &node.attributes, limits.bezier_detail)
        })
    }

    pub fn curve_vertex(&mut self, id: NodeId, point: Vec3) -> GeometryResult<()> {
        self.authored(id, "curve_vertex requires a geometry or path shape", |node, limits| {
            node.raw.curve_vertex(
                point,
                &node.attributes,
                limits.curve_detail,
                limits.curve_tightness,
            )
        })
    }

    /// Start a new contour (a hole, for paths) at the next vertex.
    pub fn break_contour(&mut self, id: NodeId) -> GeometryResult<()> {
        self.authored(id, "break_contour requires a geometry or path shape", |node, _| {
            node.raw.break_contour();
            Ok(())
        })
    }

    /// Normal for subsequent vertices. Disables computed normals for the shape.
    pub fn set_normal(&mut self, id: NodeId, normal: Vec3) -> GeometryResult<()> {
        let node = self.authored_mut(id, "normal requires a geometry or path shape")?;
        node.attributes.normal = normal;
        node.raw.set_explicit_normals(true);
        Ok(())
    }

    pub fn set_texcoord(&mut self, id: NodeId, texcoord: Vec2) -> GeometryResult<()> {
        let node = self.authored_mut(id, "texcoord requires a geometry or path shape")?;
        node.attributes.texcoord = texcoord;
        Ok(())
    }

    /// Replace the fill/stroke switches, cap or winding of a subtree.
    pub fn set_style(&mut self, id: NodeId, style: TessStyle) -> GeometryResult<()> {
        for leaf in self.leaves_of(id)? {
            if let Some(node) = self.nodes.get_mut(&leaf) {
                node.style = style;
            }
            self.mark_stale(leaf, Stale::TESSELLATION);
        }
        Ok(())
    }

    // ====================
    // Style
    // ====================

    /// Recolor the fill of every leaf below `id`.
    pub fn set_fill(&mut self, id: NodeId, color: Color) -> GeometryResult<()> {
        for leaf in self.leaves_of(id)? {
            self.recolor_fill(leaf, color);
        }
        Ok(())
    }

    /// Tint textured leaves below `id`. Untextured leaves keep their fill.
    pub fn set_tint(&mut self, id: NodeId, color: Color) -> GeometryResult<()> {
        for leaf in self.leaves_of(id)? {
            if self.nodes.get(&leaf).is_some_and(|node| node.texture.is_some()) {
                self.recolor_fill(leaf, color);
            }
        }
        Ok(())
    }

    pub fn set_stroke(&mut self, id: NodeId, color: Color) -> GeometryResult<()> {
        for leaf in self.leaves_of(id)? {
            let Some(node) = self.nodes.get_mut(&leaf) else {
                continue;
            };
            node.attributes.stroke = color;
            for v in node.raw.vertices_mut() {
                v.attributes.stroke = color;
            }
            node.tess.recolor_line(color);
            node.tess.recolor_point(color);
            self.sync_leaf(leaf, &[Channel::LineColor, Channel::PointColor]);
        }
        Ok(())
    }

    /// Stroke weight changes the point and line geometry, so the leaves are
    /// tessellated again.
    pub fn set_stroke_weight(&mut self, id: NodeId, weight: f32) -> GeometryResult<()> {
        for leaf in self.leaves_of(id)? {
            let Some(node) = self.nodes.get_mut(&leaf) else {
                continue;
            };
            node.attributes.stroke_weight = weight;
            node.style.stroke_weight = weight;
            for v in node.raw.vertices_mut() {
                v.attributes.stroke_weight = weight;
            }
            self.mark_stale(leaf, Stale::TESSELLATION);
        }
        Ok(())
    }

    fn recolor_fill(&mut self, leaf: NodeId, color: Color) {
        let Some(node) = self.nodes.get_mut(&leaf) else {
            return;
        };
        node.attributes.fill = color;
        for v in node.raw.vertices_mut() {
            v.attributes.fill = color;
        }
        node.tess.recolor_fill(color);
        self.sync_leaf(leaf, &[Channel::FillColor]);
    }

    // ====================
    // Transforms
    // ====================

    pub fn translate(&mut self, id: NodeId, offset: Vec3) -> GeometryResult<()> {
        self.apply_transform(id, Affine3A::from_translation(offset))
    }

    pub fn rotate(&mut self, id: NodeId, rotation: Quat) -> GeometryResult<()> {
        self.apply_transform(id, Affine3A::from_quat(rotation))
    }

    pub fn scale(&mut self, id: NodeId, scale: Vec3) -> GeometryResult<()> {
        self.apply_transform(id, Affine3A::from_scale(scale))
    }

    /// Pre-multiply `transform` onto a node.
    ///
    /// A leaf's tessellated data is transformed in place; a group keeps the
    /// matrix and applies it when drawing.
    pub fn apply_transform(&mut self, id: NodeId, transform: Affine3A) -> GeometryResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(GeometryError::NodeNotFound(id.0))?;
        let combined = transform * node.transform.unwrap_or(Affine3A::IDENTITY);
        node.transform = Some(combined);
        if node.is_group() {
            return Ok(());
        }

        node.tess.apply_transform(&transform);
        self.sync_leaf(
            id,
            &[
                Channel::FillPosition,
                Channel::FillNormal,
                Channel::LinePosition,
                Channel::LineDirWidth,
                Channel::PointPosition,
            ],
        );
        Ok(())
    }

    /// Move a node so that the center of its bounds lands on `point`.
    ///
    /// Bounds come from the last [`prepare`](Self::prepare) and are taken in
    /// the parent's space. A node without geometry is left alone.
    pub fn center(&mut self, id: NodeId, point: Vec3) -> GeometryResult<()> {
        let Some((min, max)) = self.bounds(id)? else {
            return Ok(());
        };
        let offset = point - (min + max) * 0.5;
        if offset == Vec3::ZERO {
            return Ok(());
        }
        self.translate(id, offset)
    }

    /// Bounds of a node in its parent's space.
    ///
    /// Leaf transforms are already baked into `tess`; a group's own transform
    /// is applied to the union of its children.
    pub fn bounds(&self, id: NodeId) -> GeometryResult<Option<(Vec3, Vec3)>> {
        let node = self.nodes.get(&id).ok_or(GeometryError::NodeNotFound(id.0))?;
        if !node.is_group() {
            return Ok(node.tess.bounds());
        }

        let mut union: Option<(Vec3, Vec3)> = None;
        for &child in &node.children {
            if let Some((min, max)) = self.bounds(child)? {
                union = Some(match union {
                    Some((lo, hi)) => (lo.min(min), hi.max(max)),
                    None => (min, max),
                });
            }
        }
        Ok(match (union, node.transform) {
            (Some((min, max)), Some(transform)) => {
                let corners = (0..8).map(|i| {
                    let pick = |bit: usize, lo: f32, hi: f32| if i & bit == 0 { lo } else { hi };
                    transform.transform_point3(Vec3::new(
                        pick(1, min.x, max.x),
                        pick(2, min.y, max.y),
                        pick(4, min.z, max.z),
                    ))
                });
                corners.fold(None, |acc: Option<(Vec3, Vec3)>, p| match acc {
                    Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
                    None => Some((p, p)),
                })
            }
            (union, _) => union,
        })
    }

    /// Clear a node's transform. A leaf is tessellated again without it.
    pub fn reset_transform(&mut self, id: NodeId) -> GeometryResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(GeometryError::NodeNotFound(id.0))?;
        if node.transform.take().is_some() && !node.is_group() {
            self.mark_stale(id, Stale::TESSELLATION);
        }
        Ok(())
    }

    /// Copy `channels` of an already-aggregated leaf into the root buffers
    /// and record the changed bytes.
    fn sync_leaf(&mut self, id: NodeId, channels: &[Channel]) {
        if !self.aggregated {
            return;
        }
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        // Stale leaves are rewritten wholesale by the next prepare.
        if !node.stale.is_empty() {
            return;
        }

        node.tess.copy_into(&mut self.geometry);
        for &channel in channels {
            let range = node.tess.range(channel.pass());
            if range.is_empty() {
                continue;
            }
            let elements = range.first_vertex as usize..(range.first_vertex + range.vertex_count) as usize;
            let bytes = self.geometry.vertex_bytes(channel, elements);
            let offset = range.first_vertex as u64 * channel.stride() as u64;
            self.dirty.record(channel, offset, bytes);
        }
    }

    // ====================
    // Textures
    // ====================

    /// Texture every leaf below `id`.
    pub fn set_texture(&mut self, id: NodeId, texture: Option<TextureHandle>) -> GeometryResult<()> {
        for leaf in self.leaves_of(id)? {
            if let Some(node) = self.nodes.get_mut(&leaf) {
                node.texture = texture;
            }
        }
        self.runs_dirty = true;
        Ok(())
    }

    /// Assign one texture per child of `group`, in order.
    ///
    /// A count mismatch leaves every child untextured.
    pub fn set_textures(&mut self, group: NodeId, textures: &[TextureHandle]) -> GeometryResult<()> {
        let node = self.nodes.get(&group).ok_or(GeometryError::NodeNotFound(group.0))?;
        if !node.is_group() {
            return Err(precondition("set_textures requires a group"));
        }
        let children = node.children.clone();
        if children.len() != textures.len() {
            tracing::warn!(
                "Group has {} children but {} textures were given; ignoring textures",
                children.len(),
                textures.len()
            );
            for child in children {
                self.set_texture(child, None)?;
            }
            return Ok(());
        }
        for (child, texture) in children.into_iter().zip(textures) {
            self.set_texture(child, Some(*texture))?;
        }
        Ok(())
    }

    /// Distinct textures used below `id`, sorted.
    pub fn textures(&self, id: NodeId) -> Vec<TextureHandle> {
        let mut set = BTreeSet::new();
        self.collect_textures(id, &mut set);
        set.into_iter().collect()
    }

    fn collect_textures(&self, id: NodeId, set: &mut BTreeSet<TextureHandle>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if let Some(texture) = node.texture {
            set.insert(texture);
        }
        for &child in &node.children {
            self.collect_textures(child, set);
        }
    }

    // ====================
    // Frame
    // ====================

    /// Re-tessellate stale leaves and aggregate the tree if anything changed.
    ///
    /// Leaves that overflow the limits are emptied and reported instead of
    /// failing the frame.
    pub fn prepare(&mut self, ctx: &mut GeometryContext) -> AggregateStats {
        profile_function!();
        let mut stats = AggregateStats::default();

        if !self.is_stale() {
            if std::mem::take(&mut self.runs_dirty) {
                self.rebuild_runs();
            }
            return stats;
        }

        let reachable = self.subtree(self.root);
        for &id in &reachable {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            if node.is_group() || !node.stale.contains(Stale::TESSELLATION) {
                continue;
            }
            stats.retessellated += 1;
            if let Err(err) = node.retessellate(&mut ctx.tessellator, &self.limits) {
                tracing::error!("Dropping shape {:?}: {}", id, err);
                node.tess.clear();
                stats.aborted.push(id);
            }
        }

        self.dirty.clear();
        let mut counters = PassCounters::default();
        aggregate::aggregate(&mut self.nodes, self.root, &mut counters);
        self.geometry.resize_to(&counters);
        aggregate::copy_to_root(&self.nodes, self.root, &mut self.geometry);
        self.rebuild_runs();
        self.runs_dirty = false;

        for id in reachable {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.stale = Stale::empty();
            }
        }
        self.aggregated = true;
        self.upload_pending = true;

        tracing::debug!(
            "Aggregated shape tree: {} fill, {} line, {} point vertices",
            counters.vertices[0],
            counters.vertices[1],
            counters.vertices[2]
        );
        stats.totals = counters;
        stats.aggregated = true;
        stats
    }

    /// Upload pending changes and submit the draws for the whole tree.
    pub fn draw(&mut self, ctx: &GeometryContext, render: &dyn RenderContext) {
        profile_function!();

        if self.upload_pending {
            self.gpu.upload(render, &self.geometry, &ctx.deletions);
            self.dirty.clear();
            self.upload_pending = false;
        } else if !self.dirty.is_empty() {
            for span in self.dirty.flush() {
                self.gpu.write_span(render, &span);
            }
        }

        self.draw_node(self.root, None, render);
    }

    /// Release the root buffers through the context's deletion queue.
    pub fn release(&mut self, ctx: &GeometryContext) {
        self.gpu.release(&ctx.deletions);
        self.upload_pending = self.aggregated;
    }

    fn draw_node(&self, id: NodeId, parent: Option<Affine3A>, render: &dyn RenderContext) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.is_group() {
            self.draw_ranges(&node.tess, parent, render);
            return;
        }

        let transform = match (parent, node.transform) {
            (Some(parent), Some(own)) => Some(parent * own),
            (parent, own) => parent.or(own),
        };
        if self.has_group_transform(id) || self.textures(id).len() > 1 {
            for &child in &node.children {
                self.draw_node(child, transform, render);
            }
        } else {
            self.draw_ranges(&node.tess, transform, render);
        }
    }

    /// One draw per texture run overlapping the fill range, then one each
    /// for lines and points.
    fn draw_ranges(&self, tess: &TessGeometry, transform: Option<Affine3A>, render: &dyn RenderContext) {
        let model = transform.map(Mat4::from);

        let fill = tess.range(PrimitivePass::Fill);
        if fill.index_count > 0 {
            let range = fill.index_range();
            for run in self.runs.runs() {
                let start = run.first_index.max(range.start);
                let end = (run.last_index + 1).min(range.end);
                if start < end {
                    render.draw_indexed(DrawCall::new(PrimitivePass::Fill, start..end, run.texture).with_transform(model));
                }
            }
        }
        for pass in [PrimitivePass::Line, PrimitivePass::Point] {
            let range = tess.range(pass);
            if range.index_count > 0 {
                render.draw_indexed(DrawCall::new(pass, range.index_range(), None).with_transform(model));
            }
        }
    }

    fn has_group_transform(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|node| {
            node.is_group()
                && (node.transform.is_some() || node.children.iter().any(|&c| self.has_group_transform(c)))
        })
    }

    fn rebuild_runs(&mut self) {
        self.runs.clear();
        for id in self.subtree(self.root) {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if node.is_group() {
                continue;
            }
            let fill = node.tess.range(PrimitivePass::Fill);
            if fill.index_count > 0 {
                self.runs.extend_or_start(node.texture, fill.first_index + fill.index_count);
            }
        }
    }

    /// `id` and every node below it, pre-order.
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn leaves_of(&self, id: NodeId) -> GeometryResult<Vec<NodeId>> {
        if !self.nodes.contains_key(&id) {
            return Err(GeometryError::NodeNotFound(id.0));
        }
        Ok(self
            .subtree(id)
            .into_iter()
            .filter(|leaf| self.nodes.get(leaf).is_some_and(|node| !node.is_group()))
            .collect())
    }
}

fn precondition(msg: &'static str) -> GeometryError {
    tracing::warn!("{}", msg);
    GeometryError::Precondition(msg)
}
