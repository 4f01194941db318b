//! Tessellated geometry store.
//!
//! Three independent pass buffers (fill, line, point), each holding channel
//! arrays plus a `u32` index array. A pass also records the range it
//! occupies once placed inside an aggregate; the aggregator rewrites those
//! markers on every structural pass.

use crate::{Channel, Color, VertexAttributes};
use glam::{Affine3A, Mat3, Vec3};
use std::ops::Range;
use tessel_test_utils::PrimitivePass;

/// Range a pass occupies inside an aggregate.
///
/// `first_*` and `last_*` are inclusive and only meaningful while the
/// matching count is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassRange {
    pub first_vertex: u32,
    pub last_vertex: u32,
    pub vertex_count: u32,
    pub first_index: u32,
    pub last_index: u32,
    pub index_count: u32,
}

impl PassRange {
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    pub fn vertex_range(&self) -> Range<u32> {
        self.first_vertex..self.first_vertex + self.vertex_count
    }

    pub fn index_range(&self) -> Range<u32> {
        self.first_index..self.first_index + self.index_count
    }

    /// Add another range's counts into this one.
    pub fn add_counts(&mut self, other: &PassRange) {
        self.vertex_count += other.vertex_count;
        self.index_count += other.index_count;
    }

    /// Copy the start markers from `other`.
    pub fn set_first(&mut self, other: &PassRange) {
        self.first_vertex = other.first_vertex;
        self.first_index = other.first_index;
    }

    /// Copy the end markers from `other`.
    pub fn set_last(&mut self, other: &PassRange) {
        self.last_vertex = other.last_vertex;
        self.last_index = other.last_index;
    }
}

/// Per-pass attribute arrays stored side by side.
pub trait VertexChannels: Default + Clone + std::fmt::Debug {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reserve(&mut self, additional: usize);

    /// Grow or shrink every channel to `len`, zero-filling new elements.
    fn resize(&mut self, len: usize);

    fn clear(&mut self);

    fn shrink_to_fit(&mut self);

    /// Overwrite `offset..offset + src.len()` with the contents of `src`.
    fn write_at(&mut self, offset: usize, src: &Self);

    /// Apply an affine transform to the position-like channels of `range`.
    fn transform(&mut self, range: Range<usize>, transform: &Affine3A, normal_matrix: &Mat3);

    fn recolor(&mut self, range: Range<usize>, color: Color);

    fn positions(&self) -> &[[f32; 3]];

    /// Raw bytes of `channel` over `range`; empty for channels of other passes.
    fn bytes(&self, channel: Channel, range: Range<usize>) -> &[u8];
}

fn transform_point(transform: &Affine3A, p: [f32; 3]) -> [f32; 3] {
    transform.transform_point3(Vec3::from(p)).to_array()
}

/// Fill pass channels.
#[derive(Debug, Clone, Default)]
pub struct FillChannels {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<Color>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub ambient: Vec<Color>,
    pub specular: Vec<Color>,
    pub emissive: Vec<Color>,
    pub shininess: Vec<f32>,
}

impl VertexChannels for FillChannels {
    fn len(&self) -> usize {
        self.positions.len()
    }

    fn reserve(&mut self, additional: usize) {
        self.positions.reserve(additional);
        self.colors.reserve(additional);
        self.normals.reserve(additional);
        self.texcoords.reserve(additional);
        self.ambient.reserve(additional);
        self.specular.reserve(additional);
        self.emissive.reserve(additional);
        self.shininess.reserve(additional);
    }

    fn resize(&mut self, len: usize) {
        self.positions.resize(len, [0.0; 3]);
        self.colors.resize(len, Color::TRANSPARENT);
        self.normals.resize(len, [0.0; 3]);
        self.texcoords.resize(len, [0.0; 2]);
        self.ambient.resize(len, Color::TRANSPARENT);
        self.specular.resize(len, Color::TRANSPARENT);
        self.emissive.resize(len, Color::TRANSPARENT);
        self.shininess.resize(len, 0.0);
    }

    fn clear(&mut self) {
        self.resize(0);
    }

    fn shrink_to_fit(&mut self) {
        self.positions.shrink_to_fit();
        self.colors.shrink_to_fit();
        self.normals.shrink_to_fit();
        self.texcoords.shrink_to_fit();
        self.ambient.shrink_to_fit();
        self.specular.shrink_to_fit();
        self.emissive.shrink_to_fit();
        self.shininess.shrink_to_fit();
    }

    fn write_at(&mut self, offset: usize, src: &Self) {
        let range = offset..offset + src.len();
        self.positions[range.clone()].copy_from_slice(&src.positions);
        self.colors[range.clone()].copy_from_slice(&src.colors);
        self.normals[range.clone()].copy_from_slice(&src.normals);
        self.texcoords[range.clone()].copy_from_slice(&src.texcoords);
        self.ambient[range.clone()].copy_from_slice(&src.ambient);
        self.specular[range.clone()].copy_from_slice(&src.specular);
        self.emissive[range.clone()].copy_from_slice(&src.emissive);
        self.shininess[range].copy_from_slice(&src.shininess);
    }

    fn transform(&mut self, range: Range<usize>, transform: &Affine3A, normal_matrix: &Mat3) {
        for p in &mut self.positions[range.clone()] {
            *p = transform_point(transform, *p);
        }
        for n in &mut self.normals[range] {
            *n = (*normal_matrix * Vec3::from(*n)).normalize_or_zero().to_array();
        }
    }

    fn recolor(&mut self, range: Range<usize>, color: Color) {
        self.colors[range].fill(color);
    }

    fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    fn bytes(&self, channel: Channel, range: Range<usize>) -> &[u8] {
        match channel {
            Channel::FillPosition => bytemuck::cast_slice(&self.positions[range]),
            Channel::FillColor => bytemuck::cast_slice(&self.colors[range]),
            Channel::FillNormal => bytemuck::cast_slice(&self.normals[range]),
            Channel::FillTexcoord => bytemuck::cast_slice(&self.texcoords[range]),
            Channel::FillAmbient => bytemuck::cast_slice(&self.ambient[range]),
            Channel::FillSpecular => bytemuck::cast_slice(&self.specular[range]),
            Channel::FillEmissive => bytemuck::cast_slice(&self.emissive[range]),
            Channel::FillShininess => bytemuck::cast_slice(&self.shininess[range]),
            _ => &[],
        }
    }
}

/// Line pass channels.
#[derive(Debug, Clone, Default)]
pub struct LineChannels {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<Color>,
    /// Other endpoint (xyz) and signed half stroke width (w).
    pub dir_widths: Vec<[f32; 4]>,
}

impl VertexChannels for LineChannels {
    fn len(&self) -> usize {
        self.positions.len()
    }

    fn reserve(&mut self, additional: usize) {
        self.positions.reserve(additional);
        self.colors.reserve(additional);
        self.dir_widths.reserve(additional);
    }

    fn resize(&mut self, len: usize) {
        self.positions.resize(len, [0.0; 3]);
        self.colors.resize(len, Color::TRANSPARENT);
        self.dir_widths.resize(len, [0.0; 4]);
    }

    fn clear(&mut self) {
        self.resize(0);
    }

    fn shrink_to_fit(&mut self) {
        self.positions.shrink_to_fit();
        self.colors.shrink_to_fit();
        self.dir_widths.shrink_to_fit();
    }

    fn write_at(&mut self, offset: usize, src: &Self) {
        let range = offset..offset + src.len();
        self.positions[range.clone()].copy_from_slice(&src.positions);
        self.colors[range.clone()].copy_from_slice(&src.colors);
        self.dir_widths[range].copy_from_slice(&src.dir_widths);
    }

    fn transform(&mut self, range: Range<usize>, transform: &Affine3A, _normal_matrix: &Mat3) {
        for p in &mut self.positions[range.clone()] {
            *p = transform_point(transform, *p);
        }
        for dw in &mut self.dir_widths[range] {
            let [x, y, z] = transform_point(transform, [dw[0], dw[1], dw[2]]);
            *dw = [x, y, z, dw[3]];
        }
    }

    fn recolor(&mut self, range: Range<usize>, color: Color) {
        self.colors[range].fill(color);
    }

    fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    fn bytes(&self, channel: Channel, range: Range<usize>) -> &[u8] {
        match channel {
            Channel::LinePosition => bytemuck::cast_slice(&self.positions[range]),
            Channel::LineColor => bytemuck::cast_slice(&self.colors[range]),
            Channel::LineDirWidth => bytemuck::cast_slice(&self.dir_widths[range]),
            _ => &[],
        }
    }
}

/// Point pass channels.
#[derive(Debug, Clone, Default)]
pub struct PointChannels {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<Color>,
    pub offsets: Vec<[f32; 2]>,
}

impl VertexChannels for PointChannels {
    fn len(&self) -> usize {
        self.positions.len()
    }

    fn reserve(&mut self, additional: usize) {
        self.positions.reserve(additional);
        self.colors.reserve(additional);
        self.offsets.reserve(additional);
    }

    fn resize(&mut self, len: usize) {
        self.positions.resize(len, [0.0; 3]);
        self.colors.resize(len, Color::TRANSPARENT);
        self.offsets.resize(len, [0.0; 2]);
    }

    fn clear(&mut self) {
        self.resize(0);
    }

    fn shrink_to_fit(&mut self) {
        self.positions.shrink_to_fit();
        self.colors.shrink_to_fit();
        self.offsets.shrink_to_fit();
    }

    fn write_at(&mut self, offset: usize, src: &Self) {
        let range = offset..offset + src.len();
        self.positions[range.clone()].copy_from_slice(&src.positions);
        self.colors[range.clone()].copy_from_slice(&src.colors);
        self.offsets[range].copy_from_slice(&src.offsets);
    }

    fn transform(&mut self, range: Range<usize>, transform: &Affine3A, _normal_matrix: &Mat3) {
        for p in &mut self.positions[range] {
            *p = transform_point(transform, *p);
        }
    }

    fn recolor(&mut self, range: Range<usize>, color: Color) {
        self.colors[range].fill(color);
    }

    fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    fn bytes(&self, channel: Channel, range: Range<usize>) -> &[u8] {
        match channel {
            Channel::PointPosition => bytemuck::cast_slice(&self.positions[range]),
            Channel::PointColor => bytemuck::cast_slice(&self.colors[range]),
            Channel::PointOffset => bytemuck::cast_slice(&self.offsets[range]),
            _ => &[],
        }
    }
}

/// Vertices and indices of one pass.
///
/// Indices are local (starting at 0) until the aggregator assigns this pass
/// a vertex offset; `applied_offset` tracks what has already been added so
/// repeated aggregation is idempotent.
#[derive(Debug, Clone, Default)]
pub struct PassBuffers<C> {
    pub vertices: C,
    pub indices: Vec<u32>,
    range: PassRange,
    applied_offset: u32,
}

pub type FillBuffers = PassBuffers<FillChannels>;
pub type LineBuffers = PassBuffers<LineChannels>;
pub type PointBuffers = PassBuffers<PointChannels>;

impl<C: VertexChannels> PassBuffers<C> {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn range(&self) -> &PassRange {
        &self.range
    }

    pub fn range_mut(&mut self) -> &mut PassRange {
        &mut self.range
    }

    pub fn reserve_vertices(&mut self, n: usize) {
        self.vertices.reserve(n);
    }

    pub fn reserve_indices(&mut self, n: usize) {
        self.indices.reserve(n);
    }

    /// Place this pass's vertices at `base` in the aggregate. Returns the
    /// next free vertex offset.
    pub fn assign_vertex_offset(&mut self, base: u32) -> u32 {
        let count = self.vertices.len() as u32;
        self.range.first_vertex = base;
        self.range.vertex_count = count;
        self.range.last_vertex = (base + count).saturating_sub(1);
        base + count
    }

    /// Place this pass's indices at `base` and renumber them to reference
    /// the vertex range assigned by [`assign_vertex_offset`](Self::assign_vertex_offset).
    /// Returns the next free index offset.
    pub fn assign_index_offset(&mut self, base: u32) -> u32 {
        let delta = self.range.first_vertex.wrapping_sub(self.applied_offset);
        if delta != 0 {
            for index in &mut self.indices {
                *index = index.wrapping_add(delta);
            }
        }
        self.applied_offset = self.range.first_vertex;

        let count = self.indices.len() as u32;
        self.range.first_index = base;
        self.range.index_count = count;
        self.range.last_index = (base + count).saturating_sub(1);
        base + count
    }

    /// Write this pass into `root` at the offsets assigned by the aggregator.
    pub fn copy_into(&self, root: &mut PassBuffers<C>) {
        root.vertices.write_at(self.range.first_vertex as usize, &self.vertices);
        let first = self.range.first_index as usize;
        root.indices[first..first + self.indices.len()].copy_from_slice(&self.indices);
    }

    /// Size this pass as an aggregate of `vertex_count` / `index_count`.
    pub fn resize(&mut self, vertex_count: usize, index_count: usize) {
        self.vertices.resize(vertex_count);
        self.indices.resize(index_count, 0);
        self.range = PassRange {
            first_vertex: 0,
            last_vertex: (vertex_count as u32).saturating_sub(1),
            vertex_count: vertex_count as u32,
            first_index: 0,
            last_index: (index_count as u32).saturating_sub(1),
            index_count: index_count as u32,
        };
    }

    pub fn shrink_to_fit(&mut self) {
        self.vertices.shrink_to_fit();
        self.indices.shrink_to_fit();
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.range = PassRange::default();
        self.applied_offset = 0;
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Next local vertex index. Appending is only valid before offsets apply.
    fn next_vertex(&self) -> u32 {
        debug_assert_eq!(self.applied_offset, 0, "appending to an offset pass");
        self.vertices.len() as u32
    }

    pub fn apply_transform(&mut self, transform: &Affine3A, normal_matrix: &Mat3) {
        let len = self.vertices.len();
        self.vertices.transform(0..len, transform, normal_matrix);
    }

    pub fn recolor(&mut self, color: Color) {
        let len = self.vertices.len();
        self.vertices.recolor(0..len, color);
    }

    /// Bytes of `channel`; the index channel is served from `indices`.
    pub fn channel_bytes(&self, channel: Channel) -> &[u8] {
        if channel.is_index() {
            bytemuck::cast_slice(&self.indices)
        } else {
            self.vertices.bytes(channel, 0..self.vertices.len())
        }
    }
}

impl FillBuffers {
    pub fn push_vertex(&mut self, position: Vec3, attributes: &VertexAttributes) -> u32 {
        let index = self.next_vertex();
        let v = &mut self.vertices;
        v.positions.push(position.to_array());
        v.colors.push(attributes.fill);
        v.normals.push(attributes.normal.to_array());
        v.texcoords.push(attributes.texcoord.to_array());
        v.ambient.push(attributes.material.ambient);
        v.specular.push(attributes.material.specular);
        v.emissive.push(attributes.material.emissive);
        v.shininess.push(attributes.material.shininess);
        index
    }
}

impl LineBuffers {
    pub fn push_vertex(&mut self, position: Vec3, color: Color, dir_width: [f32; 4]) -> u32 {
        let index = self.next_vertex();
        self.vertices.positions.push(position.to_array());
        self.vertices.colors.push(color);
        self.vertices.dir_widths.push(dir_width);
        index
    }
}

impl PointBuffers {
    pub fn push_vertex(&mut self, position: Vec3, color: Color, offset: [f32; 2]) -> u32 {
        let index = self.next_vertex();
        self.vertices.positions.push(position.to_array());
        self.vertices.colors.push(color);
        self.vertices.offsets.push(offset);
        index
    }
}

/// Running vertex/index offsets per pass, used while aggregating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounters {
    pub vertices: [u32; 3],
    pub indices: [u32; 3],
}

pub(crate) fn pass_slot(pass: PrimitivePass) -> usize {
    match pass {
        PrimitivePass::Fill => 0,
        PrimitivePass::Line => 1,
        PrimitivePass::Point => 2,
    }
}

/// The tessellated output of one shape (or the aggregate of a tree).
#[derive(Debug, Clone, Default)]
pub struct TessGeometry {
    pub fill: FillBuffers,
    pub line: LineBuffers,
    pub point: PointBuffers,
}

impl TessGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.fill.clear();
        self.line.clear();
        self.point.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fill.is_empty() && self.line.is_empty() && self.point.is_empty()
    }

    pub fn range(&self, pass: PrimitivePass) -> &PassRange {
        match pass {
            PrimitivePass::Fill => self.fill.range(),
            PrimitivePass::Line => self.line.range(),
            PrimitivePass::Point => self.point.range(),
        }
    }

    pub fn range_mut(&mut self, pass: PrimitivePass) -> &mut PassRange {
        match pass {
            PrimitivePass::Fill => self.fill.range_mut(),
            PrimitivePass::Line => self.line.range_mut(),
            PrimitivePass::Point => self.point.range_mut(),
        }
    }

    pub fn vertex_count(&self, pass: PrimitivePass) -> usize {
        match pass {
            PrimitivePass::Fill => self.fill.vertex_count(),
            PrimitivePass::Line => self.line.vertex_count(),
            PrimitivePass::Point => self.point.vertex_count(),
        }
    }

    pub fn index_count(&self, pass: PrimitivePass) -> usize {
        match pass {
            PrimitivePass::Fill => self.fill.index_count(),
            PrimitivePass::Line => self.line.index_count(),
            PrimitivePass::Point => self.point.index_count(),
        }
    }

    pub fn reset_ranges(&mut self) {
        for pass in PrimitivePass::ALL {
            *self.range_mut(pass) = PassRange::default();
        }
    }

    /// Add every pass's counts from `other` (a child) into this group range.
    pub fn add_counts(&mut self, other: &TessGeometry) {
        for pass in PrimitivePass::ALL {
            let child = *other.range(pass);
            self.range_mut(pass).add_counts(&child);
        }
    }

    /// Take start markers from `other` for passes that have none yet.
    ///
    /// Call before [`add_counts`](Self::add_counts) so that only the first
    /// non-empty child defines where a group starts.
    pub fn set_first(&mut self, other: &TessGeometry) {
        for pass in PrimitivePass::ALL {
            let child = *other.range(pass);
            let own = self.range_mut(pass);
            if !child.is_empty() && own.is_empty() {
                own.set_first(&child);
            }
        }
    }

    /// Take end markers from every non-empty pass of `other`.
    pub fn set_last(&mut self, other: &TessGeometry) {
        for pass in PrimitivePass::ALL {
            let child = *other.range(pass);
            if !child.is_empty() {
                self.range_mut(pass).set_last(&child);
            }
        }
    }

    /// Assign offsets for all passes from the running counters and advance them.
    pub fn assign_offsets(&mut self, counters: &mut PassCounters) {
        let slot = pass_slot(PrimitivePass::Fill);
        counters.vertices[slot] = self.fill.assign_vertex_offset(counters.vertices[slot]);
        counters.indices[slot] = self.fill.assign_index_offset(counters.indices[slot]);
        let slot = pass_slot(PrimitivePass::Line);
        counters.vertices[slot] = self.line.assign_vertex_offset(counters.vertices[slot]);
        counters.indices[slot] = self.line.assign_index_offset(counters.indices[slot]);
        let slot = pass_slot(PrimitivePass::Point);
        counters.vertices[slot] = self.point.assign_vertex_offset(counters.vertices[slot]);
        counters.indices[slot] = self.point.assign_index_offset(counters.indices[slot]);
    }

    /// Size every pass as an aggregate holding `counters` elements.
    pub fn resize_to(&mut self, counters: &PassCounters) {
        let (f, l, p) = (
            pass_slot(PrimitivePass::Fill),
            pass_slot(PrimitivePass::Line),
            pass_slot(PrimitivePass::Point),
        );
        self.fill.resize(counters.vertices[f] as usize, counters.indices[f] as usize);
        self.line.resize(counters.vertices[l] as usize, counters.indices[l] as usize);
        self.point.resize(counters.vertices[p] as usize, counters.indices[p] as usize);
    }

    /// Write every pass into `root` at the assigned offsets.
    pub fn copy_into(&self, root: &mut TessGeometry) {
        self.fill.copy_into(&mut root.fill);
        self.line.copy_into(&mut root.line);
        self.point.copy_into(&mut root.point);
    }

    pub fn shrink_to_fit(&mut self) {
        self.fill.shrink_to_fit();
        self.line.shrink_to_fit();
        self.point.shrink_to_fit();
    }

    /// Transform positions (and normals, and line endpoints) of every pass.
    pub fn apply_transform(&mut self, transform: &Affine3A) {
        let normal_matrix = tessel_core::math::normal_matrix(transform);
        self.fill.apply_transform(transform, &normal_matrix);
        self.line.apply_transform(transform, &normal_matrix);
        self.point.apply_transform(transform, &normal_matrix);
    }

    pub fn recolor_fill(&mut self, color: Color) {
        self.fill.recolor(color);
    }

    pub fn recolor_line(&mut self, color: Color) {
        self.line.recolor(color);
    }

    pub fn recolor_point(&mut self, color: Color) {
        self.point.recolor(color);
    }

    /// Bytes of any channel of any pass.
    pub fn channel_bytes(&self, channel: Channel) -> &[u8] {
        match channel.pass() {
            PrimitivePass::Fill => self.fill.channel_bytes(channel),
            PrimitivePass::Line => self.line.channel_bytes(channel),
            PrimitivePass::Point => self.point.channel_bytes(channel),
        }
    }

    /// Bytes of a vertex channel over `range` (in elements).
    pub fn vertex_bytes(&self, channel: Channel, range: Range<usize>) -> &[u8] {
        match channel.pass() {
            PrimitivePass::Fill => self.fill.vertices.bytes(channel, range),
            PrimitivePass::Line => self.line.vertices.bytes(channel, range),
            PrimitivePass::Point => self.point.vertices.bytes(channel, range),
        }
    }

    /// Axis-aligned bounds `(min, max)` of every stored position.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut positions = self
            .fill
            .vertices
            .positions()
            .iter()
            .chain(self.line.vertices.positions())
            .chain(self.point.vertices.positions())
            .map(|p| Vec3::from(*p));
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Midpoint of [`bounds`](Self::bounds).
    pub fn center(&self) -> Option<Vec3> {
        self.bounds().map(|(min, max)| (min + max) * 0.5)
    }
}
