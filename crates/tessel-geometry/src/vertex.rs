//! Vertex channels and their GPU layouts.
//!
//! Each pass stores its attributes as separate arrays (one buffer per
//! channel), so a recolor only touches the color buffer.

use crate::Color;
use static_assertions::const_assert_eq;
use tessel_test_utils::PrimitivePass;

const_assert_eq!(std::mem::size_of::<Color>(), 4);
const_assert_eq!(std::mem::size_of::<[f32; 4]>(), 16);

/// One attribute (or index) array of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    FillPosition,
    FillColor,
    FillNormal,
    FillTexcoord,
    FillAmbient,
    FillSpecular,
    FillEmissive,
    FillShininess,
    FillIndex,
    LinePosition,
    LineColor,
    /// Other endpoint position plus signed half stroke width.
    LineDirWidth,
    LineIndex,
    PointPosition,
    PointColor,
    /// Screen-space displacement from the point center.
    PointOffset,
    PointIndex,
}

impl Channel {
    pub const ALL: [Channel; 17] = [
        Channel::FillPosition,
        Channel::FillColor,
        Channel::FillNormal,
        Channel::FillTexcoord,
        Channel::FillAmbient,
        Channel::FillSpecular,
        Channel::FillEmissive,
        Channel::FillShininess,
        Channel::FillIndex,
        Channel::LinePosition,
        Channel::LineColor,
        Channel::LineDirWidth,
        Channel::LineIndex,
        Channel::PointPosition,
        Channel::PointColor,
        Channel::PointOffset,
        Channel::PointIndex,
    ];

    pub fn pass(self) -> PrimitivePass {
        match self {
            Channel::FillPosition
            | Channel::FillColor
            | Channel::FillNormal
            | Channel::FillTexcoord
            | Channel::FillAmbient
            | Channel::FillSpecular
            | Channel::FillEmissive
            | Channel::FillShininess
            | Channel::FillIndex => PrimitivePass::Fill,
            Channel::LinePosition | Channel::LineColor | Channel::LineDirWidth | Channel::LineIndex => {
                PrimitivePass::Line
            }
            Channel::PointPosition | Channel::PointColor | Channel::PointOffset | Channel::PointIndex => {
                PrimitivePass::Point
            }
        }
    }

    /// The index channel of `pass`.
    pub fn index_of(pass: PrimitivePass) -> Channel {
        match pass {
            PrimitivePass::Fill => Channel::FillIndex,
            PrimitivePass::Line => Channel::LineIndex,
            PrimitivePass::Point => Channel::PointIndex,
        }
    }

    pub fn is_index(self) -> bool {
        matches!(self, Channel::FillIndex | Channel::LineIndex | Channel::PointIndex)
    }

    /// Size in bytes of one element.
    pub fn stride(self) -> usize {
        match self {
            Channel::FillPosition | Channel::FillNormal | Channel::LinePosition | Channel::PointPosition => 12,
            Channel::FillTexcoord | Channel::PointOffset => 8,
            Channel::LineDirWidth => 16,
            Channel::FillColor
            | Channel::FillAmbient
            | Channel::FillSpecular
            | Channel::FillEmissive
            | Channel::LineColor
            | Channel::PointColor => std::mem::size_of::<Color>(),
            Channel::FillShininess => 4,
            Channel::FillIndex | Channel::LineIndex | Channel::PointIndex => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::FillPosition => "fill positions",
            Channel::FillColor => "fill colors",
            Channel::FillNormal => "fill normals",
            Channel::FillTexcoord => "fill texcoords",
            Channel::FillAmbient => "fill ambient",
            Channel::FillSpecular => "fill specular",
            Channel::FillEmissive => "fill emissive",
            Channel::FillShininess => "fill shininess",
            Channel::FillIndex => "fill indices",
            Channel::LinePosition => "line positions",
            Channel::LineColor => "line colors",
            Channel::LineDirWidth => "line directions",
            Channel::LineIndex => "line indices",
            Channel::PointPosition => "point positions",
            Channel::PointColor => "point colors",
            Channel::PointOffset => "point offsets",
            Channel::PointIndex => "point indices",
        }
    }

    pub fn usage(self) -> wgpu::BufferUsages {
        if self.is_index() {
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST
        } else {
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST
        }
    }

    /// Layout of this channel's vertex buffer. `None` for index channels.
    pub fn vertex_layout(self) -> Option<wgpu::VertexBufferLayout<'static>> {
        const FILL_POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        const FILL_COLOR: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Unorm8x4];
        const FILL_NORMAL: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];
        const FILL_TEXCOORD: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x2];
        const FILL_AMBIENT: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![4 => Unorm8x4];
        const FILL_SPECULAR: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![5 => Unorm8x4];
        const FILL_EMISSIVE: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![6 => Unorm8x4];
        const FILL_SHININESS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![7 => Float32];
        const LINE_POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        const LINE_COLOR: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Unorm8x4];
        const LINE_DIR_WIDTH: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x4];
        const POINT_POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        const POINT_COLOR: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Unorm8x4];
        const POINT_OFFSET: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];

        let attributes: &'static [wgpu::VertexAttribute] = match self {
            Channel::FillPosition => &FILL_POSITION,
            Channel::FillColor => &FILL_COLOR,
            Channel::FillNormal => &FILL_NORMAL,
            Channel::FillTexcoord => &FILL_TEXCOORD,
            Channel::FillAmbient => &FILL_AMBIENT,
            Channel::FillSpecular => &FILL_SPECULAR,
            Channel::FillEmissive => &FILL_EMISSIVE,
            Channel::FillShininess => &FILL_SHININESS,
            Channel::LinePosition => &LINE_POSITION,
            Channel::LineColor => &LINE_COLOR,
            Channel::LineDirWidth => &LINE_DIR_WIDTH,
            Channel::PointPosition => &POINT_POSITION,
            Channel::PointColor => &POINT_COLOR,
            Channel::PointOffset => &POINT_OFFSET,
            Channel::FillIndex | Channel::LineIndex | Channel::PointIndex => return None,
        };

        Some(wgpu::VertexBufferLayout {
            array_stride: self.stride() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        })
    }
}

/// Vertex buffer layouts of `pass`, in channel order (one buffer slot each).
pub fn pass_layouts(pass: PrimitivePass) -> Vec<wgpu::VertexBufferLayout<'static>> {
    Channel::ALL
        .iter()
        .filter(|channel| channel.pass() == pass)
        .filter_map(|channel| channel.vertex_layout())
        .collect()
}
