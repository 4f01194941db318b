//! Packed RGBA8 colors.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// An RGBA color packed into 8 bits per channel.
///
/// Byte order in memory is `r, g, b, a`, which matches
/// `wgpu::VertexFormat::Unorm8x4` so color channels upload as-is.
///
/// ```
/// use tessel_geometry::Color;
///
/// let red = Color::rgb(1.0, 0.0, 0.0);
/// assert_eq!(red.to_rgba_u8(), [255, 0, 0, 255]);
/// assert_eq!(Color::from_hex(0xFF8800).to_rgba_u8(), [255, 136, 0, 255]);
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color(u32);

impl Color {
    pub const WHITE: Color = Color::from_rgba_u8(255, 255, 255, 255);
    pub const BLACK: Color = Color::from_rgba_u8(0, 0, 0, 255);
    pub const RED: Color = Color::from_rgba_u8(255, 0, 0, 255);
    pub const GREEN: Color = Color::from_rgba_u8(0, 255, 0, 255);
    pub const BLUE: Color = Color::from_rgba_u8(0, 0, 255, 255);
    pub const TRANSPARENT: Color = Color::from_rgba_u8(0, 0, 0, 0);

    pub const fn from_rgba_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_le_bytes([r, g, b, a]))
    }

    /// Create a color from float components; values are clamped to `0.0..=1.0`.
    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::from_vec4(Vec4::new(r, g, b, a))
    }

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Create an opaque color from a 24-bit RGB hex value (e.g. `0xFF8800`).
    pub const fn from_hex(hex: u32) -> Self {
        Self::from_rgba_u8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255)
    }

    /// Create a color from normalized components, clamping out-of-range values.
    pub fn from_vec4(v: Vec4) -> Self {
        let c = (v.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
        Self::from_rgba_u8(c.x as u8, c.y as u8, c.z as u8, c.w as u8)
    }

    pub const fn to_rgba_u8(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Normalized components, used when blending attributes.
    pub fn to_vec4(self) -> Vec4 {
        let [r, g, b, a] = self.to_rgba_u8();
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }

    /// Component-wise product, as used for tinting.
    pub fn multiply(self, other: Color) -> Color {
        Color::from_vec4(self.to_vec4() * other.to_vec4())
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
