//! Style state the tessellator consumes.

/// Cap style for stroke endpoints and points.
///
/// Points render as round fans for [`LineCap::Round`] and as square
/// billboards otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Flat cap ending at the endpoint.
    Butt,
    /// Round cap.
    #[default]
    Round,
    /// Square cap extending beyond the endpoint.
    Square,
}

/// Join style for stroke corners.
///
/// Ribbons are emitted per segment; corners are resolved by the line shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Fill/stroke switches and stroke geometry for one tessellation call.
///
/// ```
/// use tessel_geometry::{LineCap, TessStyle};
///
/// let style = TessStyle::default()
///     .with_stroke_weight(4.0)
///     .with_cap(LineCap::Square);
/// assert!(style.fill && style.stroke);
/// assert_eq!(style.half_weight(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessStyle {
    pub fill: bool,
    pub stroke: bool,
    pub stroke_weight: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    /// NONZERO winding when set, even-odd when contours model holes.
    pub solid: bool,
}

impl Default for TessStyle {
    fn default() -> Self {
        Self {
            fill: true,
            stroke: true,
            stroke_weight: 1.0,
            cap: LineCap::Round,
            join: LineJoin::Miter,
            solid: true,
        }
    }
}

impl TessStyle {
    pub fn with_fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_stroke(mut self, stroke: bool) -> Self {
        self.stroke = stroke;
        self
    }

    pub fn with_stroke_weight(mut self, weight: f32) -> Self {
        self.stroke_weight = weight;
        self
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    pub fn half_weight(&self) -> f32 {
        self.stroke_weight * 0.5
    }
}
