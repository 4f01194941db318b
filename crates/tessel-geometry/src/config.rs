//! Capacity limits and curve/primitive detail settings.

/// Hard ceilings and detail levels used by tessellation.
///
/// These are consumed from the host renderer and scoped to one
/// [`GeometryContext`](crate::GeometryContext).
///
/// ```
/// use tessel_geometry::GeometryLimits;
///
/// let limits = GeometryLimits::default()
///     .with_max_vertices(1024)
///     .with_bezier_detail(8);
/// assert_eq!(limits.max_indices, 3 * 131_072);
/// assert_eq!(limits.bezier_detail, 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryLimits {
    /// Maximum vertices per pass buffer.
    pub max_vertices: usize,
    /// Maximum indices per pass buffer.
    pub max_indices: usize,
    /// Lower bound on segments for round points and ellipses.
    pub min_accuracy: usize,
    /// Segments emitted per bezier (and quadratic) vertex.
    pub bezier_detail: usize,
    /// Segments emitted per Catmull-Rom curve span.
    pub curve_detail: usize,
    /// Catmull-Rom tightness; 0 is a standard Catmull-Rom spline.
    pub curve_tightness: f32,
    /// Longitude and latitude segments of generated spheres.
    pub sphere_detail: (usize, usize),
    /// Curve flattening tolerance handed to lyon.
    pub tolerance: f32,
}

impl Default for GeometryLimits {
    fn default() -> Self {
        Self {
            max_vertices: 131_072,
            max_indices: 3 * 131_072,
            min_accuracy: 6,
            bezier_detail: 20,
            curve_detail: 20,
            curve_tightness: 0.0,
            sphere_detail: (30, 30),
            tolerance: 0.1,
        }
    }
}

impl GeometryLimits {
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices;
        self
    }

    pub fn with_max_indices(mut self, max_indices: usize) -> Self {
        self.max_indices = max_indices;
        self
    }

    pub fn with_min_accuracy(mut self, min_accuracy: usize) -> Self {
        self.min_accuracy = min_accuracy.max(3);
        self
    }

    pub fn with_bezier_detail(mut self, detail: usize) -> Self {
        self.bezier_detail = detail.max(1);
        self
    }

    pub fn with_curve_detail(mut self, detail: usize) -> Self {
        self.curve_detail = detail.max(1);
        self
    }

    pub fn with_curve_tightness(mut self, tightness: f32) -> Self {
        self.curve_tightness = tightness;
        self
    }

    pub fn with_sphere_detail(mut self, u: usize, v: usize) -> Self {
        self.sphere_detail = (u.max(3), v.max(2));
        self
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }
}
