//! Math utilities and types
//!
//! Provides the math types shared by the parameter model and the scene
//! boundary: nalgebra aliases, an RGBA colour, and the oriented placement
//! frame that generation parameters and sub-placements carry.

pub use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Squared length below which a frame axis is treated as collapsed.
const AXIS_EPSILON_SQ: f32 = 1.0e-12;

/// RGBA colour with floating point channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colour {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel
    pub a: f32,
}

impl Colour {
    /// Opaque white
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    /// Opaque black
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

    /// Create a colour from all four channels
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque colour from RGB channels
    pub fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Channels as an array, in RGBA order
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Oriented placement frame
///
/// A frame is an origin, a per-axis size, and three axis directions. It is
/// the spatial currency of the generation boundary: procedures receive
/// their placement as a frame and sub-placements carry one in their
/// parameters. Axes are stored explicitly rather than as a rotation so
/// that sheared or mirrored placements survive a round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Frame origin in parent space
    pub origin: Vec3,
    /// Extent along each local axis
    pub size: Vec3,
    /// Local axis directions, X/Y/Z order
    pub axes: [Vec3; 3],
}

impl Frame {
    /// Unit frame: origin at zero, unit size, basis axes
    pub fn unit() -> Self {
        Self::default()
    }

    /// Create an axis-aligned frame from origin and size
    pub fn new(origin: Vec3, size: Vec3) -> Self {
        Self {
            origin,
            size,
            ..Default::default()
        }
    }

    /// Create a frame with explicit axes
    pub fn with_axes(origin: Vec3, size: Vec3, axes: [Vec3; 3]) -> Self {
        Self { origin, size, axes }
    }

    /// True if any axis has collapsed to (near) zero length
    pub fn is_degenerate(&self) -> bool {
        self.axes
            .iter()
            .any(|axis| axis.norm_squared() < AXIS_EPSILON_SQ)
    }

    /// Replace collapsed axes with the matching world basis axis
    ///
    /// Returns `true` if any axis was replaced. Persisted frames sometimes
    /// arrive with zeroed axes; repairing per-axis keeps the valid ones.
    pub fn repair_axes(&mut self) -> bool {
        let mut repaired = false;
        for (index, axis) in self.axes.iter_mut().enumerate() {
            if axis.norm_squared() < AXIS_EPSILON_SQ {
                *axis = basis_axis(index);
                repaired = true;
            }
        }
        repaired
    }

    /// Convert to a placement matrix
    ///
    /// Columns are the axes scaled by the matching size component, with the
    /// origin as translation.
    pub fn to_matrix(&self) -> Mat4 {
        let x = self.axes[0] * self.size.x;
        let y = self.axes[1] * self.size.y;
        let z = self.axes[2] * self.size.z;
        let o = self.origin;
        Mat4::new(
            x.x, y.x, z.x, o.x,
            x.y, y.y, z.y, o.y,
            x.z, y.z, z.z, o.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            size: Vec3::new(1.0, 1.0, 1.0),
            axes: [basis_axis(0), basis_axis(1), basis_axis(2)],
        }
    }
}

fn basis_axis(index: usize) -> Vec3 {
    match index {
        0 => Vec3::new(1.0, 0.0, 0.0),
        1 => Vec3::new(0.0, 1.0, 0.0),
        _ => Vec3::new(0.0, 0.0, 1.0),
    }
}
