//! Edge geometry shared by the renderer and the particle system.
//!
//! Both must agree on the exact curve, otherwise particles drift off their
//! edges. Flow edges are straight segments; feedback edges are quadratic
//! Beziers bowed to one side of the chord.

use std::ops::{Add, Mul, Sub};

use super::types::EdgeKind;

/// Control-point offset for feedback edges, as a fraction of the chord length.
pub const FEEDBACK_CURVATURE: f64 = 0.25;

/// Below this length a vector has no usable direction.
const MIN_LENGTH: f64 = 1e-9;

/// A position or displacement in canvas units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// The origin.
	pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean length.
	pub fn length(self) -> f64 {
		(self.x * self.x + self.y * self.y).sqrt()
	}

	/// Distance to `other`.
	pub fn distance(self, other: Point) -> f64 {
		(other - self).length()
	}

	/// Linear interpolation: `t = 0` gives `self`, `t = 1` gives `other`.
	pub fn lerp(self, other: Point, t: f64) -> Point {
		self + (other - self) * t
	}

	/// The vector rotated by +90 degrees.
	pub fn perp(self) -> Point {
		Point::new(-self.y, self.x)
	}

	/// Unit vector in the same direction, or `None` for a (near) zero vector.
	pub fn normalized(self) -> Option<Point> {
		let len = self.length();
		(len > MIN_LENGTH).then(|| self * (1.0 / len))
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

/// Control point of the bowed curve from `from` to `to`: the chord midpoint
/// pushed sideways by `curvature` times the chord, rotated 90 degrees.
pub fn control_point(from: Point, to: Point, curvature: f64) -> Point {
	from.lerp(to, 0.5) + (to - from).perp() * curvature
}

/// The drawn shape of one edge for the current node positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgePath {
	/// Straight segment, used for flow edges.
	Line {
		/// Source node center.
		from: Point,
		/// Target node center.
		to: Point,
	},
	/// Quadratic Bezier, used for feedback edges.
	Quad {
		/// Source node center.
		from: Point,
		/// Control point, off to one side of the chord.
		ctrl: Point,
		/// Target node center.
		to: Point,
	},
}

impl EdgePath {
	/// Path for an edge of `kind`, using the default feedback curvature.
	pub fn new(kind: EdgeKind, from: Point, to: Point) -> Self {
		Self::with_curvature(kind, from, to, FEEDBACK_CURVATURE)
	}

	/// Path with an explicit bow. Flow edges ignore `curvature`.
	pub fn with_curvature(kind: EdgeKind, from: Point, to: Point, curvature: f64) -> Self {
		match kind {
			EdgeKind::Flow => EdgePath::Line { from, to },
			EdgeKind::Feedback => EdgePath::Quad {
				from,
				ctrl: control_point(from, to, curvature),
				to,
			},
		}
	}

	/// Start of the path.
	pub fn from(&self) -> Point {
		match *self {
			EdgePath::Line { from, .. } | EdgePath::Quad { from, .. } => from,
		}
	}

	/// End of the path.
	pub fn to(&self) -> Point {
		match *self {
			EdgePath::Line { to, .. } | EdgePath::Quad { to, .. } => to,
		}
	}

	/// Point on the path at parameter `t` in `[0, 1]`.
	pub fn point_at(&self, t: f64) -> Point {
		match *self {
			EdgePath::Line { from, to } => from.lerp(to, t),
			EdgePath::Quad { from, ctrl, to } => {
				let u = 1.0 - t;
				from * (u * u) + ctrl * (2.0 * u * t) + to * (t * t)
			}
		}
	}

	/// Derivative of the path at `t` (not normalized).
	pub fn tangent_at(&self, t: f64) -> Point {
		match *self {
			EdgePath::Line { from, to } => to - from,
			EdgePath::Quad { from, ctrl, to } => {
				(ctrl - from) * (2.0 * (1.0 - t)) + (to - ctrl) * (2.0 * t)
			}
		}
	}

	/// Unit direction of travel at the target end, used to orient arrowheads.
	pub fn end_direction(&self) -> Option<Point> {
		self.tangent_at(1.0).normalized()
	}

	/// Where a particle at progress `t` is drawn.
	///
	/// Flow particles ride the segment. Feedback particles sit `offset` units
	/// to the side of the curve, measured along the local perpendicular.
	/// Returns `None` when the curve has no direction at `t`.
	pub fn particle_position(&self, t: f64, offset: f64) -> Option<Point> {
		match self {
			EdgePath::Line { .. } => Some(self.point_at(t)),
			EdgePath::Quad { .. } => {
				let unit = self.tangent_at(t).normalized()?;
				Some(self.point_at(t) + unit.perp() * offset)
			}
		}
	}
}
