use serde::{Deserialize, Serialize};

/// World-space axis-aligned box.
///
/// The default value is [`Aabb::EMPTY`], an inverted box that contains no
/// point and acts as the identity for [`Aabb::union`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
	/// Minimum corner (inclusive).
	pub min: [f64; 3],
	/// Maximum corner (inclusive).
	pub max: [f64; 3],
}

impl Default for Aabb {
	fn default() -> Self {
		Self::EMPTY
	}
}

impl Aabb {
	/// The box containing nothing.
	pub const EMPTY: Self = Self {
		min: [f64::INFINITY; 3],
		max: [f64::NEG_INFINITY; 3],
	};

	/// Creates a box spanning two corners given in any order.
	pub fn new(a: [f64; 3], b: [f64; 3]) -> Self {
		Self {
			min: [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])],
			max: [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
		}
	}

	/// Returns true when no point lies inside the box.
	pub fn is_empty(&self) -> bool {
		(0..3).any(|axis| self.min[axis] > self.max[axis])
	}

	/// Returns true when `point` lies inside the box, edges included.
	pub fn contains(&self, point: [f64; 3]) -> bool {
		(0..3).all(|axis| self.min[axis] <= point[axis] && point[axis] <= self.max[axis])
	}

	/// Returns true when the two boxes share at least one point.
	pub fn intersects(&self, other: &Self) -> bool {
		!self.is_empty()
			&& !other.is_empty()
			&& (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
	}

	/// Smallest box enclosing both inputs.
	pub fn union(&self, other: &Self) -> Self {
		if self.is_empty() {
			return *other;
		}
		if other.is_empty() {
			return *self;
		}
		Self {
			min: std::array::from_fn(|axis| self.min[axis].min(other.min[axis])),
			max: std::array::from_fn(|axis| self.max[axis].max(other.max[axis])),
		}
	}
}
