//! Geometric primitives for schematic layout.
//!
//! Before layout, coordinates are world coordinates taken from the asset
//! tables (typically eastings/northings in metres). After layout they are
//! logical schematic units. The same [`Point`] type carries both; which
//! space a value lives in is determined by the pipeline stage.

use serde::{Deserialize, Serialize};

/// Vectors shorter than this have no usable direction.
const DIRECTION_EPSILON: f64 = 1e-12;

/// A 2D point or displacement vector.
///
/// # Examples
///
/// ```
/// # use culvert_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f64 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f64 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f64) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f64) -> Self {
        self.y = y;
        self
    }

    /// Checks if both x and y coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Calculates the Euclidean length of this point as a vector
    pub fn hypot(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Calculates the Euclidean distance to another point
    pub fn distance(self, other: Point) -> f64 {
        other.sub_point(self).hypot()
    }

    /// Multiplies both coordinates by the given factor.
    ///
    /// # Examples
    ///
    /// ```
    /// # use culvert_core::geometry::Point;
    /// let direction = Point::new(0.6, 0.8);
    /// let step = direction.scale(150.0);
    /// assert!((step.x() - 90.0).abs() < 1e-9);
    /// assert!((step.y() - 120.0).abs() < 1e-9);
    /// ```
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Returns the unit vector pointing in the same direction, or `None` if
    /// the vector is too short to have a direction.
    ///
    /// # Examples
    ///
    /// ```
    /// # use culvert_core::geometry::Point;
    /// let unit = Point::new(3.0, 4.0).unit().unwrap();
    /// assert!((unit.x() - 0.6).abs() < 1e-12);
    /// assert!(Point::new(0.0, 0.0).unit().is_none());
    /// ```
    pub fn unit(self) -> Option<Self> {
        let length = self.hypot();
        if length < DIRECTION_EPSILON || !length.is_finite() {
            None
        } else {
            Some(self.scale(1.0 / length))
        }
    }

    /// Returns the arithmetic mean of the given points, or `None` if there
    /// are none.
    ///
    /// # Examples
    ///
    /// ```
    /// # use culvert_core::geometry::Point;
    /// let points = [Point::new(0.0, 0.0), Point::new(10.0, 100.0)];
    /// let centroid = Point::centroid(points).unwrap();
    /// assert_eq!(centroid, Point::new(5.0, 50.0));
    /// ```
    pub fn centroid(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let (sum, count) = points
            .into_iter()
            .fold((Point::default(), 0usize), |(sum, count), p| {
                (sum.add_point(p), count + 1)
            });
        (count > 0).then(|| sum.scale(1.0 / count as f64))
    }
}
