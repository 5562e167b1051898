#![deny(clippy::cast_lossless)]
#![doc(test(no_crate_inject))]
//! Constrained Delaunay triangulation of simple polygons with holes.
//!
//! Points are swept bottom-up along an advancing front. Every point event
//! grows the front by one triangle, Delaunay legality is restored by edge
//! flips, and the contour edges are forced into the mesh by edge events.
//! A flood fill bounded by the contour edges extracts the interior.
//!
//! ```rust
//! # use polysweep::triangulate_polygon;
//! let square = [[0, 0], [1, 0], [1, 1], [0, 1]];
//! let indices = triangulate_polygon(&square, &[]).unwrap();
//! assert_eq!(indices.len(), 6);
//! ```

pub mod algorithms;
mod config;
pub mod data;
mod orientation;

pub use algorithms::triangulation::{
  triangulate_polygon, triangulate_polygon_with_steiner_points, Triangulate,
};
pub use config::SweepConfig;
pub use orientation::{Orientation, Predicates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
  /// Two input points share the exact same coordinates.
  #[error("points {first} and {second} coincide")]
  DuplicatePoint { first: usize, second: usize },
  /// A contour edge runs through a mesh vertex in a configuration that
  /// cannot be split.
  #[error("constrained edge is collinear with a mesh vertex")]
  UnsupportedCollinearConstraint,
  /// The triangle graph lacks a neighbor or front node the sweep relies on.
  /// Usually caused by self-intersecting or overlapping contours.
  #[error("missing neighbor in triangle graph")]
  MissingNeighbor,
  #[error("degenerate geometry: fewer than 3 points or all points collinear")]
  DegenerateGeometry,
  #[error("coordinate of point {0} is not a finite number")]
  InvalidCoordinate(usize),
  #[error("hole offsets must be increasing and inside the point list")]
  InvalidHoleIndex,
  #[error("step budget exhausted")]
  StepBudgetExceeded,
  /// A point index does not fit the `u32` flat output.
  #[error("point index {0} does not fit in a u32")]
  IndexOverflow(usize),
}

#[cfg(test)]
pub mod testing;
