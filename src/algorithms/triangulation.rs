use num_traits::ToPrimitive;

use crate::data::{PointId, Polygon};
use crate::{Error, SweepConfig};

mod advancing_front;
pub mod constrained_delaunay;
mod sweep;
mod sweep_context;

pub trait Triangulate {
  fn triangulate(self) -> Result<Vec<(PointId, PointId, PointId)>, Error>;
}

impl Triangulate for &Polygon {
  fn triangulate(self) -> Result<Vec<(PointId, PointId, PointId)>, Error> {
    constrained_delaunay::constrained_delaunay(self, &SweepConfig::default())
  }
}

impl Polygon {
  /// Triangulates with non-default predicate tolerance, sentinel margin or
  /// step budget.
  ///
  /// ```rust
  /// # use polysweep::data::Polygon;
  /// # use polysweep::SweepConfig;
  /// let poly = Polygon::new(&[[0.0, 0.0], [3.0, 0.0], [0.0, 4.0]], &[]).unwrap();
  /// let config = SweepConfig::default().with_epsilon(1e-9);
  /// assert_eq!(poly.triangulate_with(&config).unwrap().len(), 1);
  /// ```
  pub fn triangulate_with(
    &self,
    config: &SweepConfig,
  ) -> Result<Vec<(PointId, PointId, PointId)>, Error> {
    constrained_delaunay::constrained_delaunay(self, config)
  }
}

/// Triangulates a polygon given as a flat point list.
///
/// `hole_indexes` holds the offset at which each hole ring starts; the outer
/// ring runs up to the first offset. Returns three point indices per
/// triangle, each triple counter-clockwise with y pointing up.
///
/// Fails with [`Error::IndexOverflow`] if an index exceeds `u32::MAX`.
///
/// ```rust
/// # use polysweep::triangulate_polygon;
/// let points = [[0, 0], [4, 0], [4, 4], [0, 4], [1, 1], [3, 1], [3, 3], [1, 3]];
/// let indices = triangulate_polygon(&points, &[4]).unwrap();
/// assert_eq!(indices.len(), 8 * 3);
/// ```
pub fn triangulate_polygon<T: ToPrimitive>(
  points: &[[T; 2]],
  hole_indexes: &[usize],
) -> Result<Vec<u32>, Error> {
  let poly = Polygon::new(points, hole_indexes)?;
  flatten(poly.triangulate()?)
}

/// Like [`triangulate_polygon`], with extra interior points that become
/// mesh vertices. They are numbered after the ring points.
pub fn triangulate_polygon_with_steiner_points<T: ToPrimitive>(
  points: &[[T; 2]],
  hole_indexes: &[usize],
  steiner: &[[T; 2]],
) -> Result<Vec<u32>, Error> {
  let poly = Polygon::new(points, hole_indexes)?.with_steiner_points(steiner)?;
  flatten(poly.triangulate()?)
}

fn flatten(triangles: Vec<(PointId, PointId, PointId)>) -> Result<Vec<u32>, Error> {
  let mut out = Vec::with_capacity(triangles.len() * 3);
  for (a, b, c) in triangles {
    for pid in [a, b, c] {
      out.push(u32::try_from(pid.usize()).map_err(|_| Error::IndexOverflow(pid.usize()))?);
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use claims::{assert_err_eq, assert_matches, assert_ok, assert_ok_eq};

  #[test]
  fn flat_indices() {
    let indices = assert_ok!(triangulate_polygon(&[[0, 0], [1, 0], [1, 1], [0, 1]], &[]));
    assert_eq!(indices.len(), 6);
    assert!(indices.iter().all(|&i| i < 4));
  }

  #[test]
  fn steiner_indices_follow_ring() {
    let indices = assert_ok!(triangulate_polygon_with_steiner_points(
      &[[0., 0.], [4., 0.], [4., 4.], [0., 4.]],
      &[],
      &[[2., 1.5]],
    ));
    assert_eq!(indices.len(), 4 * 3);
    assert_eq!(indices.iter().filter(|&&i| i == 4).count(), 4);
  }

  #[test]
  #[cfg(target_pointer_width = "64")]
  fn wide_ids_do_not_fit_flat_output() {
    let wide = u32::MAX as usize + 1;
    let triangles = vec![(PointId(0), PointId(1), PointId(wide))];
    assert_err_eq!(flatten(triangles), Error::IndexOverflow(wide));
    let triangles = vec![(PointId(0), PointId(1), PointId(u32::MAX as usize))];
    assert_ok_eq!(flatten(triangles), vec![0, 1, u32::MAX]);
  }

  #[test]
  fn errors_pass_through() {
    assert_err_eq!(
      triangulate_polygon(&[[0, 0], [1, 0], [0, 0], [0, 1]], &[]),
      Error::DuplicatePoint { first: 0, second: 2 }
    );
    assert_err_eq!(
      triangulate_polygon(&[[0, 0], [1, 1], [2, 2]], &[]),
      Error::DegenerateGeometry
    );
    assert_err_eq!(
      triangulate_polygon(&[[0, 0], [1, 0], [0, 1]], &[3]),
      Error::InvalidHoleIndex
    );
    assert_matches!(
      triangulate_polygon(&[[0., 0.], [1., 0.], [f64::INFINITY, 1.]], &[]),
      Err(Error::InvalidCoordinate(_))
    );
  }
}
