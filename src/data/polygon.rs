use num_traits::ToPrimitive;

use crate::data::Point;
use crate::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub usize);

impl PointId {
  pub fn usize(self) -> usize {
    self.0
  }
}

impl From<PointId> for usize {
  fn from(pid: PointId) -> usize {
    pid.0
  }
}

impl std::fmt::Display for PointId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A polygon: one outer ring followed by zero or more hole rings, plus
/// optional free-standing interior points.
///
/// Point ids index the input point list in the order it was given. Rings
/// are closed implicitly, the last point connects back to the first.
#[derive(Debug, Clone)]
pub struct Polygon {
  pub(crate) points: Vec<Point>,
  pub(crate) rings: Vec<Vec<PointId>>,
  pub(crate) steiner: Vec<PointId>,
}

impl Polygon {
  /// Builds a polygon from a flat point list. `hole_indexes` marks where
  /// each hole ring starts; the outer ring is everything before the first
  /// offset.
  ///
  /// ```rust
  /// # use polysweep::data::Polygon;
  /// let pts = [[0, 0], [4, 0], [4, 4], [0, 4], [1, 1], [3, 1], [3, 3], [1, 3]];
  /// let poly = Polygon::new(&pts, &[4]).unwrap();
  /// assert_eq!(poly.holes().len(), 1);
  /// assert_eq!(poly.area(), 12.0);
  /// ```
  pub fn new<T: ToPrimitive>(points: &[[T; 2]], hole_indexes: &[usize]) -> Result<Polygon, Error> {
    let points = convert_points(points, 0)?;
    let rings = split_rings(points.len(), hole_indexes)?;
    let poly = Polygon {
      points,
      rings,
      steiner: Vec::new(),
    };
    poly.validate()?;
    Ok(poly)
  }

  /// Adds points that take part in the triangulation without being on any
  /// ring. They get ids following the ring points.
  pub fn with_steiner_points<T: ToPrimitive>(
    mut self,
    points: &[[T; 2]],
  ) -> Result<Polygon, Error> {
    let offset = self.points.len();
    let extra = convert_points(points, offset)?;
    self.points.extend(extra);
    self.steiner = (offset..self.points.len()).map(PointId).collect();
    self.validate()?;
    Ok(self)
  }

  /// Checks ring sizes, collinear rings and coincident points.
  pub fn validate(&self) -> Result<(), Error> {
    for ring in &self.rings {
      if ring.len() < 3 {
        return Err(Error::DegenerateGeometry);
      }
    }

    // Has no duplicate points.
    let mut order: Vec<usize> = (0..self.points.len()).collect();
    order.sort_by_key(|&i| (self.points[i].sweep_key(), i));
    for pair in order.windows(2) {
      if self.points[pair[0]] == self.points[pair[1]] {
        return Err(Error::DuplicatePoint {
          first: pair[0],
          second: pair[1],
        });
      }
    }

    for ring in &self.rings {
      if is_collinear(ring.iter().map(|&pid| self.point(pid))) {
        return Err(Error::DegenerateGeometry);
      }
    }
    Ok(())
  }

  pub fn points(&self) -> &[Point] {
    &self.points
  }

  pub fn point(&self, pid: PointId) -> &Point {
    &self.points[pid.0]
  }

  pub fn rings(&self) -> &[Vec<PointId>] {
    &self.rings
  }

  pub fn outer(&self) -> &[PointId] {
    &self.rings[0]
  }

  pub fn holes(&self) -> &[Vec<PointId>] {
    &self.rings[1..]
  }

  pub fn steiner_points(&self) -> &[PointId] {
    &self.steiner
  }

  /// Every ring edge as `(src, dst)` in ring order.
  pub fn iter_boundary_edges(&self) -> impl Iterator<Item = (PointId, PointId)> + '_ {
    self.rings.iter().flat_map(|ring| {
      ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(&src, &dst)| (src, dst))
    })
  }

  /// Area of the outer ring minus the area of the holes.
  pub fn area(&self) -> f64 {
    let outer = self.ring_signed_area_2x(&self.rings[0]).abs();
    let holes: f64 = self
      .holes()
      .iter()
      .map(|ring| self.ring_signed_area_2x(ring).abs())
      .sum();
    (outer - holes) / 2.0
  }

  /// Twice the signed area of `ring`, positive when counter-clockwise.
  pub(crate) fn ring_signed_area_2x(&self, ring: &[PointId]) -> f64 {
    ring
      .iter()
      .zip(ring.iter().cycle().skip(1))
      .map(|(&p, &q)| {
        let p = self.point(p);
        let q = self.point(q);
        p.x_coord() * q.y_coord() - q.x_coord() * p.y_coord()
      })
      .sum()
  }
}

fn convert_points<T: ToPrimitive>(points: &[[T; 2]], offset: usize) -> Result<Vec<Point>, Error> {
  points
    .iter()
    .enumerate()
    .map(|(i, coords)| Point::from_primitive(coords).ok_or(Error::InvalidCoordinate(offset + i)))
    .collect()
}

fn split_rings(len: usize, hole_indexes: &[usize]) -> Result<Vec<Vec<PointId>>, Error> {
  let mut starts = Vec::with_capacity(hole_indexes.len() + 2);
  starts.push(0);
  for &start in hole_indexes {
    let prev = starts[starts.len() - 1];
    if start <= prev || start >= len {
      return Err(Error::InvalidHoleIndex);
    }
    starts.push(start);
  }
  starts.push(len);
  Ok(
    starts
      .windows(2)
      .map(|w| (w[0]..w[1]).map(PointId).collect())
      .collect(),
  )
}

// A ring is collinear when every point lies on the line through the first
// point and the point farthest from it. The tolerance is relative to the
// ring's extent.
fn is_collinear<'a>(mut pts: impl Iterator<Item = &'a Point> + Clone) -> bool {
  let origin = match pts.next() {
    Some(p) => *p,
    None => return true,
  };
  let dist2 = |p: &Point| {
    let dx = p.x_coord() - origin.x_coord();
    let dy = p.y_coord() - origin.y_coord();
    dx * dx + dy * dy
  };
  let far = pts
    .clone()
    .max_by(|a, b| dist2(a).total_cmp(&dist2(b)))
    .copied();
  let far = match far {
    Some(p) if dist2(&p) > 0.0 => p,
    _ => return true,
  };
  let tolerance = 1e-12 * dist2(&far);
  let (ax, ay) = (far.x_coord() - origin.x_coord(), far.y_coord() - origin.y_coord());
  pts.all(|p| {
    let (bx, by) = (p.x_coord() - origin.x_coord(), p.y_coord() - origin.y_coord());
    (ax * by - ay * bx).abs() <= tolerance
  })
}
