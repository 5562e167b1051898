#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone)]
pub enum Orientation {
  CounterClockWise,
  ClockWise,
  CoLinear,
}
use Orientation::*;

impl Orientation {
  /// Determine the direction you have to turn if you walk from `p1`
  /// to `p2` to `p3`. Cross products with a magnitude below `epsilon`
  /// count as colinear.
  ///
  /// # Examples
  ///
  /// ```rust
  /// # use polysweep::Orientation;
  /// let p1 = [0.0, 0.0];
  /// let p2 = [0.0, 1.0]; // One unit above p1.
  /// assert!(Orientation::new(&p1, &p2, &[0.0, 2.0], 1e-12).is_colinear());
  /// assert!(Orientation::new(&p1, &p2, &[-1.0, 2.0], 1e-12).is_ccw());
  /// assert!(Orientation::new(&p1, &p2, &[1.0, 2.0], 1e-12).is_cw());
  /// ```
  pub fn new(p1: &[f64; 2], p2: &[f64; 2], p3: &[f64; 2], epsilon: f64) -> Orientation {
    let [ax, ay] = *p1;
    let [bx, by] = *p2;
    let [cx, cy] = *p3;
    let val = (ax - cx) * (by - cy) - (ay - cy) * (bx - cx);
    if val > -epsilon && val < epsilon {
      CoLinear
    } else if val > 0.0 {
      CounterClockWise
    } else {
      ClockWise
    }
  }

  pub fn is_colinear(self) -> bool {
    matches!(self, CoLinear)
  }

  pub fn is_ccw(self) -> bool {
    matches!(self, CounterClockWise)
  }

  pub fn is_cw(self) -> bool {
    matches!(self, ClockWise)
  }
}

/// Floating point predicates sharing one epsilon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predicates {
  pub epsilon: f64,
}

impl Predicates {
  pub fn new(epsilon: f64) -> Predicates {
    Predicates { epsilon }
  }

  pub fn orient2d(&self, a: &[f64; 2], b: &[f64; 2], c: &[f64; 2]) -> Orientation {
    Orientation::new(a, b, c, self.epsilon)
  }

  /// True if `d` lies strictly inside the circumcircle of the
  /// counter-clockwise triangle `a`, `b`, `c`.
  ///
  /// Bails out early when `d` is not on the inner side of the edges `ab` or
  /// `ca`. Determinants within epsilon of zero count as outside.
  pub fn in_circle(&self, a: &[f64; 2], b: &[f64; 2], c: &[f64; 2], d: &[f64; 2]) -> bool {
    let adx = a[0] - d[0];
    let ady = a[1] - d[1];
    let bdx = b[0] - d[0];
    let bdy = b[1] - d[1];

    let oabd = adx * bdy - bdx * ady;
    if oabd <= 0.0 {
      return false;
    }

    let cdx = c[0] - d[0];
    let cdy = c[1] - d[1];

    let ocad = cdx * ady - adx * cdy;
    if ocad <= 0.0 {
      return false;
    }

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdx * cdy - cdx * bdy) + blift * ocad + clift * oabd;
    det > self.epsilon
  }

  /// True if `d` lies in the wedge spanned at `a` by `b` and `c`, which is
  /// where a flip of the diagonal `bc` to `ad` keeps both triangles valid.
  pub fn in_scan_area(&self, a: &[f64; 2], b: &[f64; 2], c: &[f64; 2], d: &[f64; 2]) -> bool {
    let oadb = (a[0] - b[0]) * (d[1] - b[1]) - (d[0] - b[0]) * (a[1] - b[1]);
    if oadb >= -self.epsilon {
      return false;
    }

    let oadc = (a[0] - c[0]) * (d[1] - c[1]) - (d[0] - c[0]) * (a[1] - c[1]);
    if oadc <= self.epsilon {
      return false;
    }
    true
  }
}

impl Default for Predicates {
  fn default() -> Self {
    Predicates::new(1e-12)
  }
}
