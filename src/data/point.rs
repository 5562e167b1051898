use num_traits::ToPrimitive;
use ordered_float::{NotNan, OrderedFloat};
use rand::distributions::{Distribution, Standard};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Point {
  pub array: [f64; 2],
}

// Random sampling in the unit square.
impl Distribution<Point> for Standard {
  fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
    Point {
      array: [rng.gen(), rng.gen()],
    }
  }
}

impl Point {
  pub const fn new(array: [f64; 2]) -> Point {
    Point { array }
  }

  /// Converts any primitive coordinate pair. Returns `None` if either
  /// coordinate is NaN, infinite, or not representable as `f64`.
  pub fn from_primitive<T: ToPrimitive>(coords: &[T; 2]) -> Option<Point> {
    let x = NotNan::new(coords[0].to_f64()?).ok()?;
    let y = NotNan::new(coords[1].to_f64()?).ok()?;
    if x.is_infinite() || y.is_infinite() {
      return None;
    }
    Some(Point::new([x.into_inner(), y.into_inner()]))
  }

  pub fn x_coord(&self) -> f64 {
    self.array[0]
  }

  pub fn y_coord(&self) -> f64 {
    self.array[1]
  }

  /// Sweep order: bottom to top, ties broken left to right.
  pub fn sweep_key(&self) -> (OrderedFloat<f64>, OrderedFloat<f64>) {
    (OrderedFloat(self.y_coord()), OrderedFloat(self.x_coord()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use claims::{assert_none, assert_some_eq};
  use proptest::prelude::*;

  #[test]
  fn from_primitive_rejects_non_finite() {
    assert_none!(Point::from_primitive(&[f64::NAN, 0.0]));
    assert_none!(Point::from_primitive(&[0.0, f64::INFINITY]));
    assert_none!(Point::from_primitive(&[f64::NEG_INFINITY, 0.0]));
    assert_some_eq!(Point::from_primitive(&[3i32, -4]), Point::new([3.0, -4.0]));
    assert_some_eq!(Point::from_primitive(&[1u8, 2]), Point::new([1.0, 2.0]));
  }

  #[test]
  fn sweep_key_orders_by_y_then_x() {
    let mut pts = vec![
      Point::new([1.0, 1.0]),
      Point::new([0.0, 1.0]),
      Point::new([5.0, 0.0]),
    ];
    pts.sort_by_key(Point::sweep_key);
    assert_eq!(
      pts,
      vec![
        Point::new([5.0, 0.0]),
        Point::new([0.0, 1.0]),
        Point::new([1.0, 1.0]),
      ]
    );
  }

  #[test]
  fn random_points_in_unit_square() {
    use rand::SeedableRng;
    let mut rng = rand::rngs::SmallRng::seed_from_u64(7);
    for _ in 0..100 {
      let p: Point = rng.gen();
      assert!((0.0..1.0).contains(&p.x_coord()) && (0.0..1.0).contains(&p.y_coord()));
    }
  }

  proptest! {
    #[test]
    fn integer_coordinates_convert_exactly(x in any::<i32>(), y in any::<i32>()) {
      let p = Point::from_primitive(&[x, y]);
      prop_assert_eq!(p, Some(Point::new([f64::from(x), f64::from(y)])));
    }
  }
}
