// This module contains strategies and helpers for:
//  * star shaped polygons, with and without a hole
//  * checking triangulations against their polygon
// Polygons are generated from a seed so proptest shrinks the size and the
// seed instead of individual coordinates.
use crate::data::{Point, PointId, Polygon};

use core::ops::Range;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::f64::consts::TAU;

///////////////////////////////////////////////////////////////////////////////
// Star polygons

// `n` points around the origin, one per angular sector, at radii in
// `radius`. Sectors never overlap so the ring is simple and counter-clockwise.
fn star_points(n: usize, radius: Range<f64>, rng: &mut SmallRng) -> Vec<[f64; 2]> {
  (0..n)
    .map(|i| {
      let angle = TAU * (i as f64 + rng.gen_range(0.1..0.9)) / n as f64;
      let r = rng.gen_range(radius.clone());
      [r * angle.cos(), r * angle.sin()]
    })
    .collect()
}

pub fn random_star(n: usize, rng: &mut SmallRng) -> Polygon {
  let points = star_points(n.max(3), 1.0..10.0, rng);
  Polygon::new(&points, &[]).expect("star polygons are valid")
}

// The outer star needs at least 8 points for its inner radius to stay
// above the hole's outer radius.
pub fn random_star_with_hole(n: usize, m: usize, rng: &mut SmallRng) -> Polygon {
  let mut points = star_points(n.max(8), 5.0..10.0, rng);
  let mut hole = star_points(m.max(3), 1.0..2.0, rng);
  if rng.gen() {
    hole.reverse();
  }
  let offset = points.len();
  points.extend(hole);
  Polygon::new(&points, &[offset]).expect("star polygons are valid")
}

pub fn star_polygon(size: Range<usize>) -> impl Strategy<Value = Polygon> {
  (size, any::<u64>()).prop_map(|(n, seed)| random_star(n, &mut SmallRng::seed_from_u64(seed)))
}

pub fn star_polygon_with_hole(
  outer: Range<usize>,
  inner: Range<usize>,
) -> impl Strategy<Value = Polygon> {
  (outer, inner, any::<u64>())
    .prop_map(|(n, m, seed)| random_star_with_hole(n, m, &mut SmallRng::seed_from_u64(seed)))
}

///////////////////////////////////////////////////////////////////////////////
// Checks on triangulations

fn signed_area_2x(a: &Point, b: &Point, c: &Point) -> f64 {
  (b.x_coord() - a.x_coord()) * (c.y_coord() - a.y_coord())
    - (c.x_coord() - a.x_coord()) * (b.y_coord() - a.y_coord())
}

/// Sum of the signed triangle areas. Clockwise triangles subtract.
pub fn triangles_area(poly: &Polygon, triangles: &[(PointId, PointId, PointId)]) -> f64 {
  triangles
    .iter()
    .map(|&(a, b, c)| signed_area_2x(poly.point(a), poly.point(b), poly.point(c)) / 2.0)
    .sum()
}

/// Panics unless every ring edge is the side of exactly one triangle and
/// every triangle is a valid, counter-clockwise index triple.
pub fn assert_boundary_edges(poly: &Polygon, triangles: &[(PointId, PointId, PointId)]) {
  let mut sides = HashSet::new();
  for &(a, b, c) in triangles {
    assert!(a != b && b != c && c != a, "repeated index in {:?}", (a, b, c));
    for pid in [a, b, c] {
      assert!(pid.usize() < poly.points().len());
    }
    assert!(signed_area_2x(poly.point(a), poly.point(b), poly.point(c)) > 0.0);
    for (src, dst) in [(a, b), (b, c), (c, a)] {
      assert!(sides.insert((src, dst)), "directed side {}-{} used twice", src, dst);
    }
  }
  for (src, dst) in poly.iter_boundary_edges() {
    let forward = sides.contains(&(src, dst));
    let backward = sides.contains(&(dst, src));
    assert!(forward != backward, "ring edge {}-{} not a unique triangle side", src, dst);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use test_strategy::proptest;

  #[proptest]
  fn stars_are_counter_clockwise(#[strategy(star_polygon(3..50))] poly: Polygon) {
    let outer: Vec<_> = poly.outer().iter().map(|&pid| *poly.point(pid)).collect();
    let area_2x: f64 = (0..outer.len())
      .map(|i| {
        let (p, q) = (outer[i], outer[(i + 1) % outer.len()]);
        p.x_coord() * q.y_coord() - q.x_coord() * p.y_coord()
      })
      .sum();
    prop_assert!(area_2x > 0.0);
  }

  #[proptest]
  fn hole_fits_inside(#[strategy(star_polygon_with_hole(8..30, 3..12))] poly: Polygon) {
    prop_assert_eq!(poly.holes().len(), 1);
    prop_assert!(poly.area() > 0.0);
    prop_assert!(poly.area() < 100.0 * std::f64::consts::PI);
  }
}
