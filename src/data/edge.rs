use super::{Point, VertIdx};
use crate::Error;

/// A constrained edge between two sweep vertices. `p` is the lower end:
/// smaller y, ties broken by smaller x. The edge is swept when `q` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
  pub p: VertIdx,
  pub q: VertIdx,
}

impl Edge {
  pub fn new(a: VertIdx, b: VertIdx, points: &[Point]) -> Result<Edge, Error> {
    let pa = &points[a.0];
    let pb = &points[b.0];
    if pa == pb {
      return Err(Error::DuplicatePoint {
        first: a.0.min(b.0),
        second: a.0.max(b.0),
      });
    }
    if pa.sweep_key() < pb.sweep_key() {
      Ok(Edge { p: a, q: b })
    } else {
      Ok(Edge { p: b, q: a })
    }
  }
}
