use crate::Error;

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct TriIdx(pub usize);
impl std::fmt::Debug for TriIdx {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "t{}", self.0)
  }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct VertIdx(pub usize);
impl std::fmt::Debug for VertIdx {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "v{}", self.0)
  }
}

/// A triangle in the sweep mesh.
///
/// Vertices are stored counter-clockwise. Slot `i` of `neighbors`,
/// `constrained` and `delaunay` describes the edge opposite `points[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triangle {
  pub points: [VertIdx; 3],
  pub neighbors: [Option<TriIdx>; 3],
  pub constrained: [bool; 3],
  pub delaunay: [bool; 3],
  pub interior: bool,
}

// Slot of the edge clockwise / counter-clockwise of vertex slot `i`.
fn cw_slot(i: usize) -> usize {
  (i + 1) % 3
}
fn ccw_slot(i: usize) -> usize {
  (i + 2) % 3
}

impl Triangle {
  pub fn new(a: VertIdx, b: VertIdx, c: VertIdx) -> Triangle {
    Triangle {
      points: [a, b, c],
      neighbors: [None; 3],
      constrained: [false; 3],
      delaunay: [false; 3],
      interior: false,
    }
  }

  pub fn index(&self, p: VertIdx) -> Option<usize> {
    self.points.iter().position(|&v| v == p)
  }

  fn slot(&self, p: VertIdx) -> Result<usize, Error> {
    self.index(p).ok_or(Error::MissingNeighbor)
  }

  pub fn contains(&self, p: VertIdx) -> bool {
    self.points.contains(&p)
  }

  pub fn contains_edge(&self, p: VertIdx, q: VertIdx) -> bool {
    self.contains(p) && self.contains(q)
  }

  /// Slot opposite the edge `p1`-`p2`, if both are vertices.
  pub fn edge_index(&self, p1: VertIdx, p2: VertIdx) -> Option<usize> {
    let i1 = self.index(p1)?;
    let i2 = self.index(p2)?;
    if i1 == i2 {
      return None;
    }
    Some(3 - i1 - i2)
  }

  pub fn point_cw(&self, p: VertIdx) -> Result<VertIdx, Error> {
    Ok(self.points[ccw_slot(self.slot(p)?)])
  }

  pub fn point_ccw(&self, p: VertIdx) -> Result<VertIdx, Error> {
    Ok(self.points[cw_slot(self.slot(p)?)])
  }

  /// The vertex of `self` facing `t` across their shared edge, where `p` is
  /// the vertex of `t` facing `self`.
  pub fn opposite_point(&self, t: &Triangle, p: VertIdx) -> Result<VertIdx, Error> {
    self.point_cw(t.point_cw(p)?)
  }

  pub fn neighbor_across(&self, p: VertIdx) -> Result<Option<TriIdx>, Error> {
    Ok(self.neighbors[self.slot(p)?])
  }

  pub fn neighbor_cw(&self, p: VertIdx) -> Result<Option<TriIdx>, Error> {
    Ok(self.neighbors[cw_slot(self.slot(p)?)])
  }

  pub fn neighbor_ccw(&self, p: VertIdx) -> Result<Option<TriIdx>, Error> {
    Ok(self.neighbors[ccw_slot(self.slot(p)?)])
  }

  pub fn constrained_cw(&self, p: VertIdx) -> Result<bool, Error> {
    Ok(self.constrained[cw_slot(self.slot(p)?)])
  }

  pub fn constrained_ccw(&self, p: VertIdx) -> Result<bool, Error> {
    Ok(self.constrained[ccw_slot(self.slot(p)?)])
  }

  pub fn set_constrained_cw(&mut self, p: VertIdx, ce: bool) -> Result<(), Error> {
    self.constrained[cw_slot(self.slot(p)?)] = ce;
    Ok(())
  }

  pub fn set_constrained_ccw(&mut self, p: VertIdx, ce: bool) -> Result<(), Error> {
    self.constrained[ccw_slot(self.slot(p)?)] = ce;
    Ok(())
  }

  pub fn delaunay_cw(&self, p: VertIdx) -> Result<bool, Error> {
    Ok(self.delaunay[cw_slot(self.slot(p)?)])
  }

  pub fn delaunay_ccw(&self, p: VertIdx) -> Result<bool, Error> {
    Ok(self.delaunay[ccw_slot(self.slot(p)?)])
  }

  pub fn set_delaunay_cw(&mut self, p: VertIdx, de: bool) -> Result<(), Error> {
    self.delaunay[cw_slot(self.slot(p)?)] = de;
    Ok(())
  }

  pub fn set_delaunay_ccw(&mut self, p: VertIdx, de: bool) -> Result<(), Error> {
    self.delaunay[ccw_slot(self.slot(p)?)] = de;
    Ok(())
  }

  /// Marks the edge `p`-`q` constrained. No-op if it is not an edge of
  /// this triangle.
  pub fn mark_constrained_edge(&mut self, p: VertIdx, q: VertIdx) {
    if let Some(i) = self.edge_index(p, q) {
      self.constrained[i] = true;
    }
  }

  /// Records `t` as the neighbor across `p1`-`p2`. Returns false if the
  /// edge does not belong to this triangle.
  pub fn mark_neighbor_edge(&mut self, p1: VertIdx, p2: VertIdx, t: TriIdx) -> bool {
    match self.edge_index(p1, p2) {
      Some(i) => {
        self.neighbors[i] = Some(t);
        true
      }
      None => false,
    }
  }

  /// Drops the vertex counter-clockwise of `opoint` in favour of `npoint`
  /// and rotates the slots. Used to turn a pair of triangles around their
  /// shared edge.
  pub fn legalize(&mut self, opoint: VertIdx, npoint: VertIdx) -> Result<(), Error> {
    let [a, b, c] = self.points;
    self.points = match self.slot(opoint)? {
      0 => [c, a, npoint],
      1 => [npoint, a, b],
      _ => [c, npoint, b],
    };
    Ok(())
  }

  pub fn clear_neighbors(&mut self) {
    self.neighbors = [None; 3];
  }

  pub fn clear_delaunay(&mut self) {
    self.delaunay = [false; 3];
  }
}
