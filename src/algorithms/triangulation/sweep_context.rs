use super::advancing_front::{AdvancingFront, NodeIdx};
use crate::data::{Edge, Point, PointId, Polygon, TriIdx, Triangle, VertIdx};
use crate::{Error, Predicates, SweepConfig};

/// State of one triangulation run.
///
/// Vertices are indexed by `VertIdx`: input points keep their input index,
/// followed by the two sentinels below the input.
#[derive(Debug, Clone)]
pub struct SweepContext {
  pub(crate) points: Vec<Point>,
  pub(crate) edges: Vec<Edge>,
  /// Edges indexed by their upper end point.
  pub(crate) edge_lists: Vec<Vec<usize>>,
  pub(crate) sorted: Vec<VertIdx>,
  pub(crate) triangles: Vec<Triangle>,
  map: Vec<TriIdx>,
  pub(crate) front: AdvancingFront,
  pub(crate) predicates: Predicates,
  /// First outer ring edge, directed so the polygon lies to its left.
  pub(crate) seed_edge: (VertIdx, VertIdx),
  real: usize,
  steps_left: usize,
}

impl SweepContext {
  pub fn new(poly: &Polygon, config: &SweepConfig) -> Result<SweepContext, Error> {
    let mut points = poly.points().to_vec();
    let real = points.len();
    if real < 3 {
      return Err(Error::DegenerateGeometry);
    }

    let mut edges = Vec::new();
    let mut edge_lists = vec![Vec::new(); real];
    for ring in poly.rings() {
      Self::init_edges(ring, &points, &mut edges, &mut edge_lists)?;
    }

    let outer = poly.outer();
    let (a, b) = (VertIdx(outer[0].usize()), VertIdx(outer[1].usize()));
    let seed_edge = if poly.ring_signed_area_2x(outer) > 0.0 {
      (a, b)
    } else {
      (b, a)
    };

    let sorted = Self::init_triangulation(&mut points, config.alpha);
    let (head, tail) = (VertIdx(real), VertIdx(real + 1));
    let first = sorted[0];
    let seed = Triangle::new(first, head, tail);
    let front = AdvancingFront::new(
      (head, points[head.0].x_coord()),
      (first, points[first.0].x_coord()),
      (tail, points[tail.0].x_coord()),
      TriIdx(0),
    );

    Ok(SweepContext {
      points,
      edges,
      edge_lists,
      sorted,
      triangles: vec![seed],
      map: vec![TriIdx(0)],
      front,
      predicates: config.predicates(),
      seed_edge,
      real,
      steps_left: config.budget_for(real),
    })
  }

  // One closed edge cycle per ring.
  fn init_edges(
    ring: &[PointId],
    points: &[Point],
    edges: &mut Vec<Edge>,
    edge_lists: &mut [Vec<usize>],
  ) -> Result<(), Error> {
    for (i, &pid) in ring.iter().enumerate() {
      let next = ring[(i + 1) % ring.len()];
      let edge = Edge::new(VertIdx(pid.usize()), VertIdx(next.usize()), points)?;
      edge_lists[edge.q.0].push(edges.len());
      edges.push(edge);
    }
    Ok(())
  }

  // Appends the two sentinels, below the bounding box and beyond it on
  // both sides, and returns the input vertices in sweep order.
  fn init_triangulation(points: &mut Vec<Point>, alpha: f64) -> Vec<VertIdx> {
    let (mut xmin, mut xmax) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut ymin, mut ymax) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points.iter() {
      xmin = xmin.min(p.x_coord());
      xmax = xmax.max(p.x_coord());
      ymin = ymin.min(p.y_coord());
      ymax = ymax.max(p.y_coord());
    }
    let dx = alpha * (xmax - xmin);
    let dy = alpha * (ymax - ymin);

    let mut sorted: Vec<VertIdx> = (0..points.len()).map(VertIdx).collect();
    sorted.sort_by_key(|v| points[v.0].sweep_key());

    points.push(Point::new([xmin - dx, ymin - dy]));
    points.push(Point::new([xmax + dx, ymin - dy]));
    sorted
  }

  pub fn point(&self, v: VertIdx) -> &Point {
    &self.points[v.0]
  }

  pub fn x(&self, v: VertIdx) -> f64 {
    self.points[v.0].x_coord()
  }

  pub fn is_sentinel(&self, v: VertIdx) -> bool {
    v.0 >= self.real
  }

  pub fn orient(&self, a: VertIdx, b: VertIdx, c: VertIdx) -> crate::Orientation {
    self
      .predicates
      .orient2d(&self.point(a).array, &self.point(b).array, &self.point(c).array)
  }

  pub fn tri(&self, t: TriIdx) -> &Triangle {
    &self.triangles[t.0]
  }

  pub fn tri_mut(&mut self, t: TriIdx) -> &mut Triangle {
    &mut self.triangles[t.0]
  }

  /// Point of the front node `n`.
  pub fn node_point(&self, n: NodeIdx) -> VertIdx {
    self.front.node(n).point
  }

  pub fn node_triangle(&self, n: NodeIdx) -> Result<TriIdx, Error> {
    self.front.node(n).triangle.ok_or(Error::MissingNeighbor)
  }

  /// Consumes one step of the budget.
  pub fn step(&mut self) -> Result<(), Error> {
    self.steps_left = self.steps_left.checked_sub(1).ok_or(Error::StepBudgetExceeded)?;
    Ok(())
  }

  pub fn add_to_map(&mut self, triangle: Triangle) -> TriIdx {
    let idx = TriIdx(self.triangles.len());
    self.triangles.push(triangle);
    self.map.push(idx);
    idx
  }

  /// Live triangles in creation order.
  pub fn map(&self) -> &[TriIdx] {
    &self.map
  }

  /// Links `a` and `b` across their shared edge. Does nothing if they do
  /// not share one.
  pub fn mark_neighbor(&mut self, a: TriIdx, b: TriIdx) {
    let [p0, p1, p2] = self.tri(a).points;
    let other = self.tri(b);
    let (i, e1, e2) = if other.contains_edge(p1, p2) {
      (0, p1, p2)
    } else if other.contains_edge(p0, p2) {
      (1, p0, p2)
    } else if other.contains_edge(p0, p1) {
      (2, p0, p1)
    } else {
      return;
    };
    self.tri_mut(a).neighbors[i] = Some(b);
    self.tri_mut(b).mark_neighbor_edge(e1, e2, a);
  }

  /// Attaches `t` to the front nodes at the far end of each of its open
  /// edges.
  pub fn map_triangle_to_nodes(&mut self, t: TriIdx) -> Result<(), Error> {
    for i in 0..3 {
      let tri = self.tri(t);
      if tri.neighbors[i].is_some() {
        continue;
      }
      let p = tri.point_cw(tri.points[i])?;
      let x = self.x(p);
      if let Some(n) = self.front.locate_point(p, x) {
        self.front.node_mut(n).triangle = Some(t);
      }
    }
    Ok(())
  }

  /// Flood fill from `start`, never crossing a constrained edge. Returns
  /// the reached triangles in depth-first preorder.
  pub fn mesh_clean(&mut self, start: TriIdx) -> Result<Vec<TriIdx>, Error> {
    let mut out = Vec::new();
    let mut stack = vec![start];
    while let Some(t) = stack.pop() {
      self.step()?;
      if self.tri(t).interior {
        continue;
      }
      self.tri_mut(t).interior = true;
      out.push(t);
      let tri = self.tri(t);
      for i in (0..3).rev() {
        if tri.constrained[i] {
          continue;
        }
        if let Some(n) = tri.neighbors[i] {
          stack.push(n);
        }
      }
    }
    Ok(out)
  }

  /// Input point ids of the triangle's vertices. Fails on sentinels.
  pub fn point_ids(&self, t: TriIdx) -> Result<(PointId, PointId, PointId), Error> {
    let [a, b, c] = self.tri(t).points;
    if self.is_sentinel(a) || self.is_sentinel(b) || self.is_sentinel(c) {
      return Err(Error::MissingNeighbor);
    }
    Ok((PointId(a.0), PointId(b.0), PointId(c.0)))
  }

  #[cfg(test)]
  pub fn check_invariant(&self) {
    for &idx in &self.map {
      let t = self.tri(idx);
      for i in 0..3 {
        if let Some(n) = t.neighbors[i] {
          let other = self.tri(n);
          let a = t.points[(i + 1) % 3];
          let b = t.points[(i + 2) % 3];
          let back = other.edge_index(a, b).map(|j| other.neighbors[j]);
          assert_eq!(
            back,
            Some(Some(idx)),
            "invariant violated: {:?}={:?}, {:?}={:?}",
            idx,
            t,
            n,
            other
          );
        }
      }
    }
  }
}
