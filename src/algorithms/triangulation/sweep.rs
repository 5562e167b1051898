use std::f64::consts::{FRAC_PI_2, PI};

use super::advancing_front::NodeIdx;
use super::sweep_context::SweepContext;
use crate::data::{Edge, TriIdx, Triangle, VertIdx};
use crate::{Error, Orientation};

const PI_3DIV4: f64 = 3.0 * PI / 4.0;

/// The constrained edge currently being forced into the mesh. `q` moves
/// down to a vertex lying on the edge when the edge is split there.
#[derive(Debug, Clone, Copy)]
struct EdgeEvent {
  p: VertIdx,
  q: VertIdx,
  right: bool,
}

/// A concave pocket in the front, bounded by two higher nodes.
#[derive(Debug, Clone, Copy)]
struct Basin {
  left: NodeIdx,
  bottom: NodeIdx,
  right: NodeIdx,
  width: f64,
  left_highest: bool,
}

// Pending work while recovering one constrained edge `ep`-`eq`.
#[derive(Debug, Clone, Copy)]
enum Task {
  Edge {
    ep: VertIdx,
    eq: VertIdx,
    t: TriIdx,
    p: VertIdx,
  },
  Flip {
    ep: VertIdx,
    eq: VertIdx,
    t: TriIdx,
    p: VertIdx,
  },
  FlipScan {
    ep: VertIdx,
    eq: VertIdx,
    flip_t: TriIdx,
    t: TriIdx,
    p: VertIdx,
  },
}

#[derive(Debug, Clone, Copy)]
enum Frame {
  Legalize(TriIdx),
  // Clears the Delaunay marks set on both sides of a flipped edge.
  Restore {
    t: TriIdx,
    i: usize,
    ot: TriIdx,
    oi: usize,
  },
}

/// Runs the sweep over a prepared context and returns the interior
/// triangles.
pub fn triangulate(tcx: &mut SweepContext) -> Result<Vec<TriIdx>, Error> {
  let mut sweep = Sweep { tcx };
  sweep.sweep_points()?;
  sweep.finalization_polygon()
}

struct Sweep<'a> {
  tcx: &'a mut SweepContext,
}

impl Sweep<'_> {
  fn sweep_points(&mut self) -> Result<(), Error> {
    for k in 1..self.tcx.sorted.len() {
      let point = self.tcx.sorted[k];
      tracing::trace!(?point, "point event");
      let node = self.point_event(point)?;
      for j in 0..self.tcx.edge_lists[point.0].len() {
        let edge = self.tcx.edges[self.tcx.edge_lists[point.0][j]];
        tracing::trace!(p = ?edge.p, q = ?edge.q, "edge event");
        self.edge_event(edge, node)?;
      }
    }
    Ok(())
  }

  // The flood fill starts on the inner side of the first outer ring edge.
  // Points left of the polygon can own the front's first node, so the
  // front is no guide to where the interior begins.
  fn finalization_polygon(&mut self) -> Result<Vec<TriIdx>, Error> {
    let (u, v) = self.tcx.seed_edge;
    for k in 0..self.tcx.map().len() {
      let t = self.tcx.map()[k];
      let tri = self.tcx.tri(t);
      if !tri.contains(u) {
        continue;
      }
      let w = tri.point_ccw(u)?;
      if w == v || self.runs_along(u, v, w) {
        tracing::trace!(?t, ?u, ?v, "flood fill seed");
        return self.tcx.mesh_clean(t);
      }
    }
    Err(Error::MissingNeighbor)
  }

  // True if `w` lies on the ray from `u` through `v`. The seed edge may
  // have been split at a point lying on it.
  fn runs_along(&self, u: VertIdx, v: VertIdx, w: VertIdx) -> bool {
    if !self.orient(u, v, w).is_colinear() {
      return false;
    }
    let (a, b, c) = (self.tcx.point(u), self.tcx.point(v), self.tcx.point(w));
    let dot = (b.x_coord() - a.x_coord()) * (c.x_coord() - a.x_coord())
      + (b.y_coord() - a.y_coord()) * (c.y_coord() - a.y_coord());
    dot > 0.0
  }

  fn pt(&self, n: NodeIdx) -> VertIdx {
    self.tcx.node_point(n)
  }

  fn x(&self, v: VertIdx) -> f64 {
    self.tcx.point(v).x_coord()
  }

  fn y(&self, v: VertIdx) -> f64 {
    self.tcx.point(v).y_coord()
  }

  fn next(&self, n: NodeIdx) -> Result<NodeIdx, Error> {
    self.tcx.front.next(n)
  }

  fn prev(&self, n: NodeIdx) -> Result<NodeIdx, Error> {
    self.tcx.front.prev(n)
  }

  fn orient(&self, a: VertIdx, b: VertIdx, c: VertIdx) -> Orientation {
    self.tcx.orient(a, b, c)
  }

  fn in_circle(&self, a: VertIdx, b: VertIdx, c: VertIdx, d: VertIdx) -> bool {
    let tcx = &self.tcx;
    tcx.predicates.in_circle(
      &tcx.point(a).array,
      &tcx.point(b).array,
      &tcx.point(c).array,
      &tcx.point(d).array,
    )
  }

  fn in_scan_area(&self, a: VertIdx, b: VertIdx, c: VertIdx, d: VertIdx) -> bool {
    let tcx = &self.tcx;
    tcx.predicates.in_scan_area(
      &tcx.point(a).array,
      &tcx.point(b).array,
      &tcx.point(c).array,
      &tcx.point(d).array,
    )
  }

  ///////////////////////////////////////////////////////////////////////////
  // Point events

  fn point_event(&mut self, point: VertIdx) -> Result<NodeIdx, Error> {
    let x = self.x(point);
    let node = self.tcx.front.locate_node(x).ok_or(Error::MissingNeighbor)?;
    let new_node = self.new_front_triangle(point, node)?;

    // The located node never lies right of the point, so only the upper
    // side of the epsilon band matters.
    if x <= self.x(self.pt(node)) + self.tcx.predicates.epsilon {
      self.fill(node)?;
    }

    self.fill_advancing_front(new_node)?;
    Ok(new_node)
  }

  fn new_front_triangle(&mut self, point: VertIdx, node: NodeIdx) -> Result<NodeIdx, Error> {
    let next = self.next(node)?;
    let triangle = Triangle::new(point, self.pt(node), self.pt(next));
    let t = self.tcx.add_to_map(triangle);
    let nt = self.tcx.node_triangle(node)?;
    self.tcx.mark_neighbor(t, nt);

    let x = self.x(point);
    let new_node = self.tcx.front.insert_after(node, point, x)?;
    self.legalize(t, true)?;
    Ok(new_node)
  }

  /// Closes the front at `node` with a triangle over its two neighbors.
  fn fill(&mut self, node: NodeIdx) -> Result<(), Error> {
    let prev = self.prev(node)?;
    let next = self.next(node)?;
    let triangle = Triangle::new(self.pt(prev), self.pt(node), self.pt(next));
    let t = self.tcx.add_to_map(triangle);

    let pt = self.tcx.node_triangle(prev)?;
    let nt = self.tcx.node_triangle(node)?;
    self.tcx.mark_neighbor(t, pt);
    self.tcx.mark_neighbor(t, nt);

    self.tcx.front.remove(node)?;
    self.legalize(t, true)?;
    Ok(())
  }

  fn fill_advancing_front(&mut self, n: NodeIdx) -> Result<(), Error> {
    // Fill right holes.
    let mut node = self.next(n)?;
    while let Some(next) = self.tcx.front.node(node).next {
      self.tcx.step()?;
      let angle = self.hole_angle(node)?;
      if !(-FRAC_PI_2..=FRAC_PI_2).contains(&angle) {
        break;
      }
      self.fill(node)?;
      node = next;
    }

    // Fill left holes.
    let mut node = self.prev(n)?;
    while let Some(prev) = self.tcx.front.node(node).prev {
      self.tcx.step()?;
      let angle = self.hole_angle(node)?;
      if !(-FRAC_PI_2..=FRAC_PI_2).contains(&angle) {
        break;
      }
      self.fill(node)?;
      node = prev;
    }

    // Fill right basins.
    if let Some(next) = self.tcx.front.node(n).next {
      if self.tcx.front.node(next).next.is_some() && self.basin_angle(n)? < PI_3DIV4 {
        self.fill_basin(n)?;
      }
    }
    Ok(())
  }

  // Signed angle at `node` between the directions to its neighbors.
  fn hole_angle(&self, node: NodeIdx) -> Result<f64, Error> {
    let p = self.pt(node);
    let next = self.pt(self.next(node)?);
    let prev = self.pt(self.prev(node)?);
    let ax = self.x(next) - self.x(p);
    let ay = self.y(next) - self.y(p);
    let bx = self.x(prev) - self.x(p);
    let by = self.y(prev) - self.y(p);
    Ok((ax * by - ay * bx).atan2(ax * bx + ay * by))
  }

  fn basin_angle(&self, node: NodeIdx) -> Result<f64, Error> {
    let p = self.pt(node);
    let next2 = self.pt(self.next(self.next(node)?)?);
    let ax = self.x(p) - self.x(next2);
    let ay = self.y(p) - self.y(next2);
    Ok(ay.atan2(ax))
  }

  fn fill_basin(&mut self, node: NodeIdx) -> Result<(), Error> {
    let next = self.next(node)?;
    let next2 = self.next(next)?;
    let left = if self.orient(self.pt(node), self.pt(next), self.pt(next2)).is_ccw() {
      next2
    } else {
      next
    };

    let mut bottom = left;
    while let Some(n) = self.tcx.front.node(bottom).next {
      self.tcx.step()?;
      if self.y(self.pt(bottom)) < self.y(self.pt(n)) {
        break;
      }
      bottom = n;
    }
    if bottom == left {
      return Ok(());
    }

    let mut right = bottom;
    while let Some(n) = self.tcx.front.node(right).next {
      self.tcx.step()?;
      if self.y(self.pt(right)) >= self.y(self.pt(n)) {
        break;
      }
      right = n;
    }
    if right == bottom {
      return Ok(());
    }

    let basin = Basin {
      left,
      bottom,
      right,
      width: self.x(self.pt(right)) - self.x(self.pt(left)),
      left_highest: self.y(self.pt(left)) > self.y(self.pt(right)),
    };
    self.fill_basin_req(&basin)
  }

  // Fills the basin bottom-up, always continuing with the lower neighbor.
  fn fill_basin_req(&mut self, basin: &Basin) -> Result<(), Error> {
    let mut node = basin.bottom;
    loop {
      self.tcx.step()?;
      if self.is_shallow(basin, node) {
        return Ok(());
      }
      self.fill(node)?;

      let prev = self.prev(node)?;
      let next = self.next(node)?;
      if prev == basin.left && next == basin.right {
        return Ok(());
      } else if prev == basin.left {
        let next2 = self.next(next)?;
        if self.orient(self.pt(node), self.pt(next), self.pt(next2)).is_cw() {
          return Ok(());
        }
        node = next;
      } else if next == basin.right {
        let prev2 = self.prev(prev)?;
        if self.orient(self.pt(node), self.pt(prev), self.pt(prev2)).is_ccw() {
          return Ok(());
        }
        node = prev;
      } else if self.y(self.pt(prev)) < self.y(self.pt(next)) {
        node = prev;
      } else {
        node = next;
      }
    }
  }

  fn is_shallow(&self, basin: &Basin, node: NodeIdx) -> bool {
    let top = if basin.left_highest {
      basin.left
    } else {
      basin.right
    };
    let height = self.y(self.pt(top)) - self.y(self.pt(node));
    basin.width > height
  }

  ///////////////////////////////////////////////////////////////////////////
  // Edge events

  fn edge_event(&mut self, edge: Edge, node: NodeIdx) -> Result<(), Error> {
    let mut ev = EdgeEvent {
      p: edge.p,
      q: edge.q,
      right: self.x(edge.p) > self.x(edge.q),
    };

    let t = self.tcx.node_triangle(node)?;
    if self.is_edge_side_of_triangle(t, edge.p, edge.q) {
      return Ok(());
    }

    // Fill the front below the edge first so the flips only ever have to
    // deal with triangles.
    self.fill_edge_event(&ev, node)?;

    let t = self.tcx.node_triangle(node)?;
    self.propagate(
      &mut ev,
      Task::Edge {
        ep: edge.p,
        eq: edge.q,
        t,
        p: edge.q,
      },
    )
  }

  fn is_edge_side_of_triangle(&mut self, t: TriIdx, ep: VertIdx, eq: VertIdx) -> bool {
    match self.tcx.tri(t).edge_index(ep, eq) {
      Some(i) => {
        self.tcx.tri_mut(t).constrained[i] = true;
        if let Some(n) = self.tcx.tri(t).neighbors[i] {
          self.tcx.tri_mut(n).mark_constrained_edge(ep, eq);
        }
        true
      }
      None => false,
    }
  }

  fn fill_edge_event(&mut self, ev: &EdgeEvent, node: NodeIdx) -> Result<(), Error> {
    if ev.right {
      self.fill_right_above_edge_event(ev, node)
    } else {
      self.fill_left_above_edge_event(ev, node)
    }
  }

  fn fill_right_above_edge_event(
    &mut self,
    ev: &EdgeEvent,
    mut node: NodeIdx,
  ) -> Result<(), Error> {
    loop {
      self.tcx.step()?;
      let next = self.next(node)?;
      if self.x(self.pt(next)) >= self.x(ev.p) {
        return Ok(());
      }
      // Is the next node below the edge?
      if self.orient(ev.q, self.pt(next), ev.p).is_ccw() {
        self.fill_right_below_edge_event(ev, node)?;
      } else {
        node = next;
      }
    }
  }

  fn fill_right_below_edge_event(&mut self, ev: &EdgeEvent, node: NodeIdx) -> Result<(), Error> {
    while self.x(self.pt(node)) < self.x(ev.p) {
      self.tcx.step()?;
      let next = self.next(node)?;
      let next2 = self.next(next)?;
      if self.orient(self.pt(node), self.pt(next), self.pt(next2)).is_ccw() {
        return self.fill_right_concave_edge_event(ev, node);
      }
      // Convex: fill what lies beyond, then retry this node.
      self.fill_right_convex_edge_event(ev, node)?;
    }
    Ok(())
  }

  fn fill_right_concave_edge_event(&mut self, ev: &EdgeEvent, node: NodeIdx) -> Result<(), Error> {
    loop {
      self.tcx.step()?;
      let next = self.next(node)?;
      self.fill(next)?;
      let next = self.next(node)?;
      if self.pt(next) == ev.p || !self.orient(ev.q, self.pt(next), ev.p).is_ccw() {
        return Ok(());
      }
      let next2 = self.next(next)?;
      if !self.orient(self.pt(node), self.pt(next), self.pt(next2)).is_ccw() {
        return Ok(());
      }
    }
  }

  fn fill_right_convex_edge_event(
    &mut self,
    ev: &EdgeEvent,
    mut node: NodeIdx,
  ) -> Result<(), Error> {
    loop {
      self.tcx.step()?;
      let n1 = self.next(node)?;
      let n2 = self.next(n1)?;
      let n3 = self.next(n2)?;
      if self.orient(self.pt(n1), self.pt(n2), self.pt(n3)).is_ccw() {
        return self.fill_right_concave_edge_event(ev, n1);
      }
      if !self.orient(ev.q, self.pt(n2), ev.p).is_ccw() {
        return Ok(());
      }
      node = n1;
    }
  }

  fn fill_left_above_edge_event(&mut self, ev: &EdgeEvent, mut node: NodeIdx) -> Result<(), Error> {
    loop {
      self.tcx.step()?;
      let prev = self.prev(node)?;
      if self.x(self.pt(prev)) <= self.x(ev.p) {
        return Ok(());
      }
      // Is the previous node below the edge?
      if self.orient(ev.q, self.pt(prev), ev.p).is_cw() {
        self.fill_left_below_edge_event(ev, node)?;
      } else {
        node = prev;
      }
    }
  }

  fn fill_left_below_edge_event(&mut self, ev: &EdgeEvent, node: NodeIdx) -> Result<(), Error> {
    while self.x(self.pt(node)) > self.x(ev.p) {
      self.tcx.step()?;
      let prev = self.prev(node)?;
      let prev2 = self.prev(prev)?;
      if self.orient(self.pt(node), self.pt(prev), self.pt(prev2)).is_cw() {
        return self.fill_left_concave_edge_event(ev, node);
      }
      self.fill_left_convex_edge_event(ev, node)?;
    }
    Ok(())
  }

  fn fill_left_concave_edge_event(&mut self, ev: &EdgeEvent, node: NodeIdx) -> Result<(), Error> {
    loop {
      self.tcx.step()?;
      let prev = self.prev(node)?;
      self.fill(prev)?;
      let prev = self.prev(node)?;
      if self.pt(prev) == ev.p || !self.orient(ev.q, self.pt(prev), ev.p).is_cw() {
        return Ok(());
      }
      let prev2 = self.prev(prev)?;
      if !self.orient(self.pt(node), self.pt(prev), self.pt(prev2)).is_cw() {
        return Ok(());
      }
    }
  }

  fn fill_left_convex_edge_event(
    &mut self,
    ev: &EdgeEvent,
    mut node: NodeIdx,
  ) -> Result<(), Error> {
    loop {
      self.tcx.step()?;
      let p1 = self.prev(node)?;
      let p2 = self.prev(p1)?;
      let p3 = self.prev(p2)?;
      if self.orient(self.pt(p1), self.pt(p2), self.pt(p3)).is_cw() {
        return self.fill_left_concave_edge_event(ev, p1);
      }
      if !self.orient(ev.q, self.pt(p2), ev.p).is_cw() {
        return Ok(());
      }
      node = p1;
    }
  }

  /// Walks and flips through the mesh until `ep`-`eq` is an edge.
  fn propagate(&mut self, ev: &mut EdgeEvent, start: Task) -> Result<(), Error> {
    let mut tasks = vec![start];
    while let Some(task) = tasks.pop() {
      self.tcx.step()?;
      match task {
        Task::Edge { ep, eq, t, p } => self.edge_event_step(ev, &mut tasks, ep, eq, t, p)?,
        Task::Flip { ep, eq, t, p } => self.flip_edge_event(ev, &mut tasks, ep, eq, t, p)?,
        Task::FlipScan {
          ep,
          eq,
          flip_t,
          t,
          p,
        } => self.flip_scan_edge_event(&mut tasks, ep, eq, flip_t, t, p)?,
      }
    }
    Ok(())
  }

  fn edge_event_step(
    &mut self,
    ev: &mut EdgeEvent,
    tasks: &mut Vec<Task>,
    ep: VertIdx,
    eq: VertIdx,
    t: TriIdx,
    p: VertIdx,
  ) -> Result<(), Error> {
    if self.is_edge_side_of_triangle(t, ep, eq) {
      return Ok(());
    }

    let p1 = self.tcx.tri(t).point_ccw(p)?;
    let o1 = self.orient(eq, p1, ep);
    if o1.is_colinear() {
      return self.split_at_vertex(ev, tasks, ep, eq, t, p, p1);
    }

    let p2 = self.tcx.tri(t).point_cw(p)?;
    let o2 = self.orient(eq, p2, ep);
    if o2.is_colinear() {
      return self.split_at_vertex(ev, tasks, ep, eq, t, p, p2);
    }

    if o1 == o2 {
      // Rotate around `p` towards the side the edge leaves on.
      let next = if o1.is_cw() {
        self.tcx.tri(t).neighbor_ccw(p)?
      } else {
        self.tcx.tri(t).neighbor_cw(p)?
      };
      let t = next.ok_or(Error::MissingNeighbor)?;
      tasks.push(Task::Edge { ep, eq, t, p });
    } else {
      // The edge crosses this triangle.
      tasks.push(Task::Flip { ep, eq, t, p });
    }
    Ok(())
  }

  // The edge runs through vertex `pc`. Constrain the upper part and carry
  // on with the part below `pc`.
  #[allow(clippy::too_many_arguments)]
  fn split_at_vertex(
    &mut self,
    ev: &mut EdgeEvent,
    tasks: &mut Vec<Task>,
    ep: VertIdx,
    eq: VertIdx,
    t: TriIdx,
    p: VertIdx,
    pc: VertIdx,
  ) -> Result<(), Error> {
    if !self.tcx.tri(t).contains_edge(eq, pc) {
      tracing::warn!(?ep, ?eq, vertex = ?pc, "constrained edge runs through a vertex");
      return Err(Error::UnsupportedCollinearConstraint);
    }
    // Both sides of the split piece act as walls for the flood fill.
    self.tcx.tri_mut(t).mark_constrained_edge(eq, pc);
    let tri = self.tcx.tri(t);
    if let Some(ot) = tri.edge_index(eq, pc).and_then(|i| tri.neighbors[i]) {
      self.tcx.tri_mut(ot).mark_constrained_edge(eq, pc);
    }
    ev.q = pc;
    let t = self
      .tcx
      .tri(t)
      .neighbor_across(p)?
      .ok_or(Error::MissingNeighbor)?;
    tasks.push(Task::Edge {
      ep,
      eq: pc,
      t,
      p: pc,
    });
    Ok(())
  }

  fn flip_edge_event(
    &mut self,
    ev: &EdgeEvent,
    tasks: &mut Vec<Task>,
    ep: VertIdx,
    eq: VertIdx,
    t: TriIdx,
    p: VertIdx,
  ) -> Result<(), Error> {
    let ot = self
      .tcx
      .tri(t)
      .neighbor_across(p)?
      .ok_or(Error::MissingNeighbor)?;
    let op = self.tcx.tri(ot).opposite_point(self.tcx.tri(t), p)?;
    let p_ccw = self.tcx.tri(t).point_ccw(p)?;
    let p_cw = self.tcx.tri(t).point_cw(p)?;

    if !self.in_scan_area(p, p_ccw, p_cw, op) {
      let new_p = self.next_flip_point(ep, eq, ot, op)?;
      tasks.push(Task::Edge { ep, eq, t, p });
      tasks.push(Task::FlipScan {
        ep,
        eq,
        flip_t: t,
        t: ot,
        p: new_p,
      });
      return Ok(());
    }

    self.rotate_triangle_pair(t, p, ot, op)?;
    self.tcx.map_triangle_to_nodes(t)?;
    self.tcx.map_triangle_to_nodes(ot)?;

    if p == eq && op == ep {
      if eq == ev.q && ep == ev.p {
        self.tcx.tri_mut(t).mark_constrained_edge(ep, eq);
        self.tcx.tri_mut(ot).mark_constrained_edge(ep, eq);
        self.legalize(t, false)?;
        self.legalize(ot, false)?;
      }
    } else {
      let o = self.orient(eq, op, ep);
      let t = self.next_flip_triangle(o, t, ot, p, op)?;
      tasks.push(Task::Flip { ep, eq, t, p });
    }
    Ok(())
  }

  // After a flip, legalizes the triangle that no longer crosses the edge
  // and returns the one that still does.
  fn next_flip_triangle(
    &mut self,
    o: Orientation,
    t: TriIdx,
    ot: TriIdx,
    p: VertIdx,
    op: VertIdx,
  ) -> Result<TriIdx, Error> {
    let (done, crossing) = if o.is_ccw() { (ot, t) } else { (t, ot) };
    let i = self
      .tcx
      .tri(done)
      .edge_index(p, op)
      .ok_or(Error::MissingNeighbor)?;
    self.tcx.tri_mut(done).delaunay[i] = true;
    self.legalize(done, false)?;
    self.tcx.tri_mut(done).clear_delaunay();
    Ok(crossing)
  }

  fn next_flip_point(
    &self,
    ep: VertIdx,
    eq: VertIdx,
    ot: TriIdx,
    op: VertIdx,
  ) -> Result<VertIdx, Error> {
    match self.orient(eq, op, ep) {
      Orientation::ClockWise => self.tcx.tri(ot).point_ccw(op),
      Orientation::CounterClockWise => self.tcx.tri(ot).point_cw(op),
      Orientation::CoLinear => {
        tracing::warn!(?ep, ?eq, vertex = ?op, "opposing point on constrained edge");
        Err(Error::UnsupportedCollinearConstraint)
      }
    }
  }

  // Scans for a point that lets the triangle `flip_t` be flipped towards
  // the edge.
  fn flip_scan_edge_event(
    &mut self,
    tasks: &mut Vec<Task>,
    ep: VertIdx,
    eq: VertIdx,
    flip_t: TriIdx,
    t: TriIdx,
    p: VertIdx,
  ) -> Result<(), Error> {
    let ot = self
      .tcx
      .tri(t)
      .neighbor_across(p)?
      .ok_or(Error::MissingNeighbor)?;
    let op = self.tcx.tri(ot).opposite_point(self.tcx.tri(t), p)?;
    let f_ccw = self.tcx.tri(flip_t).point_ccw(eq)?;
    let f_cw = self.tcx.tri(flip_t).point_cw(eq)?;

    if self.in_scan_area(eq, f_ccw, f_cw, op) {
      // Flip with the new edge op -> eq.
      tasks.push(Task::Flip {
        ep: eq,
        eq: op,
        t: ot,
        p: op,
      });
    } else {
      let new_p = self.next_flip_point(ep, eq, ot, op)?;
      tasks.push(Task::FlipScan {
        ep,
        eq,
        flip_t,
        t: ot,
        p: new_p,
      });
    }
    Ok(())
  }

  ///////////////////////////////////////////////////////////////////////////
  // Legalization

  /// Restores the Delaunay property around `t` by flipping. Returns whether
  /// `t` itself was flipped. Triangles that end up legal are mapped to the
  /// front, `t` only if `map_if_legal` is set.
  fn legalize(&mut self, t: TriIdx, map_if_legal: bool) -> Result<bool, Error> {
    let (i, ot, oi) = match self.flip_illegal_edge(t)? {
      Some(flip) => flip,
      None => {
        if map_if_legal {
          self.tcx.map_triangle_to_nodes(t)?;
        }
        return Ok(false);
      }
    };

    let mut stack = vec![Frame::Restore { t, i, ot, oi }, Frame::Legalize(ot), Frame::Legalize(t)];
    while let Some(frame) = stack.pop() {
      self.tcx.step()?;
      match frame {
        Frame::Legalize(t) => match self.flip_illegal_edge(t)? {
          Some((i, ot, oi)) => {
            stack.push(Frame::Restore { t, i, ot, oi });
            stack.push(Frame::Legalize(ot));
            stack.push(Frame::Legalize(t));
          }
          None => self.tcx.map_triangle_to_nodes(t)?,
        },
        Frame::Restore { t, i, ot, oi } => {
          self.tcx.tri_mut(t).delaunay[i] = false;
          self.tcx.tri_mut(ot).delaunay[oi] = false;
        }
      }
    }
    Ok(true)
  }

  // Finds the first edge of `t` violating the empty circle property and
  // flips it. Returns the flipped slots of `t` and its neighbor.
  fn flip_illegal_edge(&mut self, t: TriIdx) -> Result<Option<(usize, TriIdx, usize)>, Error> {
    for i in 0..3 {
      let tri = self.tcx.tri(t);
      if tri.delaunay[i] {
        continue;
      }
      let Some(ot) = tri.neighbors[i] else {
        continue;
      };

      let p = tri.points[i];
      let other = self.tcx.tri(ot);
      let op = other.opposite_point(tri, p)?;
      let oi = other.index(op).ok_or(Error::MissingNeighbor)?;

      // Constrained edges, and edges already checked further up the
      // stack, stay as they are.
      if other.constrained[oi] || other.delaunay[oi] {
        let ce = other.constrained[oi];
        self.tcx.tri_mut(t).constrained[i] = ce;
        continue;
      }

      let (p_ccw, p_cw) = (tri.point_ccw(p)?, tri.point_cw(p)?);
      if self.in_circle(p, p_ccw, p_cw, op) {
        self.tcx.tri_mut(t).delaunay[i] = true;
        self.tcx.tri_mut(ot).delaunay[oi] = true;
        self.rotate_triangle_pair(t, p, ot, op)?;
        return Ok(Some((i, ot, oi)));
      }
    }
    Ok(None)
  }

  /// Turns the edge shared by `t` and `ot` so that it joins `p` and `op`.
  /// Edge flags and outer neighbors move with their edges.
  fn rotate_triangle_pair(
    &mut self,
    t: TriIdx,
    p: VertIdx,
    ot: TriIdx,
    op: VertIdx,
  ) -> Result<(), Error> {
    let (n1, n2, ce1, ce2, de1, de2) = {
      let tri = self.tcx.tri(t);
      (
        tri.neighbor_ccw(p)?,
        tri.neighbor_cw(p)?,
        tri.constrained_ccw(p)?,
        tri.constrained_cw(p)?,
        tri.delaunay_ccw(p)?,
        tri.delaunay_cw(p)?,
      )
    };
    let (n3, n4, ce3, ce4, de3, de4) = {
      let tri = self.tcx.tri(ot);
      (
        tri.neighbor_ccw(op)?,
        tri.neighbor_cw(op)?,
        tri.constrained_ccw(op)?,
        tri.constrained_cw(op)?,
        tri.delaunay_ccw(op)?,
        tri.delaunay_cw(op)?,
      )
    };

    {
      let tri = self.tcx.tri_mut(t);
      tri.legalize(p, op)?;
      tri.set_delaunay_cw(p, de2)?;
      tri.set_delaunay_ccw(op, de3)?;
      tri.set_constrained_cw(p, ce2)?;
      tri.set_constrained_ccw(op, ce3)?;
      tri.clear_neighbors();
    }
    {
      let tri = self.tcx.tri_mut(ot);
      tri.legalize(op, p)?;
      tri.set_delaunay_ccw(p, de1)?;
      tri.set_delaunay_cw(op, de4)?;
      tri.set_constrained_ccw(p, ce1)?;
      tri.set_constrained_cw(op, ce4)?;
      tri.clear_neighbors();
    }

    if let Some(n1) = n1 {
      self.tcx.mark_neighbor(ot, n1);
    }
    if let Some(n2) = n2 {
      self.tcx.mark_neighbor(t, n2);
    }
    if let Some(n3) = n3 {
      self.tcx.mark_neighbor(t, n3);
    }
    if let Some(n4) = n4 {
      self.tcx.mark_neighbor(ot, n4);
    }
    self.tcx.mark_neighbor(t, ot);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::Polygon;
  use crate::SweepConfig;
  use claims::assert_ok;

  fn context(points: &[[f64; 2]], holes: &[usize]) -> SweepContext {
    let poly = Polygon::new(points, holes).unwrap();
    SweepContext::new(&poly, &SweepConfig::default()).unwrap()
  }

  #[test]
  fn rotate_pair_turns_shared_edge() {
    // Unit square split along 1-3 into t = (0,1,3) and ot = (2,3,1).
    let mut tcx = context(&[[0., 0.], [1., 0.], [1., 1.], [0., 1.]], &[]);
    let t = tcx.add_to_map(Triangle::new(VertIdx(0), VertIdx(1), VertIdx(3)));
    let ot = tcx.add_to_map(Triangle::new(VertIdx(2), VertIdx(3), VertIdx(1)));
    tcx.mark_neighbor(t, ot);
    tcx.tri_mut(t).mark_constrained_edge(VertIdx(0), VertIdx(1));

    let mut sweep = Sweep { tcx: &mut tcx };
    assert_ok!(sweep.rotate_triangle_pair(t, VertIdx(0), ot, VertIdx(2)));

    // Both triangles now share the diagonal 0-2 and stay counter-clockwise.
    for idx in [t, ot] {
      let tri = tcx.tri(idx);
      assert!(tri.contains_edge(VertIdx(0), VertIdx(2)));
      let [a, b, c] = tri.points;
      assert!(tcx.orient(a, b, c).is_ccw());
    }
    assert_eq!(tcx.tri(t).neighbor_across(VertIdx(3)), Ok(Some(ot)));
    assert_eq!(tcx.tri(ot).neighbor_across(VertIdx(1)), Ok(Some(t)));
    // The constrained flag followed the edge 0-1 into `ot`.
    let slot = tcx.tri(ot).edge_index(VertIdx(0), VertIdx(1)).unwrap();
    assert!(tcx.tri(ot).constrained[slot]);
    tcx.check_invariant();
  }

  #[test]
  fn sweep_keeps_neighbors_mutual() {
    let mut tcx = context(
      &[
        [0., 0.],
        [8., 2.],
        [9., 0.],
        [9., 3.],
        [1., 1.],
        [0., 3.],
      ],
      &[],
    );
    let mut sweep = Sweep { tcx: &mut tcx };
    assert_ok!(sweep.sweep_points());
    tcx.check_invariant();
    // All live triangles are counter-clockwise.
    for &idx in tcx.map() {
      let [a, b, c] = tcx.tri(idx).points;
      assert!(tcx.orient(a, b, c).is_ccw(), "{:?}", tcx.tri(idx));
    }
  }

  #[test]
  fn hole_edges_are_constrained() {
    let mut tcx = context(
      &[
        [0., 0.],
        [4., 0.],
        [4., 4.],
        [0., 4.],
        [1., 1.],
        [3., 1.],
        [3., 3.],
        [1., 3.],
      ],
      &[4],
    );
    let inside = assert_ok!(triangulate(&mut tcx));
    assert_eq!(inside.len(), 8);
    for &(a, b) in &[(4, 5), (5, 6), (6, 7), (7, 4), (0, 1), (1, 2), (2, 3), (3, 0)] {
      let (a, b) = (VertIdx(a), VertIdx(b));
      let found = inside.iter().any(|&idx| {
        let tri = tcx.tri(idx);
        tri.edge_index(a, b).map_or(false, |i| tri.constrained[i])
      });
      assert!(found, "edge {:?}-{:?} missing", a, b);
    }
  }

  #[test]
  fn split_edge_is_constrained_on_both_sides() {
    // v4 sits on the ring edge v1-v2, which gets split there.
    let poly = Polygon::new(&[[0., 0.], [4., 0.], [4., 4.], [0., 4.]], &[])
      .unwrap()
      .with_steiner_points(&[[4., 2.]])
      .unwrap();
    let mut tcx = SweepContext::new(&poly, &SweepConfig::default()).unwrap();
    let mut sweep = Sweep { tcx: &mut tcx };
    assert_ok!(sweep.sweep_points());
    tcx.check_invariant();
    for (a, b) in [(VertIdx(1), VertIdx(4)), (VertIdx(4), VertIdx(2))] {
      let sides: Vec<bool> = tcx
        .map()
        .iter()
        .filter_map(|&idx| {
          let tri = tcx.tri(idx);
          tri.edge_index(a, b).map(|i| tri.constrained[i])
        })
        .collect();
      assert_eq!(sides, vec![true, true], "edge {:?}-{:?}", a, b);
    }
    // The flood fill stays inside the square.
    let mut sweep = Sweep { tcx: &mut tcx };
    assert_eq!(assert_ok!(sweep.finalization_polygon()).len(), 3);
  }

  #[test]
  fn seed_follows_outer_ring_winding() {
    let tcx = context(&[[0., 0.], [0., 1.], [1., 1.], [1., 0.]], &[]);
    assert_eq!(tcx.seed_edge, (VertIdx(1), VertIdx(0)));
    let tcx = context(&[[0., 0.], [1., 0.], [1., 1.], [0., 1.]], &[]);
    assert_eq!(tcx.seed_edge, (VertIdx(0), VertIdx(1)));
  }

  #[test]
  fn step_budget_is_enforced() {
    let poly = Polygon::new(&[[0., 0.], [1., 0.], [1., 1.], [0., 1.]], &[]).unwrap();
    let config = SweepConfig::default().with_step_budget(3);
    let mut tcx = SweepContext::new(&poly, &config).unwrap();
    assert_eq!(triangulate(&mut tcx), Err(Error::StepBudgetExceeded));
  }
}
