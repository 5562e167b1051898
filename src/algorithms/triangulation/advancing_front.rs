use crate::data::{TriIdx, VertIdx};
use crate::Error;

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct NodeIdx(pub usize);
impl std::fmt::Debug for NodeIdx {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "n{}", self.0)
  }
}

#[derive(Debug, Clone)]
pub struct Node {
  pub point: VertIdx,
  /// x coordinate of `point`.
  pub value: f64,
  /// Triangle that has `point` as a vertex and no neighbor across the front
  /// segment leaving this node.
  pub triangle: Option<TriIdx>,
  pub prev: Option<NodeIdx>,
  pub next: Option<NodeIdx>,
}

/// The x-monotone polyline bounding the swept part of the mesh from above.
///
/// Nodes live in an arena and keep their links after being cut out of the
/// list, so a node removed by a fill can still be used to step to its old
/// neighbors.
#[derive(Debug, Clone)]
pub struct AdvancingFront {
  nodes: Vec<Node>,
  head: NodeIdx,
  search: NodeIdx,
}

impl AdvancingFront {
  /// Front of three nodes. Head and middle are attached to `triangle`, the
  /// tail has no triangle yet.
  pub fn new(
    head: (VertIdx, f64),
    middle: (VertIdx, f64),
    tail: (VertIdx, f64),
    triangle: TriIdx,
  ) -> Self {
    let node = |(point, value): (VertIdx, f64), triangle, prev, next| Node {
      point,
      value,
      triangle,
      prev,
      next,
    };
    let nodes = vec![
      node(head, Some(triangle), None, Some(NodeIdx(1))),
      node(middle, Some(triangle), Some(NodeIdx(0)), Some(NodeIdx(2))),
      node(tail, None, Some(NodeIdx(1)), None),
    ];
    AdvancingFront {
      nodes,
      head: NodeIdx(0),
      search: NodeIdx(0),
    }
  }

  #[cfg(test)]
  pub fn head(&self) -> NodeIdx {
    self.head
  }

  // Nothing is ever inserted after the seed's last node.
  #[cfg(test)]
  pub fn tail(&self) -> NodeIdx {
    NodeIdx(2)
  }

  pub fn node(&self, idx: NodeIdx) -> &Node {
    &self.nodes[idx.0]
  }

  pub fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
    &mut self.nodes[idx.0]
  }

  pub fn next(&self, idx: NodeIdx) -> Result<NodeIdx, Error> {
    self.node(idx).next.ok_or(Error::MissingNeighbor)
  }

  pub fn prev(&self, idx: NodeIdx) -> Result<NodeIdx, Error> {
    self.node(idx).prev.ok_or(Error::MissingNeighbor)
  }

  /// Splices a new node for `point` right after `after`.
  pub fn insert_after(
    &mut self,
    after: NodeIdx,
    point: VertIdx,
    value: f64,
  ) -> Result<NodeIdx, Error> {
    let next = self.next(after)?;
    let idx = NodeIdx(self.nodes.len());
    self.nodes.push(Node {
      point,
      value,
      triangle: None,
      prev: Some(after),
      next: Some(next),
    });
    self.node_mut(next).prev = Some(idx);
    self.node_mut(after).next = Some(idx);
    Ok(idx)
  }

  /// Unlinks an inner node. The node keeps its own links.
  pub fn remove(&mut self, idx: NodeIdx) -> Result<(), Error> {
    let prev = self.prev(idx)?;
    let next = self.next(idx)?;
    self.node_mut(prev).next = Some(next);
    self.node_mut(next).prev = Some(prev);
    if self.search == idx {
      self.search = prev;
    }
    Ok(())
  }

  /// The node with the greatest x not exceeding `x`. Walks from the last
  /// node found.
  pub fn locate_node(&mut self, x: f64) -> Option<NodeIdx> {
    let mut node = self.search;
    if x < self.node(node).value {
      while let Some(prev) = self.node(node).prev {
        node = prev;
        if x >= self.node(node).value {
          self.search = node;
          return Some(node);
        }
      }
    } else {
      while let Some(next) = self.node(node).next {
        node = next;
        if x < self.node(node).value {
          let found = self.node(node).prev?;
          self.search = found;
          return Some(found);
        }
      }
    }
    None
  }

  /// The node holding `point`, whose x coordinate is `x`.
  pub fn locate_point(&mut self, point: VertIdx, x: f64) -> Option<NodeIdx> {
    let search = self.search;
    let nx = self.node(search).value;
    let found = if x == nx {
      // Two nodes may briefly share an x coordinate.
      let candidates = [Some(search), self.node(search).prev, self.node(search).next];
      candidates
        .into_iter()
        .flatten()
        .find(|&n| self.node(n).point == point)
        .or_else(|| self.scan(point))
    } else if x < nx {
      self.walk(search, point, |n| n.prev)
    } else {
      self.walk(search, point, |n| n.next)
    };
    if let Some(node) = found {
      self.search = node;
    }
    found
  }

  fn walk(
    &self,
    from: NodeIdx,
    point: VertIdx,
    step: impl Fn(&Node) -> Option<NodeIdx>,
  ) -> Option<NodeIdx> {
    let mut node = from;
    while let Some(n) = step(self.node(node)) {
      node = n;
      if self.node(node).point == point {
        return Some(node);
      }
    }
    None
  }

  fn scan(&self, point: VertIdx) -> Option<NodeIdx> {
    self.iter().find(|&n| self.node(n).point == point)
  }

  /// Live nodes from head to tail.
  pub fn iter(&self) -> impl Iterator<Item = NodeIdx> + '_ {
    std::iter::successors(Some(self.head), move |&n| self.node(n).next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use claims::{assert_ok, assert_some_eq};

  // head(-1) -> v0(0) -> tail(5)
  fn front() -> AdvancingFront {
    AdvancingFront::new((VertIdx(10), -1.0), (VertIdx(0), 0.0), (VertIdx(11), 5.0), TriIdx(0))
  }

  fn points(front: &AdvancingFront) -> Vec<VertIdx> {
    front.iter().map(|n| front.node(n).point).collect()
  }

  #[test]
  fn seed_front() {
    let f = front();
    assert_eq!(points(&f), vec![VertIdx(10), VertIdx(0), VertIdx(11)]);
    assert_eq!(f.node(f.head()).triangle, Some(TriIdx(0)));
    assert_eq!(f.node(f.tail()).triangle, None);
  }

  #[test]
  fn insert_and_remove() {
    let mut f = front();
    let mid = NodeIdx(1);
    let a = assert_ok!(f.insert_after(mid, VertIdx(1), 2.0));
    assert_eq!(points(&f), vec![VertIdx(10), VertIdx(0), VertIdx(1), VertIdx(11)]);
    assert_ok!(f.remove(mid));
    assert_eq!(points(&f), vec![VertIdx(10), VertIdx(1), VertIdx(11)]);
    // A removed node still knows its old neighbors.
    assert_eq!(f.node(mid).next, Some(a));
    assert!(f.remove(f.head()).is_err());
  }

  #[test]
  fn locate_node_greatest_x_not_above() {
    let mut f = front();
    let a = assert_ok!(f.insert_after(NodeIdx(1), VertIdx(1), 2.0));
    assert_some_eq!(f.locate_node(1.0), NodeIdx(1));
    assert_some_eq!(f.locate_node(2.0), a);
    assert_some_eq!(f.locate_node(4.9), a);
    assert_some_eq!(f.locate_node(-0.5), f.head());
    assert_eq!(f.locate_node(-3.0), None);
    assert_eq!(f.locate_node(7.0), None);
  }

  #[test]
  fn locate_point_with_shared_x() {
    let mut f = front();
    let a = assert_ok!(f.insert_after(NodeIdx(1), VertIdx(1), 0.0));
    assert_some_eq!(f.locate_point(VertIdx(0), 0.0), NodeIdx(1));
    assert_some_eq!(f.locate_point(VertIdx(1), 0.0), a);
    assert_some_eq!(f.locate_point(VertIdx(11), 5.0), f.tail());
    assert_some_eq!(f.locate_point(VertIdx(10), -1.0), f.head());
    assert_eq!(f.locate_point(VertIdx(7), 3.0), None);
  }

  #[test]
  fn removing_search_node_keeps_lookups_on_front() {
    let mut f = front();
    let a = assert_ok!(f.insert_after(NodeIdx(1), VertIdx(1), 2.0));
    assert_some_eq!(f.locate_node(0.5), NodeIdx(1));
    assert_ok!(f.remove(NodeIdx(1)));
    assert_some_eq!(f.locate_node(0.5), f.head());
    assert_some_eq!(f.locate_node(3.0), a);
  }
}
