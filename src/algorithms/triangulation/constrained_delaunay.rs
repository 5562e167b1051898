use super::sweep;
use super::sweep_context::SweepContext;
use crate::data::{PointId, Polygon};
use crate::{Error, SweepConfig};

/// Computes the constrained Delaunay triangulation of a polygon with holes.
///
/// The points are swept bottom-up; each point adds a triangle to the
/// advancing front and every ring edge ending at that point is forced into
/// the mesh by flips. Triangles are returned counter-clockwise, in the order
/// a flood fill bounded by the ring edges reaches them. Expected time is
/// $O(n \log n)$ for well-behaved input.
///
/// Fails without partial output if the rings overlap, touch, or put a vertex
/// on another ring's edge in a way the sweep cannot resolve.
pub fn constrained_delaunay(
  poly: &Polygon,
  config: &SweepConfig,
) -> Result<Vec<(PointId, PointId, PointId)>, Error> {
  tracing::debug!(
    points = poly.points().len(),
    holes = poly.holes().len(),
    steiner = poly.steiner_points().len(),
    "triangulating polygon"
  );

  let result = sweep_polygon(poly, config);
  match &result {
    Ok(triangles) => tracing::debug!(triangles = triangles.len(), "triangulation done"),
    Err(err) => tracing::warn!(%err, "triangulation failed"),
  }
  result
}

fn sweep_polygon(
  poly: &Polygon,
  config: &SweepConfig,
) -> Result<Vec<(PointId, PointId, PointId)>, Error> {
  let mut tcx = SweepContext::new(poly, config)?;
  let interior = sweep::triangulate(&mut tcx)?;
  tracing::trace!(live = tcx.map().len(), interior = interior.len(), "mesh extracted");
  interior.into_iter().map(|t| tcx.point_ids(t)).collect()
}
