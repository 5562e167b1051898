mod edge;
pub(crate) mod point;
pub mod polygon;
mod triangle;

pub use edge::Edge;
pub use point::Point;
#[doc(inline)]
pub use polygon::{PointId, Polygon};
pub use triangle::{TriIdx, Triangle, VertIdx};
