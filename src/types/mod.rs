//! Strongly-typed domain types for safer APIs.
//!
//! Newtypes keep segment, time, node and material indices apart so a
//! timestep can never be passed where a segment is expected.
//!
//! # Example
//!
//! ```
//! use adr_rs::types::{Bounds2D, Point3, SegmentIndex, TimeIndex};
//!
//! let seg = SegmentIndex::new(10);
//! let t = TimeIndex::new(3);
//! assert_ne!(seg.get(), t.get());
//!
//! let p = Point3::new(1.0, 2.0, 3.0);
//! assert_eq!(p.distance_squared(&Point3::new(1.0, 2.0, 3.0)), 0.0);
//!
//! let bounds = Bounds2D::new(0.0, 10.0, 0.0, 5.0);
//! assert_eq!(bounds.width(), 10.0);
//! ```

mod bounds;
mod indices;
mod point;

pub use bounds::Bounds2D;
pub use indices::{CellIndex, MaterialIndex, NodeIndex, SegmentIndex, TimeIndex};
pub use point::Point3;
