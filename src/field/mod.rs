//! Spatiotemporal velocity fields.
//!
//! A [`VelocityField`] holds node positions, a shared [`TimeAxis`](crate::time::TimeAxis)
//! and a 3D velocity vector per (timestep, node). It answers nearest-node
//! queries and time-interpolated velocity queries.
//!
//! # Example
//!
//! ```
//! use adr_rs::field::{Node, SearchTolerance, VelocityField};
//! use adr_rs::time::TimeAxis;
//! use adr_rs::types::Point3;
//!
//! let axis = TimeAxis::new(vec![0, 10_000]).unwrap().shared();
//! let nodes = vec![Node::new(Point3::new(0.0, 0.0, 0.0))];
//! let velocity = vec![vec![[1.0, 0.0, 0.0]], vec![[3.0, 0.0, 0.0]]];
//! let field = VelocityField::new(nodes, velocity, axis).unwrap();
//!
//! let v = field
//!     .velocity_at(Point3::new(1.0, 1.0, 0.0), 5_000, SearchTolerance::coarse())
//!     .unwrap();
//! assert!((v[0] - 2.0).abs() < 1e-12);
//! ```

mod node;
mod tolerance;
mod velocity_field;

pub use node::Node;
pub use tolerance::SearchTolerance;
pub use velocity_field::{VelocityField, speed};
