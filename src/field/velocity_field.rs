//! Velocity field storage and queries.

use std::sync::{Arc, OnceLock};

use crate::error::{Result, TransportError};
use crate::time::TimeAxis;
use crate::types::{Bounds2D, NodeIndex, Point3, TimeIndex};

use super::{Node, SearchTolerance};

/// Resultant speed of a velocity vector.
#[inline]
pub fn speed(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Node positions with a velocity vector per (timestep, node).
///
/// Immutable after construction. Elevation bounds are computed eagerly;
/// extreme speeds are computed on first request.
#[derive(Debug)]
pub struct VelocityField {
    nodes: Vec<Node>,
    /// Row-major `[time][node]`
    velocity: Vec<[f64; 3]>,
    axis: Arc<TimeAxis>,
    elevation_bounds: (f64, f64),
    horizontal_bounds: Bounds2D,
    extreme_speeds: OnceLock<(f64, f64)>,
}

impl VelocityField {
    /// Build a field from nodes and `velocity[time][node]` rows.
    ///
    /// # Errors
    /// - `DimensionMismatch` if there are no nodes, if the number of rows
    ///   differs from the axis length, or if any row differs from the node count
    /// - `NonFinite` if a node position is NaN or infinite
    pub fn new(
        nodes: Vec<Node>,
        velocity: Vec<Vec<[f64; 3]>>,
        axis: Arc<TimeAxis>,
    ) -> Result<Self> {
        if nodes.is_empty() {
            return Err(TransportError::DimensionMismatch {
                what: "velocity field nodes",
                expected: 1,
                actual: 0,
            });
        }
        if velocity.len() != axis.len() {
            return Err(TransportError::DimensionMismatch {
                what: "velocity timesteps",
                expected: axis.len(),
                actual: velocity.len(),
            });
        }
        if let Some(row) = velocity.iter().find(|row| row.len() != nodes.len()) {
            return Err(TransportError::DimensionMismatch {
                what: "velocity nodes per timestep",
                expected: nodes.len(),
                actual: row.len(),
            });
        }
        if nodes.iter().any(|n| {
            !(n.position.x.is_finite() && n.position.y.is_finite() && n.position.z.is_finite())
        }) {
            return Err(TransportError::NonFinite {
                what: "node position",
            });
        }

        let elevation_bounds = nodes.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, n| {
            (acc.0.min(n.position.z), acc.1.max(n.position.z))
        });
        let horizontal_bounds =
            Bounds2D::from_points(nodes.iter().map(|n| (n.position.x, n.position.y))).ok_or(
                TransportError::DimensionMismatch {
                    what: "velocity field nodes",
                    expected: 1,
                    actual: 0,
                },
            )?;
        let velocity = velocity.into_iter().flatten().collect();

        Ok(Self {
            nodes,
            velocity,
            axis,
            elevation_bounds,
            horizontal_bounds,
            extreme_speeds: OnceLock::new(),
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Horizontal extent of the nodes, e.g. for sizing a covering raster.
    pub fn horizontal_bounds(&self) -> Bounds2D {
        self.horizontal_bounds
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn time_axis(&self) -> &Arc<TimeAxis> {
        &self.axis
    }

    /// Velocity sample at (timestep, node).
    ///
    /// # Panics
    /// Panics if either index is out of range.
    #[inline]
    pub fn velocity(&self, t: TimeIndex, node: NodeIndex) -> [f64; 3] {
        assert!(
            node.get() < self.nodes.len(),
            "node index {} out of range (0..{})",
            node,
            self.nodes.len()
        );
        self.velocity[t.get() * self.nodes.len() + node.get()]
    }

    /// Nearest node to `point` within per-axis thresholds.
    ///
    /// Nodes outside the bounding thresholds are rejected before the
    /// distance is computed. Squared distances are compared.
    pub fn nearest_node(&self, point: Point3, max_xy: f64, max_z: f64) -> Option<NodeIndex> {
        self.nearest_node_within(point, SearchTolerance::new(max_xy, max_z))
    }

    /// Nearest node using the coarse (sparse 3D grid) tolerance.
    pub fn nearest_node_coarse(&self, point: Point3) -> Option<NodeIndex> {
        self.nearest_node_within(point, SearchTolerance::coarse())
    }

    /// Nearest node using the fine tolerance, for points projected from
    /// geographic coordinates.
    pub fn nearest_node_fine(&self, point: Point3) -> Option<NodeIndex> {
        self.nearest_node_within(point, SearchTolerance::fine())
    }

    /// Nearest node with an explicit tolerance.
    pub fn nearest_node_within(
        &self,
        point: Point3,
        tolerance: SearchTolerance,
    ) -> Option<NodeIndex> {
        let mut best: Option<(usize, f64)> = None;

        for (i, node) in self.nodes.iter().enumerate() {
            let d = node.position - point;
            if !tolerance.admits(d.x, d.y, d.z) {
                continue;
            }
            let dist_sq = d.x * d.x + d.y * d.y + d.z * d.z;
            match best {
                Some((_, best_sq)) if dist_sq >= best_sq => {}
                _ => best = Some((i, dist_sq)),
            }
        }

        best.map(|(i, _)| NodeIndex::new(i))
    }

    /// Time-interpolated velocity at the node nearest to `point`.
    ///
    /// Returns `None` if no node lies within `tolerance`. Query times past
    /// the last timestep return the last sample; times on an axis entry
    /// return that sample unchanged.
    pub fn velocity_at(
        &self,
        point: Point3,
        time_millis: i64,
        tolerance: SearchTolerance,
    ) -> Option<[f64; 3]> {
        let node = self.nearest_node_within(point, tolerance)?;
        Some(self.velocity_at_node(node, time_millis))
    }

    /// Time-interpolated velocity at a known node.
    pub fn velocity_at_node(&self, node: NodeIndex, time_millis: i64) -> [f64; 3] {
        let f = self.axis.fractional_index(time_millis);
        let lower = self.velocity(f.index, node);

        if f.fraction == 0.0 {
            return lower;
        }
        let upper_index = f.index.next();
        if upper_index.get() >= self.axis.len() {
            return self.velocity(self.axis.last_index(), node);
        }

        let upper = self.velocity(upper_index, node);
        let w = f.fraction;
        [
            lower[0] + (upper[0] - lower[0]) * w,
            lower[1] + (upper[1] - lower[1]) * w,
            lower[2] + (upper[2] - lower[2]) * w,
        ]
    }

    /// Minimum and maximum node elevation.
    pub fn elevation_bounds(&self) -> (f64, f64) {
        self.elevation_bounds
    }

    /// Minimum and maximum resultant speed over every (timestep, node).
    pub fn extreme_speeds(&self) -> (f64, f64) {
        *self.extreme_speeds.get_or_init(|| {
            self.velocity
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |acc, &v| {
                    let s = speed(v);
                    (acc.0.min(s), acc.1.max(s))
                })
        })
    }

    /// Mean velocity vector over all nodes at timestep `t`.
    pub fn mean_velocity(&self, t: TimeIndex) -> [f64; 3] {
        let n = self.nodes.len();
        let row = &self.velocity[t.get() * n..(t.get() + 1) * n];
        let sum = row.iter().fold([0.0; 3], |acc, v| {
            [acc[0] + v[0], acc[1] + v[1], acc[2] + v[2]]
        });
        [sum[0] / n as f64, sum[1] / n as f64, sum[2] / n as f64]
    }
}
