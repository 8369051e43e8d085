//! Velocity field nodes.

use serde::{Deserialize, Serialize};

use crate::types::Point3;

/// A velocity sample location.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Position in the projected coordinate system
    pub position: Point3,
    /// Distance to a reference surface (e.g. groundwater depth), if known
    #[serde(default)]
    pub reference_distance: Option<f64>,
}

impl Node {
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            reference_distance: None,
        }
    }

    /// Attach a reference-surface distance.
    pub fn with_reference_distance(mut self, distance: f64) -> Self {
        self.reference_distance = Some(distance);
        self
    }
}
