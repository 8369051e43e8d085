//! Scenario configuration.
//!
//! A scenario bundles a time axis, an optional channel, an optional surface
//! and a list of injections. Configurations deserialize from JSON and build
//! ready-to-solve solvers.
//!
//! # Example
//!
//! ```
//! use adr_rs::config::ScenarioConfig;
//! use adr_rs::types::TimeIndex;
//!
//! let json = r#"{
//!     "time_axis": { "start_millis": 0, "step_millis": 1000, "count": 101 },
//!     "channel": { "segment_count": 1000, "total_length": 1000.0, "velocity": 1.0 },
//!     "injections": [
//!         { "location": { "distance": 500.5 }, "time_millis": 0, "mass": 10.0 }
//!     ]
//! }"#;
//!
//! let config = ScenarioConfig::from_json_str(json).unwrap();
//! let mut scenario = config.build().unwrap();
//! scenario.solve().unwrap();
//!
//! let channel = scenario.channel.as_ref().unwrap();
//! let m1 = channel.first_moment(TimeIndex::new(100)).unwrap();
//! assert!((m1 - 600.5).abs() < 1e-6);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::mesh::{ChannelMesh, Raster2D};
use crate::solver::{ChannelFlow, ChannelTransportSolver, SurfaceFlow, SurfaceTransportSolver};
use crate::source::{Injection, InjectionLocation};
use crate::time::TimeAxis;

fn default_one() -> f64 {
    1.0
}

fn default_materials() -> usize {
    1
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] TransportError),
    #[error("Injection {index} targets a {kind} but the scenario has none")]
    MissingGeometry { index: usize, kind: &'static str },
}

/// Time axis definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeAxisConfig {
    /// `count` timestamps `step_millis` apart
    Uniform {
        #[serde(default)]
        start_millis: i64,
        step_millis: i64,
        count: usize,
    },
    /// Explicit strictly increasing timestamps
    Explicit { timestamps: Vec<i64> },
}

impl TimeAxisConfig {
    pub fn build(&self) -> Result<TimeAxis, TransportError> {
        match self {
            TimeAxisConfig::Uniform {
                start_millis,
                step_millis,
                count,
            } => TimeAxis::uniform(*start_millis, *step_millis, *count),
            TimeAxisConfig::Explicit { timestamps } => TimeAxis::new(timestamps.clone()),
        }
    }
}

/// Channel geometry and flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Number of equal segments
    pub segment_count: usize,
    /// Channel length (m)
    pub total_length: f64,
    /// Flow velocity (m/s)
    pub velocity: f64,
    /// Water level (m)
    #[serde(default = "default_one")]
    pub water_level: f64,
    /// Channel width (m)
    #[serde(default = "default_one")]
    pub width: f64,
    /// Dispersion coefficient (m²/s)
    #[serde(default)]
    pub dispersion: f64,
}

impl ChannelConfig {
    pub fn build_solver(
        &self,
        axis: Arc<TimeAxis>,
    ) -> Result<ChannelTransportSolver, TransportError> {
        let mesh = ChannelMesh::uniform(self.total_length, self.segment_count)?;
        let flow = ChannelFlow::new(self.velocity, self.water_level, self.width, self.dispersion)?;
        ChannelTransportSolver::builder()
            .mesh(Arc::new(mesh))
            .flow(flow)
            .time_axis(axis)
            .build()
    }
}

/// Surface raster and flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Lower-left raster corner `[x, y]`
    #[serde(default)]
    pub origin: [f64; 2],
    pub cell_width: f64,
    pub cell_height: f64,
    pub nx: usize,
    pub ny: usize,
    /// Flow velocity `[vx, vy]` (m/s)
    #[serde(default)]
    pub velocity: [f64; 2],
    /// Water depth (m)
    #[serde(default = "default_one")]
    pub depth: f64,
    /// Dispersion `[Dx, Dy]` (m²/s)
    #[serde(default)]
    pub dispersion: [f64; 2],
    /// First-timestep offset ε0 (s)
    #[serde(default)]
    pub first_step_offset: f64,
    /// Elapsed time used at τ = 0 (s); omitted means point deposit
    #[serde(default)]
    pub elapsed_floor: Option<f64>,
    /// Number of material layers
    #[serde(default = "default_materials")]
    pub materials: usize,
}

impl SurfaceConfig {
    pub fn build_solver(
        &self,
        axis: Arc<TimeAxis>,
    ) -> Result<SurfaceTransportSolver, TransportError> {
        let raster = Raster2D::new(
            (self.origin[0], self.origin[1]),
            self.cell_width,
            self.cell_height,
            self.nx,
            self.ny,
        )?;
        let mut flow = SurfaceFlow::new(self.velocity, self.depth, self.dispersion)?
            .with_first_step_offset(self.first_step_offset);
        if let Some(eps) = self.elapsed_floor {
            flow = flow.with_elapsed_floor(eps);
        }
        SurfaceTransportSolver::builder()
            .raster(Arc::new(raster))
            .flow(flow)
            .time_axis(axis)
            .materials(self.materials)
            .build()
    }
}

/// Complete scenario definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub time_axis: TimeAxisConfig,
    #[serde(default)]
    pub channel: Option<ChannelConfig>,
    #[serde(default)]
    pub surface: Option<SurfaceConfig>,
    #[serde(default)]
    pub injections: Vec<Injection>,
}

impl ScenarioConfig {
    /// Parse a scenario from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every injection has matching geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, inj) in self.injections.iter().enumerate() {
            match inj.location {
                InjectionLocation::Channel { .. } if self.channel.is_none() => {
                    return Err(ConfigError::MissingGeometry {
                        index,
                        kind: "channel",
                    });
                }
                InjectionLocation::Surface { .. } if self.surface.is_none() => {
                    return Err(ConfigError::MissingGeometry {
                        index,
                        kind: "surface",
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Build solvers and register every injection with its solver.
    pub fn build(&self) -> Result<Scenario, ConfigError> {
        self.validate()?;
        let axis = Arc::new(self.time_axis.build()?);

        let mut channel = self
            .channel
            .as_ref()
            .map(|c| c.build_solver(Arc::clone(&axis)))
            .transpose()?;
        let mut surface = self
            .surface
            .as_ref()
            .map(|s| s.build_solver(Arc::clone(&axis)))
            .transpose()?;

        for inj in &self.injections {
            match (inj.location, channel.as_mut(), surface.as_mut()) {
                (InjectionLocation::Channel { .. }, Some(c), _) => c.add_injection(*inj),
                (InjectionLocation::Surface { .. }, _, Some(s)) => s.add_injection(*inj),
                _ => unreachable!("validated above"),
            }
        }

        Ok(Scenario {
            axis,
            channel,
            surface,
        })
    }
}

/// Solvers built from a [`ScenarioConfig`], sharing one time axis.
pub struct Scenario {
    pub axis: Arc<TimeAxis>,
    pub channel: Option<ChannelTransportSolver>,
    pub surface: Option<SurfaceTransportSolver>,
}

impl Scenario {
    /// Solve every configured solver.
    pub fn solve(&mut self) -> Result<(), TransportError> {
        if let Some(c) = self.channel.as_mut() {
            c.solve()?;
        }
        if let Some(s) = self.surface.as_mut() {
            s.solve()?;
        }
        Ok(())
    }
}
