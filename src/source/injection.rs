//! Point-mass injection records.

use serde::{Deserialize, Serialize};

use crate::types::MaterialIndex;

/// Where an injection happens.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InjectionLocation {
    /// Distance along a channel (m)
    Channel { distance: f64 },
    /// Planar surface position (m)
    Surface { x: f64, y: f64 },
}

/// A discrete point-mass contamination event.
///
/// Injections are immutable; multiple injections superpose additively.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Injection {
    pub location: InjectionLocation,
    /// Injection time (ms on the shared time axis)
    pub time_millis: i64,
    /// Injected mass (kg)
    pub mass: f64,
    /// Particle count used by the Lagrangian counterpart, if any
    #[serde(default)]
    pub particles: Option<usize>,
    /// Material tag (surface grids carry one layer per material)
    #[serde(default)]
    pub material: usize,
}

impl Injection {
    /// Injection at a distance along a channel.
    pub fn channel(distance: f64, time_millis: i64, mass: f64) -> Self {
        Self {
            location: InjectionLocation::Channel { distance },
            time_millis,
            mass,
            particles: None,
            material: 0,
        }
    }

    /// Injection at a surface position.
    pub fn surface(x: f64, y: f64, time_millis: i64, mass: f64) -> Self {
        Self {
            location: InjectionLocation::Surface { x, y },
            time_millis,
            mass,
            particles: None,
            material: 0,
        }
    }

    pub fn with_particles(mut self, particles: usize) -> Self {
        self.particles = Some(particles);
        self
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = material;
        self
    }

    pub fn material_index(&self) -> MaterialIndex {
        MaterialIndex::new(self.material)
    }

    /// True if the injection adds mass (positive and finite).
    ///
    /// Non-contributing injections are accepted by the solvers as no-ops.
    #[inline]
    pub fn contributes(&self) -> bool {
        is_contributing(self.mass)
    }
}

/// Positive and finite.
#[inline]
pub(crate) fn is_contributing(mass: f64) -> bool {
    mass.is_finite() && mass > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let inj = Injection::surface(1.0, 2.0, 500, 3.0)
            .with_material(2)
            .with_particles(1000);
        assert_eq!(inj.location, InjectionLocation::Surface { x: 1.0, y: 2.0 });
        assert_eq!(inj.material_index(), MaterialIndex::new(2));
        assert_eq!(inj.particles, Some(1000));
    }

    #[test]
    fn test_contributes() {
        assert!(Injection::channel(0.0, 0, 1.0).contributes());
        assert!(!Injection::channel(0.0, 0, 0.0).contributes());
        assert!(!Injection::channel(0.0, 0, -5.0).contributes());
        assert!(!Injection::channel(0.0, 0, f64::NAN).contributes());
        assert!(!is_contributing(f64::INFINITY));
    }

    #[test]
    fn test_deserialize_location() {
        let inj: Injection =
            serde_json::from_str(r#"{"location":{"distance":500.5},"time_millis":0,"mass":10.0}"#)
                .unwrap();
        assert_eq!(inj.location, InjectionLocation::Channel { distance: 500.5 });
        assert_eq!(inj.material, 0);

        let inj: Injection = serde_json::from_str(
            r#"{"location":{"x":1.0,"y":2.0},"time_millis":1000,"mass":1.0,"material":1}"#,
        )
        .unwrap();
        assert_eq!(inj.location, InjectionLocation::Surface { x: 1.0, y: 2.0 });
    }
}
