//! Tunable parameters for the steering model and the world that runs it.
//!
//! Every behavior flag that differs between simulation profiles is an
//! enumerated option here, and each profile is a preset constructor on
//! [`SteeringConfig`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const WIDTH: f32 = 800.0;
pub const HEIGHT: f32 = 640.0;
pub const FPS: f32 = 60.0;
pub const MOB_SIZE: f32 = 16.0;
pub const MAX_SPEED: f32 = 4.0;
pub const MAX_FORCE: f32 = 0.3;
pub const APPROACH_RADIUS: f32 = 120.0;
pub const SEPARATION_RADIUS: f32 = 30.0;
/// Clearance added to an obstacle's half-diagonal.
pub const WALL_LIMIT: f32 = 20.0;
pub const LOOK_AHEAD: f32 = 40.0;
/// Side length of one obstacle grid cell.
pub const CELL_SIZE: f32 = 32.0;

/// What happens when an agent leaves the world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BoundaryPolicy {
    /// Reflect the crossing velocity component and clamp back inside.
    #[default]
    Bounce,
    /// Re-enter from the opposite edge with unchanged velocity.
    Wrap,
}

/// Which peers an agent aligns and coheres with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FlockingScope {
    /// Every other agent.
    Global,
    /// Only agents sharing the same cohort. Agents without a cohort still
    /// flock with everyone.
    #[default]
    Cohort,
}

/// How obstacles push agents away
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AvoidancePolicy {
    /// Repel from every obstacle the agent currently overlaps, proportional
    /// to penetration depth. `gain` multiplies the clamped force when the
    /// behaviors are combined.
    RadiusRepulsion { gain: f32 },
    /// Probe two points ahead along the heading and steer away from the
    /// nearest obstacle that contains either of them.
    LookAhead,
}

impl Default for AvoidancePolicy {
    fn default() -> Self {
        AvoidancePolicy::RadiusRepulsion { gain: 2.0 }
    }
}

/// Whether arrival stops the seek behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ArrivalPolicy {
    /// Seeking is suppressed for good once the target has been reached.
    #[default]
    Latch,
    /// The arrival flag is still recorded but the agent keeps seeking,
    /// which suits a target that moves every frame.
    Continuous,
}

/// Per-behavior multipliers applied when forces are combined
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Weights {
    pub seek: f32,
    pub avoid: f32,
    pub separation: f32,
    pub alignment: f32,
    pub cohesion: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            seek: 1.0,
            avoid: 1.5,
            separation: 2.0,
            alignment: 1.0,
            cohesion: 1.0,
        }
    }
}

/// Configuration for the steering simulation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct SteeringConfig {
    /// World extent along x.
    pub width: f32,
    /// World extent along y.
    pub height: f32,
    /// Nominal frame rate. A step of `1 / fps` integrates exactly one frame.
    pub fps: f32,
    /// Side of an agent's square footprint.
    pub agent_size: f32,
    pub max_speed: f32,
    /// Upper bound for every individual steering force.
    pub max_force: f32,
    /// Seek slows down linearly inside this distance of the target.
    pub approach_radius: f32,
    pub separation_radius: f32,
    /// Clearance added to an obstacle's geometric radius.
    pub wall_limit: f32,
    /// Probe distance at full speed for look-ahead avoidance.
    pub look_ahead: f32,
    pub weights: Weights,
    pub boundary: BoundaryPolicy,
    pub flocking: FlockingScope,
    pub avoidance: AvoidancePolicy,
    pub arrival: ArrivalPolicy,
    /// Seed for the world's random spawn positions and headings.
    pub seed: u64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self::lanes()
    }
}

impl SteeringConfig {
    fn base() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            fps: FPS,
            agent_size: MOB_SIZE,
            max_speed: MAX_SPEED,
            max_force: MAX_FORCE,
            approach_radius: APPROACH_RADIUS,
            separation_radius: SEPARATION_RADIUS,
            wall_limit: WALL_LIMIT,
            look_ahead: LOOK_AHEAD,
            weights: Weights::default(),
            boundary: BoundaryPolicy::Bounce,
            flocking: FlockingScope::Cohort,
            avoidance: AvoidancePolicy::default(),
            arrival: ArrivalPolicy::Latch,
            seed: 42,
        }
    }

    /// A single agent chasing a live target point (e.g. the cursor) in a
    /// toroidal world, dodging walls with look-ahead probes.
    pub fn mouse_follow() -> Self {
        Self {
            max_force: 0.15,
            look_ahead: 20.0,
            weights: Weights {
                seek: 1.0,
                avoid: 2.0,
                separation: 0.0,
                alignment: 0.0,
                cohesion: 0.0,
            },
            boundary: BoundaryPolicy::Wrap,
            flocking: FlockingScope::Global,
            avoidance: AvoidancePolicy::LookAhead,
            arrival: ArrivalPolicy::Continuous,
            ..Self::base()
        }
    }

    /// One flock squeezing through a narrow gap toward a fixed target.
    pub fn bottleneck() -> Self {
        Self {
            separation_radius: 50.0,
            weights: Weights {
                seek: 0.5,
                avoid: 1.5,
                separation: 1.5,
                alignment: 1.0,
                cohesion: 1.0,
            },
            flocking: FlockingScope::Global,
            arrival: ArrivalPolicy::Continuous,
            ..Self::base()
        }
    }

    /// Two cohorts crossing through a shared gap toward opposite targets.
    pub fn lanes() -> Self {
        Self::base()
    }

    pub fn half_width(&self) -> f32 {
        self.agent_size / 2.0
    }

    pub fn frame_time(&self) -> f32 {
        1.0 / self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lanes() {
        let config = SteeringConfig::default();
        assert_eq!(config, SteeringConfig::lanes());
        assert_eq!(config.flocking, FlockingScope::Cohort);
        assert_eq!(config.arrival, ArrivalPolicy::Latch);
        assert_eq!(config.separation_radius, 30.0);
    }

    #[test]
    fn test_presets_differ_in_policy() {
        let mouse = SteeringConfig::mouse_follow();
        assert_eq!(mouse.boundary, BoundaryPolicy::Wrap);
        assert_eq!(mouse.avoidance, AvoidancePolicy::LookAhead);
        assert_eq!(mouse.max_force, 0.15);

        let bottleneck = SteeringConfig::bottleneck();
        assert_eq!(bottleneck.boundary, BoundaryPolicy::Bounce);
        assert_eq!(bottleneck.flocking, FlockingScope::Global);
        assert_eq!(bottleneck.weights.seek, 0.5);
    }

    #[test]
    fn test_half_width_and_frame_time() {
        let config = SteeringConfig::default();
        assert_eq!(config.half_width(), 8.0);
        assert!((config.frame_time() - 1.0 / 60.0).abs() < 1e-6);
    }
}
