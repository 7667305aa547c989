#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::vector::{abs, Vector2};

/// Stable identity of an agent within one world. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AgentId(pub u64);

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single steerable mob
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Agent {
    pub id: AgentId,
    pub position: Vector2,
    pub velocity: Vector2,
    /// Combined steering force of the last tick. Recomputed every tick.
    pub acceleration: Vector2,
    pub target: Vector2,
    pub cohort: Option<u32>,
    /// Set once the agent comes within the approach radius of its target.
    /// Only recreating the agent clears it.
    pub target_reached: bool,
    pub half_width: f32,
    /// Disabled agents are not integrated but still count as peers.
    pub enabled: bool,
}

impl Agent {
    pub fn new(id: AgentId, position: Vector2, velocity: Vector2, target: Vector2) -> Self {
        Self {
            id,
            position,
            velocity,
            acceleration: Vector2::zero(),
            target,
            cohort: None,
            target_reached: false,
            half_width: crate::config::MOB_SIZE / 2.0,
            enabled: true,
        }
    }

    pub fn with_cohort(mut self, cohort: u32) -> Self {
        self.cohort = Some(cohort);
        self
    }

    pub fn with_half_width(mut self, half_width: f32) -> Self {
        self.half_width = half_width;
        self
    }

    /// Whether `point` lies on the agent's square footprint.
    pub fn covers(&self, point: Vector2) -> bool {
        abs(point.x - self.position.x) <= self.half_width
            && abs(point.y - self.position.y) <= self.half_width
    }
}

/// A static circular region agents steer around
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Obstacle {
    pub center: Vector2,
    /// Avoidance radius, clearance included.
    pub radius: f32,
    /// Side of the square the obstacle was built from. Used for picking.
    pub size: f32,
}

impl Obstacle {
    pub fn new(center: Vector2, radius: f32, size: f32) -> Self {
        Self {
            center,
            radius,
            size,
        }
    }

    /// Builds the obstacle occupying grid cell (`cell_x`, `cell_y`) of a grid
    /// with `size`-wide cells. The radius is the square's half-diagonal plus
    /// `clearance`.
    pub fn from_cell(cell_x: i32, cell_y: i32, size: f32, clearance: f32) -> Self {
        let half = size / 2.0;
        let center = Vector2::new(cell_x as f32 * size + half, cell_y as f32 * size + half);
        let radius = size * core::f32::consts::SQRT_2 / 2.0 + clearance;
        Self::new(center, radius, size)
    }

    /// Whether `point` lies inside the avoidance circle.
    pub fn contains(&self, point: Vector2) -> bool {
        self.center.distance(&point) <= self.radius
    }

    /// Whether `point` lies on the obstacle's square.
    pub fn covers(&self, point: Vector2) -> bool {
        let half = self.size / 2.0;
        abs(point.x - self.center.x) <= half && abs(point.y - self.center.y) <= half
    }
}
