#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::AgentId;
use crate::vector::Vector2;

/// Which agents a target update applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TargetSelector {
    All,
    Cohort(u32),
    Agent(AgentId),
}

impl TargetSelector {
    pub fn matches(&self, id: AgentId, cohort: Option<u32>) -> bool {
        match *self {
            TargetSelector::All => true,
            TargetSelector::Cohort(k) => cohort == Some(k),
            TargetSelector::Agent(wanted) => wanted == id,
        }
    }
}

/// Structural change to a world, applied between ticks
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Command {
    /// Add an agent. A missing position is drawn at random inside the world;
    /// a missing target falls back to the cohort's target, then the world's.
    SpawnAgent {
        #[cfg_attr(feature = "serde", serde(default))]
        position: Option<Vector2>,
        #[cfg_attr(feature = "serde", serde(default))]
        cohort: Option<u32>,
        #[cfg_attr(feature = "serde", serde(default))]
        target: Option<Vector2>,
    },
    /// Remove every agent whose footprint covers `point`.
    RemoveAgentAt { point: Vector2 },
    /// Add a wall on grid cell (`cell_x`, `cell_y`) of `size`-wide cells.
    AddObstacle { cell_x: i32, cell_y: i32, size: f32 },
    /// Remove every obstacle whose square covers `point`.
    RemoveObstacleAt { point: Vector2 },
    SetTarget {
        selector: TargetSelector,
        point: Vector2,
    },
    SetEnabled { agent: AgentId, enabled: bool },
}
