use mob_core::{AgentId, Command, Scenario, SteeringConfig, TargetSelector, Vector2, Weights, World};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents a 2D position in world coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        Vector2::from(*self).distance(&Vector2::from(*other))
    }
}

impl From<Position> for Vector2 {
    fn from(position: Position) -> Self {
        Vector2::new(position.x, position.y)
    }
}

impl From<Vector2> for Position {
    fn from(vector: Vector2) -> Self {
        Position::new(vector.x, vector.y)
    }
}

/// Live target update from an input device, e.g. the cursor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetPositionUpdate {
    /// Optional target position (None leaves the current targets in place)
    pub position: Option<Position>,
}

impl TargetPositionUpdate {
    /// The world command that retargets every agent, if any.
    pub fn to_command(&self) -> Option<Command> {
        self.position.map(|position| Command::SetTarget {
            selector: TargetSelector::All,
            point: position.into(),
        })
    }
}

/// Partial tuning update. Missing fields keep their current values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsUpdate {
    pub weights: Option<Weights>,
    pub max_speed: Option<f32>,
    pub max_force: Option<f32>,
}

impl SettingsUpdate {
    /// Applies the update only if the result is still a valid
    /// configuration. On error `config` is left as it was.
    pub fn apply_to(&self, config: &mut SteeringConfig) -> Result<(), SettingsError> {
        let mut updated = config.clone();
        if let Some(weights) = self.weights {
            updated.weights = weights;
        }
        if let Some(max_speed) = self.max_speed {
            updated.max_speed = max_speed;
        }
        if let Some(max_force) = self.max_force {
            updated.max_force = max_force;
        }

        validate_config(&updated)?;
        *config = updated;
        Ok(())
    }
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f32 },
}

/// Everything needed to set up a run: which layout, and how it is tuned
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    pub scenario: Scenario,
    /// Tuning overrides, merged field by field onto the scenario's preset.
    pub steering: Option<serde_json::Value>,
}

impl SimulationSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: SimulationSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The scenario preset with any overrides applied.
    pub fn config(&self) -> Result<SteeringConfig, SettingsError> {
        let preset = self.scenario.config();
        let Some(overrides) = &self.steering else {
            return Ok(preset);
        };

        let mut merged = serde_json::to_value(preset)?;
        merge(&mut merged, overrides.clone());
        Ok(serde_json::from_value(merged)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_config(&self.config()?)
    }

    pub fn build_world(&self) -> Result<World, SettingsError> {
        Ok(World::from_scenario(self.scenario, self.config()?))
    }
}

/// Checks that every size, speed and rate is positive and every force,
/// radius, weight and gain is non-negative. Non-finite values are rejected.
pub fn validate_config(config: &SteeringConfig) -> Result<(), SettingsError> {
    for (field, value) in [
        ("width", config.width),
        ("height", config.height),
        ("fps", config.fps),
        ("agent_size", config.agent_size),
        ("max_speed", config.max_speed),
        ("approach_radius", config.approach_radius),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(SettingsError::NotPositive { field, value });
        }
    }

    let weights = config.weights;
    for (field, value) in [
        ("max_force", config.max_force),
        ("separation_radius", config.separation_radius),
        ("wall_limit", config.wall_limit),
        ("look_ahead", config.look_ahead),
        ("weights.seek", weights.seek),
        ("weights.avoid", weights.avoid),
        ("weights.separation", weights.separation),
        ("weights.alignment", weights.alignment),
        ("weights.cohesion", weights.cohesion),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(SettingsError::Negative { field, value });
        }
    }

    if let mob_core::AvoidancePolicy::RadiusRepulsion { gain } = config.avoidance {
        if !(gain.is_finite() && gain >= 0.0) {
            return Err(SettingsError::Negative {
                field: "avoidance.gain",
                value: gain,
            });
        }
    }

    Ok(())
}

fn merge(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

/// State of one agent as handed to a renderer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Position,
    pub velocity: Position,
    /// Only needed to draw debug vectors.
    pub acceleration: Position,
    pub cohort: Option<u32>,
    pub target_reached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObstacleSnapshot {
    pub center: Position,
    pub radius: f32,
}

/// Everything a renderer needs after one tick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub agents: Vec<AgentSnapshot>,
    pub obstacles: Vec<ObstacleSnapshot>,
}

impl FrameSnapshot {
    pub fn capture(world: &World) -> Self {
        Self {
            tick: world.tick_count(),
            agents: world
                .agents()
                .iter()
                .map(|agent| AgentSnapshot {
                    id: agent.id,
                    position: agent.position.into(),
                    velocity: agent.velocity.into(),
                    acceleration: agent.acceleration.into(),
                    cohort: agent.cohort,
                    target_reached: agent.target_reached,
                })
                .collect(),
            obstacles: world
                .obstacles()
                .iter()
                .map(|obstacle| ObstacleSnapshot {
                    center: obstacle.center.into(),
                    radius: obstacle.radius,
                })
                .collect(),
        }
    }
}

/// Summary of a running simulation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub tick: u64,
    pub agent_count: usize,
    pub obstacle_count: usize,
    pub arrived_count: usize,
}

impl StatusResponse {
    pub fn capture(world: &World) -> Self {
        Self {
            tick: world.tick_count(),
            agent_count: world.agents().len(),
            obstacle_count: world.obstacles().len(),
            arrived_count: world.arrived_count(),
        }
    }
}
