use alloc::vec::Vec;

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::command::{Command, TargetSelector};
use crate::config::{BoundaryPolicy, SteeringConfig};
use crate::entity::{Agent, AgentId, Obstacle};
use crate::scenario::Scenario;
use crate::steering::SteeringField;
use crate::vector::{abs, Vector2};

/// Owns every agent and obstacle and advances them tick by tick
#[derive(Debug, Clone)]
pub struct World {
    config: SteeringConfig,
    agents: Vec<Agent>,
    obstacles: Vec<Obstacle>,
    pending: Vec<Command>,
    default_target: Vector2,
    next_id: u64,
    ticks: u64,
    rng: SmallRng,
}

impl World {
    pub fn new(config: SteeringConfig) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        let default_target = Vector2::new(config.width / 2.0, config.height / 2.0);

        Self {
            config,
            agents: Vec::new(),
            obstacles: Vec::new(),
            pending: Vec::new(),
            default_target,
            next_id: 0,
            ticks: 0,
            rng,
        }
    }

    /// A world laid out as `scenario`, running `config`.
    pub fn from_scenario(scenario: Scenario, config: SteeringConfig) -> Self {
        scenario.build_with(config)
    }

    pub fn config(&self) -> &SteeringConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next tick.
    pub fn set_config(&mut self, config: SteeringConfig) {
        self.config = config;
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Target given to agents spawned without one.
    pub fn default_target(&self) -> Vector2 {
        self.default_target
    }

    pub fn set_default_target(&mut self, target: Vector2) {
        self.default_target = target;
    }

    pub fn arrived_count(&self) -> usize {
        self.agents.iter().filter(|agent| agent.target_reached).count()
    }

    /// Commands submitted but not yet applied.
    pub fn pending_commands(&self) -> &[Command] {
        &self.pending
    }

    pub(crate) fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    fn next_agent_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a fully specified agent.
    pub fn add_agent(
        &mut self,
        position: Vector2,
        velocity: Vector2,
        target: Vector2,
        cohort: Option<u32>,
    ) -> AgentId {
        let id = self.next_agent_id();
        let mut agent = Agent::new(id, position, velocity, target)
            .with_half_width(self.config.half_width());
        agent.cohort = cohort;
        self.agents.push(agent);
        id
    }

    /// Add an agent heading in a random direction at full speed. Missing
    /// fields are filled in the same way as [`Command::SpawnAgent`].
    pub fn spawn_agent(
        &mut self,
        position: Option<Vector2>,
        cohort: Option<u32>,
        target: Option<Vector2>,
    ) -> AgentId {
        let position = position.unwrap_or_else(|| {
            let (width, height) = (self.config.width, self.config.height);
            self.random_point(0.0..=width, 0.0..=height)
        });
        let target = target
            .or_else(|| cohort.and_then(|k| self.cohort_target(k)))
            .unwrap_or(self.default_target);
        let heading = self.rng.gen_range(0.0..core::f32::consts::TAU);
        let velocity = Vector2::new(self.config.max_speed, 0.0).rotate(heading);

        let id = self.add_agent(position, velocity, target, cohort);
        debug!("spawned agent {} at ({:.1}, {:.1})", id, position.x, position.y);
        id
    }

    pub(crate) fn random_point(
        &mut self,
        xs: core::ops::RangeInclusive<f32>,
        ys: core::ops::RangeInclusive<f32>,
    ) -> Vector2 {
        let x = sample(&mut self.rng, xs);
        let y = sample(&mut self.rng, ys);
        Vector2::new(x, y)
    }

    fn cohort_target(&self, cohort: u32) -> Option<Vector2> {
        self.agents
            .iter()
            .find(|agent| agent.cohort == Some(cohort))
            .map(|agent| agent.target)
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Add a wall on a grid cell, using the configured clearance.
    pub fn add_obstacle_cell(&mut self, cell_x: i32, cell_y: i32, size: f32) {
        let obstacle = Obstacle::from_cell(cell_x, cell_y, size, self.config.wall_limit);
        self.add_obstacle(obstacle);
    }

    /// Remove every agent covering `point`. Returns how many were removed.
    pub fn remove_agents_at(&mut self, point: Vector2) -> usize {
        let before = self.agents.len();
        self.agents.retain(|agent| !agent.covers(point));
        before - self.agents.len()
    }

    /// Remove every obstacle covering `point`. Returns how many were removed.
    pub fn remove_obstacles_at(&mut self, point: Vector2) -> usize {
        let before = self.obstacles.len();
        self.obstacles.retain(|obstacle| !obstacle.covers(point));
        before - self.obstacles.len()
    }

    /// Retarget the selected agents. Arrival latches are left untouched.
    pub fn set_target(&mut self, selector: TargetSelector, point: Vector2) -> usize {
        if selector == TargetSelector::All {
            self.default_target = point;
        }

        let mut updated = 0;
        for agent in self
            .agents
            .iter_mut()
            .filter(|agent| selector.matches(agent.id, agent.cohort))
        {
            agent.target = point;
            updated += 1;
        }
        updated
    }

    pub fn set_enabled(&mut self, id: AgentId, enabled: bool) -> bool {
        match self.agents.iter_mut().find(|agent| agent.id == id) {
            Some(agent) => {
                agent.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Stage a structural change for the next tick boundary.
    pub fn submit(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Apply every staged command in submission order.
    pub fn apply_commands(&mut self) -> usize {
        let pending = core::mem::take(&mut self.pending);
        let count = pending.len();
        for command in pending {
            self.apply(command);
        }
        count
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SpawnAgent {
                position,
                cohort,
                target,
            } => {
                self.spawn_agent(position, cohort, target);
            }
            Command::RemoveAgentAt { point } => {
                let removed = self.remove_agents_at(point);
                debug!("removed {} agent(s) at ({:.1}, {:.1})", removed, point.x, point.y);
            }
            Command::AddObstacle {
                cell_x,
                cell_y,
                size,
            } => {
                self.add_obstacle_cell(cell_x, cell_y, size);
                debug!("added obstacle at cell ({}, {})", cell_x, cell_y);
            }
            Command::RemoveObstacleAt { point } => {
                let removed = self.remove_obstacles_at(point);
                debug!("removed {} obstacle(s) at ({:.1}, {:.1})", removed, point.x, point.y);
            }
            Command::SetTarget { selector, point } => {
                let updated = self.set_target(selector, point);
                debug!("retargeted {} agent(s) via {:?}", updated, selector);
            }
            Command::SetEnabled { agent, enabled } => {
                if !self.set_enabled(agent, enabled) {
                    debug!("no agent {} to {}", agent, if enabled { "enable" } else { "disable" });
                }
            }
        }
    }

    /// Advance one frame of `1 / fps`.
    pub fn tick(&mut self) {
        self.advance(1.0);
    }

    /// Advance every enabled agent by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let frames = if dt.is_finite() && dt > 0.0 {
            dt * self.config.fps
        } else {
            warn!("invalid timestep {}, using one frame", dt);
            1.0
        };
        self.advance(frames);
    }

    /// Staged commands are applied first. All steering forces are then
    /// evaluated against the unmodified agent list before any agent moves,
    /// so the order of agents never affects the outcome of a tick.
    fn advance(&mut self, frames: f32) {
        self.apply_commands();

        let accelerations = self.accelerations();
        for (agent, acceleration) in self.agents.iter_mut().zip(accelerations) {
            match acceleration {
                Some(acceleration) => integrate(agent, acceleration, frames, &self.config),
                None => agent.acceleration = Vector2::zero(),
            }
        }

        self.ticks += 1;
    }

    fn accelerations(&self) -> Vec<Option<Vector2>> {
        let field = SteeringField::new(&self.config);
        let evaluate = |agent: &Agent| {
            agent
                .enabled
                .then(|| field.acceleration(agent, &self.obstacles, &self.agents))
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.agents.par_iter().map(evaluate).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.agents.iter().map(evaluate).collect()
        }
    }
}

/// Uniform draw from `range`. An empty or degenerate range yields its start.
fn sample(rng: &mut SmallRng, range: core::ops::RangeInclusive<f32>) -> f32 {
    let (start, end) = range.into_inner();
    if start < end {
        rng.gen_range(start..=end)
    } else {
        start
    }
}

/// Apply `acceleration` to one agent over `frames` frames, then latch
/// arrival and enforce the boundary policy.
pub fn integrate(agent: &mut Agent, acceleration: Vector2, frames: f32, config: &SteeringConfig) {
    agent.acceleration = acceleration;
    agent.velocity += acceleration * frames;
    agent.velocity = agent.velocity.limit(config.max_speed);
    agent.position += agent.velocity * frames;

    if !agent.target_reached && agent.position.distance(&agent.target) < config.approach_radius {
        agent.target_reached = true;
        debug!("agent {} reached its target", agent.id);
    }

    apply_boundary(agent, config);
}

pub fn apply_boundary(agent: &mut Agent, config: &SteeringConfig) {
    let (width, height) = (config.width, config.height);
    let position = &mut agent.position;
    let velocity = &mut agent.velocity;

    match config.boundary {
        BoundaryPolicy::Bounce => {
            if position.x < 0.0 {
                position.x = 0.0;
                velocity.x = abs(velocity.x);
            } else if position.x > width {
                position.x = width;
                velocity.x = -abs(velocity.x);
            }

            if position.y < 0.0 {
                position.y = 0.0;
                velocity.y = abs(velocity.y);
            } else if position.y > height {
                position.y = height;
                velocity.y = -abs(velocity.y);
            }
        }
        BoundaryPolicy::Wrap => {
            if position.x > width {
                position.x = 0.0;
            } else if position.x < 0.0 {
                position.x = width;
            }

            if position.y > height {
                position.y = 0.0;
            } else if position.y < 0.0 {
                position.y = height;
            }
        }
    }
}
