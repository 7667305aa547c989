//! Steering forces.
//!
//! Every behavior is a pure function of the state it is handed: one agent,
//! the static obstacles and the peer agents of the current (pre-tick)
//! snapshot. Each force is clamped to `max_force` on its own; the weighted
//! sum produced by [`SteeringField::combine`] is not clamped again.

use crate::config::{ArrivalPolicy, AvoidancePolicy, FlockingScope, SteeringConfig, Weights};
use crate::entity::{Agent, Obstacle};
use crate::vector::Vector2;

/// Interchangeable obstacle avoidance policy
pub trait AvoidanceStrategy {
    fn avoid(&self, agent: &Agent, obstacles: &[Obstacle], config: &SteeringConfig) -> Vector2;
}

/// Pushes away from every obstacle the agent overlaps, scaled by how deep it
/// has penetrated the obstacle's radius.
#[derive(Debug, Clone, Copy, Default)]
pub struct RadiusRepulsion;

impl AvoidanceStrategy for RadiusRepulsion {
    fn avoid(&self, agent: &Agent, obstacles: &[Obstacle], config: &SteeringConfig) -> Vector2 {
        let mut steer = Vector2::zero();

        for obstacle in obstacles {
            let threshold = obstacle.radius + agent.half_width;
            let distance = agent.position.distance(&obstacle.center);
            if distance < threshold {
                let away = (agent.position - obstacle.center).normalize();
                steer += away * (threshold - distance);
            }
        }

        steer.limit(config.max_force)
    }
}

/// Probes two points ahead of the agent and steers away from the nearest
/// obstacle that contains either probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookAhead;

impl LookAhead {
    /// The far and near probe points, or `None` when the agent has no
    /// heading or the speed limit leaves no room to look ahead.
    pub fn probes(agent: &Agent, config: &SteeringConfig) -> Option<(Vector2, Vector2)> {
        if !(config.max_speed > 0.0) {
            return None;
        }
        let heading = agent.velocity.try_normalize()?;
        let reach = config.look_ahead * agent.velocity.magnitude() / config.max_speed;
        let ahead = agent.position + heading * reach;
        let ahead2 = agent.position + heading * (reach / 2.0);
        Some((ahead, ahead2))
    }

    /// The obstacle closest to the agent among those hit by a probe.
    pub fn most_threatening<'a>(
        agent: &Agent,
        obstacles: &'a [Obstacle],
        ahead: Vector2,
        ahead2: Vector2,
    ) -> Option<&'a Obstacle> {
        obstacles
            .iter()
            .filter(|obstacle| obstacle.contains(ahead) || obstacle.contains(ahead2))
            .min_by(|a, b| {
                let da = agent.position.distance(&a.center);
                let db = agent.position.distance(&b.center);
                da.total_cmp(&db)
            })
    }
}

impl AvoidanceStrategy for LookAhead {
    fn avoid(&self, agent: &Agent, obstacles: &[Obstacle], config: &SteeringConfig) -> Vector2 {
        let Some((ahead, ahead2)) = Self::probes(agent, config) else {
            return Vector2::zero();
        };

        match Self::most_threatening(agent, obstacles, ahead, ahead2) {
            Some(obstacle) => (ahead - obstacle.center).scale_to(config.max_force),
            None => Vector2::zero(),
        }
    }
}

/// Peers of `agent` it aligns and coheres with. Never includes the agent.
pub fn flockmates<'p>(
    scope: FlockingScope,
    agent: &'p Agent,
    peers: &'p [Agent],
) -> impl Iterator<Item = &'p Agent> + 'p {
    peers.iter().filter(move |peer| {
        peer.id != agent.id
            && match (scope, agent.cohort) {
                (FlockingScope::Cohort, Some(cohort)) => peer.cohort == Some(cohort),
                _ => true,
            }
    })
}

/// The five raw steering forces acting on one agent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringForces {
    pub seek: Vector2,
    pub avoid: Vector2,
    pub separation: Vector2,
    pub alignment: Vector2,
    pub cohesion: Vector2,
}

/// Stateless force computation over borrowed world state
#[derive(Debug, Clone, Copy)]
pub struct SteeringField<'a> {
    config: &'a SteeringConfig,
}

impl<'a> SteeringField<'a> {
    pub fn new(config: &'a SteeringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SteeringConfig {
        self.config
    }

    /// Seek `target` at full speed, ramping the desired speed down linearly
    /// inside the approach radius. Zero when already exactly on the target.
    pub fn seek_with_arrival(&self, agent: &Agent, target: Vector2) -> Vector2 {
        let offset = target - agent.position;
        let distance = offset.magnitude();
        let Some(direction) = offset.try_normalize() else {
            return Vector2::zero();
        };

        let speed = if distance < self.config.approach_radius {
            self.config.max_speed * distance / self.config.approach_radius
        } else {
            self.config.max_speed
        };

        let steer = direction * speed - agent.velocity;
        steer.limit(self.config.max_force)
    }

    /// Obstacle avoidance using the configured [`AvoidancePolicy`].
    pub fn avoid_obstacles(&self, agent: &Agent, obstacles: &[Obstacle]) -> Vector2 {
        match self.config.avoidance {
            AvoidancePolicy::RadiusRepulsion { .. } => {
                RadiusRepulsion.avoid(agent, obstacles, self.config)
            }
            AvoidancePolicy::LookAhead => LookAhead.avoid(agent, obstacles, self.config),
        }
    }

    /// Extra multiplier the avoidance policy applies on top of its weight.
    pub fn avoidance_gain(&self) -> f32 {
        match self.config.avoidance {
            AvoidancePolicy::RadiusRepulsion { gain } => gain,
            AvoidancePolicy::LookAhead => 1.0,
        }
    }

    /// Push away from every peer inside the separation radius, closer peers
    /// weighing more. The result is either zero or exactly `max_force` long.
    pub fn separation(&self, agent: &Agent, peers: &[Agent]) -> Vector2 {
        let mut steering = Vector2::zero();

        for peer in peers.iter().filter(|peer| peer.id != agent.id) {
            let distance = agent.position.distance(&peer.position);
            // Coincident peers have no direction to push along.
            if distance > 0.0 && distance < self.config.separation_radius {
                let away = (agent.position - peer.position).normalize();
                steering += away / distance;
            }
        }

        steering.scale_to(self.config.max_force)
    }

    /// Steer toward the average velocity of flockmates.
    pub fn alignment(&self, agent: &Agent, peers: &[Agent]) -> Vector2 {
        let mut sum = Vector2::zero();
        let mut count = 0;

        for peer in self.flockmates(agent, peers) {
            sum += peer.velocity;
            count += 1;
        }

        if count == 0 {
            return Vector2::zero();
        }

        let average = sum / count as f32;
        (average - agent.velocity).limit(self.config.max_force)
    }

    /// Seek the centroid of flockmates.
    pub fn cohesion(&self, agent: &Agent, peers: &[Agent]) -> Vector2 {
        let mut sum = Vector2::zero();
        let mut count = 0;

        for peer in self.flockmates(agent, peers) {
            sum += peer.position;
            count += 1;
        }

        if count == 0 {
            return Vector2::zero();
        }

        self.seek_with_arrival(agent, sum / count as f32)
    }

    /// Peers an agent aligns and coheres with under the configured scope.
    pub fn flockmates<'p>(
        &self,
        agent: &'p Agent,
        peers: &'p [Agent],
    ) -> impl Iterator<Item = &'p Agent> + 'p {
        flockmates(self.config.flocking, agent, peers)
    }

    /// Evaluate all five behaviors for `agent`.
    pub fn forces(&self, agent: &Agent, obstacles: &[Obstacle], peers: &[Agent]) -> SteeringForces {
        let seeking = match self.config.arrival {
            ArrivalPolicy::Latch => !agent.target_reached,
            ArrivalPolicy::Continuous => true,
        };

        SteeringForces {
            seek: if seeking {
                self.seek_with_arrival(agent, agent.target)
            } else {
                Vector2::zero()
            },
            avoid: self.avoid_obstacles(agent, obstacles),
            separation: self.separation(agent, peers),
            alignment: self.alignment(agent, peers),
            cohesion: self.cohesion(agent, peers),
        }
    }

    /// Weighted sum of the forces. The avoidance gain of the configured
    /// policy multiplies the avoid weight.
    pub fn combine(&self, forces: &SteeringForces, weights: &Weights) -> Vector2 {
        forces.seek * weights.seek
            + forces.avoid * (weights.avoid * self.avoidance_gain())
            + forces.separation * weights.separation
            + forces.alignment * weights.alignment
            + forces.cohesion * weights.cohesion
    }

    /// The combined acceleration for `agent` under the configured weights.
    pub fn acceleration(&self, agent: &Agent, obstacles: &[Obstacle], peers: &[Agent]) -> Vector2 {
        let forces = self.forces(agent, obstacles, peers);
        self.combine(&forces, &self.config.weights)
    }
}
