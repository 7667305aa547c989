#![cfg_attr(not(feature = "std"), no_std)]

//! Steering-force model for mobs moving on a bounded 2D plane.
//!
//! [`SteeringField`] computes the individual behaviors (seek with arrival,
//! obstacle avoidance, separation, alignment, cohesion) and their weighted
//! combination. [`World`] owns the agents and obstacles, advances them one
//! tick at a time and exposes their state for whatever draws them.
//!
//! The `parallel` feature evaluates forces on rayon's thread pool. Its
//! tests run with `cargo test -p mob-core --features parallel`.

extern crate alloc;

pub mod command;
pub mod config;
pub mod entity;
pub mod scenario;
pub mod steering;
pub mod vector;
pub mod world;

pub use command::{Command, TargetSelector};
pub use config::{
    ArrivalPolicy, AvoidancePolicy, BoundaryPolicy, FlockingScope, SteeringConfig, Weights,
};
pub use entity::{Agent, AgentId, Obstacle};
pub use scenario::Scenario;
pub use steering::{AvoidanceStrategy, LookAhead, RadiusRepulsion, SteeringField, SteeringForces};
pub use vector::Vector2;
pub use world::World;
