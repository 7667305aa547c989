//! Ready-made world layouts, one per simulation profile.

use alloc::vec::Vec;

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{SteeringConfig, CELL_SIZE};
use crate::entity::Obstacle;
use crate::vector::Vector2;
use crate::world::World;

const RANDOM_WALLS: usize = 8;
const BOTTLENECK_MOBS: usize = 20;
const LANE_MOBS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Scenario {
    /// One agent chasing a live target among randomly placed walls.
    MouseFollow,
    /// A flock squeezing through a one-cell gap in a vertical wall.
    Bottleneck,
    /// Two cohorts crossing through a three-cell gap in opposite directions.
    #[default]
    Lanes,
}

impl Scenario {
    /// The configuration preset this layout was tuned for.
    pub fn config(&self) -> SteeringConfig {
        match self {
            Scenario::MouseFollow => SteeringConfig::mouse_follow(),
            Scenario::Bottleneck => SteeringConfig::bottleneck(),
            Scenario::Lanes => SteeringConfig::lanes(),
        }
    }

    pub fn build(&self) -> World {
        self.build_with(self.config())
    }

    /// Lay the scenario out in a world running `config`.
    pub fn build_with(&self, config: SteeringConfig) -> World {
        let mut world = World::new(config);
        let (width, height) = (world.config().width, world.config().height);

        match self {
            Scenario::MouseFollow => {
                for _ in 0..RANDOM_WALLS {
                    let obstacle = random_wall(&mut world);
                    world.add_obstacle(obstacle);
                }
                world.spawn_agent(None, None, None);
            }
            Scenario::Bottleneck => {
                for obstacle in wall_with_gap(world.config(), CELL_SIZE, 1.0) {
                    world.add_obstacle(obstacle);
                }
                let target = Vector2::new(width - 100.0, height / 2.0);
                world.set_default_target(target);
                // Narrow worlds collapse the band onto the left edge.
                let band = (width / 2.0 - 50.0).max(0.0);
                for _ in 0..BOTTLENECK_MOBS {
                    let position = world.random_point(0.0..=band, 0.0..=height);
                    world.spawn_agent(Some(position), None, Some(target));
                }
            }
            Scenario::Lanes => {
                for obstacle in wall_with_gap(world.config(), CELL_SIZE, 3.0) {
                    world.add_obstacle(obstacle);
                }
                let east = Vector2::new(width - 50.0, height / 2.0);
                let west = Vector2::new(50.0, height / 2.0);
                for _ in 0..LANE_MOBS {
                    let left = world.random_point(0.0..=(width / 4.0), 0.0..=height);
                    world.spawn_agent(Some(left), Some(1), Some(east));
                    let right = world.random_point((3.0 * width / 4.0)..=width, 0.0..=height);
                    world.spawn_agent(Some(right), Some(2), Some(west));
                }
            }
        }

        log::debug!(
            "built {:?} with {} agents and {} obstacles",
            self,
            world.agents().len(),
            world.obstacles().len()
        );
        world
    }
}

/// A vertical wall down the middle column of the grid, open for
/// `gap_cells` cells around the vertical center.
pub fn wall_with_gap(config: &SteeringConfig, cell: f32, gap_cells: f32) -> Vec<Obstacle> {
    let column = (config.width / 2.0 / cell) as i32;
    let gap = gap_cells * cell;
    let gap_start = config.height / 2.0 - gap / 2.0;
    let gap_end = gap_start + gap;
    let mut rows = (config.height / cell) as i32;
    if (rows as f32) * cell < config.height {
        rows += 1;
    }

    (0..rows)
        .filter(|row| {
            let y = *row as f32 * cell;
            y < gap_start || y >= gap_end
        })
        .map(|row| Obstacle::from_cell(column, row, cell, config.wall_limit))
        .collect()
}

fn random_wall(world: &mut World) -> Obstacle {
    let columns = (world.config().width / CELL_SIZE) as i32;
    let rows = (world.config().height / CELL_SIZE) as i32;
    let wall_limit = world.config().wall_limit;
    let cell_x = world.rng().gen_range(0..columns.max(1));
    let cell_y = world.rng().gen_range(0..rows.max(1));
    Obstacle::from_cell(cell_x, cell_y, CELL_SIZE, wall_limit)
}
