//! Headless driver for the mob simulation.
//!
//! A [`Driver`] owns a [`World`], feeds it scripted commands at the ticks
//! they are scheduled for, and writes [`FrameSnapshot`]s as JSON lines for
//! whatever renders or analyses the run.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use mob_core::{Command, Scenario, World};
use mob_shared::{FrameSnapshot, SettingsUpdate, SimulationSettings, StatusResponse};
use serde::{Deserialize, Serialize};

/// A command to submit when the world reaches `tick`.
///
/// A command scheduled for tick `n` is applied at the start of the tick
/// that takes the world from `n` to `n + 1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptedCommand {
    pub tick: u64,
    pub command: Command,
}

pub fn load_settings(path: &Path) -> Result<SimulationSettings> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    SimulationSettings::from_json(&json)
        .with_context(|| format!("Invalid settings in {}", path.display()))
}

/// Settings from `path` (or the defaults), with `scenario` replacing the
/// file's. The result is validated against the scenario actually chosen.
pub fn resolve_settings(
    path: Option<&Path>,
    scenario: Option<Scenario>,
) -> Result<SimulationSettings> {
    let mut settings = match path {
        Some(path) => load_settings(path)?,
        None => SimulationSettings::default(),
    };
    if let Some(scenario) = scenario {
        settings.scenario = scenario;
        settings
            .validate()
            .with_context(|| format!("Settings are invalid for scenario {:?}", scenario))?;
    }
    Ok(settings)
}

pub fn load_commands(path: &Path) -> Result<Vec<ScriptedCommand>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read command script {}", path.display()))?;
    parse_commands(&json).with_context(|| format!("Invalid command script {}", path.display()))
}

pub fn parse_commands(json: &str) -> Result<Vec<ScriptedCommand>> {
    let commands: Vec<ScriptedCommand> = serde_json::from_str(json)?;
    Ok(commands)
}

/// Builds the world described by `settings`, reseeded when `seed` is given.
pub fn build_world(settings: &SimulationSettings, seed: Option<u64>) -> Result<World> {
    let mut config = settings.config()?;
    if let Some(seed) = seed {
        config.seed = seed;
    }
    Ok(World::from_scenario(settings.scenario, config))
}

pub struct Driver {
    world: World,
    script: Vec<ScriptedCommand>,
    next_command: usize,
    emit_every: u64,
}

impl Driver {
    pub fn new(world: World) -> Self {
        Self {
            world,
            script: Vec::new(),
            next_command: 0,
            emit_every: 1,
        }
    }

    /// Replaces the command script. Commands sharing a tick keep their order.
    pub fn with_script(mut self, mut script: Vec<ScriptedCommand>) -> Self {
        script.sort_by_key(|scripted| scripted.tick);
        self.script = script;
        self.next_command = 0;
        self
    }

    /// Emit a frame every `every` ticks. Zero is treated as one.
    pub fn with_emit_every(mut self, every: u64) -> Self {
        self.emit_every = every.max(1);
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Retunes the running world. Invalid updates are rejected and the
    /// current configuration is kept.
    pub fn update_settings(&mut self, update: &SettingsUpdate) -> Result<()> {
        let mut config = self.world.config().clone();
        update
            .apply_to(&mut config)
            .context("Rejected settings update")?;
        log::info!(
            "Settings updated: max speed {}, max force {}",
            config.max_speed,
            config.max_force
        );
        self.world.set_config(config);
        Ok(())
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse::capture(&self.world)
    }

    /// Commands still waiting for their tick.
    pub fn remaining_commands(&self) -> usize {
        self.script.len() - self.next_command
    }

    /// Advances the world by one tick, returning a frame when one is due.
    pub fn step(&mut self) -> Option<FrameSnapshot> {
        let now = self.world.tick_count();
        while let Some(scripted) = self.script.get(self.next_command) {
            if scripted.tick > now {
                break;
            }
            if scripted.tick < now {
                log::warn!(
                    "Command scheduled for tick {} applied late at tick {}",
                    scripted.tick,
                    now
                );
            }
            log::debug!("Tick {}: {:?}", now, scripted.command);
            self.world.submit(scripted.command.clone());
            self.next_command += 1;
        }

        self.world.tick();

        if self.world.tick_count() % self.emit_every == 0 {
            Some(FrameSnapshot::capture(&self.world))
        } else {
            None
        }
    }

    /// Runs `ticks` ticks, writing each due frame to `out` as one JSON line.
    /// Returns the number of frames written.
    pub fn run<W: Write>(&mut self, ticks: u64, mut out: W) -> Result<usize> {
        let mut frames = 0;
        for _ in 0..ticks {
            if let Some(frame) = self.step() {
                serde_json::to_writer(&mut out, &frame).context("Failed to encode frame")?;
                writeln!(out).context("Failed to write frame")?;
                frames += 1;
            }
        }
        out.flush().context("Failed to flush output")?;

        let status = self.status();
        log::info!(
            "Ran to tick {}: {} agents, {} arrived, {} frames written",
            status.tick,
            status.agent_count,
            status.arrived_count,
            frames
        );
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mob_core::Vector2;

    #[test]
    fn test_emit_every() {
        let mut driver = Driver::new(Scenario::Bottleneck.build()).with_emit_every(3);
        let emitted: Vec<u64> = (0..9).filter_map(|_| driver.step()).map(|f| f.tick).collect();
        assert_eq!(emitted, vec![3, 6, 9]);
    }

    #[test]
    fn test_zero_emit_every_emits_each_tick() {
        let mut driver = Driver::new(Scenario::Lanes.build()).with_emit_every(0);
        assert!(driver.step().is_some());
        assert!(driver.step().is_some());
    }

    #[test]
    fn test_script_applied_at_its_tick() {
        let script = vec![
            ScriptedCommand {
                tick: 2,
                command: Command::SpawnAgent {
                    position: Some(Vector2::new(100.0, 100.0)),
                    cohort: None,
                    target: None,
                },
            },
            ScriptedCommand {
                tick: 0,
                command: Command::SpawnAgent {
                    position: None,
                    cohort: None,
                    target: None,
                },
            },
        ];
        let mut driver = Driver::new(Scenario::Bottleneck.build()).with_script(script);
        assert_eq!(driver.remaining_commands(), 2);

        driver.step();
        assert_eq!(driver.world().agents().len(), 21);
        driver.step();
        assert_eq!(driver.world().agents().len(), 21);
        driver.step();
        assert_eq!(driver.world().agents().len(), 22);
        assert_eq!(driver.remaining_commands(), 0);
    }

    #[test]
    fn test_update_settings() {
        let mut driver = Driver::new(Scenario::Lanes.build());

        let faster = SettingsUpdate {
            max_speed: Some(6.0),
            ..SettingsUpdate::default()
        };
        driver.update_settings(&faster).unwrap();
        assert_eq!(driver.world().config().max_speed, 6.0);

        let stalled = SettingsUpdate {
            max_speed: Some(0.0),
            ..SettingsUpdate::default()
        };
        assert!(driver.update_settings(&stalled).is_err());
        assert_eq!(driver.world().config().max_speed, 6.0);
    }

    #[test]
    fn test_seed_override() {
        let settings = SimulationSettings::default();
        let a = build_world(&settings, Some(7)).unwrap();
        let b = build_world(&settings, Some(7)).unwrap();
        let c = build_world(&settings, None).unwrap();

        assert_eq!(a.config().seed, 7);
        assert_eq!(c.config().seed, 42);
        assert_eq!(a.agents(), b.agents());
        assert_ne!(a.agents(), c.agents());
    }

    #[test]
    fn test_parse_commands() {
        let json = r#"[
            { "tick": 0, "command": { "type": "spawn_agent", "cohort": 1 } },
            { "tick": 5, "command": { "type": "set_target", "selector": "all", "point": { "x": 10.0, "y": 20.0 } } },
            { "tick": 9, "command": { "type": "set_enabled", "agent": 3, "enabled": false } }
        ]"#;
        let commands = parse_commands(json).unwrap();

        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[0].command,
            Command::SpawnAgent {
                position: None,
                cohort: Some(1),
                target: None,
            }
        );
        assert_eq!(commands[2].tick, 9);
        assert!(parse_commands(r#"[{ "tick": 1, "command": { "type": "jump" } }]"#).is_err());
    }
}
