use anyhow::Result;
use mob_client::{load_commands, load_settings, resolve_settings, Driver, ScriptedCommand};
use mob_core::{AgentId, Command, Scenario, TargetSelector, Vector2};
use mob_shared::{FrameSnapshot, Position, TargetPositionUpdate};
use std::path::PathBuf;

/// Writes `contents` to a fresh file under the system temp directory
fn write_temp_file(name: &str, contents: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("mob-client-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Parses the JSON-lines output of a run
fn parse_frames(output: &[u8]) -> Result<Vec<FrameSnapshot>> {
    let text = std::str::from_utf8(output)?;
    let mut frames = Vec::new();
    for line in text.lines() {
        frames.push(serde_json::from_str(line)?);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_emits_json_lines() -> Result<()> {
        let mut driver = Driver::new(Scenario::Bottleneck.build()).with_emit_every(10);
        let mut output = Vec::new();

        let written = driver.run(50, &mut output)?;
        let frames = parse_frames(&output)?;

        assert_eq!(written, 5);
        assert_eq!(
            frames.iter().map(|f| f.tick).collect::<Vec<_>>(),
            vec![10, 20, 30, 40, 50]
        );
        for frame in &frames {
            assert_eq!(frame.agents.len(), 20);
            assert_eq!(frame.obstacles.len(), 19);
            for agent in &frame.agents {
                let speed = Position::new(0.0, 0.0).distance_to(&agent.velocity);
                assert!(speed <= 4.0 + 1e-3, "speed {} over the limit", speed);
                assert!((0.0..=800.0).contains(&agent.position.x));
                assert!((0.0..=640.0).contains(&agent.position.y));
            }
        }

        Ok(())
    }

    #[test]
    fn test_scripted_edits_show_up_in_frames() -> Result<()> {
        let world = Scenario::Lanes.build();
        let spawned = AgentId(world.agents().len() as u64);
        let script = vec![
            ScriptedCommand {
                tick: 0,
                command: Command::SpawnAgent {
                    position: Some(Vector2::new(100.0, 100.0)),
                    cohort: Some(3),
                    target: Some(Vector2::new(700.0, 100.0)),
                },
            },
            ScriptedCommand {
                tick: 2,
                command: Command::RemoveObstacleAt {
                    point: Vector2::new(400.0, 16.0),
                },
            },
            ScriptedCommand {
                tick: 2,
                command: Command::AddObstacle {
                    cell_x: 5,
                    cell_y: 5,
                    size: 32.0,
                },
            },
            ScriptedCommand {
                tick: 4,
                command: Command::SetTarget {
                    selector: TargetSelector::Cohort(3),
                    point: Vector2::new(400.0, 400.0),
                },
            },
        ];

        let mut driver = Driver::new(world).with_script(script);
        let mut output = Vec::new();
        driver.run(5, &mut output)?;
        let frames = parse_frames(&output)?;

        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].agents.len(), 21);
        assert!(frames[0].agents.iter().any(|a| a.id == spawned && a.cohort == Some(3)));

        assert_eq!(frames[1].obstacles.len(), 17);
        assert_eq!(frames[2].obstacles.len(), 17);
        assert!(frames[2]
            .obstacles
            .iter()
            .any(|o| o.center == Position::new(176.0, 176.0)));
        assert!(!frames[2]
            .obstacles
            .iter()
            .any(|o| o.center == Position::new(400.0, 16.0)));

        let agent = driver.world().agent(spawned).expect("spawned agent");
        assert_eq!(agent.target, Vector2::new(400.0, 400.0));
        let others_untouched = driver
            .world()
            .agents()
            .iter()
            .filter(|a| a.cohort == Some(1))
            .all(|a| a.target == Vector2::new(750.0, 320.0));
        assert!(others_untouched);
        assert_eq!(driver.remaining_commands(), 0);

        Ok(())
    }

    #[test]
    fn test_arrival_reported_in_status() -> Result<()> {
        let script = vec![ScriptedCommand {
            tick: 0,
            command: Command::SpawnAgent {
                position: Some(Vector2::new(600.0, 320.0)),
                cohort: None,
                target: Some(Vector2::new(620.0, 320.0)),
            },
        }];
        let mut driver = Driver::new(Scenario::Bottleneck.build()).with_script(script);

        let frame = driver.step().expect("frame every tick by default");
        let status = driver.status();

        assert_eq!(status.tick, 1);
        assert_eq!(status.agent_count, 21);
        assert_eq!(status.arrived_count, 1);
        assert_eq!(frame.agents.iter().filter(|a| a.target_reached).count(), 1);

        Ok(())
    }

    #[test]
    fn test_cursor_update_retargets_everyone() -> Result<()> {
        let update = TargetPositionUpdate {
            position: Some(Position::new(250.0, 250.0)),
        };
        let command = update.to_command().expect("position set");
        let mut driver = Driver::new(Scenario::MouseFollow.build())
            .with_script(vec![ScriptedCommand { tick: 0, command }]);

        driver.step();

        let world = driver.world();
        assert_eq!(world.default_target(), Vector2::new(250.0, 250.0));
        assert!(world
            .agents()
            .iter()
            .all(|a| a.target == Vector2::new(250.0, 250.0)));

        Ok(())
    }

    #[test]
    fn test_files_drive_a_run() -> Result<()> {
        let settings_path = write_temp_file(
            "settings.json",
            r#"{ "scenario": "bottleneck", "steering": { "seed": 9, "max_speed": 3.0 } }"#,
        )?;
        let commands_path = write_temp_file(
            "commands.json",
            r#"[
                { "tick": 1, "command": { "type": "spawn_agent", "position": { "x": 50.0, "y": 50.0 } } },
                { "tick": 3, "command": { "type": "set_enabled", "agent": 20, "enabled": false } }
            ]"#,
        )?;

        let settings = load_settings(&settings_path)?;
        let script = load_commands(&commands_path)?;
        assert_eq!(settings.scenario, Scenario::Bottleneck);
        assert_eq!(script.len(), 2);

        let world = mob_client::build_world(&settings, None)?;
        assert_eq!(world.config().seed, 9);
        assert_eq!(world.config().max_speed, 3.0);

        let mut driver = Driver::new(world).with_script(script).with_emit_every(2);
        let mut output = Vec::new();
        driver.run(6, &mut output)?;
        let frames = parse_frames(&output)?;

        assert_eq!(frames.len(), 3);
        assert_eq!(frames.last().map(|f| f.agents.len()), Some(21));

        let disabled = driver.world().agent(AgentId(20)).expect("spawned agent");
        assert!(!disabled.enabled);
        let frozen_at = frames[1]
            .agents
            .iter()
            .find(|a| a.id == AgentId(20))
            .map(|a| a.position);
        let final_position = frames[2]
            .agents
            .iter()
            .find(|a| a.id == AgentId(20))
            .map(|a| a.position);
        assert_eq!(frozen_at, final_position);

        Ok(())
    }

    #[test]
    fn test_scenario_override_is_revalidated() -> Result<()> {
        // Valid on top of the lanes preset, but the mouse-follow preset uses
        // look-ahead avoidance and has no gain to fall back on.
        let path = write_temp_file(
            "override.json",
            r#"{ "scenario": "lanes", "steering": { "avoidance": { "radius_repulsion": {} } } }"#,
        )?;

        let settings = resolve_settings(Some(&path), None)?;
        assert_eq!(settings.scenario, Scenario::Lanes);
        assert!(resolve_settings(Some(&path), Some(Scenario::Bottleneck)).is_ok());

        let err = resolve_settings(Some(&path), Some(Scenario::MouseFollow)).unwrap_err();
        assert!(err.to_string().contains("invalid for scenario MouseFollow"));

        Ok(())
    }

    #[test]
    fn test_narrow_override_still_builds() -> Result<()> {
        let path = write_temp_file("narrow.json", r#"{ "steering": { "width": 80.0 } }"#)?;
        let settings = resolve_settings(Some(&path), Some(Scenario::Bottleneck))?;
        let world = mob_client::build_world(&settings, None)?;

        let mut driver = Driver::new(world);
        let mut output = Vec::new();
        driver.run(10, &mut output)?;
        let frames = parse_frames(&output)?;

        assert_eq!(frames.len(), 10);
        for agent in &frames[9].agents {
            assert!((0.0..=80.0).contains(&agent.position.x));
        }

        Ok(())
    }

    #[test]
    fn test_missing_files_are_reported() {
        let missing = std::env::temp_dir().join("mob-client-tests-does-not-exist.json");
        let err = load_settings(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
        assert!(load_commands(&missing).is_err());
    }
}
