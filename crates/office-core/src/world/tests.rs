use super::*;
use contracts::TilePoint;

fn test_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.run_id = "office_test".to_string();
    config.seed = 42;
    config.max_ticks = 10_000;
    config
}

fn started_world() -> OfficeWorld {
    let mut world = OfficeWorld::new(test_config()).expect("world builds");
    world.start();
    world
}

fn command(world: &OfficeWorld, payload: CommandPayload) -> Command {
    let issued = world.status().current_tick;
    Command::new(
        format!("cmd_{}_{}", issued, world.events().len()),
        world.run_id().to_string(),
        issued,
        payload,
    )
}

#[test]
fn agents_spawn_seated_at_their_desks() {
    let world = started_world();
    assert_eq!(world.agent_ids().len(), 5);
    for detail in world.agent_details() {
        assert_eq!(detail.status, AgentStatus::Idle);
        assert_eq!(detail.x, detail.desk_x);
        assert_eq!(detail.y, detail.desk_y);
        assert_eq!(detail.facing, contracts::Facing::Up);
        assert!(detail.walk_speed >= 40.0 && detail.walk_speed <= 70.0);
    }
}

#[test]
fn desk_anchor_is_the_desk_layer_centroid() {
    let world = started_world();
    // wp1 occupies (4,3) and (5,3): centroid x 4.5, y 3.
    let detail = world.agent_detail("seo-analyst").expect("agent");
    assert_eq!(detail.desk_x, 4.5 * 32.0 + 16.0);
    assert_eq!(detail.desk_y, 3.0 * 32.0 + 16.0);
}

#[test]
fn duplicate_agent_ids_are_rejected() {
    let mut bundle = default_office();
    let mut twin = bundle.agents[0].clone();
    twin.name = "Copy".to_string();
    bundle.agents.push(twin);
    let err = OfficeWorld::from_map(test_config(), &bundle).unwrap_err();
    assert!(matches!(err, WorldInitError::DuplicateAgent(id) if id == "seo-analyst"));
}

#[test]
fn idle_agents_eventually_wander_and_never_hold_two_motions() {
    let mut world = started_world();
    world.step_n(400);

    for agent_id in world.agent_ids() {
        let started = world
            .events()
            .iter()
            .filter(|event| {
                event.event_type == EventType::WanderStarted
                    && event.actors.iter().any(|actor| actor.actor_id == agent_id)
            })
            .count();
        assert!(started >= 1, "agent {agent_id} never wandered");
    }

    // Structural guarantee: one motion slot per agent, and every idle,
    // unselected, silent agent either walks or has a pending deadline.
    for (agent_id, agent) in &world.agents {
        if agent.wander_gate_open() {
            assert!(
                world.wander.has_pending(agent_id),
                "agent {agent_id} idle with no scheduled wander"
            );
        }
    }
}

#[test]
fn working_agent_runs_home_and_seats_facing_the_monitor() {
    let mut world = started_world();
    // Stand the agent in the middle of the room, mid-wander.
    {
        let agent = world.agents.get_mut("ua-strategist").expect("agent");
        agent.position = TilePoint::new(15, 20).center();
    }

    let working = command(
        &world,
        CommandPayload::SetAgentStatus {
            agent_id: "ua-strategist".to_string(),
            status: AgentStatus::Working,
        },
    );
    world.inject_command(working);
    world.step();

    let detail = world.agent_detail("ua-strategist").expect("agent");
    assert_eq!(detail.status, AgentStatus::Working);
    let motion = detail.active_motion.expect("desk motion");
    assert_eq!(motion.purpose, "to_desk");
    assert!(motion.run);

    // Keep stepping: the agent arrives, snaps to the desk, and faces up.
    world.step_n(300);
    let detail = world.agent_detail("ua-strategist").expect("agent");
    assert_eq!(detail.x, detail.desk_x);
    assert_eq!(detail.y, detail.desk_y);
    assert_eq!(detail.facing, contracts::Facing::Up);
    assert!(world
        .events()
        .iter()
        .any(|event| event.event_type == EventType::AgentSeated));
}

#[test]
fn forced_interruption_terminates_conversation_in_the_same_tick() {
    let mut world = started_world();
    let trigger = command(
        &world,
        CommandPayload::TriggerConversation {
            asker_id: "seo-analyst".to_string(),
            answerer_id: "senior-copywriter".to_string(),
        },
    );
    world.inject_command(trigger);
    world.step();

    assert!(world.social.is_participant("seo-analyst"));
    assert!(world.agents["seo-analyst"].is_talking);
    assert!(world.agents["senior-copywriter"].is_talking);

    let events_before = world.events().len();
    let working = command(
        &world,
        CommandPayload::SetAgentStatus {
            agent_id: "seo-analyst".to_string(),
            status: AgentStatus::Working,
        },
    );
    world.inject_command(working);
    world.step();

    // Same tick: talking flags cleared, session gone, agent heading home.
    let asker = &world.agents["seo-analyst"];
    assert!(!asker.is_talking);
    assert_eq!(asker.status, AgentStatus::Working);
    assert!(!world.agents["senior-copywriter"].is_talking);
    assert!(world.social.session().is_none());

    let tail = &world.events()[events_before..];
    let status_tick = tail
        .iter()
        .find(|event| event.event_type == EventType::AgentStatusChanged)
        .expect("status event")
        .tick;
    let ended = tail
        .iter()
        .find(|event| event.event_type == EventType::ConversationEnded)
        .expect("conversation ended");
    assert_eq!(ended.tick, status_tick);
    assert_eq!(
        ended
            .details
            .as_ref()
            .and_then(|details| details.get("reason"))
            .and_then(serde_json::Value::as_str),
        Some("speaker_reassigned")
    );
}

#[test]
fn done_reverts_to_idle_after_the_fixed_delay() {
    let mut world = started_world();
    let done = command(
        &world,
        CommandPayload::SetAgentStatus {
            agent_id: "project-manager".to_string(),
            status: AgentStatus::Done,
        },
    );
    world.inject_command(done);
    world.step();
    assert_eq!(
        world.agent_detail("project-manager").expect("agent").status,
        AgentStatus::Done
    );

    // 3000 time-units at 100 per tick.
    world.step_n(29);
    assert_eq!(
        world.agent_detail("project-manager").expect("agent").status,
        AgentStatus::Done
    );
    world.step_n(2);
    assert_eq!(
        world.agent_detail("project-manager").expect("agent").status,
        AgentStatus::Idle
    );

    let reverted = world
        .events()
        .iter()
        .find(|event| {
            event.event_type == EventType::AgentStatusChanged
                && event.caused_by.iter().any(|cause| cause == "auto:done_revert")
        })
        .expect("auto revert event");
    assert_eq!(
        reverted
            .details
            .as_ref()
            .and_then(|details| details.get("status"))
            .and_then(serde_json::Value::as_str),
        Some("idle")
    );
}

#[test]
fn selection_pauses_wandering_and_raises_both_intents() {
    let mut world = started_world();
    let select = command(
        &world,
        CommandPayload::SelectAgent {
            agent_id: "creative-director".to_string(),
        },
    );
    world.inject_command(select);
    world.step();

    let detail = world.agent_detail("creative-director").expect("agent");
    assert!(detail.selected);
    assert!(detail.active_motion.is_none());
    assert_eq!(world.selected_agent(), Some("creative-director"));

    let types = world
        .events()
        .iter()
        .map(|event| event.event_type)
        .collect::<Vec<_>>();
    assert!(types.contains(&EventType::AgentSelected));
    assert!(types.contains(&EventType::BioRequested));
    assert!(types.contains(&EventType::ChatRequested));

    // Selecting somebody else hands the selection over.
    let select_other = command(
        &world,
        CommandPayload::SelectAgent {
            agent_id: "seo-analyst".to_string(),
        },
    );
    world.inject_command(select_other);
    world.step();
    assert_eq!(world.selected_agent(), Some("seo-analyst"));
    assert!(!world.agents["creative-director"].selected);

    let deselect = command(&world, CommandPayload::DeselectAgent);
    world.inject_command(deselect);
    world.step();
    assert_eq!(world.selected_agent(), None);
    assert!(world.wander.has_pending("seo-analyst"));
}

#[test]
fn unknown_agent_commands_are_silent_no_ops() {
    let mut world = started_world();
    let events_before = world.events().len();
    let bogus = command(
        &world,
        CommandPayload::SetAgentStatus {
            agent_id: "ghost".to_string(),
            status: AgentStatus::Working,
        },
    );
    world.inject_command(bogus);
    let select = command(
        &world,
        CommandPayload::SelectAgent {
            agent_id: "ghost".to_string(),
        },
    );
    world.inject_command(select);
    world.step();
    let emitted = world.events()[events_before..]
        .iter()
        .filter(|event| {
            matches!(
                event.event_type,
                EventType::AgentStatusChanged | EventType::AgentSelected
            )
        })
        .count();
    assert_eq!(emitted, 0);
}

#[test]
fn render_frame_reports_poses_bubbles_and_animation_handles() {
    let mut world = started_world();
    world.step_n(80);

    let frame = world.render_frame();
    assert_eq!(frame.tick, world.status().current_tick);
    assert_eq!(frame.agents.len(), 5);
    for pose in &frame.agents {
        let sprite_id = &world.agents[&pose.agent_id].sprite_id;
        let expected = contracts::animation_handle(sprite_id, pose.facing, pose.motion);
        assert_eq!(pose.animation, expected);
        if pose.is_talking {
            // Bubbles only ever hang over the current speaker.
            assert!(world.social.is_participant(&pose.agent_id));
        }
    }
}

#[test]
fn replay_is_deterministic_for_equal_seed_and_commands() {
    let drive = |seed: u64| {
        let mut config = test_config();
        config.seed = seed;
        let mut world = OfficeWorld::new(config).expect("world builds");
        world.start();
        let trigger = command(
            &world,
            CommandPayload::TriggerConversation {
                asker_id: "seo-analyst".to_string(),
                answerer_id: "project-manager".to_string(),
            },
        );
        world.enqueue_command(trigger, 80);
        let working = command(
            &world,
            CommandPayload::SetAgentStatus {
                agent_id: "ua-strategist".to_string(),
                status: AgentStatus::Working,
            },
        );
        world.enqueue_command(working, 150);
        world.step_n(300);
        world
    };

    let first = drive(7);
    let second = drive(7);
    assert_eq!(first.events(), second.events());
    assert_eq!(first.render_frame(), second.render_frame());

    let third = drive(8);
    assert_ne!(first.events(), third.events());
}
