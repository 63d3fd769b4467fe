use contracts::{AgentSeed, MapBundle, MapLayer, WorldPoint, TILE_SIZE};

use super::*;
use crate::grid::{GridError, TileGrid};
use crate::rng::SimRng;
use crate::agent::{WANDER_SPEED_MAX, WANDER_SPEED_MIN};

/// Fallback desk anchor when an agent's desk layer is missing or empty.
const FALLBACK_DESK: WorldPoint = WorldPoint { x: 480.0, y: 320.0 };

/// Error type for world construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldInitError {
    Grid(GridError),
    DuplicateAgent(String),
    NoAgents,
}

impl std::fmt::Display for WorldInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorldInitError::Grid(err) => write!(f, "grid build failed: {err}"),
            WorldInitError::DuplicateAgent(id) => write!(f, "duplicate agent id: {id}"),
            WorldInitError::NoAgents => write!(f, "map bundle declares no agents"),
        }
    }
}

impl std::error::Error for WorldInitError {}

impl From<GridError> for WorldInitError {
    fn from(value: GridError) -> Self {
        WorldInitError::Grid(value)
    }
}

/// Desk anchor: centroid of the desk layer's occupied cells, in world units.
fn desk_position(bundle: &MapBundle, layer_name: &str) -> WorldPoint {
    let Some(layer) = bundle.layers.iter().find(|layer| layer.name == layer_name) else {
        return FALLBACK_DESK;
    };
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut count = 0.0;
    for y in 0..bundle.height as i32 {
        for x in 0..bundle.width as i32 {
            if layer.occupied(bundle.width, x, y) {
                sum_x += f64::from(x);
                sum_y += f64::from(y);
                count += 1.0;
            }
        }
    }
    if count == 0.0 {
        return FALLBACK_DESK;
    }
    WorldPoint {
        x: sum_x / count * TILE_SIZE + TILE_SIZE / 2.0,
        y: sum_y / count * TILE_SIZE + TILE_SIZE / 2.0,
    }
}

impl OfficeWorld {
    /// Build the default five-desk office.
    pub fn new(config: RunConfig) -> Result<Self, WorldInitError> {
        Self::from_map(config, &default_office())
    }

    /// Build a world from a map bundle; the bundle is consumed once and the
    /// resulting grid is immutable for the run.
    pub fn from_map(config: RunConfig, bundle: &MapBundle) -> Result<Self, WorldInitError> {
        if bundle.agents.is_empty() {
            return Err(WorldInitError::NoAgents);
        }

        let grid = TileGrid::build(bundle.width, bundle.height, &bundle.layers)?;
        let pathfinder = Pathfinder::new(grid);

        let master_rng = SimRng::new(config.seed);
        let mut agents = BTreeMap::new();
        let mut wander = WanderScheduler::new(master_rng.fork("wander"));
        for seed in &bundle.agents {
            if agents.contains_key(&seed.agent_id) {
                return Err(WorldInitError::DuplicateAgent(seed.agent_id.clone()));
            }
            let desk = desk_position(bundle, &seed.desk_layer);
            let walk_speed = master_rng
                .fork(&format!("speed:{}", seed.agent_id))
                .range_f64(WANDER_SPEED_MIN, WANDER_SPEED_MAX);
            agents.insert(
                seed.agent_id.clone(),
                OfficeAgent::new(seed, desk, walk_speed),
            );
            wander.schedule_initial(&seed.agent_id, 0);
        }

        let social = SocialScheduler::new(
            master_rng.fork("social"),
            config.max_sessions_per_window,
            config.session_cooldown,
        );

        let status = RunStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: config.run_id.clone(),
            current_tick: 0,
            max_ticks: config.max_ticks,
            mode: RunMode::Paused,
            queue_depth: 0,
        };

        Ok(Self {
            config,
            status,
            room_id: bundle.room_id.clone(),
            queued_commands: Vec::new(),
            next_command_sequence: 0,
            event_log: Vec::new(),
            agents,
            pathfinder,
            wander,
            social,
            selected_agent: None,
            last_step_metrics: StepMetrics::default(),
        })
    }
}

fn layer_from(width: u32, height: u32, name: &str, occupied: &[(i32, i32)]) -> MapLayer {
    let mut cells = vec![false; width as usize * height as usize];
    for (x, y) in occupied {
        if *x >= 0 && *y >= 0 && *x < width as i32 && *y < height as i32 {
            cells[*y as usize * width as usize + *x as usize] = true;
        }
    }
    MapLayer {
        name: name.to_string(),
        blocking: true,
        cells,
    }
}

/// The stock office scene: a 39×27 room, border walls, a furniture block,
/// and five desks, one per character.
pub fn default_office() -> MapBundle {
    let width = 39_u32;
    let height = 27_u32;

    let mut wall = Vec::new();
    for x in 0..width as i32 {
        wall.push((x, 0));
        wall.push((x, height as i32 - 1));
    }
    for y in 0..height as i32 {
        wall.push((0, y));
        wall.push((width as i32 - 1, y));
    }

    // A meeting table block in the room center and two plant clusters.
    let mut objects = Vec::new();
    for x in 14..=17 {
        for y in 10..=11 {
            objects.push((x, y));
        }
    }
    objects.extend([(4, 20), (5, 20), (33, 4), (34, 4)]);

    // One desk (two tiles wide) per character, along the top and side walls.
    let desks: [(&str, [(i32, i32); 2]); 5] = [
        ("wp1", [(4, 3), (5, 3)]),
        ("wp2", [(11, 3), (12, 3)]),
        ("wp3", [(18, 3), (19, 3)]),
        ("wp4", [(25, 3), (26, 3)]),
        ("wp5", [(32, 3), (33, 3)]),
    ];

    let mut layers = vec![
        layer_from(width, height, "Wall", &wall),
        layer_from(width, height, "Objects", &objects),
    ];
    for (name, cells) in &desks {
        layers.push(layer_from(width, height, name, cells));
    }

    let agents = vec![
        AgentSeed {
            agent_id: "seo-analyst".to_string(),
            name: "Adam".to_string(),
            role: "SEO Analyst".to_string(),
            sprite_id: "Adam".to_string(),
            desk_layer: "wp1".to_string(),
        },
        AgentSeed {
            agent_id: "senior-copywriter".to_string(),
            name: "Jenny".to_string(),
            role: "Senior Copywriter".to_string(),
            sprite_id: "Jenny".to_string(),
            desk_layer: "wp2".to_string(),
        },
        AgentSeed {
            agent_id: "ua-strategist".to_string(),
            name: "Bob".to_string(),
            role: "UA Strategist".to_string(),
            sprite_id: "Bob".to_string(),
            desk_layer: "wp3".to_string(),
        },
        AgentSeed {
            agent_id: "creative-director".to_string(),
            name: "Alex".to_string(),
            role: "Creative Director".to_string(),
            sprite_id: "Alex".to_string(),
            desk_layer: "wp4".to_string(),
        },
        AgentSeed {
            agent_id: "project-manager".to_string(),
            name: "Molly".to_string(),
            role: "Project Manager".to_string(),
            sprite_id: "Molly".to_string(),
            desk_layer: "wp5".to_string(),
        },
    ];

    MapBundle {
        room_id: "office:main".to_string(),
        width,
        height,
        layers,
        agents,
    }
}
