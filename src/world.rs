//! The per-level simulation context.
//!
//! Owns the maze graph, teleporters, every actor and the shared flags. One
//! [`Simulation::tick`] runs, in order: input sampling, movement for every
//! actor, ghost behaviour updates, then pickups and contacts.

use std::collections::HashSet;

use glam::{IVec2, Vec2};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::SimConfig;
use crate::direction::cell_of;
use crate::ghost::{AiContext, GhostBrain, GhostState, Personality, PlayerView};
use crate::input::{InputBuffer, InputFrame};
use crate::level::Level;
use crate::maze::MazeGraph;
use crate::movement::{GridMover, HitWall, MoveContext, MovementParams, ReverseInput, SetDirection, TargetRef};
use crate::teleport::Teleporters;

const PELLET_SCORE: u32 = 10;
const POWER_SCORE: u32 = 50;
const GHOST_SCORE: u32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub enum Role {
    Player { spawn: IVec2 },
    Ghost(GhostBrain),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub id: EntityId,
    pub mover: GridMover,
    pub role: Role,
}

/// Read-only view of an actor for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub position: Vec2,
    pub next_cell: IVec2,
    pub heading: IVec2,
    pub ghost: Option<(Personality, GhostState)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PelletEaten { cell: IVec2 },
    PowerPelletEaten { cell: IVec2, scared: usize },
    GhostEaten { ghost: EntityId },
    PlayerCaught { player: EntityId, ghost: EntityId },
    ModeChanged { scatter: bool },
    LevelCleared,
}

pub struct Simulation {
    config: SimConfig,
    maze: MazeGraph,
    teleporters: Teleporters,
    actors: Vec<Actor>,
    home_cells: HashSet<IVec2>,
    home_entrances: Vec<IVec2>,
    scatter_anchors: Vec<IVec2>,
    pellets: HashSet<IVec2>,
    power_pellets: HashSet<IVec2>,
    scatter_mode: bool,
    mode_elapsed: f32,
    clock: f32,
    input: InputBuffer,
    last_input: InputFrame,
    rng: StdRng,
    score: u32,
    lives: u32,
    cleared: bool,
}

impl Simulation {
    fn new(maze: MazeGraph, config: SimConfig, seed: u64) -> Self {
        Self {
            input: InputBuffer::new(config.input_decay),
            scatter_mode: config.start_in_scatter,
            lives: config.lives,
            config,
            maze,
            teleporters: Teleporters::new(),
            actors: Vec::new(),
            home_cells: HashSet::new(),
            home_entrances: Vec::new(),
            scatter_anchors: Vec::new(),
            pellets: HashSet::new(),
            power_pellets: HashSet::new(),
            mode_elapsed: 0.0,
            clock: 0.0,
            last_input: InputFrame::default(),
            rng: StdRng::seed_from_u64(seed),
            score: 0,
            cleared: false,
        }
    }

    pub fn from_level(level: &Level, config: SimConfig, seed: u64) -> Self {
        let maze = level.build_maze();
        let mut sim = Self::new(maze, config, seed);
        sim.teleporters = Teleporters::from_pairs(&level.teleporters, &sim.maze);
        sim.home_cells = level.home_cells.clone();
        sim.home_entrances = level.home_entrances.clone();
        sim.scatter_anchors = level.scatter_anchors.clone();
        sim.pellets = level.pellets.clone();
        sim.power_pellets = level.power_pellets.clone();
        // A level with nothing to eat can never be cleared.
        sim.cleared = sim.pellets.is_empty() && sim.power_pellets.is_empty();
        for spawn in &level.player_spawns {
            sim.spawn_player(*spawn);
        }
        for (personality, cell) in &level.ghost_spawns {
            sim.spawn_ghost(*personality, *cell);
        }
        sim.shuffle_scatter_anchors();
        info!(
            "level ready: {} players, {} ghosts, {} pellets, {} teleporters",
            level.player_spawns.len(),
            level.ghost_spawns.len(),
            sim.pellets.len() + sim.power_pellets.len(),
            level.teleporters.len()
        );
        sim
    }

    pub fn player_params(&self) -> MovementParams {
        MovementParams {
            hit_wall: HitWall::Stop,
            set_direction: SetDirection::Input,
            reverse_input: ReverseInput::Anytime,
            count_ignorable_walls: true,
            count_secret_walls: false,
            target: None,
            target_offset: Vec2::ZERO,
            speed: self.config.player_speed,
        }
    }

    pub fn spawn_player(&mut self, cell: IVec2) -> EntityId {
        let id = EntityId(self.actors.len());
        let mover = GridMover::new(cell.as_vec2(), self.player_params())
            .with_post_buffer(self.config.player_post_buffer);
        self.actors.push(Actor {
            id,
            mover,
            role: Role::Player { spawn: cell },
        });
        id
    }

    pub fn spawn_ghost(&mut self, personality: Personality, cell: IVec2) -> EntityId {
        let id = EntityId(self.actors.len());
        self.actors.push(Actor {
            id,
            mover: GridMover::new(cell.as_vec2(), GhostBrain::initial_params()),
            role: Role::Ghost(GhostBrain::new(personality, cell, self.clock)),
        });
        id
    }

    /// Advances the world by `dt` seconds with `raw_input` held.
    pub fn tick(&mut self, raw_input: Vec2, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.clock += dt;
        self.advance_schedule(dt, &mut events);

        let frame = self.input.sample(raw_input, self.clock);
        self.last_input = frame;
        let step = dt * self.config.game_speed;

        for idx in 0..self.actors.len() {
            let target_point = self.resolve_target(&self.actors[idx].mover);
            let mut ctx = MoveContext {
                maze: &self.maze,
                teleporters: &self.teleporters,
                input: frame,
                target_point,
                step,
                rng: &mut self.rng,
            };
            self.actors[idx].mover.advance(&mut ctx);
        }

        self.update_ghosts();
        self.resolve_triggers(&mut events);
        events
    }

    fn resolve_target(&self, mover: &GridMover) -> Option<Vec2> {
        let params = mover.movement_params();
        let anchor = match params.target? {
            TargetRef::Cell(cell) => cell.as_vec2(),
            TargetRef::Entity(id) => match self.actors.get(id.0) {
                Some(actor) => actor.mover.position(),
                None => {
                    warn!("target {id:?} does not exist");
                    return None;
                }
            },
        };
        Some(anchor + params.target_offset)
    }

    fn update_ghosts(&mut self) {
        let players = self.player_views();
        let ghost_positions: Vec<Vec2> = self
            .actors
            .iter()
            .filter(|a| matches!(a.role, Role::Ghost(_)))
            .map(|a| a.mover.position())
            .collect();
        let lead_ghost = self.lead_ghost().map(|id| self.actors[id.0].mover.position());

        for actor in &mut self.actors {
            let Actor { id, mover, role } = actor;
            let Role::Ghost(brain) = role else {
                continue;
            };
            let mut ctx = AiContext {
                now: self.clock,
                scatter_mode: self.scatter_mode,
                bounds: self.maze.bounds(),
                bounds_margin: self.config.bounds_margin,
                wait_duration: self.config.wait_duration,
                scared_duration: self.config.scared_duration,
                proximity_radius: self.config.ghost_radius,
                self_id: *id,
                players: &players,
                ghost_positions: &ghost_positions,
                lead_ghost,
                home_cells: &self.home_cells,
                home_entrances: &self.home_entrances,
                scatter_anchors: &self.scatter_anchors,
                rng: &mut self.rng,
            };
            brain.update(mover, &mut ctx);
        }
    }

    fn player_views(&self) -> Vec<PlayerView> {
        self.actors
            .iter()
            .filter(|a| matches!(a.role, Role::Player { .. }))
            .map(|a| PlayerView {
                id: a.id,
                position: a.mover.position(),
                heading: a.mover.move_direction(),
            })
            .collect()
    }

    /// The first red ghost, else the first ghost.
    pub fn lead_ghost(&self) -> Option<EntityId> {
        let ghosts = || {
            self.actors.iter().filter_map(|a| match &a.role {
                Role::Ghost(brain) => Some((a.id, brain.personality())),
                Role::Player { .. } => None,
            })
        };
        ghosts()
            .find(|(_, p)| *p == Personality::Red)
            .or_else(|| ghosts().next())
            .map(|(id, _)| id)
    }

    fn resolve_triggers(&mut self, events: &mut Vec<GameEvent>) {
        let players: Vec<(EntityId, Vec2)> =
            self.player_views().iter().map(|p| (p.id, p.position)).collect();

        for (_, position) in &players {
            let cell = cell_of(*position);
            if self.pellets.remove(&cell) {
                self.score += PELLET_SCORE;
                events.push(GameEvent::PelletEaten { cell });
            }
            if self.power_pellets.remove(&cell) {
                self.score += POWER_SCORE;
                let scared = self.scare_ghosts();
                events.push(GameEvent::PowerPelletEaten { cell, scared });
            }
        }

        let mut caught = None;
        for (player, position) in &players {
            for actor in &mut self.actors {
                let Role::Ghost(brain) = &mut actor.role else {
                    continue;
                };
                if actor.mover.position().distance(*position) >= self.config.capture_radius {
                    continue;
                }
                match brain.state() {
                    GhostState::Scared => {
                        brain.mark_captured();
                        self.score += GHOST_SCORE;
                        debug!("ghost {:?} eaten", actor.id);
                        events.push(GameEvent::GhostEaten { ghost: actor.id });
                    }
                    GhostState::Chase | GhostState::Scatter if caught.is_none() => {
                        caught = Some((*player, actor.id));
                    }
                    _ => {}
                }
            }
        }
        if let Some((player, ghost)) = caught {
            self.player_caught(player);
            events.push(GameEvent::PlayerCaught { player, ghost });
        }

        if !self.cleared && self.pellets.is_empty() && self.power_pellets.is_empty() {
            self.cleared = true;
            info!("level cleared with score {}", self.score);
            events.push(GameEvent::LevelCleared);
        }
    }

    fn player_caught(&mut self, player: EntityId) {
        self.lives = self.lives.saturating_sub(1);
        info!("player {player:?} caught, {} lives left", self.lives);
        let now = self.clock;
        for actor in &mut self.actors {
            match &mut actor.role {
                Role::Player { spawn } => actor.mover.place_at(*spawn),
                Role::Ghost(brain) => brain.send_home(&mut actor.mover, now),
            }
        }
        self.input.clear();
    }

    /// Frightens every chasing or scattering ghost; returns how many are
    /// scared afterwards.
    pub fn scare_ghosts(&mut self) -> usize {
        let now = self.clock;
        self.actors
            .iter_mut()
            .filter_map(|a| match &mut a.role {
                Role::Ghost(brain) => Some(brain),
                Role::Player { .. } => None,
            })
            .map(|brain| brain.scare(now))
            .filter(|scared| *scared)
            .count()
    }

    /// Sends a scared ghost home. Returns `false` for anything else.
    pub fn mark_captured(&mut self, ghost: EntityId) -> bool {
        match self.actors.get_mut(ghost.0).map(|a| &mut a.role) {
            Some(Role::Ghost(brain)) => brain.mark_captured(),
            _ => false,
        }
    }

    pub fn set_scatter_mode(&mut self, scatter: bool) {
        if self.scatter_mode == scatter {
            return;
        }
        self.scatter_mode = scatter;
        self.mode_elapsed = 0.0;
        self.shuffle_scatter_anchors();
        for actor in &mut self.actors {
            if let Role::Ghost(brain) = &mut actor.role {
                brain.follow_mode(scatter);
            }
        }
        info!("scatter mode {}", if scatter { "on" } else { "off" });
    }

    fn advance_schedule(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let Some(schedule) = self.config.schedule else {
            return;
        };
        self.mode_elapsed += dt;
        let phase = if self.scatter_mode {
            schedule.scatter_secs
        } else {
            schedule.chase_secs
        };
        if self.mode_elapsed >= phase {
            let scatter = !self.scatter_mode;
            self.set_scatter_mode(scatter);
            events.push(GameEvent::ModeChanged { scatter });
        }
    }

    // One anchor per ghost, in a fresh order; ghosts beyond the anchor count
    // wander instead.
    fn shuffle_scatter_anchors(&mut self) {
        let mut anchors = self.scatter_anchors.clone();
        anchors.shuffle(&mut self.rng);
        let mut anchors = anchors.into_iter();
        for actor in &mut self.actors {
            if let Role::Ghost(brain) = &mut actor.role {
                brain.set_scatter_target(anchors.next().map(TargetRef::Cell));
            }
        }
    }

    pub fn snapshots(&self) -> Vec<EntitySnapshot> {
        self.actors
            .iter()
            .map(|a| EntitySnapshot {
                id: a.id,
                position: a.mover.position(),
                next_cell: a.mover.next_cell(),
                heading: a.mover.move_direction(),
                ghost: match &a.role {
                    Role::Ghost(brain) => Some((brain.personality(), brain.state())),
                    Role::Player { .. } => None,
                },
            })
            .collect()
    }

    pub fn teleporter_endpoints(&self) -> Vec<(Vec2, Vec2)> {
        self.teleporters.endpoints()
    }

    pub fn maze(&self) -> &MazeGraph {
        &self.maze
    }

    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(id.0)
    }

    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.actors.get_mut(id.0)
    }

    pub fn mover(&self, id: EntityId) -> Option<&GridMover> {
        self.actor(id).map(|a| &a.mover)
    }

    pub fn ghost(&self, id: EntityId) -> Option<&GhostBrain> {
        match self.actor(id).map(|a| &a.role) {
            Some(Role::Ghost(brain)) => Some(brain),
            _ => None,
        }
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn home_cells(&self) -> &HashSet<IVec2> {
        &self.home_cells
    }

    pub fn pellets(&self) -> &HashSet<IVec2> {
        &self.pellets
    }

    pub fn power_pellets(&self) -> &HashSet<IVec2> {
        &self.power_pellets
    }

    pub fn scatter_mode(&self) -> bool {
        self.scatter_mode
    }

    pub fn time(&self) -> f32 {
        self.clock
    }

    pub fn last_input(&self) -> InputFrame {
        self.last_input
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
