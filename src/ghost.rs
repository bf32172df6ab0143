//! Ghost behaviour.
//!
//! Each ghost pairs a [`GhostBrain`] with its own [`GridMover`]. Every tick
//! the brain picks one [`MovementParams`] bundle for its current state and
//! hands it to the mover; personalities only differ in where they aim while
//! chasing.

use std::collections::HashSet;

use glam::{IVec2, Vec2};
use log::{debug, warn};
use rand::Rng;

use crate::direction::cell_of;
use crate::movement::{GridMover, HitWall, MovementParams, ReverseInput, SetDirection, TargetRef};
use crate::tiles::Bounds;
use crate::world::EntityId;

const WAIT_SPEED: f32 = 4.0;
const CHASE_SPEED: f32 = 5.0;
const EATEN_SPEED: f32 = 15.0;
const SCARED_SPEED: f32 = 2.5;
const YELLOW_SPRINT_SPEED: f32 = 5.5;
const YELLOW_LURK_SPEED: f32 = 2.5;

const PINK_LEAD: f32 = 4.0;
const CYAN_LEAD: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GhostState {
    Wait,
    Chase,
    Scared,
    Scatter,
    Eaten,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Personality {
    Red,
    Pink,
    Cyan,
    Orange,
    Green,
    Purple,
    Yellow,
    White,
    Custom,
}

impl Personality {
    pub fn from_glyph(glyph: char) -> Option<Self> {
        let personality = match glyph {
            'R' => Personality::Red,
            'K' => Personality::Pink,
            'C' => Personality::Cyan,
            'O' => Personality::Orange,
            'G' => Personality::Green,
            'U' => Personality::Purple,
            'Y' => Personality::Yellow,
            'W' => Personality::White,
            'X' => Personality::Custom,
            _ => return None,
        };
        Some(personality)
    }

    pub fn glyph(self) -> char {
        match self {
            Personality::Red => 'R',
            Personality::Pink => 'K',
            Personality::Cyan => 'C',
            Personality::Orange => 'O',
            Personality::Green => 'G',
            Personality::Purple => 'U',
            Personality::Yellow => 'Y',
            Personality::White => 'W',
            Personality::Custom => 'X',
        }
    }
}

/// A player as seen by the ghosts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerView {
    pub id: EntityId,
    pub position: Vec2,
    pub heading: IVec2,
}

/// Shared world state a ghost reads while updating.
pub struct AiContext<'a, R: Rng> {
    pub now: f32,
    pub scatter_mode: bool,
    pub bounds: Bounds,
    pub bounds_margin: i32,
    pub wait_duration: f32,
    pub scared_duration: f32,
    pub proximity_radius: f32,
    pub self_id: EntityId,
    pub players: &'a [PlayerView],
    pub ghost_positions: &'a [Vec2],
    pub lead_ghost: Option<Vec2>,
    pub home_cells: &'a HashSet<IVec2>,
    pub home_entrances: &'a [IVec2],
    pub scatter_anchors: &'a [IVec2],
    pub rng: &'a mut R,
}

impl<R: Rng> AiContext<'_, R> {
    fn mode_state(&self) -> GhostState {
        if self.scatter_mode {
            GhostState::Scatter
        } else {
            GhostState::Chase
        }
    }

    fn nearest_player(&self, from: Vec2) -> Option<PlayerView> {
        self.players
            .iter()
            .copied()
            .min_by(|a, b| a.position.distance(from).total_cmp(&b.position.distance(from)))
    }

    fn nearest_entrance(&self, from: Vec2) -> Option<IVec2> {
        self.home_entrances
            .iter()
            .copied()
            .min_by(|a, b| a.as_vec2().distance(from).total_cmp(&b.as_vec2().distance(from)))
    }

    fn nearest_home_cell(&self, from: IVec2) -> Option<IVec2> {
        self.home_cells
            .iter()
            .copied()
            .min_by_key(|cell| ((*cell - from).length_squared(), cell.x, cell.y))
    }
}

/// Per-state bundles. Some fields are rewritten as the ghost plays.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Behaviors {
    wait: MovementParams,
    chase: MovementParams,
    input_chase: MovementParams,
    eaten: MovementParams,
    scared: MovementParams,
    scatter: MovementParams,
}

impl Default for Behaviors {
    fn default() -> Self {
        let roam = MovementParams {
            hit_wall: HitWall::TurnReverse,
            set_direction: SetDirection::Target,
            reverse_input: ReverseInput::None,
            count_ignorable_walls: true,
            count_secret_walls: true,
            target: None,
            target_offset: Vec2::ZERO,
            speed: CHASE_SPEED,
        };
        Self {
            wait: MovementParams {
                set_direction: SetDirection::Auto,
                speed: WAIT_SPEED,
                ..roam
            },
            chase: roam,
            input_chase: MovementParams {
                hit_wall: HitWall::Stop,
                set_direction: SetDirection::Input,
                reverse_input: ReverseInput::WallOnly,
                ..roam
            },
            eaten: MovementParams {
                count_ignorable_walls: false,
                speed: EATEN_SPEED,
                ..roam
            },
            scared: MovementParams {
                set_direction: SetDirection::Random,
                speed: SCARED_SPEED,
                ..roam
            },
            scatter: roam,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GhostBrain {
    personality: Personality,
    state: GhostState,
    prev_state: GhostState,
    is_home: bool,
    prev_is_home: bool,
    start_cell: IVec2,
    time_entered_home: f32,
    time_became_scared: f32,
    scatter_target: Option<TargetRef>,
    behaviors: Behaviors,
}

impl GhostBrain {
    /// A waiting ghost whose wait timer starts at `now`.
    pub fn new(personality: Personality, start_cell: IVec2, now: f32) -> Self {
        Self {
            personality,
            state: GhostState::Wait,
            prev_state: GhostState::Wait,
            is_home: false,
            prev_is_home: false,
            start_cell,
            time_entered_home: now,
            time_became_scared: now,
            scatter_target: None,
            behaviors: Behaviors::default(),
        }
    }

    /// Bundle a freshly spawned ghost starts with.
    pub fn initial_params() -> MovementParams {
        Behaviors::default().wait
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn state(&self) -> GhostState {
        self.state
    }

    pub fn is_home(&self) -> bool {
        self.is_home
    }

    pub fn start_cell(&self) -> IVec2 {
        self.start_cell
    }

    pub fn time_entered_home(&self) -> f32 {
        self.time_entered_home
    }

    pub fn time_became_scared(&self) -> f32 {
        self.time_became_scared
    }

    pub fn scatter_target(&self) -> Option<TargetRef> {
        self.scatter_target
    }

    pub fn set_scatter_target(&mut self, target: Option<TargetRef>) {
        self.scatter_target = target;
    }

    /// Frightens a chasing or scattering ghost. An already scared ghost only
    /// restarts its timer. Returns whether the ghost is scared afterwards.
    pub fn scare(&mut self, now: f32) -> bool {
        match self.state {
            GhostState::Scared => {
                self.time_became_scared = now;
                true
            }
            GhostState::Chase | GhostState::Scatter => {
                self.state = GhostState::Scared;
                true
            }
            GhostState::Wait | GhostState::Eaten => false,
        }
    }

    /// A scared ghost touched by a player is sent home.
    pub fn mark_captured(&mut self) -> bool {
        if self.state != GhostState::Scared {
            return false;
        }
        self.state = GhostState::Eaten;
        true
    }

    /// Follows a global scatter/chase switch.
    pub fn follow_mode(&mut self, scatter: bool) {
        self.state = match (self.state, scatter) {
            (GhostState::Chase, true) => GhostState::Scatter,
            (GhostState::Scatter, false) => GhostState::Chase,
            (state, _) => state,
        };
    }

    /// Puts the ghost back to waiting at `now`, as after a lost life.
    pub fn send_home(&mut self, mover: &mut GridMover, now: f32) {
        mover.place_at(self.start_cell);
        self.state = GhostState::Wait;
        self.time_entered_home = now;
    }

    pub fn update<R: Rng>(&mut self, mover: &mut GridMover, ctx: &mut AiContext<'_, R>) {
        let cell = cell_of(mover.position());
        if !ctx.bounds.expand(ctx.bounds_margin).contains(cell) {
            warn!("{:?} ghost escaped the maze at {cell}, resetting", self.personality);
            self.send_home(mover, ctx.now);
        }

        self.is_home = ctx.home_cells.contains(&cell_of(mover.position()));

        match self.state {
            GhostState::Wait => {
                mover.set_movement_params(self.behaviors.wait);
                if ctx.now >= self.time_entered_home + ctx.wait_duration {
                    self.state = ctx.mode_state();
                }
            }
            GhostState::Chase => self.chase(mover, ctx),
            GhostState::Eaten => {
                if self.prev_state != GhostState::Eaten {
                    self.head_for_home(ctx);
                }
                mover.set_movement_params(self.behaviors.eaten);
                if self.is_home {
                    self.state = GhostState::Wait;
                    self.time_entered_home = ctx.now;
                }
            }
            GhostState::Scared => {
                if self.prev_state != GhostState::Scared {
                    mover.instant_reverse();
                    self.time_became_scared = ctx.now;
                }
                mover.set_movement_params(self.behaviors.scared);
                if self.is_home {
                    self.state = GhostState::Wait;
                    self.time_entered_home = ctx.now;
                } else if ctx.now >= self.time_became_scared + ctx.scared_duration {
                    self.state = ctx.mode_state();
                }
            }
            GhostState::Scatter => self.scatter(mover, ctx),
        }

        if self.state != self.prev_state {
            debug!(
                "{:?} ghost {:?} -> {:?} at {:.2}s",
                self.personality, self.prev_state, self.state, ctx.now
            );
        }
        self.prev_state = self.state;
        self.prev_is_home = self.is_home;
    }

    fn chase<R: Rng>(&mut self, mover: &mut GridMover, ctx: &mut AiContext<'_, R>) {
        if self.personality == Personality::White && !self.is_home {
            mover.set_movement_params(self.behaviors.input_chase);
            return;
        }

        let position = mover.position();
        let (target, offset) = self.chase_target(position, ctx);
        let chase = &mut self.behaviors.chase;
        if self.is_home {
            chase.target = ctx.nearest_entrance(position).map(TargetRef::Cell);
            chase.target_offset = Vec2::ZERO;
        } else {
            chase.target = target;
            chase.target_offset = offset;
        }
        chase.count_ignorable_walls = !self.is_home;
        mover.set_movement_params(*chase);
    }

    /// Where this personality aims while chasing, and the offset added on top.
    fn chase_target<R: Rng>(&mut self, position: Vec2, ctx: &AiContext<'_, R>) -> (Option<TargetRef>, Vec2) {
        let Some(player) = ctx.nearest_player(position) else {
            return (None, Vec2::ZERO);
        };
        let on_player = Some(TargetRef::Entity(player.id));
        let distance = player.position.distance(position);

        match self.personality {
            Personality::Red | Personality::White => (on_player, Vec2::ZERO),
            Personality::Pink => (on_player, player.heading.as_vec2() * PINK_LEAD),
            Personality::Cyan => {
                let pincer = ctx.lead_ghost.map_or(Vec2::ZERO, |lead| player.position - lead);
                (on_player, player.heading.as_vec2() * CYAN_LEAD + pincer)
            }
            Personality::Orange => {
                if distance < ctx.proximity_radius {
                    if self.scatter_target.is_none() {
                        self.scatter_target = ctx.scatter_anchors.first().copied().map(TargetRef::Cell);
                    }
                    (self.scatter_target, Vec2::ZERO)
                } else {
                    (on_player, Vec2::ZERO)
                }
            }
            Personality::Green => {
                let everyone: Vec<Vec2> = ctx
                    .players
                    .iter()
                    .map(|p| p.position)
                    .chain(ctx.ghost_positions.iter().copied())
                    .collect();
                let centroid = everyone.iter().copied().sum::<Vec2>() / everyone.len() as f32;
                (Some(TargetRef::Entity(ctx.self_id)), centroid - position)
            }
            Personality::Purple => {
                self.behaviors.chase.reverse_input = ReverseInput::WallOnly;
                (on_player, Vec2::ZERO)
            }
            Personality::Yellow => {
                let chase = &mut self.behaviors.chase;
                if distance <= ctx.proximity_radius {
                    chase.set_direction = SetDirection::Target;
                    chase.speed = YELLOW_SPRINT_SPEED;
                } else {
                    chase.set_direction = SetDirection::Random;
                    chase.speed = if self.is_home { CHASE_SPEED } else { YELLOW_LURK_SPEED };
                }
                (on_player, Vec2::ZERO)
            }
            Personality::Custom => (None, Vec2::ZERO),
        }
    }

    fn scatter<R: Rng>(&mut self, mover: &mut GridMover, ctx: &mut AiContext<'_, R>) {
        if self.personality == Personality::White {
            self.state = GhostState::Chase;
            return;
        }

        let position = mover.position();
        if self.is_home {
            self.behaviors.scatter.target = ctx.nearest_entrance(position).map(TargetRef::Cell);
            self.behaviors.scatter.set_direction = SetDirection::Target;
        } else if self.prev_state != GhostState::Scatter {
            mover.instant_reverse();
            self.aim_at_anchor();
        } else if self.prev_is_home {
            self.aim_at_anchor();
        }

        let scatter = &mut self.behaviors.scatter;
        if self.personality == Personality::Yellow {
            scatter.speed = if self.is_home { CHASE_SPEED } else { YELLOW_LURK_SPEED };
        }
        scatter.count_ignorable_walls = !self.is_home;
        mover.set_movement_params(*scatter);
    }

    fn aim_at_anchor(&mut self) {
        let scatter = &mut self.behaviors.scatter;
        scatter.target = self.scatter_target;
        scatter.target_offset = Vec2::ZERO;
        scatter.set_direction = if self.scatter_target.is_some() {
            SetDirection::Target
        } else {
            SetDirection::Random
        };
    }

    // Aims at a random entrance, offset onto the nearest home cell so the
    // ghost keeps going through the door instead of circling the entrance.
    fn head_for_home<R: Rng>(&mut self, ctx: &mut AiContext<'_, R>) {
        let eaten = &mut self.behaviors.eaten;
        if ctx.home_entrances.is_empty() {
            let home = ctx.nearest_home_cell(self.start_cell);
            eaten.target = home.map(TargetRef::Cell);
            eaten.target_offset = Vec2::ZERO;
            return;
        }
        let entrance = ctx.home_entrances[ctx.rng.gen_range(0..ctx.home_entrances.len())];
        eaten.target = Some(TargetRef::Cell(entrance));
        eaten.target_offset = ctx
            .nearest_home_cell(entrance)
            .map_or(Vec2::ZERO, |home| (home - entrance).as_vec2());
    }
}
