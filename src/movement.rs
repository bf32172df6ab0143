//! Grid movement.
//!
//! A [`GridMover`] keeps a continuous position travelling from `prev_cell`
//! toward the adjacent `next_cell`. Headings change on arrival at a maze
//! node, while stopped, or in front of a door or secret wall that blocks
//! this mover. A fresh turn is also taken inside the early-turn window just
//! after leaving a cell, and entities allowed to reverse freely may do so
//! at any time.

use glam::{IVec2, Vec2};
use log::debug;
use rand::Rng;

use crate::direction::{cell_of, move_towards, rotate_ccw, rotate_cw, Dir};
use crate::input::InputFrame;
use crate::maze::MazeGraph;
use crate::teleport::Teleporters;
use crate::world::EntityId;

/// What happens when the committed heading runs into a wall at a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HitWall {
    #[default]
    Stop,
    /// Turn left, else right, else stop.
    TurnStop,
    /// Turn left, else right, else reverse.
    TurnReverse,
    Reverse,
}

/// Where the desired heading comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SetDirection {
    /// Heading is driven from outside through [`GridMover::set_move_direction`].
    #[default]
    Manual,
    /// Pick a random heading when stopped; used for idle wiggling.
    Auto,
    Input,
    Target,
    Random,
}

/// When a desired heading opposite to the current one is honoured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReverseInput {
    #[default]
    None,
    Anytime,
    NodeOnly,
    WallOnly,
}

/// Something a mover can steer toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetRef {
    Entity(EntityId),
    Cell(IVec2),
}

/// The full set of tunables swapped into a mover in one go.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementParams {
    pub hit_wall: HitWall,
    pub set_direction: SetDirection,
    pub reverse_input: ReverseInput,
    /// Door tiles block this entity.
    pub count_ignorable_walls: bool,
    /// Secret walls block this entity.
    pub count_secret_walls: bool,
    pub target: Option<TargetRef>,
    pub target_offset: Vec2,
    /// Cells per second.
    pub speed: f32,
}

impl Default for MovementParams {
    fn default() -> Self {
        Self {
            hit_wall: HitWall::Stop,
            set_direction: SetDirection::Manual,
            reverse_input: ReverseInput::None,
            count_ignorable_walls: true,
            count_secret_walls: true,
            target: None,
            target_offset: Vec2::ZERO,
            speed: 1.0,
        }
    }
}

/// Shared state a mover reads while advancing one tick.
pub struct MoveContext<'a, R: Rng> {
    pub maze: &'a MazeGraph,
    pub teleporters: &'a Teleporters,
    pub input: InputFrame,
    /// Resolved target position, offset included.
    pub target_point: Option<Vec2>,
    /// Simulated seconds this tick.
    pub step: f32,
    pub rng: &'a mut R,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridMover {
    position: Vec2,
    prev_cell: IVec2,
    next_cell: IVec2,
    move_direction: IVec2,
    input_direction: IVec2,
    move_multiplier: i32,
    input_post_buffer: f32,
    params: MovementParams,
}

impl GridMover {
    /// A stopped mover snapped to the cell nearest `position`.
    pub fn new(position: Vec2, params: MovementParams) -> Self {
        let cell = cell_of(position);
        Self {
            position: cell.as_vec2(),
            prev_cell: cell,
            next_cell: cell,
            move_direction: IVec2::ZERO,
            input_direction: IVec2::ZERO,
            move_multiplier: 1,
            input_post_buffer: 0.0,
            params,
        }
    }

    /// Fraction of a cell after leaving a node during which a fresh turn is
    /// still taken at that node.
    pub fn with_post_buffer(mut self, fraction: f32) -> Self {
        self.input_post_buffer = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn prev_cell(&self) -> IVec2 {
        self.prev_cell
    }

    pub fn next_cell(&self) -> IVec2 {
        self.next_cell
    }

    pub fn move_direction(&self) -> IVec2 {
        self.move_direction
    }

    pub fn input_direction(&self) -> IVec2 {
        self.input_direction
    }

    pub fn move_multiplier(&self) -> i32 {
        self.move_multiplier
    }

    pub fn input_post_buffer(&self) -> f32 {
        self.input_post_buffer
    }

    pub fn movement_params(&self) -> MovementParams {
        self.params
    }

    /// Applies a new bundle. Returns `false` and leaves the mover untouched
    /// when the bundle is already in place.
    pub fn set_movement_params(&mut self, params: MovementParams) -> bool {
        if self.params == params {
            return false;
        }
        self.params = params;
        true
    }

    /// Stops in place on the nearest cell.
    pub fn reset_move_direction(&mut self) {
        self.move_direction = IVec2::ZERO;
        self.input_direction = IVec2::ZERO;
        self.prev_cell = cell_of(self.position);
        self.next_cell = self.prev_cell;
    }

    /// Moves to `cell` and stops there.
    pub fn place_at(&mut self, cell: IVec2) {
        self.position = cell.as_vec2();
        self.reset_move_direction();
    }

    /// Turns around mid-corridor, heading back to the cell just left.
    pub fn instant_reverse(&mut self) {
        self.move_direction = -self.move_direction;
        self.move_multiplier = 1;
        self.prev_cell = self.next_cell;
        self.next_cell = self.prev_cell + self.move_direction * self.move_multiplier;
    }

    /// Commits a heading for a mover resting on its cell; used by
    /// [`SetDirection::Manual`] owners.
    pub fn set_move_direction(&mut self, direction: IVec2) {
        self.move_direction = direction;
        self.move_multiplier = 1;
        self.next_cell = self.prev_cell + direction;
    }

    fn blocked(&self, maze: &MazeGraph, cell: IVec2) -> bool {
        maze.has_wall(
            cell,
            self.params.count_ignorable_walls,
            self.params.count_secret_walls,
        )
    }

    /// Advances one tick.
    pub fn advance<R: Rng>(&mut self, ctx: &mut MoveContext<'_, R>) {
        let travel = self.params.speed * ctx.step;
        self.input_direction = self.resolve_intent(ctx, travel);

        if self.params.reverse_input == ReverseInput::Anytime
            && self.input_direction != IVec2::ZERO
            && self.input_direction == -self.move_direction
        {
            self.instant_reverse();
        }

        self.position = move_towards(self.position, self.next_cell.as_vec2(), travel);

        let early_turn = self.within_post_buffer() && self.fresh_turn(ctx);
        let arrived = self.position == self.next_cell.as_vec2();
        if !arrived && !early_turn {
            return;
        }

        if early_turn {
            self.position = self.prev_cell.as_vec2();
            self.next_cell = self.prev_cell;
        }

        if let Some(exit) = ctx.teleporters.exit_for(cell_of(self.position)) {
            debug!("teleport {} -> {}", cell_of(self.position), exit.cell);
            self.position = exit.cell.as_vec2();
            if let Some(facing) = exit.facing {
                self.move_direction = facing;
            }
        }

        self.prev_cell = cell_of(self.position);
        self.position = self.prev_cell.as_vec2();

        if self.decides_at(ctx.maze, self.prev_cell) {
            self.take_intent(ctx.maze);
            self.resolve_wall_hit(ctx.maze);
        }

        self.next_cell = self.prev_cell + self.move_direction * self.move_multiplier;
    }

    // Nodes, a stopped mover, and any cell whose way ahead blocks this
    // mover even though the graph saw it as open (doors, secret walls).
    fn decides_at(&self, maze: &MazeGraph, cell: IVec2) -> bool {
        maze.is_node(cell)
            || self.move_direction == IVec2::ZERO
            || self.blocked(maze, cell + self.move_direction)
    }

    // Just past the previous cell, within the post-buffer fraction of a cell.
    fn within_post_buffer(&self) -> bool {
        if self.input_post_buffer <= 0.0 {
            return false;
        }
        let prev = self.prev_cell.as_vec2();
        let reach = self.move_direction.as_vec2() * self.input_post_buffer;
        self.position.distance(prev) <= reach.length() && (self.position - prev).dot(reach) > 0.0
    }

    // A sideways turn pressed this frame that the previous cell allows.
    fn fresh_turn<R: Rng>(&self, ctx: &MoveContext<'_, R>) -> bool {
        let intent = self.input_direction;
        ctx.input.pressed_this_frame
            && intent != IVec2::ZERO
            && intent != self.move_direction
            && intent != -self.move_direction
            && !self.blocked(ctx.maze, self.prev_cell + intent)
    }

    fn take_intent(&mut self, maze: &MazeGraph) {
        let intent = self.input_direction;
        if intent == IVec2::ZERO || self.blocked(maze, self.prev_cell + intent) {
            return;
        }
        let reversing = intent == -self.move_direction;
        let permitted = match self.params.reverse_input {
            ReverseInput::NodeOnly => true,
            ReverseInput::WallOnly => {
                !reversing || self.blocked(maze, self.prev_cell + self.move_direction)
            }
            ReverseInput::None | ReverseInput::Anytime => !reversing,
        };
        if permitted {
            self.move_direction = intent;
            self.move_multiplier = 1;
        }
    }

    fn resolve_wall_hit(&mut self, maze: &MazeGraph) {
        let heading = self.move_direction;
        if !self.blocked(maze, self.prev_cell + heading) {
            return;
        }
        let resolved = match self.params.hit_wall {
            HitWall::Stop => heading,
            HitWall::Reverse => -heading,
            HitWall::TurnStop | HitWall::TurnReverse => self.turn_at_wall(maze),
        };
        self.move_direction = resolved;
        // Stalling only on a true dead end keeps the mover from bouncing
        // against the wall every tick.
        self.move_multiplier = if resolved == heading { 0 } else { 1 };
    }

    fn turn_at_wall(&self, maze: &MazeGraph) -> IVec2 {
        let heading = self.move_direction;
        let left = rotate_ccw(heading);
        if !self.blocked(maze, self.prev_cell + left) {
            return left;
        }
        let right = rotate_cw(heading);
        if !self.blocked(maze, self.prev_cell + right) {
            return right;
        }
        match self.params.hit_wall {
            HitWall::TurnReverse | HitWall::Reverse => -heading,
            HitWall::TurnStop | HitWall::Stop => heading,
        }
    }

    fn resolve_intent<R: Rng>(&self, ctx: &mut MoveContext<'_, R>, travel: f32) -> IVec2 {
        match self.params.set_direction {
            SetDirection::Input => ctx.input.direction,
            SetDirection::Target => match ctx.target_point {
                Some(target) => self.steer_toward(ctx.maze, target, travel),
                None => IVec2::ZERO,
            },
            SetDirection::Auto => {
                if self.move_direction == IVec2::ZERO {
                    random_cardinal(ctx.rng)
                } else {
                    IVec2::ZERO
                }
            }
            SetDirection::Random => self.wander(ctx, travel),
            SetDirection::Manual => IVec2::ZERO,
        }
    }

    /// `(at_node, at_wall)` for the arrival this tick's travel would make.
    fn arrival_probe(&self, maze: &MazeGraph, travel: f32) -> (bool, bool) {
        let next = self.next_cell.as_vec2();
        let reaches = move_towards(self.position, next, travel) == next;
        let at_node = reaches && self.decides_at(maze, self.next_cell);
        let at_wall = at_node && self.blocked(maze, self.next_cell + self.move_direction);
        (at_node, at_wall)
    }

    fn steer_toward(&self, maze: &MazeGraph, target: Vec2, travel: f32) -> IVec2 {
        let (at_node, at_wall) = self.arrival_probe(maze, travel);

        if !at_node && self.params.reverse_input == ReverseInput::Anytime {
            let ahead = self.next_cell.as_vec2().distance(target);
            // Doubling back costs the trip to the previous cell twice.
            let behind = self.prev_cell.as_vec2().distance(target) * 2.0;
            if behind < ahead {
                return self.prev_cell - self.next_cell;
            }
        }

        if !at_node {
            return self.input_direction;
        }

        let allow_reverse = match self.params.reverse_input {
            ReverseInput::None => false,
            ReverseInput::Anytime | ReverseInput::NodeOnly => true,
            ReverseInput::WallOnly => at_wall,
        };
        let reverse = -self.move_direction;
        self.open_directions(maze, allow_reverse)
            .into_iter()
            .map(|dir| {
                let reach = if dir == reverse { 2 } else { 1 };
                let distance = (self.next_cell + dir * reach).as_vec2().distance(target);
                (dir, distance)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(IVec2::ZERO, |(dir, _)| dir)
    }

    fn wander<R: Rng>(&self, ctx: &mut MoveContext<'_, R>, travel: f32) -> IVec2 {
        let (_, at_wall) = self.arrival_probe(ctx.maze, travel);
        let allow_reverse = match self.params.reverse_input {
            ReverseInput::None | ReverseInput::NodeOnly => false,
            ReverseInput::Anytime => true,
            ReverseInput::WallOnly => at_wall,
        };
        let open = self.open_directions(ctx.maze, allow_reverse);
        if open.is_empty() {
            // Boxed in: any heading, legal or not, lets a trapped mover escape.
            return random_cardinal(ctx.rng);
        }
        open[ctx.rng.gen_range(0..open.len())]
    }

    /// Unblocked headings out of `next_cell`, in [`Dir::ALL`] order.
    fn open_directions(&self, maze: &MazeGraph, allow_reverse: bool) -> Vec<IVec2> {
        let reverse = -self.move_direction;
        Dir::ALL
            .into_iter()
            .map(Dir::delta)
            .filter(|dir| !self.blocked(maze, self.next_cell + *dir))
            .filter(|dir| allow_reverse || *dir != reverse)
            .collect()
    }
}

fn random_cardinal<R: Rng>(rng: &mut R) -> IVec2 {
    Dir::ALL[rng.gen_range(0..Dir::ALL.len())].delta()
}
