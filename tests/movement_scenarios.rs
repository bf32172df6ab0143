use approx::assert_relative_eq;
use gakman::movement::MoveContext;
use gakman::{
    GridMover, HitWall, InputFrame, Level, MazeGraph, MovementParams, ReverseInput, SetDirection, TeleportExit,
    Teleporters,
};
use glam::{IVec2, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::{fixture, rstest};

const STEP: f32 = 0.05;

fn maze(rows: &[&str]) -> MazeGraph {
    Level::from_rows(rows).unwrap().build_maze()
}

fn frame(direction: IVec2, pressed: bool) -> InputFrame {
    InputFrame {
        raw: direction,
        direction,
        pressed_this_frame: pressed,
    }
}

fn advance(mover: &mut GridMover, maze: &MazeGraph, teleporters: &Teleporters, input: InputFrame) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut ctx = MoveContext {
        maze,
        teleporters,
        input,
        target_point: None,
        step: STEP,
        rng: &mut rng,
    };
    mover.advance(&mut ctx);
}

fn manual(hit_wall: HitWall) -> MovementParams {
    MovementParams {
        hit_wall,
        set_direction: SetDirection::Manual,
        speed: 5.0,
        ..MovementParams::default()
    }
}

/// Advances until the mover leaves `from`, returning how many ticks it took.
fn run_until_left(mover: &mut GridMover, maze: &MazeGraph, teleporters: &Teleporters, from: IVec2) -> usize {
    for ticks in 1..=20 {
        advance(mover, maze, teleporters, InputFrame::default());
        if mover.prev_cell() != from {
            return ticks;
        }
    }
    panic!("mover never left {from}");
}

#[test]
fn turn_stop_takes_the_open_side_at_a_wall() {
    let maze = maze(&[
        "#######", //
        "#######",
        "###.###",
        "#P..###",
        "#######",
    ]);
    let mut mover = GridMover::new(Vec2::new(2.0, 1.0), manual(HitWall::TurnStop));
    mover.set_move_direction(IVec2::X);

    run_until_left(&mut mover, &maze, &Teleporters::new(), IVec2::new(2, 1));

    assert_eq!(mover.prev_cell(), IVec2::new(3, 1));
    assert_eq!(mover.move_direction(), IVec2::Y);
    assert_eq!(mover.move_multiplier(), 1);
    assert_eq!(mover.next_cell(), IVec2::new(3, 2));
}

#[rstest]
#[case(HitWall::Stop, IVec2::X, 0)]
#[case(HitWall::Reverse, -IVec2::X, 1)]
#[case(HitWall::TurnReverse, -IVec2::X, 1)]
fn dead_end_resolution(#[case] hit_wall: HitWall, #[case] heading: IVec2, #[case] multiplier: i32) {
    let maze = maze(&[
        "#####", //
        "#P..#",
        "#####",
    ]);
    let mut mover = GridMover::new(Vec2::new(2.0, 1.0), manual(hit_wall));
    mover.set_move_direction(IVec2::X);

    run_until_left(&mut mover, &maze, &Teleporters::new(), IVec2::new(2, 1));

    assert_eq!(mover.move_direction(), heading);
    assert_eq!(mover.move_multiplier(), multiplier);
    assert_eq!(mover.next_cell(), mover.prev_cell() + heading * multiplier);
}

#[test]
fn teleport_applies_on_the_arrival_tick() {
    let maze = maze(&[
        "############",
        "#P.........#",
        "############",
    ]);
    let mut teleporters = Teleporters::new();
    teleporters.insert(
        IVec2::new(10, 1),
        TeleportExit {
            cell: IVec2::new(1, 1),
            facing: Some(IVec2::X),
        },
    );
    let mut mover = GridMover::new(Vec2::new(9.0, 1.0), manual(HitWall::Stop));
    mover.set_move_direction(IVec2::X);

    let ticks = run_until_left(&mut mover, &maze, &teleporters, IVec2::new(9, 1));

    assert_eq!(ticks, 4);
    assert_eq!(mover.position(), Vec2::new(1.0, 1.0));
    assert_eq!(mover.prev_cell(), IVec2::new(1, 1));
    assert_eq!(mover.move_direction(), IVec2::X);
    assert_eq!(mover.next_cell(), IVec2::new(2, 1));
}

#[test]
fn identical_params_are_a_no_op() {
    let mut mover = GridMover::new(Vec2::new(3.4, 1.6), manual(HitWall::Stop));
    mover.set_move_direction(IVec2::Y);
    let before = mover.clone();

    assert!(!mover.set_movement_params(manual(HitWall::Stop)));
    assert_eq!(mover, before);
    assert!(mover.set_movement_params(manual(HitWall::Reverse)));
}

// A corridor along y = 1 with a single branch going up from (3, 1).
const BRANCH: [&str; 4] = [
    "#########", //
    "###.#####",
    "#P......#",
    "#########",
];

#[fixture]
fn player_at_branch() -> (GridMover, MazeGraph) {
    let maze = maze(&BRANCH);
    let params = MovementParams {
        hit_wall: HitWall::Stop,
        set_direction: SetDirection::Input,
        reverse_input: ReverseInput::Anytime,
        speed: 5.0,
        ..MovementParams::default()
    };
    let mut mover = GridMover::new(Vec2::new(2.0, 1.0), params).with_post_buffer(0.3);
    let teleporters = Teleporters::new();

    advance(&mut mover, &maze, &teleporters, frame(IVec2::X, true));
    while mover.prev_cell() != IVec2::new(3, 1) {
        advance(&mut mover, &maze, &teleporters, frame(IVec2::X, false));
    }
    assert_eq!(mover.position(), Vec2::new(3.0, 1.0));
    assert_eq!(mover.next_cell(), IVec2::new(4, 1));
    (mover, maze)
}

#[rstest]
fn late_turn_inside_post_buffer_snaps_back(player_at_branch: (GridMover, MazeGraph)) {
    let (mut mover, maze) = player_at_branch;

    advance(&mut mover, &maze, &Teleporters::new(), frame(IVec2::Y, true));

    assert_eq!(mover.position(), Vec2::new(3.0, 1.0));
    assert_eq!(mover.move_direction(), IVec2::Y);
    assert_eq!(mover.next_cell(), IVec2::new(3, 2));
}

#[rstest]
fn held_turn_past_the_node_is_not_taken(player_at_branch: (GridMover, MazeGraph)) {
    let (mut mover, maze) = player_at_branch;

    // Held, not freshly pressed: the buffer does not apply.
    advance(&mut mover, &maze, &Teleporters::new(), frame(IVec2::Y, false));

    assert_relative_eq!(mover.position().x, 3.25);
    assert_eq!(mover.move_direction(), IVec2::X);
    assert_eq!(mover.next_cell(), IVec2::new(4, 1));
}

#[rstest]
fn reverse_inside_post_buffer_is_a_reversal_not_a_turn(player_at_branch: (GridMover, MazeGraph)) {
    let (mut mover, maze) = player_at_branch;
    let teleporters = Teleporters::new();
    advance(&mut mover, &maze, &teleporters, frame(IVec2::X, false));
    assert_relative_eq!(mover.position().x, 3.25);

    advance(&mut mover, &maze, &teleporters, frame(-IVec2::X, true));

    assert_eq!(mover.position(), Vec2::new(3.0, 1.0));
    assert_eq!(mover.prev_cell(), IVec2::new(3, 1));
    assert_eq!(mover.move_direction(), -IVec2::X);
    assert_eq!(mover.next_cell(), IVec2::new(2, 1));
}

#[rstest]
fn reversal_mid_branch_swaps_cells(player_at_branch: (GridMover, MazeGraph)) {
    let (mut mover, maze) = player_at_branch;
    let teleporters = Teleporters::new();
    advance(&mut mover, &maze, &teleporters, frame(IVec2::Y, true));
    advance(&mut mover, &maze, &teleporters, frame(IVec2::Y, false));
    advance(&mut mover, &maze, &teleporters, frame(IVec2::Y, false));
    assert_relative_eq!(mover.position().y, 1.5);

    advance(&mut mover, &maze, &teleporters, frame(-IVec2::Y, true));

    assert_relative_eq!(mover.position().y, 1.25);
    assert_eq!(mover.move_direction(), -IVec2::Y);
    assert_eq!(mover.prev_cell(), IVec2::new(3, 2));
    assert_eq!(mover.next_cell(), IVec2::new(3, 1));
}
